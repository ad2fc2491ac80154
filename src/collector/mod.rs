//! Fact collection
//!
//! A `Collector` pairs one detected `HostProfile` with a `CommandRunner` and
//! runs the three resolvers against them:
//!
//! ```text
//!  HostProfile ──┬─> enablement()  systemd → chkconfig → rc.d → upstart
//!                ├─> status()      systemd → status-all (deb) → status-all (rhel) → initctl
//!                └─> listening() / established()   netstat
//!                          │
//!                          ▼
//!                       Report
//! ```
//!
//! Sources run in the fixed order shown; within a resolver the first source
//! to produce a key owns it.

mod enablement;
mod sockets;
mod status;

use crate::config::Config;
use crate::host::HostProfile;
use crate::parsers::SkippedRow;
use crate::report::Report;
use crate::runner::CommandRunner;

/// Sources of boot-enablement facts, in precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnablementSource {
    SystemdUnitFiles,
    Chkconfig,
    RcLinks,
    UpstartJobs,
}

impl EnablementSource {
    pub const ORDER: [Self; 4] = [
        Self::SystemdUnitFiles,
        Self::Chkconfig,
        Self::RcLinks,
        Self::UpstartJobs,
    ];

    pub fn applies(&self, profile: &HostProfile) -> bool {
        match self {
            Self::SystemdUnitFiles => profile.uses_systemd(),
            Self::Chkconfig => profile.is_rhel_at_least(5),
            Self::RcLinks => profile.is_debian(),
            Self::UpstartJobs => profile.is_debian() || profile.is_rhel_major(6),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SystemdUnitFiles => "systemd unit files",
            Self::Chkconfig => "chkconfig",
            Self::RcLinks => "rc.d links",
            Self::UpstartJobs => "upstart jobs",
        }
    }
}

/// Sources of runtime-state facts, in precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusSource {
    SystemdUnits,
    DebianStatusAll,
    RhelStatusAll,
    Initctl,
}

impl StatusSource {
    pub const ORDER: [Self; 4] = [
        Self::SystemdUnits,
        Self::DebianStatusAll,
        Self::RhelStatusAll,
        Self::Initctl,
    ];

    pub fn applies(&self, profile: &HostProfile) -> bool {
        match self {
            Self::SystemdUnits => profile.uses_systemd(),
            Self::DebianStatusAll => profile.is_debian(),
            Self::RhelStatusAll => profile.is_rhel_at_least(5),
            Self::Initctl => {
                (profile.is_debian() && !profile.uses_systemd()) || profile.is_rhel_major(6)
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SystemdUnits => "systemd units",
            Self::DebianStatusAll => "service --status-all (debian)",
            Self::RhelStatusAll => "service --status-all (rhel)",
            Self::Initctl => "initctl list",
        }
    }
}

/// Runs the resolvers for one host
pub struct Collector<R> {
    profile: HostProfile,
    runner: R,
    config: Config,
}

impl<R: CommandRunner> Collector<R> {
    pub fn new(profile: HostProfile, runner: R, config: Config) -> Self {
        Self { profile, runner, config }
    }

    pub fn profile(&self) -> &HostProfile {
        &self.profile
    }

    /// Run every resolver and assemble the report
    pub async fn collect(&self) -> Report {
        log::info!("Collecting service facts for {}", self.profile);

        let init = self.enablement().await;
        let status = self.status().await;
        let listening = self.listening().await;
        let established = self.established().await;

        Report::aggregate(init, status, listening, established)
    }
}

fn log_skipped(source: &str, skipped: &[SkippedRow]) {
    if skipped.is_empty() {
        return;
    }
    log::debug!("{}: {} rows skipped", source, skipped.len());
    for row in skipped {
        log::trace!("{} line {}: {}", source, row.line, row.reason);
    }
}
