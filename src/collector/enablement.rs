//! Boot-enablement resolver
//!
//! Merges systemd unit-file state, chkconfig runlevel flags, rc.d links and
//! Upstart `start on` directives into one `{key -> enabled|disabled|...}` map.

use std::path::Path;

use super::{log_skipped, Collector, EnablementSource};
use crate::facts::{EnablementMap, ServiceKey};
use crate::parsers::{rcd, systemd, sysv, upstart};
use crate::runner::{CommandRunner, Invocation};

impl<R: CommandRunner> Collector<R> {
    /// Enablement facts from every source that applies to this host
    pub async fn enablement(&self) -> EnablementMap {
        let mut result = EnablementMap::new();

        for source in EnablementSource::ORDER {
            if !source.applies(&self.profile) {
                log::debug!("Enablement source {} does not apply", source.as_str());
                continue;
            }

            let facts = match source {
                EnablementSource::SystemdUnitFiles => self.unit_file_facts().await,
                EnablementSource::Chkconfig => self.chkconfig_facts().await,
                EnablementSource::RcLinks => self.rc_link_facts(),
                EnablementSource::UpstartJobs => self.upstart_job_facts().await,
            };

            let found = facts.len();
            let added = result.merge_from(facts);
            log::debug!(
                "{}: {} services, {} new",
                source.as_str(),
                found,
                added
            );
        }

        log::info!("Resolved enablement for {} services", result.len());
        result
    }

    async fn unit_file_facts(&self) -> EnablementMap {
        let output = self
            .runner
            .run(&Invocation::new(systemd::LIST_UNIT_FILES), None)
            .await;
        let parsed = systemd::parse_unit_files(&output);
        log_skipped(EnablementSource::SystemdUnitFiles.as_str(), &parsed.skipped);
        parsed.facts
    }

    async fn chkconfig_facts(&self) -> EnablementMap {
        let cmd = if self.profile.is_rhel_at_least(6) {
            Invocation::new(sysv::CHKCONFIG_LIST)
        } else {
            Invocation::new(sysv::LEGACY_CHKCONFIG_LIST).elevated(self.config.elevation())
        };

        let output = self.runner.run(&cmd, None).await;
        let parsed = sysv::parse_chkconfig(&output);
        log_skipped(EnablementSource::Chkconfig.as_str(), &parsed.skipped);
        parsed.facts
    }

    fn rc_link_facts(&self) -> EnablementMap {
        let dir = self.config.rc_dir();
        let names: Vec<String> = list_dir(&dir, "*")
            .iter()
            .filter_map(|p| p.file_name()?.to_str().map(str::to_string))
            .collect();
        rcd::parse_rc_links(names.iter().map(String::as_str))
    }

    async fn upstart_job_facts(&self) -> EnablementMap {
        let mut facts = EnablementMap::new();

        for path in list_dir(&self.config.root.join(upstart::JOB_DIR), "*.conf") {
            let Some(job) = upstart::job_name(&path) else {
                continue;
            };
            let content = match tokio::fs::read_to_string(&path).await {
                Ok(c) => c,
                Err(e) => {
                    log::debug!("Cannot read {}: {}", path.display(), e);
                    continue;
                }
            };
            if let Some(state) = upstart::job_state(&content) {
                facts.insert(ServiceKey::from_service(job), state);
            }
        }

        facts
    }
}

/// Entries of `dir` matching `pattern`, sorted; empty if the directory is missing
fn list_dir(dir: &Path, pattern: &str) -> Vec<std::path::PathBuf> {
    let full = format!("{}/{}", glob::Pattern::escape(&dir.to_string_lossy()), pattern);
    match glob::glob(&full) {
        Ok(paths) => paths.filter_map(Result::ok).collect(),
        Err(e) => {
            log::warn!("Invalid scan pattern {}: {}", full, e);
            Vec::new()
        }
    }
}
