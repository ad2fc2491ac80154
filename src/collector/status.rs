//! Runtime-status resolver

use super::{log_skipped, Collector, StatusSource};
use crate::facts::StatusMap;
use crate::parsers::{systemd, sysv, upstart, Parsed};
use crate::runner::{CommandRunner, Invocation};

impl<R: CommandRunner> Collector<R> {
    /// Running/stopped facts from every source that applies to this host
    pub async fn status(&self) -> StatusMap {
        let mut result = StatusMap::new();

        for source in StatusSource::ORDER {
            if !source.applies(&self.profile) {
                log::debug!("Status source {} does not apply", source.as_str());
                continue;
            }

            let parsed = match source {
                StatusSource::SystemdUnits => {
                    let output = self.runner.run(&Invocation::new(systemd::LIST_UNITS), None).await;
                    systemd::parse_units(&output)
                }
                StatusSource::DebianStatusAll => {
                    let cmd = Invocation::new(sysv::STATUS_ALL).merge_stderr();
                    let output = self.runner.run(&cmd, None).await;
                    sysv::parse_bracket_status(&output)
                }
                StatusSource::RhelStatusAll => self.rhel_status_all().await,
                StatusSource::Initctl => {
                    let output = self.runner.run(&Invocation::new(upstart::INITCTL_LIST), None).await;
                    upstart::parse_initctl_list(&output)
                }
            };

            log_skipped(source.as_str(), &parsed.skipped);
            let found = parsed.facts.len();
            let added = result.merge_from(parsed.facts);
            log::debug!("{}: {} services, {} new", source.as_str(), found, added);
        }

        log::info!("Resolved runtime status for {} services", result.len());
        result
    }

    /// `service --status-all | grep 'running\|stopped'`
    async fn rhel_status_all(&self) -> Parsed<StatusMap> {
        let cmd = if self.profile.is_rhel_at_least(6) {
            Invocation::new(sysv::STATUS_ALL)
        } else {
            Invocation::new(sysv::LEGACY_STATUS_ALL).elevated(self.config.elevation())
        };

        let output = self.runner.run(&cmd, None).await;
        if output.trim().is_empty() {
            return Parsed::new(StatusMap::new());
        }

        let filtered = self
            .runner
            .run(&Invocation::new(sysv::STATUS_FILTER), Some(&output))
            .await;
        sysv::parse_phrase_status(&filtered)
    }
}
