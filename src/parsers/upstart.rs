//! Upstart job configuration and `initctl list`
//!
//! Job files live in `/etc/init/<job>.conf`. Enablement comes from the
//! runlevels named in the job's `start on` directive:
//!
//! ```text
//! start on (filesystem
//!           and runlevel [2345])    # enabled
//! start on runlevel [016]           # disabled
//! start on started dbus             # no runlevel, no fact
//! ```

use std::path::Path;

use super::columns::{Column, Parsed, Schema, SkipReason};
use crate::facts::{EnablementState, RuntimeState, ServiceKey, StatusMap};

pub const INITCTL_LIST: &[&str] = &["initctl", "list"];

/// Directory holding job definitions, relative to the filesystem root
pub const JOB_DIR: &str = "etc/init";

const NAME: Column = Column::new(0, "job");
const GOAL_STATE: Column = Column::new(1, "goal/state");

const INITCTL: Schema = Schema {
    source: "initctl list",
    columns: &[NAME, GOAL_STATE],
};

/// Multi-user runlevels that count as "starts at boot"
const BOOT_RUNLEVELS: std::ops::RangeInclusive<u8> = 2..=5;

/// Job name from its config path (`/etc/init/ssh.conf` -> `ssh`)
pub fn job_name(path: &Path) -> Option<&str> {
    let file_name = path.file_name()?.to_str()?;
    let name = file_name.split('.').next()?;
    (!name.is_empty()).then_some(name)
}

/// The last `start on` directive in a job file, comments removed and
/// continuation lines joined
pub fn start_on_directive(content: &str) -> Option<String> {
    let mut directive: Option<String> = None;
    let mut open = 0i32;
    let mut collecting = false;

    for raw in content.lines() {
        let line = raw.split('#').next().unwrap_or("").trim();

        if collecting {
            if let Some(d) = directive.as_mut() {
                d.push(' ');
                d.push_str(line);
            }
        } else if line.starts_with("start on") {
            directive = Some(line.to_string());
            open = 0;
            collecting = true;
        } else {
            continue;
        }

        open += line.matches('(').count() as i32 - line.matches(')').count() as i32;
        if open <= 0 {
            collecting = false;
        }
    }

    directive
}

/// Runlevel digits named in a `runlevel` argument (`[2345]`, `[!016]`, `2`)
///
/// A `!` is not expanded: `[!016]` names 0, 1 and 6.
fn runlevels_in(arg: &str) -> Vec<u8> {
    arg.chars()
        .filter_map(|c| c.to_digit(10))
        .filter_map(|d| u8::try_from(d).ok())
        .collect()
}

/// Enablement implied by a job file, or `None` if its start condition does
/// not involve runlevels
pub fn job_state(content: &str) -> Option<EnablementState> {
    let directive = start_on_directive(content)?;
    let lower = directive.to_lowercase();

    let mut mentions_runlevel = false;
    let mut boots = false;
    for (pos, _) in lower.match_indices("runlevel") {
        mentions_runlevel = true;
        let arg = lower[pos + "runlevel".len()..]
            .split_whitespace()
            .next()
            .unwrap_or("");
        if runlevels_in(arg).iter().any(|l| BOOT_RUNLEVELS.contains(l)) {
            boots = true;
        }
    }

    if !mentions_runlevel {
        return None;
    }
    Some(if boots {
        EnablementState::Enabled
    } else {
        EnablementState::Disabled
    })
}

/// `start/running` and friends
pub fn goal_state(token: &str) -> RuntimeState {
    match token {
        "start/running" => RuntimeState::Active,
        "stop/waiting" => RuntimeState::Inactive,
        _ => RuntimeState::Unknown,
    }
}

/// Parse `initctl list`
///
/// Instance jobs (`network-interface (eth0) start/running`) are keyed with
/// the instance folded in: `network-interface_(eth0)_service`.
pub fn parse_initctl_list(output: &str) -> Parsed<StatusMap> {
    let mut parsed = Parsed::new(StatusMap::new());

    for (idx, line) in output.lines().enumerate() {
        let head = line.split(',').next().unwrap_or("").replace(" (", "_(");
        let row = match INITCTL.split(&head) {
            Ok(row) => row,
            Err(reason) => {
                parsed.skip(idx + 1, reason);
                continue;
            }
        };

        let token = row.get(GOAL_STATE);
        if !token.contains('/') {
            parsed.skip(idx + 1, SkipReason::NotDataRow);
            continue;
        }

        parsed
            .facts
            .insert(ServiceKey::from_service(row.get(NAME)), goal_state(token));
    }

    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_name() {
        assert_eq!(job_name(Path::new("/etc/init/ssh.conf")), Some("ssh"));
        assert_eq!(job_name(Path::new("/etc/init/rc-sysinit.conf")), Some("rc-sysinit"));
        assert_eq!(job_name(Path::new("/etc/init/.hidden")), None);
    }

    #[test]
    fn test_single_line_directive() {
        let content = "description \"OpenSSH server\"\n\nstart on runlevel [2345]\nstop on runlevel [!2345]\n";
        assert_eq!(job_state(content), Some(EnablementState::Enabled));
    }

    #[test]
    fn test_disabled_runlevels() {
        assert_eq!(job_state("start on runlevel [016]\n"), Some(EnablementState::Disabled));
        assert_eq!(job_state("start on runlevel S\n"), Some(EnablementState::Disabled));
    }

    #[test]
    fn test_negated_runlevels_read_by_digit() {
        // the digits written decide, whatever the `!`
        assert_eq!(job_state("start on runlevel [!016]\n"), Some(EnablementState::Disabled));
        assert_eq!(job_state("start on runlevel [!2345]\n"), Some(EnablementState::Enabled));
        assert_eq!(
            job_state("start on stopped rc RUNLEVEL=[!2345]\n"),
            Some(EnablementState::Enabled)
        );
    }

    #[test]
    fn test_multi_line_directive() {
        let content = "\
start on (local-filesystems
          and net-device-up IFACE!=lo
          and runlevel [2345])
stop on runlevel [!2345]
";
        assert_eq!(
            start_on_directive(content).as_deref(),
            Some("start on (local-filesystems and net-device-up IFACE!=lo and runlevel [2345])")
        );
        assert_eq!(job_state(content), Some(EnablementState::Enabled));
    }

    #[test]
    fn test_commented_directive_ignored() {
        let content = "# start on runlevel [2345]\nstart on runlevel [016] # was [2345]\n";
        assert_eq!(job_state(content), Some(EnablementState::Disabled));
        assert_eq!(job_state("#start on runlevel [2345]\n"), None);
    }

    #[test]
    fn test_event_only_job_has_no_fact() {
        assert_eq!(job_state("start on started dbus\n"), None);
        assert_eq!(job_state("task\nexec /bin/true\n"), None);
    }

    #[test]
    fn test_parse_initctl_list() {
        let output = "\
ssh start/running, process 1234
tty1 start/running, process 987
network-interface (eth0) start/running
network-interface (lo) stop/waiting
plymouth-log stop/waiting
mountall-net start/pre-start
orphan
";
        let parsed = parse_initctl_list(output);
        let facts = &parsed.facts;

        assert_eq!(facts.get("ssh_service"), Some(&RuntimeState::Active));
        assert_eq!(facts.get("network-interface_(eth0)_service"), Some(&RuntimeState::Active));
        assert_eq!(facts.get("network-interface_(lo)_service"), Some(&RuntimeState::Inactive));
        assert_eq!(facts.get("plymouth-log_service"), Some(&RuntimeState::Inactive));
        assert_eq!(facts.get("mountall-net_service"), Some(&RuntimeState::Unknown));
        assert_eq!(facts.len(), 6);
        assert_eq!(parsed.malformed(), 1);
    }

    #[test]
    fn test_goal_state_table() {
        assert_eq!(goal_state("start/running"), RuntimeState::Active);
        assert_eq!(goal_state("stop/waiting"), RuntimeState::Inactive);
        assert_eq!(goal_state("stop/killed"), RuntimeState::Unknown);
        assert_eq!(goal_state("running"), RuntimeState::Unknown);
    }
}
