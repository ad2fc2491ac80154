//! System V tooling: `chkconfig --list` and `service --status-all`
//!
//! The same `service --status-all` command prints two unrelated formats:
//!
//! ```text
//! Debian/Ubuntu                 RHEL/CentOS
//!  [ + ]  apache2               crond (pid  1234) is running...
//!  [ - ]  bootmisc.sh           sshd is stopped
//!  [ ? ]  hwclock.sh            iptables: Firewall is not running.
//! ```

use super::columns::{Column, Parsed, Schema, SkipReason};
use crate::facts::{EnablementMap, EnablementState, RuntimeState, ServiceKey, StatusMap};

pub const CHKCONFIG_LIST: &[&str] = &["chkconfig", "--list"];

/// RHEL 5 keeps chkconfig out of unprivileged PATHs
pub const LEGACY_CHKCONFIG_LIST: &[&str] = &["/sbin/chkconfig", "--list"];

pub const STATUS_ALL: &[&str] = &["service", "--status-all"];

pub const LEGACY_STATUS_ALL: &[&str] = &["/sbin/service", "--status-all"];

/// Filter applied to RHEL `service --status-all` output
pub const STATUS_FILTER: &[&str] = &["grep", "running\\|stopped"];

/// Name plus one column per runlevel 0..=6
const CHKCONFIG_COLUMNS: usize = 8;

/// Runlevels whose flags decide enablement
const INSPECTED_RUNLEVELS: std::ops::RangeInclusive<usize> = 2..=5;

const XINETD_SECTION: &str = "xinetd based services";

const BRACKET_OPEN: Column = Column::new(0, "[");
const TOKEN: Column = Column::new(1, "token");
const BRACKET_CLOSE: Column = Column::new(2, "]");
const NAME: Column = Column::new(3, "name");

const DEBIAN_STATUS: Schema = Schema {
    source: "service --status-all (debian)",
    columns: &[BRACKET_OPEN, TOKEN, BRACKET_CLOSE, NAME],
};

/// Enablement from the four inspected runlevel flags
///
/// Disabled only when every flag is literally `off`.
pub fn runlevel_state(flags: [&str; 4]) -> EnablementState {
    if flags.iter().all(|f| *f == "off") {
        EnablementState::Disabled
    } else {
        EnablementState::Enabled
    }
}

/// Flags for runlevels 2..=5, or `None` if the row is not laid out as
/// `name 0:x 1:x ... 6:x`
fn inspected_flags<'a>(fields: &[&'a str]) -> Option<[&'a str; 4]> {
    if fields.len() != CHKCONFIG_COLUMNS {
        return None;
    }

    let mut flags = [""; 4];
    for (runlevel, field) in fields[1..].iter().enumerate() {
        let (level, flag) = field.split_once(':')?;
        if level.parse::<usize>().ok()? != runlevel {
            return None;
        }
        if INSPECTED_RUNLEVELS.contains(&runlevel) {
            flags[runlevel - INSPECTED_RUNLEVELS.start()] = flag;
        }
    }
    Some(flags)
}

fn looks_like_runlevel(field: &str) -> bool {
    field
        .split_once(':')
        .is_some_and(|(level, _)| level.len() == 1 && level.chars().all(|c| c.is_ascii_digit()))
}

/// Parse `chkconfig --list`
///
/// Rows whose runlevel columns do not line up with the expected layout are
/// recorded as unknown rather than read positionally.
pub fn parse_chkconfig(output: &str) -> Parsed<EnablementMap> {
    let mut parsed = Parsed::new(EnablementMap::new());

    for (idx, line) in output.lines().enumerate() {
        if line.trim_start().starts_with(XINETD_SECTION) {
            break;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        let Some(name) = fields.first() else {
            parsed.skip(idx + 1, SkipReason::Blank);
            continue;
        };
        if !fields[1..].iter().any(|f| looks_like_runlevel(f)) {
            parsed.skip(idx + 1, SkipReason::NotDataRow);
            continue;
        }

        let state = match inspected_flags(&fields) {
            Some(flags) => runlevel_state(flags),
            None => {
                log::debug!(
                    "chkconfig row {} for {} has unexpected layout ({} columns)",
                    idx + 1,
                    name,
                    fields.len()
                );
                EnablementState::Unknown
            }
        };
        parsed.facts.insert(ServiceKey::from_service(name), state);
    }

    parsed
}

/// Debian `[ + ]` token
pub fn bracket_token_state(token: &str) -> RuntimeState {
    match token {
        "+" => RuntimeState::Active,
        "-" => RuntimeState::Inactive,
        _ => RuntimeState::Unknown,
    }
}

/// RHEL `... is <token>` phrase, dots already stripped
pub fn phrase_state(phrase: &str) -> RuntimeState {
    match phrase.split_whitespace().collect::<Vec<_>>().as_slice() {
        ["running"] => RuntimeState::Active,
        ["stopped"] | ["not", "running"] => RuntimeState::Inactive,
        _ => RuntimeState::Unknown,
    }
}

/// Parse Debian-style `service --status-all`
pub fn parse_bracket_status(output: &str) -> Parsed<StatusMap> {
    let mut parsed = Parsed::new(StatusMap::new());

    for (idx, line) in output.lines().enumerate() {
        let row = match DEBIAN_STATUS.split(line) {
            Ok(row) => row,
            Err(reason) => {
                parsed.skip(idx + 1, reason);
                continue;
            }
        };
        if row.get(BRACKET_OPEN) != "[" || row.get(BRACKET_CLOSE) != "]" {
            parsed.skip(idx + 1, SkipReason::NotDataRow);
            continue;
        }

        parsed.facts.insert(
            ServiceKey::from_service(row.get(NAME)),
            bracket_token_state(row.get(TOKEN)),
        );
    }

    parsed
}

/// Parse RHEL-style `service --status-all`
pub fn parse_phrase_status(output: &str) -> Parsed<StatusMap> {
    let mut parsed = Parsed::new(StatusMap::new());

    for (idx, line) in output.lines().enumerate() {
        let Some(name) = line.split_whitespace().next() else {
            parsed.skip(idx + 1, SkipReason::Blank);
            continue;
        };
        let Some((_, phrase)) = line.split_once(" is ") else {
            parsed.skip(idx + 1, SkipReason::NotDataRow);
            continue;
        };

        let phrase = phrase.replace('.', "");
        let name = name.trim_end_matches(':');
        parsed
            .facts
            .insert(ServiceKey::from_service(name), phrase_state(&phrase));
    }

    parsed
}
