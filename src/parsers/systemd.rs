//! systemctl listings
//!
//! ```text
//! $ systemctl list-unit-files --type=service
//! UNIT FILE                      STATE           VENDOR PRESET
//! accounts-daemon.service        enabled         enabled
//! apt-daily.service              static          -
//!
//! 2 unit files listed.
//!
//! $ systemctl list-units --all --type=service --plain --no-legend
//! accounts-daemon.service  loaded    active   running Accounts Service
//! apt-daily.service        loaded    inactive dead    Daily apt download activities
//! ```

use super::columns::{Column, Parsed, Schema, SkipReason};
use crate::facts::{EnablementMap, EnablementState, RuntimeState, ServiceKey, StatusMap};

pub const LIST_UNIT_FILES: &[&str] = &["systemctl", "list-unit-files", "--type=service"];

pub const LIST_UNITS: &[&str] = &[
    "systemctl",
    "list-units",
    "--all",
    "--type=service",
    "--plain",
    "--no-legend",
];

const UNIT: Column = Column::new(0, "unit");
const FILE_STATE: Column = Column::new(1, "state");
const ACTIVE: Column = Column::new(2, "active");

const UNIT_FILES: Schema = Schema {
    source: "systemctl list-unit-files",
    columns: &[UNIT, FILE_STATE],
};

const UNITS: Schema = Schema {
    source: "systemctl list-units",
    columns: &[UNIT, ACTIVE],
};

/// Unit-file state; anything besides the three settled states is unknown
pub fn unit_file_state(token: &str) -> EnablementState {
    match token {
        "enabled" => EnablementState::Enabled,
        "disabled" => EnablementState::Disabled,
        "static" => EnablementState::Static,
        _ => EnablementState::Unknown,
    }
}

/// ACTIVE column state; transitional states are unknown
pub fn active_state(token: &str) -> RuntimeState {
    match token {
        "active" => RuntimeState::Active,
        "inactive" | "failed" => RuntimeState::Inactive,
        _ => RuntimeState::Unknown,
    }
}

fn is_service_unit(name: &str) -> bool {
    name.ends_with(".service")
}

/// Parse `systemctl list-unit-files --type=service`
pub fn parse_unit_files(output: &str) -> Parsed<EnablementMap> {
    let mut parsed = Parsed::new(EnablementMap::new());

    for (idx, line) in output.lines().enumerate() {
        let row = match UNIT_FILES.split(line) {
            Ok(row) => row,
            Err(reason) => {
                parsed.skip(idx + 1, reason);
                continue;
            }
        };

        let unit = row.get(UNIT);
        if !is_service_unit(unit) {
            parsed.skip(idx + 1, SkipReason::NotDataRow);
            continue;
        }

        parsed
            .facts
            .insert(ServiceKey::from_unit(unit), unit_file_state(row.get(FILE_STATE)));
    }

    parsed
}

/// Parse `systemctl list-units --all --type=service --plain --no-legend`
pub fn parse_units(output: &str) -> Parsed<StatusMap> {
    let mut parsed = Parsed::new(StatusMap::new());

    for (idx, line) in output.lines().enumerate() {
        // Older systemctl marks not-found units with a bullet even in --plain mode
        let line = line.trim_start().trim_start_matches('●');

        let row = match UNITS.split(line) {
            Ok(row) => row,
            Err(reason) => {
                parsed.skip(idx + 1, reason);
                continue;
            }
        };

        let unit = row.get(UNIT);
        if !is_service_unit(unit) {
            parsed.skip(idx + 1, SkipReason::NotDataRow);
            continue;
        }

        parsed
            .facts
            .insert(ServiceKey::from_unit(unit), active_state(row.get(ACTIVE)));
    }

    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT_FILES_OUTPUT: &str = "\
UNIT FILE                                  STATE           VENDOR PRESET
accounts-daemon.service                    enabled         enabled
apache-htcacheclean.service                disabled        enabled
apport-forward@.service                    static          -
autovt@.service                            alias           -
console-getty.service                      masked          disabled
rc.local.service                           enabled-runtime enabled

6 unit files listed.
";

    const UNITS_OUTPUT: &str = "\
accounts-daemon.service   loaded    active   running Accounts Service
apt-daily.service         loaded    inactive dead    Daily apt download activities
mdmonitor.service         loaded    failed   failed  Software RAID monitoring
nginx.service             loaded    activating start A high performance web server
● plymouth.service        not-found inactive dead    plymouth.service
";

    #[test]
    fn test_unit_files_states() {
        let parsed = parse_unit_files(UNIT_FILES_OUTPUT);
        let facts = &parsed.facts;

        assert_eq!(facts.get("accounts-daemon_service"), Some(&EnablementState::Enabled));
        assert_eq!(facts.get("apache-htcacheclean_service"), Some(&EnablementState::Disabled));
        assert_eq!(facts.get("apport-forward@_service"), Some(&EnablementState::Static));
        assert_eq!(facts.get("autovt@_service"), Some(&EnablementState::Unknown));
        assert_eq!(facts.get("console-getty_service"), Some(&EnablementState::Unknown));
        assert_eq!(facts.get("rc_local_service"), Some(&EnablementState::Unknown));
        assert_eq!(facts.len(), 6);
    }

    #[test]
    fn test_unit_files_skips_header_and_footer() {
        let parsed = parse_unit_files(UNIT_FILES_OUTPUT);
        // header, blank line, footer
        assert_eq!(parsed.skipped.len(), 3);
        assert_eq!(parsed.malformed(), 0);
    }

    #[test]
    fn test_unit_files_row_without_state() {
        let parsed = parse_unit_files("orphan.service\nssh.service enabled\n");
        assert_eq!(parsed.facts.len(), 1);
        assert_eq!(parsed.malformed(), 1);
        assert_eq!(parsed.skipped[0].line, 1);
    }

    #[test]
    fn test_units_active_column() {
        let parsed = parse_units(UNITS_OUTPUT);
        let facts = &parsed.facts;

        assert_eq!(facts.get("accounts-daemon_service"), Some(&RuntimeState::Active));
        assert_eq!(facts.get("apt-daily_service"), Some(&RuntimeState::Inactive));
        assert_eq!(facts.get("mdmonitor_service"), Some(&RuntimeState::Inactive));
        assert_eq!(facts.get("nginx_service"), Some(&RuntimeState::Unknown));
        assert_eq!(facts.get("plymouth_service"), Some(&RuntimeState::Inactive));
    }

    #[test]
    fn test_unknown_tokens_never_active() {
        for token in ["running", "reloading", "deactivating", "ACTIVE", ""] {
            assert_eq!(active_state(token), RuntimeState::Unknown, "token {:?}", token);
        }
    }

    #[test]
    fn test_empty_output() {
        assert!(parse_unit_files("").facts.is_empty());
        assert!(parse_units("").facts.is_empty());
    }
}
