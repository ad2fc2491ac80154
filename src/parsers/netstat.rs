//! netstat socket tables
//!
//! ```text
//! $ netstat -tulnep
//! Active Internet connections (only servers)
//! Proto Recv-Q Send-Q Local Address    Foreign Address  State   User  Inode   PID/Program name
//! tcp        0      0 0.0.0.0:80       0.0.0.0:*        LISTEN  0     12345   1234/apache2
//! udp        0      0 0.0.0.0:68       0.0.0.0:*                0     14321   800/dhclient
//! ```
//!
//! The PID/Program column moves: UDP rows have no State, and the User and
//! Inode columns only appear with `-e`. It is located as the first
//! `pid/name` (or `-`) field after the address columns.
//!
//! Socket tables race with the processes they describe, so every row is
//! parsed on its own and a bad row never aborts the table.

use super::columns::{Column, Parsed, Schema, SkipReason};
use crate::facts::{Connection, SocketBinding, SocketMap};

pub const LISTENING: &[&str] = &["netstat", "-tulnep"];

pub const ESTABLISHED: &[&str] = &["netstat", "-tnep"];

const PROTO: Column = Column::new(0, "proto");
const LOCAL: Column = Column::new(3, "local address");
const FOREIGN: Column = Column::new(4, "foreign address");
const STATE: Column = Column::new(5, "state");

/// First column that may hold PID/Program name
const PROGRAM_FROM: usize = 5;

const LISTENING_TABLE: Schema = Schema {
    source: "netstat listening",
    columns: &[PROTO, LOCAL, FOREIGN],
};

const ESTABLISHED_TABLE: Schema = Schema {
    source: "netstat established",
    columns: &[PROTO, LOCAL, FOREIGN, STATE],
};

fn is_header(fields: &[&str]) -> bool {
    matches!(fields.first(), Some(&"Active") | Some(&"Proto"))
}

fn is_program_field(field: &str) -> bool {
    field == "-"
        || field
            .split_once('/')
            .is_some_and(|(pid, _)| !pid.is_empty() && pid.chars().all(|c| c.is_ascii_digit()))
}

/// Program name from the first `pid/name` field at or after `from`
fn program_name(fields: &[&str], from: usize) -> Result<String, SkipReason> {
    let field = fields
        .iter()
        .skip(from)
        .find(|f| is_program_field(f))
        .ok_or_else(|| SkipReason::NoProcess(String::new()))?;

    match field.split_once('/') {
        Some((_, name)) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(SkipReason::NoProcess(field.to_string())),
    }
}

/// Split `addr:port` on the last colon (`:::22` -> `::`, `22`)
pub fn split_endpoint(endpoint: &str) -> Result<(String, String), SkipReason> {
    match endpoint.rsplit_once(':') {
        Some((addr, port)) if !port.is_empty() => Ok((addr.to_string(), port.to_string())),
        _ => Err(SkipReason::NoPort(endpoint.to_string())),
    }
}

/// One row of `netstat -tulnep`
pub fn parse_listening_row(line: &str) -> Result<SocketBinding, SkipReason> {
    let row = LISTENING_TABLE.split(line).map_err(|e| {
        if is_header(&line.split_whitespace().collect::<Vec<_>>()) {
            SkipReason::NotDataRow
        } else {
            e
        }
    })?;
    if is_header(row.fields()) {
        return Err(SkipReason::NotDataRow);
    }

    let proto = row.get(PROTO);
    if !(proto.starts_with("tcp") || proto.starts_with("udp")) {
        return Err(SkipReason::Protocol(proto.to_string()));
    }

    let service_name = program_name(row.fields(), PROGRAM_FROM)?;
    let (address, port) = split_endpoint(row.get(LOCAL))?;
    Ok(SocketBinding { service_name, port, address })
}

/// One row of `netstat -tnep`, keyed by the foreign endpoint
pub fn parse_established_row(line: &str) -> Result<Connection, SkipReason> {
    let row = ESTABLISHED_TABLE.split(line).map_err(|e| {
        if is_header(&line.split_whitespace().collect::<Vec<_>>()) {
            SkipReason::NotDataRow
        } else {
            e
        }
    })?;
    if is_header(row.fields()) {
        return Err(SkipReason::NotDataRow);
    }

    let proto = row.get(PROTO);
    if !proto.starts_with("tcp") {
        return Err(SkipReason::Protocol(proto.to_string()));
    }
    let state = row.get(STATE);
    if !state.starts_with("ESTA") {
        return Err(SkipReason::State(state.to_string()));
    }

    let service_name = program_name(row.fields(), STATE.index + 1)?;
    let (address, port) = split_endpoint(row.get(FOREIGN))?;
    Ok(Connection { service_name, port, address })
}

fn collect<F>(output: &str, parse_row: F) -> Parsed<SocketMap>
where
    F: Fn(&str) -> Result<SocketBinding, SkipReason>,
{
    let mut parsed = Parsed::new(SocketMap::new());
    for (idx, line) in output.lines().enumerate() {
        match parse_row(line) {
            Ok(binding) => parsed.facts.record(binding),
            Err(reason) => parsed.skip(idx + 1, reason),
        }
    }
    parsed
}

/// Parse a listening-socket table
pub fn parse_listening(output: &str) -> Parsed<SocketMap> {
    collect(output, parse_listening_row)
}

/// Parse an established-connection table
pub fn parse_established(output: &str) -> Parsed<SocketMap> {
    collect(output, parse_established_row)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTENING_OUTPUT: &str = "\
Active Internet connections (only servers)
Proto Recv-Q Send-Q Local Address           Foreign Address         State       User       Inode      PID/Program name
tcp        0      0 0.0.0.0:80              0.0.0.0:*               LISTEN      0          12345      1234/apache2
tcp        0      0 127.0.0.1:9102          0.0.0.0:*               LISTEN      0          12346      1300/bacula-fd
tcp6       0      0 ::1:25                  :::*                    LISTEN      0          12347      1400/exim4
tcp6       0      0 :::80                   :::*                    LISTEN      0          12348      1234/apache2
udp        0      0 0.0.0.0:68              0.0.0.0:*                           0          14321      800/dhclient
udp        0      0 127.0.0.1:323           0.0.0.0:*                           0          1111       -
";

    const ESTABLISHED_OUTPUT: &str = "\
Active Internet connections (w/o servers)
Proto Recv-Q Send-Q Local Address           Foreign Address         State       User       Inode      PID/Program name
tcp        0      0 10.0.0.5:22             10.0.2.2:41478          ESTABLISHED 0          22222      567/sshd: vagrant
tcp        0      0 10.0.0.5:51234          1.2.3.4:389             ESTABLISHED 0          22223      610/nscd
tcp        0      0 10.0.0.5:51300          1.2.3.4:443             TIME_WAIT   0          0          -
tcp6       0      0 ::1:5432                ::1:40000               ESTABLISHED 106        33333      -
";

    #[test]
    fn test_listening_row_without_extended_columns() {
        let binding = parse_listening_row("tcp 0 0 0.0.0.0:80 0.0.0.0:* LISTEN 1234/apache2").unwrap();
        assert_eq!(binding.service_name, "apache2");
        assert_eq!(binding.port, "80");
        assert_eq!(binding.address, "0.0.0.0");
    }

    #[test]
    fn test_established_row_without_extended_columns() {
        let conn =
            parse_established_row("tcp 0 0 10.0.0.5:22 10.0.2.2:41478 ESTABLISHED 567/sshd").unwrap();
        assert_eq!(conn.service_name, "sshd");
        assert_eq!(conn.port, "41478");
        assert_eq!(conn.address, "10.0.2.2");
    }

    #[test]
    fn test_parse_listening_table() {
        let parsed = parse_listening(LISTENING_OUTPUT);
        let map = &parsed.facts;

        assert_eq!(map.address("apache2", "80"), Some("::"));
        assert_eq!(map.address("bacula-fd", "9102"), Some("127.0.0.1"));
        assert_eq!(map.address("exim4", "25"), Some("::1"));
        assert_eq!(map.address("dhclient", "68"), Some("0.0.0.0"));
        assert_eq!(map.len(), 4);

        // two headers plus the socket without an owning process
        assert_eq!(parsed.skipped.len(), 3);
        assert_eq!(parsed.malformed(), 1);
        assert_eq!(parsed.skipped[2].line, 8);
    }

    #[test]
    fn test_parse_established_table() {
        let parsed = parse_established(ESTABLISHED_OUTPUT);
        let map = &parsed.facts;

        assert_eq!(map.address("sshd:", "41478"), Some("10.0.2.2"));
        assert_eq!(map.address("nscd", "389"), Some("1.2.3.4"));
        assert_eq!(map.len(), 2);
        assert!(parsed
            .skipped
            .iter()
            .any(|s| s.reason == SkipReason::State("TIME_WAIT".into())));
    }

    #[test]
    fn test_malformed_rows_do_not_abort() {
        let output = "\
tcp 0 0
tcp 0 0 0.0.0.0 0.0.0.0:* LISTEN 99/nokport
raw 0 0 0.0.0.0:1 0.0.0.0:* 7 0 1/ping
tcp 0 0 0.0.0.0:22 0.0.0.0:* LISTEN 900/sshd
tcp 0 0 0.0.0.0:23 0.0.0.0:* LISTEN
";
        let parsed = parse_listening(output);
        assert_eq!(parsed.facts.address("sshd", "22"), Some("0.0.0.0"));
        assert_eq!(parsed.facts.len(), 1);

        let reasons: Vec<_> = parsed.skipped.iter().map(|s| &s.reason).collect();
        assert!(matches!(reasons[0], SkipReason::TooFewColumns { .. }));
        assert_eq!(reasons[1], &SkipReason::NoPort("0.0.0.0".into()));
        assert_eq!(reasons[2], &SkipReason::Protocol("raw".into()));
        assert_eq!(reasons[3], &SkipReason::NoProcess(String::new()));
    }

    #[test]
    fn test_udp_only_in_listening() {
        let line = "udp 0 0 10.0.0.5:5353 10.0.0.9:5353 ESTABLISHED 0 1 42/avahi";
        assert_eq!(
            parse_established_row(line).unwrap_err(),
            SkipReason::Protocol("udp".into())
        );
        assert_eq!(parse_listening_row(line).unwrap().service_name, "avahi");
    }

    #[test]
    fn test_split_endpoint() {
        assert_eq!(split_endpoint("[::]:22"), Ok(("[::]".into(), "22".into())));
        assert_eq!(split_endpoint("fe80::1%eth0:123"), Ok(("fe80::1%eth0".into(), "123".into())));
        assert_eq!(split_endpoint("0.0.0.0:*"), Ok(("0.0.0.0".into(), "*".into())));
        assert!(split_endpoint("0.0.0.0:").is_err());
    }
}
