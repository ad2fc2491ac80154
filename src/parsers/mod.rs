//! Line parsers, one module per source format
//!
//! Parsers are pure: command text in, facts out. They never fail; rows they
//! cannot use are reported back in `Parsed::skipped`.

pub mod columns;
pub mod netstat;
pub mod rcd;
pub mod systemd;
pub mod sysv;
pub mod upstart;

pub use columns::{Parsed, SkipReason, SkippedRow};
