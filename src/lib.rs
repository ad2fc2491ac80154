//! service-facts - Normalized service and socket facts for Linux hosts
//!
//! Collects a point-in-time snapshot of:
//! - which services start at boot (systemd, chkconfig, rc.d, Upstart)
//! - which services are running right now
//! - which programs listen on which ports, and who they talk to
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 service-facts                    │
//! ├─────────────────────────────────────────────────┤
//! │ HostProfile │  Collector (3 resolvers) │ Report  │
//! ├─────────────────────────────────────────────────┤
//! │  Line parsers (one per source) │ CommandRunner   │
//! └─────────────────────────────────────────────────┘
//! ```

pub mod collector;
pub mod config;
pub mod facts;
pub mod host;
pub mod parsers;
pub mod report;
pub mod runner;

pub use collector::{Collector, EnablementSource, StatusSource};
pub use config::{Config, ConfigError};
pub use facts::{EnablementState, RuntimeState, ServiceKey, SocketBinding};
pub use host::{Family, HostProfile};
pub use report::{Format, Report, ReportError};
pub use runner::{CommandRunner, Invocation, SystemRunner};
