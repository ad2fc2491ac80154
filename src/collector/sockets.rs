//! Socket-table resolver
//!
//! Listening sockets and established connections come from two separate
//! snapshots; neither depends on the host profile.

use super::{log_skipped, Collector};
use crate::facts::SocketMap;
use crate::parsers::netstat;
use crate::runner::{CommandRunner, Invocation};

impl<R: CommandRunner> Collector<R> {
    /// `{program -> {local port -> local address}}`
    pub async fn listening(&self) -> SocketMap {
        let output = self.runner.run(&Invocation::new(netstat::LISTENING), None).await;
        let parsed = netstat::parse_listening(&output);

        log_skipped("netstat listening", &parsed.skipped);
        if parsed.malformed() > 0 {
            log::debug!("{} listening rows had no usable owner or address", parsed.malformed());
        }
        log::info!("Found listening sockets for {} programs", parsed.facts.len());
        parsed.facts
    }

    /// `{program -> {foreign port -> foreign address}}`
    pub async fn established(&self) -> SocketMap {
        let output = self.runner.run(&Invocation::new(netstat::ESTABLISHED), None).await;
        let parsed = netstat::parse_established(&output);

        log_skipped("netstat established", &parsed.skipped);
        log::info!("Found established connections for {} programs", parsed.facts.len());
        parsed.facts
    }
}
