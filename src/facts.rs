//! Normalized fact types
//!
//! Every source speaks its own vocabulary. The types here are the common
//! language the resolvers translate into.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Suffix appended to keys sourced from init-system metadata
pub const SERVICE_SUFFIX: &str = "_service";

/// Normalized service identifier
///
/// Lowercased, dots replaced with underscores. Keys sourced from init-system
/// metadata carry the `_service` suffix; socket-table keys are left as the raw
/// program name and never pass through here.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceKey(String);

impl ServiceKey {
    /// Key for a bare service name (`sshd`, `apache2`, `rc.local`)
    pub fn from_service(name: &str) -> Self {
        Self(format!("{}{}", normalize(name), SERVICE_SUFFIX))
    }

    /// Key for a systemd unit name (`nginx.service` -> `nginx_service`)
    ///
    /// The unit suffix already supplies the `_service` tail once the dot is
    /// replaced, so it is not appended a second time.
    pub fn from_unit(unit: &str) -> Self {
        Self(normalize(unit))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn normalize(name: &str) -> String {
    name.trim().replace('.', "_").to_lowercase()
}

/// Whether a service is configured to start automatically
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnablementState {
    Enabled,
    Disabled,
    Static,
    Unknown,
}

impl EnablementState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
            Self::Static => "static",
            Self::Unknown => "unknown",
        }
    }
}

/// Whether a service's processes are currently running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeState {
    Active,
    Inactive,
    Unknown,
}

impl RuntimeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Unknown => "unknown",
        }
    }
}

/// Accumulated `{ServiceKey -> state}` facts for one resolver
///
/// Ordered so that identical hosts serialize identically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactMap<S>(BTreeMap<ServiceKey, S>);

impl<S> Default for FactMap<S> {
    fn default() -> Self {
        Self(BTreeMap::new())
    }
}

impl<S> FactMap<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fact from the source currently being parsed (last write wins)
    pub fn insert(&mut self, key: ServiceKey, state: S) {
        self.0.insert(key, state);
    }

    /// Fold another source's facts in; keys already present are kept
    ///
    /// Returns how many keys were newly added.
    pub fn merge_from(&mut self, other: FactMap<S>) -> usize {
        let mut added = 0;
        for (key, state) in other.0 {
            if let std::collections::btree_map::Entry::Vacant(slot) = self.0.entry(key) {
                slot.insert(state);
                added += 1;
            }
        }
        added
    }

    pub fn get(&self, key: &str) -> Option<&S> {
        self.0.get(&ServiceKey(key.to_string()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ServiceKey, &S)> {
        self.0.iter()
    }
}

pub type EnablementMap = FactMap<EnablementState>;
pub type StatusMap = FactMap<RuntimeState>;

/// One endpoint attributed to a program: local bind or remote peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketBinding {
    pub service_name: String,
    pub port: String,
    pub address: String,
}

/// Connections share the binding shape; the address is the foreign end
pub type Connection = SocketBinding;

/// `{service_name -> {port -> address}}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SocketMap(BTreeMap<String, BTreeMap<String, String>>);

impl SocketMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, binding: SocketBinding) {
        self.0
            .entry(binding.service_name)
            .or_default()
            .insert(binding.port, binding.address);
    }

    /// Address recorded for `service` on `port`
    pub fn address(&self, service: &str, port: &str) -> Option<&str> {
        self.0.get(service)?.get(port).map(String::as_str)
    }

    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_key_normalization() {
        assert_eq!(ServiceKey::from_service("Rc.Local").as_str(), "rc_local_service");
        assert_eq!(ServiceKey::from_service("  sshd\t").as_str(), "sshd_service");
        assert_eq!(ServiceKey::from_unit("NetworkManager.service").as_str(), "networkmanager_service");
        assert_eq!(ServiceKey::from_unit("apport-forward@.service").as_str(), "apport-forward@_service");
    }

    #[test]
    fn test_unit_and_service_keys_collide() {
        assert_eq!(ServiceKey::from_unit("ssh.service"), ServiceKey::from_service("ssh"));
    }

    #[test]
    fn test_merge_first_writer_wins() {
        let mut acc = EnablementMap::new();
        acc.insert(ServiceKey::from_service("ssh"), EnablementState::Static);

        let mut later = EnablementMap::new();
        later.insert(ServiceKey::from_service("ssh"), EnablementState::Disabled);
        later.insert(ServiceKey::from_service("cron"), EnablementState::Enabled);

        assert_eq!(acc.merge_from(later), 1);
        assert_eq!(acc.get("ssh_service"), Some(&EnablementState::Static));
        assert_eq!(acc.get("cron_service"), Some(&EnablementState::Enabled));
    }

    #[test]
    fn test_insert_last_writer_wins() {
        let mut map = StatusMap::new();
        map.insert(ServiceKey::from_service("ssh"), RuntimeState::Inactive);
        map.insert(ServiceKey::from_service("ssh"), RuntimeState::Active);
        assert_eq!(map.get("ssh_service"), Some(&RuntimeState::Active));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_socket_map_record() {
        let mut map = SocketMap::new();
        map.record(SocketBinding {
            service_name: "apache2".into(),
            port: "80".into(),
            address: "0.0.0.0".into(),
        });
        map.record(SocketBinding {
            service_name: "apache2".into(),
            port: "443".into(),
            address: "::".into(),
        });
        assert_eq!(map.address("apache2", "80"), Some("0.0.0.0"));
        assert_eq!(map.address("apache2", "443"), Some("::"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_state_serialization() {
        assert_eq!(serde_json::to_string(&EnablementState::Static).unwrap(), "\"static\"");
        assert_eq!(serde_json::to_string(&RuntimeState::Inactive).unwrap(), "\"inactive\"");
    }
}
