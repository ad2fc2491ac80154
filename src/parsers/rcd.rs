//! SysV rc.d runlevel links
//!
//! `/etc/rc2.d/S20apache2` starts apache2 in runlevel 2, `K01foo` stops foo.
//! Anything else in the directory (README, .placeholder) is ignored.

use crate::facts::{EnablementMap, EnablementState, ServiceKey};

/// Service name and state encoded in one link name
pub fn classify_link(file_name: &str) -> Option<(&str, EnablementState)> {
    let mut chars = file_name.chars();
    let state = match chars.next()? {
        'S' => EnablementState::Enabled,
        'K' => EnablementState::Disabled,
        _ => return None,
    };

    let rest = chars.as_str();
    let name = rest.trim_start_matches(|c: char| c.is_ascii_digit());
    if name.len() == rest.len() || name.is_empty() {
        return None;
    }
    Some((name, state))
}

/// Build enablement facts from the link names of one runlevel directory
pub fn parse_rc_links<'a, I>(names: I) -> EnablementMap
where
    I: IntoIterator<Item = &'a str>,
{
    let mut facts = EnablementMap::new();
    for name in names {
        match classify_link(name) {
            Some((service, state)) => facts.insert(ServiceKey::from_service(service), state),
            None => log::debug!("Ignoring rc.d entry {}", name),
        }
    }
    facts
}
