//! Host profile detection
//!
//! Reads the distribution release files once and reduces them to the three
//! facts every source's applicability check needs: family, major version and
//! codename.
//!
//! Release file formats:
//! ```text
//! /etc/os-release       ID=ubuntu  VERSION_ID="16.04"  VERSION_CODENAME=xenial
//! /etc/lsb-release      DISTRIB_ID=Ubuntu  DISTRIB_RELEASE=14.04  DISTRIB_CODENAME=trusty
//! /etc/redhat-release   CentOS release 6.10 (Final)
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::Serialize;

/// Distribution families with a known init-system history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    DebianUbuntu,
    RhelCentos,
    Unknown,
}

impl Family {
    fn from_id(id: &str) -> Self {
        let id = id.trim().to_lowercase();
        if id.starts_with("ubuntu") || id.starts_with("debian") {
            Self::DebianUbuntu
        } else if id.starts_with("centos")
            || id.starts_with("rhel")
            || id.starts_with("redhat")
            || id.starts_with("red hat")
        {
            Self::RhelCentos
        } else {
            Self::Unknown
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DebianUbuntu => write!(f, "debian/ubuntu"),
            Self::RhelCentos => write!(f, "rhel/centos"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Debian-family codenames that boot with systemd by default
const SYSTEMD_CODENAMES: &[&str] = &[
    // Ubuntu 15.04 onward
    "vivid", "wily", "xenial", "yakkety", "zesty", "artful", "bionic", "cosmic",
    "disco", "eoan", "focal", "groovy", "hirsute", "impish", "jammy", "kinetic",
    "lunar", "mantic", "noble", "oracular", "plucky", "questing",
    // Debian 8 onward
    "jessie", "stretch", "buster", "bullseye", "bookworm", "trixie", "forky",
];

/// Debian-family codenames that predate systemd
const LEGACY_CODENAMES: &[&str] = &[
    // Ubuntu 8.04 to 14.10
    "hardy", "intrepid", "jaunty", "karmic", "lucid", "maverick", "natty",
    "oneiric", "precise", "quantal", "raring", "saucy", "trusty", "utopic",
    // Debian 5 to 7
    "lenny", "squeeze", "wheezy",
];

/// Lowest Debian-family major version assumed to run systemd when the
/// codename is not recognized. Debian 8 is the first; Ubuntu releases
/// numbered 8 or above that predate systemd are in `LEGACY_CODENAMES`.
const SYSTEMD_MIN_DEBIAN_MAJOR: u32 = 8;

/// Immutable description of the host, computed once per run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostProfile {
    pub family: Family,
    pub major_version: String,
    pub codename: String,
}

impl Default for HostProfile {
    fn default() -> Self {
        Self::unknown()
    }
}

impl HostProfile {
    pub fn new(family: Family, major_version: &str, codename: &str) -> Self {
        Self {
            family,
            major_version: major_version.to_string(),
            codename: codename.to_lowercase(),
        }
    }

    /// Profile for which no source applies
    pub fn unknown() -> Self {
        Self::new(Family::Unknown, "", "")
    }

    /// Detect the profile from release files under `root`
    ///
    /// Never fails: unreadable or unrecognized release files yield
    /// `Family::Unknown`.
    pub fn detect(root: &Path) -> Self {
        let read = |rel: &str| std::fs::read_to_string(root.join(rel)).ok();

        if let Some(profile) = read("etc/os-release").and_then(|c| Self::from_os_release(&c)) {
            log::debug!("Host profile from os-release: {:?}", profile);
            return profile;
        }
        if let Some(profile) = read("etc/lsb-release").and_then(|c| Self::from_lsb_release(&c)) {
            log::debug!("Host profile from lsb-release: {:?}", profile);
            return profile;
        }
        for rel in ["etc/redhat-release", "etc/centos-release"] {
            if let Some(profile) = read(rel).and_then(|c| Self::from_redhat_release(&c)) {
                log::debug!("Host profile from {}: {:?}", rel, profile);
                return profile;
            }
        }

        log::debug!("No recognizable release file under {}", root.display());
        Self::unknown()
    }

    /// Parse `/etc/os-release` content
    pub fn from_os_release(content: &str) -> Option<Self> {
        let vars = parse_shell_vars(content);
        let id = vars.get("ID")?;

        let mut family = Family::from_id(id);
        if family == Family::Unknown {
            if let Some(like) = vars.get("ID_LIKE") {
                family = like
                    .split_whitespace()
                    .map(Family::from_id)
                    .find(|f| *f != Family::Unknown)
                    .unwrap_or(Family::Unknown);
            }
        }

        let version = vars.get("VERSION_ID").map(String::as_str).unwrap_or("");
        let codename = vars
            .get("VERSION_CODENAME")
            .or_else(|| vars.get("UBUNTU_CODENAME"))
            .map(String::as_str)
            .filter(|c| !c.is_empty())
            .or_else(|| vars.get("VERSION").and_then(|v| codename_in_version(v)))
            .unwrap_or("");

        Some(Self::new(family, major_of(version), codename))
    }

    /// Parse `/etc/lsb-release` content
    pub fn from_lsb_release(content: &str) -> Option<Self> {
        let vars = parse_shell_vars(content);
        let id = vars.get("DISTRIB_ID")?;
        let version = vars.get("DISTRIB_RELEASE").map(String::as_str).unwrap_or("");
        let codename = vars.get("DISTRIB_CODENAME").map(String::as_str).unwrap_or("");
        Some(Self::new(Family::from_id(id), major_of(version), codename))
    }

    /// Parse free-text `/etc/redhat-release` content
    ///
    /// `CentOS Linux release 7.9.2009 (Core)` -> rhel/centos, "7", "core"
    pub fn from_redhat_release(content: &str) -> Option<Self> {
        let line = content.lines().map(str::trim).find(|l| !l.is_empty())?;

        let version = line
            .split_whitespace()
            .find(|w| w.chars().next().is_some_and(|c| c.is_ascii_digit()))
            .unwrap_or("");

        let codename = line
            .rsplit_once('(')
            .and_then(|(_, rest)| rest.split_once(')'))
            .map(|(name, _)| name.trim())
            .unwrap_or("");

        Some(Self::new(Family::from_id(line), major_of(version), codename))
    }

    /// Major version as a number, for ordered comparisons
    pub fn major(&self) -> Option<u32> {
        self.major_version.parse().ok()
    }

    pub fn is_debian(&self) -> bool {
        self.family == Family::DebianUbuntu
    }

    pub fn is_rhel(&self) -> bool {
        self.family == Family::RhelCentos
    }

    /// RHEL family at exactly `major`
    pub fn is_rhel_major(&self, major: u32) -> bool {
        self.is_rhel() && self.major() == Some(major)
    }

    /// RHEL family at `major` or later
    pub fn is_rhel_at_least(&self, major: u32) -> bool {
        self.is_rhel() && self.major().is_some_and(|m| m >= major)
    }

    /// Whether systemd is the authoritative init system
    pub fn uses_systemd(&self) -> bool {
        if self.is_debian() {
            let codename = self.codename.as_str();
            if SYSTEMD_CODENAMES.contains(&codename) {
                return true;
            }
            if LEGACY_CODENAMES.contains(&codename) {
                return false;
            }
            return self.major().is_some_and(|m| m >= SYSTEMD_MIN_DEBIAN_MAJOR);
        }
        self.is_rhel_at_least(7)
    }
}

impl fmt::Display for HostProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let version = if self.major_version.is_empty() { "?" } else { &self.major_version };
        let codename = if self.codename.is_empty() { "-" } else { &self.codename };
        write!(f, "{} {} ({})", self.family, version, codename)
    }
}

/// Codename embedded in an os-release `VERSION` string
///
/// `8 (jessie)` -> `jessie`, `16.04.7 LTS (Xenial Xerus)` -> `Xenial`,
/// `14.04.6 LTS, Trusty Tahr` -> `Trusty`
fn codename_in_version(version: &str) -> Option<&str> {
    let tail = match version.split_once('(') {
        Some((_, rest)) => rest.split(')').next().unwrap_or(""),
        None => version.split_once(',')?.1,
    };
    tail.split_whitespace().next()
}

fn major_of(version: &str) -> &str {
    version.split('.').next().unwrap_or("").trim()
}

/// Parse `KEY=value` / `KEY="value"` lines
fn parse_shell_vars(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .filter_map(|l| l.split_once('='))
        .map(|(k, v)| {
            let v = v.trim().trim_matches('"').trim_matches('\'');
            (k.trim().to_string(), v.to_string())
        })
        .collect()
}
