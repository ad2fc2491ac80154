//! Collection settings

use std::path::PathBuf;
use std::time::Duration;

/// Default bound on any single external command
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Runlevel whose rc.d directory is scanned by default
pub const DEFAULT_RUNLEVEL: u8 = 2;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Command timeout must be greater than zero")]
    ZeroTimeout,

    #[error("Runlevel {0} out of range (0-6)")]
    Runlevel(u8),

    #[error("Filesystem root {0} is not a directory")]
    Root(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Filesystem root for release files, rc.d links and Upstart jobs
    pub root: PathBuf,
    /// Upper bound on each external command
    pub command_timeout: Duration,
    /// rc.d runlevel directory to scan (`/etc/rc<N>.d`)
    pub runlevel: u8,
    /// Wrapper for commands that need root on legacy hosts
    pub elevate: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/"),
            command_timeout: DEFAULT_TIMEOUT,
            runlevel: DEFAULT_RUNLEVEL,
            elevate: vec!["sudo".to_string()],
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.command_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.runlevel > 6 {
            return Err(ConfigError::Runlevel(self.runlevel));
        }
        if !self.root.is_dir() {
            return Err(ConfigError::Root(self.root.clone()));
        }
        Ok(())
    }

    /// Escalation prefix to use now; empty when already running as root
    pub fn elevation(&self) -> &[String] {
        if nix::unistd::geteuid().is_root() {
            &[]
        } else {
            &self.elevate
        }
    }

    /// rc.d directory for the configured runlevel
    pub fn rc_dir(&self) -> PathBuf {
        self.root.join(format!("etc/rc{}.d", self.runlevel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rc_dir(), PathBuf::from("/etc/rc2.d"));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let config = Config {
            command_timeout: Duration::ZERO,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroTimeout)));
    }

    #[test]
    fn test_rejects_bad_runlevel() {
        let config = Config {
            runlevel: 7,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Runlevel(7))));
    }

    #[test]
    fn test_rejects_missing_root() {
        let config = Config {
            root: PathBuf::from("/nonexistent-service-facts-root"),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Root(_))));
    }
}
