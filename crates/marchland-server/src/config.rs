//! Server configuration

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Server configuration, loadable from a YAML file.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the server
    pub bind_address: SocketAddr,
    /// Minimum players to start (2-4)
    pub min_players: u8,
    /// Maximum players allowed (2-4)
    pub max_players: u8,
    /// Grace period in seconds before a disconnected turn holder is
    /// passed over
    pub disconnect_grace_secs: u64,
    /// Room name shown in the lobby directory
    pub room_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:7777".parse().expect("valid default address"),
            min_players: 2,
            max_players: 4,
            disconnect_grace_secs: 60,
            room_name: "Marchland".to_string(),
        }
    }
}

/// Configuration load errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid player limits: min {min}, max {max} (allowed 2-4)")]
    InvalidPlayerLimits { min: u8, max: u8 },
}

impl ServerConfig {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let ok = (2..=4).contains(&self.min_players)
            && (2..=4).contains(&self.max_players)
            && self.min_players <= self.max_players;
        if ok {
            Ok(())
        } else {
            Err(ConfigError::InvalidPlayerLimits {
                min: self.min_players,
                max: self.max_players,
            })
        }
    }

    pub fn disconnect_grace(&self) -> Duration {
        Duration::from_secs(self.disconnect_grace_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = ServerConfig::default();
        assert_eq!(config.min_players, 2);
        assert_eq!(config.max_players, 4);
        assert_eq!(config.disconnect_grace(), Duration::from_secs(60));
        assert_eq!(config.bind_address.port(), 7777);
    }

    #[test]
    fn partial_yaml_overrides_defaults() {
        let yaml = "max_players: 3\nroom_name: Frontier\n";
        let config: ServerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.max_players, 3);
        assert_eq!(config.room_name, "Frontier");
        // Untouched fields keep their defaults.
        assert_eq!(config.min_players, 2);
        assert_eq!(config.disconnect_grace_secs, 60);
    }

    #[test]
    fn file_roundtrip() {
        let path = std::env::temp_dir().join("marchland-config-test.yaml");
        std::fs::write(&path, "bind_address: \"127.0.0.1:9000\"\nmin_players: 2\n").unwrap();

        let config = ServerConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.bind_address.port(), 9000);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn bad_player_limits_rejected() {
        let path = std::env::temp_dir().join("marchland-config-bad.yaml");
        std::fs::write(&path, "max_players: 9\n").unwrap();

        let err = ServerConfig::from_yaml_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPlayerLimits { .. }));

        std::fs::remove_file(&path).ok();
    }
}
