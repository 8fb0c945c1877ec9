use serde::Deserialize;
use std::path::PathBuf;

// =============================================================================
// Time-related constants
// =============================================================================

/// Default TTL for the shared cache tier, in seconds (1 hour)
pub const DEFAULT_SHARED_CACHE_TTL_SECS: u64 = 3600;

/// Gate configuration structure
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct GateConfig {
    pub cache: CacheConfig,
    pub database: DatabaseConfig,
}

/// Cache-related configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    /// Shared-tier TTL in seconds
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_SHARED_CACHE_TTL_SECS,
        }
    }
}

/// Policy database configuration
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct DatabaseConfig {
    /// Policy database path; `None` falls back to the user data directory
    pub path: Option<PathBuf>,
}

/// Returns the path to the data directory for version-gate.
/// Uses $XDG_DATA_HOME/version-gate if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/version-gate,
/// or ./version-gate if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the default path to the policy database file.
pub fn db_path() -> PathBuf {
    data_dir().join("policy.db")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("version-gate")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn gate_config_from_partial_object_uses_defaults_for_missing_fields() {
        let result = serde_json::from_value::<GateConfig>(json!({
            "cache": {
                "ttlSecs": 60
            }
        }))
        .unwrap();

        assert_eq!(result.cache.ttl_secs, 60);
        assert_eq!(result.database, DatabaseConfig::default());
    }

    #[test]
    fn gate_config_from_full_object_parses_all_fields() {
        let result = serde_json::from_value::<GateConfig>(json!({
            "cache": {
                "ttlSecs": 120
            },
            "database": {
                "path": "/var/lib/version-gate/policy.db"
            }
        }))
        .unwrap();

        assert_eq!(
            result,
            GateConfig {
                cache: CacheConfig { ttl_secs: 120 },
                database: DatabaseConfig {
                    path: Some(PathBuf::from("/var/lib/version-gate/policy.db")),
                },
            }
        );
    }

    #[test]
    fn data_dir_with_env_uses_xdg_data_home_when_set() {
        let path = data_dir_with_env(
            Some("/tmp/test-data".to_string()),
            Some(PathBuf::from("/home/user")),
        );

        assert_eq!(path, PathBuf::from("/tmp/test-data/version-gate"));
    }

    #[test]
    fn data_dir_with_env_falls_back_to_home_local_share() {
        let path = data_dir_with_env(None, Some(PathBuf::from("/home/user")));

        assert_eq!(path, PathBuf::from("/home/user/.local/share/version-gate"));
    }

    #[test]
    fn data_dir_with_env_falls_back_to_current_dir_when_no_dirs_available() {
        let path = data_dir_with_env(None, None);
        assert_eq!(path, PathBuf::from("./version-gate"));
    }
}
