use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Optional `agile/config.yaml`. Every field has a default, so a missing file
/// and an empty file behave the same.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Minimum number of BDD scenarios before discovery can complete.
    #[serde(default = "default_min_scenarios")]
    pub min_scenarios: usize,
    /// Whole-word tokens treated as unfilled, on top of `[Bracket prompts]`
    /// and `{{mustache}}` markers.
    #[serde(default = "default_placeholder_tokens")]
    pub placeholder_tokens: Vec<String>,
    /// Owner values that count as "not assigned" (case-insensitive).
    #[serde(default = "default_owner_placeholders")]
    pub owner_placeholders: Vec<String>,
    /// How long a writer waits for the per-issue lock.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_min_scenarios() -> usize {
    2
}

fn default_placeholder_tokens() -> Vec<String> {
    vec!["TBD".to_string()]
}

fn default_owner_placeholders() -> Vec<String> {
    ["unassigned", "tbd", "none"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_lock_timeout_ms() -> u64 {
    5000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_scenarios: default_min_scenarios(),
            placeholder_tokens: default_placeholder_tokens(),
            owner_placeholders: default_owner_placeholders(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

impl Config {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// True when `owner` is empty, a bracket prompt, or a configured
    /// placeholder word.
    pub fn is_placeholder_owner(&self, owner: &str) -> bool {
        let owner = owner.trim();
        if owner.is_empty() || (owner.starts_with('[') && owner.ends_with(']')) {
            return true;
        }
        if owner.starts_with("{{") && owner.ends_with("}}") {
            return true;
        }
        self.owner_placeholders
            .iter()
            .any(|p| p.eq_ignore_ascii_case(owner))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.min_scenarios, 2);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("agile")).unwrap();
        std::fs::write(dir.path().join("agile/config.yaml"), "min_scenarios: 3\n").unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(cfg.min_scenarios, 3);
        assert_eq!(cfg.lock_timeout_ms, 5000);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("agile")).unwrap();
        std::fs::write(dir.path().join("agile/config.yaml"), "min_scenario: 3\n").unwrap();
        assert!(Config::load(dir.path()).is_err(), "typo should be rejected");
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let mut cfg = Config::default();
        cfg.placeholder_tokens.push("FIXME".to_string());
        cfg.save(dir.path()).unwrap();
        assert_eq!(Config::load(dir.path()).unwrap(), cfg);
    }

    #[test]
    fn placeholder_owners() {
        let cfg = Config::default();
        assert!(cfg.is_placeholder_owner(""));
        assert!(cfg.is_placeholder_owner("[Name]"));
        assert!(cfg.is_placeholder_owner("Unassigned"));
        assert!(cfg.is_placeholder_owner("{{owner}}"));
        assert!(!cfg.is_placeholder_owner("dana"));
    }
}
