//! DRC compiler configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Options controlling how DRC styles are compiled.
///
/// ```toml
/// rule_optimization = true
/// fallback_step_size = 64
/// output_scale_factor = 10
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrcConfig {
    /// Whether redundant and illegal-edge rules are pruned after compilation.
    pub rule_optimization: bool,
    /// The step size used when no rule has a nonzero distance.
    pub fallback_step_size: i32,
    /// The scale factor of the active output style, if any.
    ///
    /// When set, a style without rules gets a step size of `6400 / factor`.
    pub output_scale_factor: Option<i32>,
    /// Explicit step sizes below this value produce a warning.
    pub small_step_size_warning: i32,
    /// Compile every populated plane pair of a multiplane spacing rule
    /// instead of only the first.
    pub spacing_all_plane_pairs: bool,
}

impl Default for DrcConfig {
    fn default() -> Self {
        Self {
            rule_optimization: true,
            fallback_step_size: 64,
            output_scale_factor: None,
            small_step_size_warning: 16,
            spacing_all_plane_pairs: false,
        }
    }
}

impl DrcConfig {
    /// Parses a configuration from TOML. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    /// The step size for a style whose halo is zero.
    pub(crate) fn empty_step_size(&self) -> i32 {
        match self.output_scale_factor {
            Some(factor) if factor > 0 => 6400 / factor,
            _ => self.fallback_step_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_uses_defaults() {
        let config = DrcConfig::from_toml_str("rule_optimization = false").unwrap();
        assert!(!config.rule_optimization);
        assert_eq!(config.fallback_step_size, 64);
        assert_eq!(config.empty_step_size(), 64);

        let config = DrcConfig::from_toml_str("output_scale_factor = 10").unwrap();
        assert_eq!(config.empty_step_size(), 640);
        assert!(DrcConfig::from_toml_str("rule_optimization = 3").is_err());
    }
}
