//! Engine configuration.

use std::fmt;

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Invalid maximum sequence length (must be > 0).
    InvalidMaxSequenceLen(usize),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidMaxSequenceLen(n) => {
                write!(f, "Invalid max sequence length: {} (must be > 0)", n)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Configuration for one engine context.
///
/// Registration-time state, read-mostly afterwards. There is no global
/// configuration: every resolution call reaches this through the context
/// that owns it.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Inclusive upper bound on the length of Random-kind sequences.
    /// Primary and Secondary sequences always have length exactly 1.
    pub max_sequence_len: usize,
    /// Prefer applying an attribute through its post-construction mutator
    /// when it is also a creation-strategy input.
    pub prefer_mutators: bool,
    /// Seed for the engine's RNG; `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_sequence_len: 8,
            prefer_mutators: true,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Create a configuration with validation.
    pub fn new(
        max_sequence_len: usize,
        prefer_mutators: bool,
        seed: Option<u64>,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            max_sequence_len,
            prefer_mutators,
            seed,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_sequence_len == 0 {
            return Err(ConfigError::InvalidMaxSequenceLen(self.max_sequence_len));
        }
        Ok(())
    }

    /// Return a copy with a fixed seed, for reproducible Random values.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.max_sequence_len, 8);
        assert!(config.prefer_mutators);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let config = EngineConfig::new(4, false, Some(7));
        assert!(config.is_ok());

        let config = EngineConfig::new(0, true, None);
        assert!(matches!(
            config,
            Err(ConfigError::InvalidMaxSequenceLen(0))
        ));
    }

    #[test]
    fn test_with_seed() {
        let config = EngineConfig::default().with_seed(42);
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn test_config_error_display() {
        let error = ConfigError::InvalidMaxSequenceLen(0);
        assert_eq!(
            format!("{}", error),
            "Invalid max sequence length: 0 (must be > 0)"
        );
    }
}
