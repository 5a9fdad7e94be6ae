//! Configuration for the composition engine.

use serde::{Deserialize, Serialize};

/// Default absolute tolerance for envelope equality, in CRS units.
pub const DEFAULT_ENVELOPE_TOLERANCE: f64 = 1e-10;

/// How much geometric disagreement between sources a session tolerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ToleranceMode {
    /// Envelope or grid-range disagreement aborts session construction.
    Strict,
    /// Disagreeing sources are reconciled via the composition policies.
    #[default]
    Lenient,
}

impl ToleranceMode {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "strict" => Self::Strict,
            _ => Self::Lenient,
        }
    }

    /// Get the mode name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Lenient => "lenient",
        }
    }
}

impl std::fmt::Display for ToleranceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Session-level configuration, fixed at open time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositionConfig {
    /// Tolerance mode for the consistency check.
    pub tolerance_mode: ToleranceMode,

    /// Whether a source that returns no data may be replaced by a
    /// constant-filled stand-in.
    pub fill_missing: bool,

    /// Absolute tolerance for envelope equality, in CRS units.
    pub envelope_tolerance: f64,
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            tolerance_mode: ToleranceMode::Lenient,
            fill_missing: true,
            envelope_tolerance: DEFAULT_ENVELOPE_TOLERANCE,
        }
    }
}

impl CompositionConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("COMPOSITION_TOLERANCE_MODE") {
            config.tolerance_mode = ToleranceMode::from_str(&val);
        }

        if let Ok(val) = std::env::var("COMPOSITION_FILL_MISSING") {
            config.fill_missing = val.to_lowercase() == "true" || val == "1";
        }

        if let Ok(val) = std::env::var("COMPOSITION_ENVELOPE_TOLERANCE") {
            if let Ok(tol) = val.parse() {
                config.envelope_tolerance = tol;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.envelope_tolerance < 0.0 || !self.envelope_tolerance.is_finite() {
            return Err("envelope_tolerance must be finite and >= 0".to_string());
        }

        Ok(())
    }
}

/// Per-read options.
///
/// Every recognized option is an explicit field; there is no open-ended
/// hints map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadOptions {
    /// Output band indices to compose, in view order. `None` reads all.
    pub bands: Option<Vec<usize>>,
}

impl ReadOptions {
    /// Read every output band.
    pub fn all() -> Self {
        Self::default()
    }

    /// Read only the given output band indices.
    pub fn with_bands(bands: Vec<usize>) -> Self {
        Self { bands: Some(bands) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CompositionConfig::default();
        assert_eq!(config.tolerance_mode, ToleranceMode::Lenient);
        assert!(config.fill_missing);
        assert_eq!(config.envelope_tolerance, DEFAULT_ENVELOPE_TOLERANCE);
    }

    #[test]
    fn test_config_validation() {
        let mut config = CompositionConfig::default();
        assert!(config.validate().is_ok());

        config.envelope_tolerance = -1.0;
        assert!(config.validate().is_err());

        config.envelope_tolerance = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tolerance_mode_from_str() {
        assert_eq!(ToleranceMode::from_str("strict"), ToleranceMode::Strict);
        assert_eq!(ToleranceMode::from_str("STRICT"), ToleranceMode::Strict);
        assert_eq!(ToleranceMode::from_str("lenient"), ToleranceMode::Lenient);
        assert_eq!(ToleranceMode::from_str("anything"), ToleranceMode::Lenient);
    }
}
