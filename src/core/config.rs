//! Configuration management for the blackwall network
//!
//! This module handles layout, build, propagation and logging settings with
//! the reference defaults of the visualization.

use crate::core::error::{Error, Result};
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Default configuration file looked up by [`Config::load`]
pub const DEFAULT_CONFIG_FILE: &str = "neural-blackwall.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Spatial layout of the network
    pub layout: LayoutConfig,

    /// Graph construction
    pub build: BuildConfig,

    /// Infection propagation timing
    pub propagation: PropagationConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// How a generated node picks its cluster anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterPolicy {
    /// `layer % cluster_count`
    ByLayer,
    /// Uniformly random cluster per node
    Random,
}

/// Spatial layout configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Radius of the network in world units
    pub network_radius: f64,

    /// Number of cluster anchors
    pub cluster_count: usize,

    /// Anchor sphere radius as a fraction of the network radius
    pub cluster_radius_factor: f64,

    /// Inner edge of a node's offset shell around its anchor
    pub inner_factor: f64,

    /// Outer edge of a node's offset shell around its anchor
    pub outer_factor: f64,

    /// Cluster assignment policy
    pub cluster_policy: ClusterPolicy,

    /// Spatial grid cell edge length
    pub cell_size: f64,

    /// Number of base palette tokens nodes draw from
    pub palette_size: u8,
}

/// Graph construction configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Chance that a grid neighbor pair gets a synthetic edge
    pub synthetic_edge_probability: f64,

    /// RNG seed (None = seeded from the OS)
    pub seed: Option<u64>,
}

/// Propagation timing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PropagationConfig {
    /// Interval between wave steps
    #[serde(deserialize_with = "deserialize_duration")]
    pub step_interval: Duration,

    /// Consecutive steps spent on each wave
    pub steps_per_wave: u32,

    /// Delay between activations within one step
    #[serde(deserialize_with = "deserialize_duration")]
    pub activation_stagger: Duration,

    /// Maximum activations scheduled per wave step
    pub max_activations_per_wave: usize,

    /// Total travel time of the infectious orb
    #[serde(deserialize_with = "deserialize_duration")]
    pub orb_duration: Duration,

    /// Distance within which the orb infects a node
    pub orb_infection_radius: f64,

    /// Orb start distance along +z as a fraction of the network radius
    pub orb_start_factor: f64,

    /// Orb destination
    pub orb_target: [f64; 3],
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            network_radius: 1500.0,
            cluster_count: 40,
            cluster_radius_factor: 0.9,
            inner_factor: 0.3,
            outer_factor: 1.0,
            cluster_policy: ClusterPolicy::ByLayer,
            cell_size: 300.0,
            palette_size: 6,
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            synthetic_edge_probability: 0.05,
            seed: None,
        }
    }
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            step_interval: Duration::from_millis(100),
            steps_per_wave: 8,
            activation_stagger: Duration::from_millis(50),
            max_activations_per_wave: 100,
            orb_duration: Duration::from_millis(8000),
            orb_infection_radius: 80.0,
            orb_start_factor: 1.8,
            orb_target: [0.0, 0.0, 0.0],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl PropagationConfig {
    /// Time between the starts of two consecutive waves
    pub fn wave_interval(&self) -> Duration {
        self.step_interval * self.steps_per_wave
    }
}

impl Config {
    /// Load configuration from the default file (if present) and environment
    pub fn load() -> Result<Self> {
        let mut config = if Path::new(DEFAULT_CONFIG_FILE).exists() {
            Self::from_file(DEFAULT_CONFIG_FILE)?
        } else {
            Config::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| Error::config(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        use std::env;

        if let Ok(radius) = env::var("NB_NETWORK_RADIUS") {
            self.layout.network_radius = radius.parse()
                .map_err(|e| Error::config(format!("Invalid network radius: {}", e)))?;
        }

        if let Ok(policy) = env::var("NB_CLUSTER_POLICY") {
            self.layout.cluster_policy = parse_cluster_policy(&policy)?;
        }

        if let Ok(p) = env::var("NB_SYNTHETIC_PROBABILITY") {
            self.build.synthetic_edge_probability = p.parse()
                .map_err(|e| Error::config(format!("Invalid synthetic edge probability: {}", e)))?;
        }

        if let Ok(seed) = env::var("NB_SEED") {
            self.build.seed = Some(seed.parse()
                .map_err(|e| Error::config(format!("Invalid seed: {}", e)))?);
        }

        if let Ok(level) = env::var("NB_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(format) = env::var("NB_LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let layout = &self.layout;
        if !layout.network_radius.is_finite() || layout.network_radius <= 0.0 {
            return Err(Error::config("Network radius must be positive"));
        }
        if layout.cluster_count == 0 {
            return Err(Error::config("Cluster count must be at least 1"));
        }
        if !layout.cell_size.is_finite() || layout.cell_size <= 0.0 {
            return Err(Error::config("Cell size must be positive"));
        }
        if !layout.cluster_radius_factor.is_finite() || layout.cluster_radius_factor < 0.0 {
            return Err(Error::config("Cluster radius factor must be finite and not negative"));
        }
        if !layout.inner_factor.is_finite() || !layout.outer_factor.is_finite() {
            return Err(Error::config("Offset shell factors must be finite"));
        }
        if layout.inner_factor < 0.0 || layout.outer_factor < layout.inner_factor {
            return Err(Error::config("Offset shell must satisfy 0 <= inner_factor <= outer_factor"));
        }
        if layout.palette_size == 0 {
            return Err(Error::config("Palette must have at least one token"));
        }

        if !(0.0..=1.0).contains(&self.build.synthetic_edge_probability) {
            return Err(Error::config("Synthetic edge probability must be within [0, 1]"));
        }

        let propagation = &self.propagation;
        if propagation.steps_per_wave == 0 {
            return Err(Error::config("Steps per wave must be at least 1"));
        }
        if propagation.step_interval.is_zero() {
            return Err(Error::config("Step interval must be non-zero"));
        }
        if propagation.orb_duration.is_zero() {
            return Err(Error::config("Orb duration must be non-zero"));
        }
        if !propagation.orb_infection_radius.is_finite() || propagation.orb_infection_radius < 0.0 {
            return Err(Error::config("Orb infection radius must be finite and not negative"));
        }
        if !propagation.orb_start_factor.is_finite() || propagation.orb_target.iter().any(|v| !v.is_finite()) {
            return Err(Error::config("Orb start and target must be finite"));
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => return Err(Error::config("Invalid log level")),
        }
        match self.logging.format.as_str() {
            "pretty" | "json" => {}
            _ => return Err(Error::config("Invalid log format")),
        }

        Ok(())
    }
}

/// Parse a cluster policy name as used on the command line and in env vars
pub fn parse_cluster_policy(name: &str) -> Result<ClusterPolicy> {
    match name {
        "by_layer" | "layer" => Ok(ClusterPolicy::ByLayer),
        "random" => Ok(ClusterPolicy::Random),
        other => Err(Error::config(format!(
            "Invalid cluster policy: {}. Valid options: by_layer, random",
            other
        ))),
    }
}

// Custom deserializer for Duration from string
fn deserialize_duration<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct DurationVisitor;

    impl<'de> Visitor<'de> for DurationVisitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a duration string like '100ms' or '8s'")
        }

        fn visit_str<E>(self, value: &str) -> std::result::Result<Duration, E>
        where
            E: de::Error,
        {
            parse_duration(value).map_err(E::custom)
        }
    }

    deserializer.deserialize_str(DurationVisitor)
}

// Simple duration parser for common formats
fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    if let Some(ms) = s.strip_suffix("ms") {
        let ms: u64 = ms.parse().map_err(|_| "Invalid milliseconds")?;
        Ok(Duration::from_millis(ms))
    } else if let Some(secs) = s.strip_suffix('s') {
        let secs: u64 = secs.parse().map_err(|_| "Invalid seconds")?;
        Ok(Duration::from_secs(secs))
    } else if let Some(mins) = s.strip_suffix('m') {
        let mins: u64 = mins.parse().map_err(|_| "Invalid minutes")?;
        Ok(Duration::from_secs(mins * 60))
    } else {
        // Raw numbers are milliseconds, matching timer conventions
        let ms: u64 = s.parse().map_err(|_| "Invalid duration format")?;
        Ok(Duration::from_millis(ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.propagation.wave_interval(), Duration::from_millis(800));
        assert_eq!(config.layout.cluster_policy, ClusterPolicy::ByLayer);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [layout]
            network_radius = 4000.0
            cluster_policy = "random"

            [propagation]
            step_interval = "250ms"
            orb_duration = "2s"
            "#,
        )
        .unwrap();

        assert_eq!(config.layout.network_radius, 4000.0);
        assert_eq!(config.layout.cluster_policy, ClusterPolicy::Random);
        assert_eq!(config.layout.cell_size, 300.0);
        assert_eq!(config.propagation.step_interval, Duration::from_millis(250));
        assert_eq!(config.propagation.orb_duration, Duration::from_secs(2));
        assert_eq!(config.propagation.steps_per_wave, 8);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let result = Config::from_toml_str("[build]\nsynthetic_edge_probability = 1.5\n");
        assert!(matches!(result, Err(Error::Config(_))));

        let result = Config::from_toml_str("[layout]\ncluster_count = 0\n");
        assert!(matches!(result, Err(Error::Config(_))));

        let result = Config::from_toml_str("[logging]\nlevel = \"loud\"\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_non_finite_values_rejected() {
        let setters: [fn(&mut Config); 6] = [
            |c| c.layout.inner_factor = f64::NAN,
            |c| c.layout.outer_factor = f64::NAN,
            |c| c.layout.cluster_radius_factor = f64::NAN,
            |c| c.layout.network_radius = f64::INFINITY,
            |c| c.propagation.orb_infection_radius = f64::NAN,
            |c| c.propagation.orb_target = [0.0, f64::NAN, 0.0],
        ];
        for set in setters {
            let mut config = Config::default();
            set(&mut config);
            assert!(matches!(config.validate(), Err(Error::Config(_))));
        }
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[build]\nseed = 42\nsynthetic_edge_probability = 0.0").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.build.seed, Some(42));
        assert_eq!(config.build.synthetic_edge_probability, 0.0);
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("50ms"), Ok(Duration::from_millis(50)));
        assert_eq!(parse_duration("8s"), Ok(Duration::from_secs(8)));
        assert_eq!(parse_duration("1m"), Ok(Duration::from_secs(60)));
        assert_eq!(parse_duration("100"), Ok(Duration::from_millis(100)));
        assert!(parse_duration("soon").is_err());
    }

    #[test]
    fn test_parse_cluster_policy() {
        assert_eq!(parse_cluster_policy("by_layer").unwrap(), ClusterPolicy::ByLayer);
        assert_eq!(parse_cluster_policy("random").unwrap(), ClusterPolicy::Random);
        assert!(parse_cluster_policy("nearest").is_err());
    }
}
