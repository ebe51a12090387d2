//! Container configuration.
//!
//! A [`ContainerConfig`] is built in code, read from the environment, or (with
//! the `config` feature) parsed from JSON, and applied with
//! [`Container::with_config`](crate::Container::with_config).

use std::collections::HashMap;
use std::env;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::error::{DiError, DiResult};
use crate::internal::DEFAULT_MAX_DEPTH;

/// One attribute option or environment setting.
///
/// Mirrors the JSON data model so `attribute_options` can be read straight
/// from configuration text. Accessors fail with [`DiError::TypeMismatch`]
/// naming the Rust type that was asked for.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(untagged))]
pub enum ConfigValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<ConfigValue>),
    Map(HashMap<String, ConfigValue>),
}

impl ConfigValue {
    pub fn as_bool(&self) -> DiResult<bool> {
        match *self {
            ConfigValue::Boolean(flag) => Ok(flag),
            _ => Err(DiError::TypeMismatch("bool")),
        }
    }

    pub fn as_i64(&self) -> DiResult<i64> {
        match *self {
            ConfigValue::Integer(n) => Ok(n),
            _ => Err(DiError::TypeMismatch("i64")),
        }
    }

    /// Integers widen to `f64`.
    pub fn as_f64(&self) -> DiResult<f64> {
        match *self {
            ConfigValue::Float(x) => Ok(x),
            ConfigValue::Integer(n) => Ok(n as f64),
            _ => Err(DiError::TypeMismatch("f64")),
        }
    }

    pub fn as_string(&self) -> DiResult<&str> {
        match self {
            ConfigValue::String(text) => Ok(text),
            _ => Err(DiError::TypeMismatch("str")),
        }
    }

    pub fn as_list(&self) -> DiResult<&[ConfigValue]> {
        match self {
            ConfigValue::List(items) => Ok(items),
            _ => Err(DiError::TypeMismatch("list")),
        }
    }

    // Environment variables are untyped text: take the first reading that
    // parses, in the order integer, float, boolean.
    fn parse_env(raw: String) -> Self {
        if let Ok(n) = raw.parse() {
            return ConfigValue::Integer(n);
        }
        if let Ok(x) = raw.parse() {
            return ConfigValue::Float(x);
        }
        if let Ok(flag) = raw.parse() {
            return ConfigValue::Boolean(flag);
        }
        ConfigValue::String(raw)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Integer(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Boolean(value)
    }
}

/// Settings of one container.
///
/// # Examples
///
/// ```rust
/// use ferrous_construct::{Container, ContainerConfig, ConfigValue};
///
/// let config = ContainerConfig::builder()
///     .max_depth(64)
///     .attribute_option("strict", true)
///     .build();
/// let container = Container::with_config(config);
///
/// assert_eq!(container.config().max_depth, 64);
/// assert_eq!(container.attributes().option("strict"), Some(ConfigValue::Boolean(true)));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ContainerConfig {
    /// Deepest nesting of resolutions before [`DiError::DepthExceeded`]
    pub max_depth: usize,
    /// Install a [`TracingObserver`](crate::TracingObserver) on construction
    pub trace_resolution: bool,
    /// Options handed to the container's attribute resolver
    pub attribute_options: HashMap<String, ConfigValue>,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            trace_resolution: false,
            attribute_options: HashMap::new(),
        }
    }
}

impl ContainerConfig {
    pub fn builder() -> ContainerConfigBuilder {
        ContainerConfigBuilder::default()
    }

    /// Reads `{PREFIX}_MAX_DEPTH` and `{PREFIX}_TRACE_RESOLUTION` from the
    /// environment, keeping defaults for unset variables.
    pub fn from_env(prefix: &str) -> DiResult<Self> {
        let mut config = Self::default();
        let var = |name: &str| env::var(format!("{}_{}", prefix.to_uppercase(), name)).ok();

        if let Some(value) = var("MAX_DEPTH") {
            let depth = ConfigValue::parse_env(value).as_i64()?;
            config.max_depth = usize::try_from(depth)
                .map_err(|_| DiError::TypeMismatch("max_depth cannot be negative"))?;
        }
        if let Some(value) = var("TRACE_RESOLUTION") {
            config.trace_resolution = ConfigValue::parse_env(value).as_bool()?;
        }
        Ok(config)
    }

    /// Parses a JSON object; missing fields keep their defaults.
    ///
    /// ```rust
    /// use ferrous_construct::ContainerConfig;
    ///
    /// let config = ContainerConfig::from_json(r#"{ "max_depth": 16 }"#).unwrap();
    /// assert_eq!(config.max_depth, 16);
    /// assert!(!config.trace_resolution);
    /// ```
    #[cfg(feature = "config")]
    pub fn from_json(text: &str) -> DiResult<Self> {
        serde_json::from_str(text).map_err(|err| DiError::Config(err.to_string()))
    }
}

/// Fluent builder for [`ContainerConfig`].
#[derive(Debug, Default)]
pub struct ContainerConfigBuilder {
    config: ContainerConfig,
}

impl ContainerConfigBuilder {
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = depth;
        self
    }

    pub fn trace_resolution(mut self, enabled: bool) -> Self {
        self.config.trace_resolution = enabled;
        self
    }

    pub fn attribute_option(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.config.attribute_options.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> ContainerConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_reject_other_variants() {
        assert_eq!(ConfigValue::Integer(3).as_i64().unwrap(), 3);
        assert_eq!(ConfigValue::Integer(3).as_f64().unwrap(), 3.0);
        assert!(ConfigValue::from("x").as_bool().is_err());
        assert!(matches!(ConfigValue::Boolean(true).as_string(), Err(DiError::TypeMismatch("str"))));
        assert_eq!(ConfigValue::List(vec![ConfigValue::from(1i64)]).as_list().unwrap().len(), 1);
    }

    #[test]
    fn env_values_are_typed() {
        assert_eq!(ConfigValue::parse_env("12".into()), ConfigValue::Integer(12));
        assert_eq!(ConfigValue::parse_env("true".into()), ConfigValue::Boolean(true));
        assert_eq!(ConfigValue::parse_env("1.5".into()), ConfigValue::Float(1.5));
        assert_eq!(ConfigValue::parse_env("deep".into()), ConfigValue::from("deep"));
    }

    #[test]
    fn from_env_reads_prefixed_variables() {
        env::set_var("FCTEST_MAX_DEPTH", "32");
        env::set_var("FCTEST_TRACE_RESOLUTION", "true");
        let config = ContainerConfig::from_env("fctest").unwrap();
        assert_eq!(config.max_depth, 32);
        assert!(config.trace_resolution);

        env::set_var("FCTEST_BAD_MAX_DEPTH", "-1");
        assert!(ContainerConfig::from_env("fctest_bad").is_err());
    }

    #[cfg(feature = "config")]
    #[test]
    fn from_json_reads_attribute_options() {
        let config = ContainerConfig::from_json(
            r#"{ "trace_resolution": true, "attribute_options": { "mode": "strict", "level": 2 } }"#,
        )
        .unwrap();
        assert!(config.trace_resolution);
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.attribute_options["mode"], ConfigValue::from("strict"));
        assert_eq!(config.attribute_options["level"], ConfigValue::Integer(2));
        assert!(matches!(ContainerConfig::from_json("[1"), Err(DiError::Config(_))));
    }
}
