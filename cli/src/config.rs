//! Server configuration from `SLIDEGEN_*` environment variables.

use serde::Deserialize;
use slidegen::RetentionPolicy;
use std::path::PathBuf;

pub const ENV_PREFIX: &str = "SLIDEGEN_";

#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct Config {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Directory holding `light.pptx`, `normal.pptx` and `dark.pptx`.
    #[serde(default = "default_template_dir")]
    pub template_dir: PathBuf,

    /// Use the built-in frame for any style whose file is missing.
    #[serde(default = "default_true")]
    pub builtin_fallback: bool,

    #[serde(default)]
    pub retention: RetentionPolicy,

    /// Upper bound on `num_slides` accepted from the form.
    #[serde(default = "default_max_slides")]
    pub max_slides: i64,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("generated")
}

fn default_template_dir() -> PathBuf {
    PathBuf::from("frame")
}

fn default_true() -> bool {
    true
}

fn default_max_slides() -> i64 {
    100
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            output_dir: default_output_dir(),
            template_dir: default_template_dir(),
            builtin_fallback: true,
            retention: RetentionPolicy::default(),
            max_slides: default_max_slides(),
        }
    }
}

impl Config {
    /// Read `.env` if present, then the process environment.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::prefixed(ENV_PREFIX).from_iter(vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(vars(&[("PATH", "/usr/bin")])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.retention, RetentionPolicy::DeleteAfterSend);
        assert_eq!(config.max_slides, 100);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_vars(vars(&[
            ("SLIDEGEN_BIND", "0.0.0.0:9000"),
            ("SLIDEGEN_OUTPUT_DIR", "/tmp/decks"),
            ("SLIDEGEN_BUILTIN_FALLBACK", "false"),
            ("SLIDEGEN_RETENTION", "max-age=600"),
            ("SLIDEGEN_MAX_SLIDES", "12"),
        ]))
        .unwrap();

        assert_eq!(config.bind, "0.0.0.0:9000");
        assert_eq!(config.output_dir, PathBuf::from("/tmp/decks"));
        assert!(!config.builtin_fallback);
        assert_eq!(
            config.retention,
            RetentionPolicy::MaxAge(Duration::from_secs(600))
        );
        assert_eq!(config.max_slides, 12);
    }

    #[test]
    fn test_invalid_value() {
        assert!(Config::from_vars(vars(&[("SLIDEGEN_MAX_SLIDES", "many")])).is_err());
        assert!(Config::from_vars(vars(&[("SLIDEGEN_RETENTION", "sometimes")])).is_err());
    }
}
