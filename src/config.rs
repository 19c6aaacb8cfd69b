use anyhow::{Context, Result, bail};
use clap::Parser;
use std::{env, str::FromStr};

const ENV_PREFIX: &str = "UPLOAD_SERVICE_";

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound for a whole request body, multipart framing included.
    pub body_limit: usize,
    /// Largest accepted `/file/image` upload, in bytes (inclusive).
    pub image_max_size: u64,
    /// Number of parts `/file/images` accepts per request.
    pub max_images: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            body_limit: 2 * 1024 * 1024,
            image_max_size: 1000,
            max_images: 4,
        }
    }
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "File upload validation and echo service")]
pub struct Args {
    /// Host to bind to (overrides UPLOAD_SERVICE_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides UPLOAD_SERVICE_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Maximum request body size in bytes (overrides UPLOAD_SERVICE_BODY_LIMIT)
    #[arg(long)]
    pub body_limit: Option<usize>,

    /// Maximum image size in bytes (overrides UPLOAD_SERVICE_IMAGE_MAX_SIZE)
    #[arg(long)]
    pub image_max_size: Option<u64>,

    /// Maximum images per request (overrides UPLOAD_SERVICE_MAX_IMAGES)
    #[arg(long)]
    pub max_images: Option<usize>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        Self::resolve(Args::parse(), |key| env::var(key).ok())
    }

    /// Merge CLI args over values produced by `lookup`, falling back to defaults.
    pub fn resolve(args: Args, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let cfg = Self {
            host: args
                .host
                .or_else(|| lookup(&format!("{ENV_PREFIX}HOST")))
                .unwrap_or(defaults.host),
            port: pick(args.port, &lookup, "PORT", defaults.port)?,
            body_limit: pick(args.body_limit, &lookup, "BODY_LIMIT", defaults.body_limit)?,
            image_max_size: pick(
                args.image_max_size,
                &lookup,
                "IMAGE_MAX_SIZE",
                defaults.image_max_size,
            )?,
            max_images: pick(args.max_images, &lookup, "MAX_IMAGES", defaults.max_images)?,
        };

        if cfg.body_limit == 0 {
            bail!("body limit must be greater than zero");
        }
        if cfg.max_images == 0 {
            bail!("max images must be greater than zero");
        }

        Ok(cfg)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn pick<T>(
    flag: Option<T>,
    lookup: &impl Fn(&str) -> Option<String>,
    suffix: &str,
    default: T,
) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    if let Some(value) = flag {
        return Ok(value);
    }

    let key = format!("{ENV_PREFIX}{suffix}");
    match lookup(&key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_flags_or_env() {
        let cfg = AppConfig::resolve(Args::default(), env_of(&[])).unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.addr(), "0.0.0.0:3000");
        assert_eq!(cfg.image_max_size, 1000);
        assert_eq!(cfg.max_images, 4);
    }

    #[test]
    fn env_overrides_defaults_and_flags_override_env() {
        let env = env_of(&[
            ("UPLOAD_SERVICE_HOST", "127.0.0.1"),
            ("UPLOAD_SERVICE_PORT", "8080"),
            ("UPLOAD_SERVICE_MAX_IMAGES", "2"),
        ]);
        let args = Args {
            port: Some(9000),
            ..Args::default()
        };

        let cfg = AppConfig::resolve(args, env).unwrap();
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.max_images, 2);
    }

    #[test]
    fn bad_env_value_names_the_variable() {
        let err = AppConfig::resolve(Args::default(), env_of(&[("UPLOAD_SERVICE_PORT", "http")]))
            .unwrap_err();
        assert!(err.to_string().contains("UPLOAD_SERVICE_PORT"));
    }

    #[test]
    fn zero_limits_are_rejected() {
        let args = Args {
            max_images: Some(0),
            ..Args::default()
        };
        assert!(AppConfig::resolve(args, env_of(&[])).is_err());

        let args = Args {
            body_limit: Some(0),
            ..Args::default()
        };
        assert!(AppConfig::resolve(args, env_of(&[])).is_err());
    }
}
