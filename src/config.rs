//! Configuration module - environment variable parsing

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::sim::SimConfig;

/// Peer configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Log filter (trace, debug, info, warn, error or an EnvFilter directive)
    pub log_level: String,
    /// Log destination; the terminal itself belongs to the game view
    pub log_file: PathBuf,
    /// Render/simulation frames per second
    pub fps: u32,
    /// Seconds before an unresolved projectile is reclaimed
    pub projectile_ttl: f32,
    /// Planar distance from the origin beyond which projectiles are reclaimed
    pub arena_radius: f32,
}

impl Default for Config {
    fn default() -> Self {
        let sim = SimConfig::default();
        Self {
            log_level: "info".to_string(),
            log_file: PathBuf::from("goliath.log"),
            fps: 60,
            projectile_ttl: sim.projectile_ttl,
            arena_radius: sim.arena_radius,
        }
    }
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let fps = parse_or(&lookup, "GOLIATH_FPS", defaults.fps)?;
        if !(1..=240).contains(&fps) {
            return Err(ConfigError::OutOfRange("GOLIATH_FPS"));
        }
        let projectile_ttl = parse_or(&lookup, "GOLIATH_PROJECTILE_TTL", defaults.projectile_ttl)?;
        if !projectile_ttl.is_finite() || projectile_ttl <= 0.0 {
            return Err(ConfigError::OutOfRange("GOLIATH_PROJECTILE_TTL"));
        }
        let arena_radius = parse_or(&lookup, "GOLIATH_ARENA_RADIUS", defaults.arena_radius)?;
        if !arena_radius.is_finite() || arena_radius <= 0.0 {
            return Err(ConfigError::OutOfRange("GOLIATH_ARENA_RADIUS"));
        }

        Ok(Self {
            log_level: lookup("GOLIATH_LOG").unwrap_or(defaults.log_level),
            log_file: lookup("GOLIATH_LOG_FILE").map(PathBuf::from).unwrap_or(defaults.log_file),
            fps,
            projectile_ttl,
            arena_radius,
        })
    }

    pub fn sim(&self) -> SimConfig {
        SimConfig {
            projectile_ttl: self.projectile_ttl,
            arena_radius: self.arena_radius,
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Environment variable out of range: {0}")]
    OutOfRange(&'static str),
}
