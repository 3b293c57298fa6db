//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{FixedOffset, NaiveDate, NaiveTime};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use mt_cache::TtlPolicy;
use mt_core::PlantDayResolver;
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the timeline file.
    pub timeline_path: PathBuf,

    /// Local time at which a plant day starts.
    pub day_start: NaiveTime,

    /// Plant offset from UTC in minutes.
    pub utc_offset_minutes: i32,

    /// Last day whose summaries are final; every day before today when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_processed_day: Option<NaiveDate>,

    /// Maximum number of cached request results.
    pub cache_capacity: usize,

    /// Cache lifetimes in seconds.
    pub ttl: TtlPolicy,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("timeline_path", &self.timeline_path)
            .field("day_start", &self.day_start)
            .field("utc_offset_minutes", &self.utc_offset_minutes)
            .field("last_processed_day", &self.last_processed_day)
            .field("cache_capacity", &self.cache_capacity)
            .finish_non_exhaustive()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            timeline_path: data_dir.join("timeline.json"),
            day_start: NaiveTime::MIN,
            utc_offset_minutes: 0,
            last_processed_day: None,
            cache_capacity: 1024,
            ttl: TtlPolicy::default(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // MT_TTL__PAST=60 sets ttl.past
        figment = figment.merge(Env::prefixed("MT_").split("__"));

        figment.extract()
    }

    /// The plant day resolver described by this configuration.
    pub fn day_resolver(&self) -> anyhow::Result<PlantDayResolver> {
        let offset = self
            .utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .with_context(|| format!("invalid utc_offset_minutes: {}", self.utc_offset_minutes))?;
        let resolver = PlantDayResolver::new(offset, self.day_start);
        Ok(match self.last_processed_day {
            Some(day) => resolver.with_last_processed_day(day),
            None => resolver,
        })
    }
}

/// Returns the platform-specific config directory for mt.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("mt"))
}

/// Returns the platform-specific data directory for mt.
///
/// On Linux: `~/.local/share/mt`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("mt"))
}
