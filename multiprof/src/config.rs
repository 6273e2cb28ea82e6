use std::{
    collections::HashSet,
    path::{Component, Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::migrate::LegacyLayout;

/// Environment variables with this prefix override the configuration file
pub const ENV_PREFIX: &str = "MULTIPROF_";

/// Main multiprof settings structure
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Default log level, can be overridden by command line options or
    /// environment variables
    #[serde(default = "default_log_filter")]
    pub log_level: log::LevelFilter,

    /// Registry directory holding `profiles.json` and one storage directory
    /// per profile
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// Grace period before the storage of a removed profile is deleted
    #[serde(default, with = "humantime_serde")]
    pub gc_delay: Duration,

    /// Adopt a legacy single-profile layout when opening the registry.
    #[serde(default = "default_migrate")]
    pub migrate: bool,

    /// Legacy layout recognized by migration
    #[serde(default)]
    pub legacy: LegacyLayout,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_filter(),
            directory: default_directory(),
            gc_delay: Duration::ZERO,
            migrate: default_migrate(),
            legacy: LegacyLayout::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !single_component(&self.legacy.marker) {
            anyhow::bail!(
                "legacy marker must be a plain file name: {:?}",
                self.legacy.marker
            );
        }
        let mut seen = HashSet::new();
        for name in &self.legacy.content {
            if !single_component(name) {
                anyhow::bail!("legacy content must be a plain directory name: {name:?}");
            }
            if !seen.insert(name) {
                anyhow::bail!("duplicate legacy content directory: {name:?}");
            }
        }
        Ok(())
    }
}

fn single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn default_log_filter() -> log::LevelFilter {
    log::LevelFilter::Info
}

fn default_directory() -> PathBuf {
    PathBuf::from("profiles")
}

fn default_migrate() -> bool {
    true
}

fn figment(path: &Option<PathBuf>) -> anyhow::Result<Figment> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));
    if let Some(path) = path {
        if !path.is_file() {
            anyhow::bail!("configuration file {path:?} does not exist");
        }
        figment = figment.merge(Toml::file(path));
    }
    Ok(figment.merge(Env::prefixed(ENV_PREFIX)))
}

pub fn load_config(path: &Option<PathBuf>) -> anyhow::Result<Config> {
    let config: Config = figment(path)?
        .extract()
        .context("failed to load configuration")?;
    config
        .validate()
        .context("failed to validate configuration")?;
    Ok(config)
}

pub fn display_config(config: &Config) -> anyhow::Result<String> {
    toml::to_string_pretty(config).context("failed to render configuration")
}
