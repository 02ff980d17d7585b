//! Configuration loading for forall check runs.
//!
//! ```toml
//! [check]
//! seed = 1234      # replay a previous run
//! samples = 200    # samples per forall quantifier
//! ```
//!
//! The file is looked up at `$FORALL_CONFIG`, then `./forall.toml`, then
//! `~/.forall/config.toml`. `FORALL_SEED` and `FORALL_SAMPLES` override
//! whatever the file says.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use forall_types::{SampleCount, Seed};
use serde::Deserialize;
use thiserror::Error;
use toml::de;

pub const CONFIG_ENV: &str = "FORALL_CONFIG";
pub const SEED_ENV: &str = "FORALL_SEED";
pub const SAMPLES_ENV: &str = "FORALL_SAMPLES";

const LOCAL_CONFIG: &str = "forall.toml";

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
pub struct ForallConfig {
    pub check: Option<CheckSection>,
}

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
pub struct CheckSection {
    pub seed: Option<Seed>,
    /// Must be at least 1.
    pub samples: Option<SampleCount>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: de::Error,
    },
    #[error("invalid {var}={value:?}: {reason}")]
    InvalidEnv {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => Some(path),
            ConfigError::InvalidEnv { .. } => None,
        }
    }
}

impl ForallConfig {
    /// Load the config file, if there is one.
    ///
    /// A missing file is not an error unless `$FORALL_CONFIG` names it.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let Some(path) = config_path() else {
            return Ok(None);
        };
        if !path.exists() && env::var_os(CONFIG_ENV).is_none() {
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };
        match toml::from_str::<Self>(&content) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "Loaded config");
                Ok(config)
            }
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    /// Check settings described by this file, defaults filled in.
    #[must_use]
    pub fn settings(&self) -> CheckSettings {
        let section = self.check.as_ref();
        CheckSettings {
            seed: section.and_then(|check| check.seed),
            samples: section
                .and_then(|check| check.samples)
                .unwrap_or_default(),
        }
    }
}

/// Where the config file is expected.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    if let Some(explicit) = env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(explicit));
    }
    let local = PathBuf::from(LOCAL_CONFIG);
    if local.is_file() {
        return Some(local);
    }
    dirs::home_dir().map(|home| home.join(".forall").join("config.toml"))
}

/// Seed and sample count for a check run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckSettings {
    pub seed: Option<Seed>,
    pub samples: SampleCount,
}

impl CheckSettings {
    /// Settings from the config file and the process environment.
    pub fn resolve() -> Result<Self, ConfigError> {
        let file = ForallConfig::load()?.unwrap_or_default();
        file.settings().with_overrides(|var| env::var(var).ok())
    }

    /// Apply `FORALL_SEED` and `FORALL_SAMPLES` as reported by `lookup`.
    /// Blank values count as unset.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let read = |var: &'static str| lookup(var).filter(|value| !value.trim().is_empty());

        if let Some(raw) = read(SEED_ENV) {
            let seed = raw.parse::<Seed>().map_err(|err| ConfigError::InvalidEnv {
                var: SEED_ENV,
                value: raw.clone(),
                reason: err.to_string(),
            })?;
            self.seed = Some(seed);
        }
        if let Some(raw) = read(SAMPLES_ENV) {
            let samples = raw
                .parse::<SampleCount>()
                .map_err(|err| ConfigError::InvalidEnv {
                    var: SAMPLES_ENV,
                    value: raw.clone(),
                    reason: err.to_string(),
                })?;
            self.samples = samples;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env;
    use std::ffi::OsStr;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::{Mutex, MutexGuard, PoisonError};

    use forall_types::{SampleCount, Seed};
    use tempfile::TempDir;

    use super::{CONFIG_ENV, CheckSettings, ConfigError, ForallConfig, SAMPLES_ENV, SEED_ENV};

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn lock_env() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
    }

    struct EnvVarGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl EnvVarGuard {
        fn set(key: &'static str, value: impl AsRef<OsStr>) -> Self {
            let previous = env::var(key).ok();
            unsafe {
                env::set_var(key, value);
            }
            Self { key, previous }
        }

        fn unset(key: &'static str) -> Self {
            let previous = env::var(key).ok();
            unsafe {
                env::remove_var(key);
            }
            Self { key, previous }
        }
    }

    impl Drop for EnvVarGuard {
        fn drop(&mut self) {
            if let Some(previous) = &self.previous {
                unsafe {
                    env::set_var(self.key, previous);
                }
            } else {
                unsafe {
                    env::remove_var(self.key);
                }
            }
        }
    }

    fn write_config(content: &str) -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forall.toml");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |var: &str| vars.get(var).cloned()
    }

    #[test]
    fn load_from_reads_check_section() {
        let (_dir, path) = write_config("[check]\nseed = 1234\nsamples = 250\n");
        let config = ForallConfig::load_from(&path).unwrap();
        let settings = config.settings();
        assert_eq!(settings.seed, Some(Seed::new(1234)));
        assert_eq!(settings.samples.get(), 250);
    }

    #[test]
    fn empty_file_gives_defaults() {
        let (_dir, path) = write_config("");
        let settings = ForallConfig::load_from(&path).unwrap().settings();
        assert_eq!(settings, CheckSettings::default());
        assert_eq!(settings.samples, SampleCount::DEFAULT);
    }

    #[test]
    fn zero_samples_is_a_parse_error() {
        let (_dir, path) = write_config("[check]\nsamples = 0\n");
        let err = ForallConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert_eq!(err.path(), Some(path.as_path()));
    }

    #[test]
    fn malformed_toml_reports_path() {
        let (_dir, path) = write_config("[check\nseed = ");
        let err = ForallConfig::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("forall.toml"));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ForallConfig::load_from(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn environment_overrides_file() {
        let (_dir, path) = write_config("[check]\nseed = 1\nsamples = 10\n");
        let settings = ForallConfig::load_from(&path)
            .unwrap()
            .settings()
            .with_overrides(env_of(&[(SEED_ENV, "99"), (SAMPLES_ENV, " 40 ")]))
            .unwrap();
        assert_eq!(settings.seed, Some(Seed::new(99)));
        assert_eq!(settings.samples.get(), 40);
    }

    #[test]
    fn blank_environment_values_are_ignored() {
        let settings = CheckSettings::default()
            .with_overrides(env_of(&[(SEED_ENV, "  ")]))
            .unwrap();
        assert_eq!(settings.seed, None);
    }

    #[test]
    fn invalid_environment_values_are_rejected() {
        let err = CheckSettings::default()
            .with_overrides(env_of(&[(SAMPLES_ENV, "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: SAMPLES_ENV, .. }));
        assert!(err.path().is_none());

        let err = CheckSettings::default()
            .with_overrides(env_of(&[(SEED_ENV, "-3")]))
            .unwrap_err();
        assert!(err.to_string().starts_with("invalid FORALL_SEED=\"-3\""));
    }

    #[test]
    fn explicit_config_path_must_exist() {
        let _lock = lock_env();
        let dir = tempfile::tempdir().unwrap();
        let _config = EnvVarGuard::set(CONFIG_ENV, dir.path().join("nope.toml"));
        let result = ForallConfig::load();
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn resolve_reads_file_then_environment() {
        let _lock = lock_env();
        let (_dir, path) = write_config("[check]\nseed = 5\nsamples = 9\n");
        let _config = EnvVarGuard::set(CONFIG_ENV, &path);
        let _samples = EnvVarGuard::unset(SAMPLES_ENV);
        let _seed = EnvVarGuard::set(SEED_ENV, "77");

        let settings = CheckSettings::resolve().unwrap();
        assert_eq!(settings.seed, Some(Seed::new(77)));
        assert_eq!(settings.samples.get(), 9);
    }

    #[test]
    fn resolve_reports_bad_environment() {
        let _lock = lock_env();
        let (_dir, path) = write_config("");
        let _config = EnvVarGuard::set(CONFIG_ENV, &path);
        let _seed = EnvVarGuard::unset(SEED_ENV);
        let _samples = EnvVarGuard::set(SAMPLES_ENV, "many");

        let err = CheckSettings::resolve().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: SAMPLES_ENV, .. }));
    }
}
