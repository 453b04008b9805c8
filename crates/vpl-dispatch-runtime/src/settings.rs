//! Dispatcher settings.
//!
//! Settings are layered with the `config` crate, later layers winning:
//!
//! 1. built-in defaults (package directory next to the executable, the
//!    platform's legacy library directories, minimum API version 2.0)
//! 2. an optional file named by `VPL_DISPATCH_CONFIG` (TOML, JSON or YAML,
//!    detected from the extension, with `${VAR}` substitution)
//! 3. `VPL_DISPATCH__*` environment variables, `__` separating nested keys
//!    (`VPL_DISPATCH__MIN_API_VERSION__MINOR=1`)
//!
//! Directories listed in `ONEVPL_SEARCH_PATH` (platform path-list syntax)
//! are then placed in front of the configured search paths.

use crate::discovery::SearchLocation;
use config::{Config as Cfg, Environment, File, FileFormat};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use vpl_dispatch_kernel::{ApiVersion, LibPriority};

/// Names the optional settings file.
pub const CONFIG_FILE_ENV: &str = "VPL_DISPATCH_CONFIG";
/// Prefix of per-key environment overrides.
pub const ENV_PREFIX: &str = "VPL_DISPATCH";
/// Extra user-defined search directories.
pub const SEARCH_PATH_ENV: &str = "ONEVPL_SEARCH_PATH";

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings parsing error: {0}")]
    Parse(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Settings deserialization error: {0}")]
    Serialization(String),
}

pub type SettingsResult<T> = Result<T, SettingsError>;

/// Where to look for implementations and which ones to accept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherSettings {
    /// Highest-priority directories.
    pub search_paths: Vec<PathBuf>,
    /// Package install directories.
    pub package_dirs: Vec<PathBuf>,
    /// Legacy system library directories.
    pub legacy_dirs: Vec<PathBuf>,
    /// Implementations reporting an older API are dropped at discovery.
    pub min_api_version: ApiVersion,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            search_paths: Vec::new(),
            package_dirs: default_package_dirs(),
            legacy_dirs: default_legacy_dirs(),
            min_api_version: ApiVersion::new(2, 0),
        }
    }
}

fn default_package_dirs() -> Vec<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .into_iter()
        .collect()
}

fn default_legacy_dirs() -> Vec<PathBuf> {
    let dirs: &[&str] = if cfg!(target_os = "windows") {
        &[]
    } else if cfg!(target_os = "macos") {
        &["/usr/local/lib"]
    } else {
        &[
            "/usr/lib/x86_64-linux-gnu",
            "/usr/lib64",
            "/usr/lib",
            "/opt/intel/mediasdk/lib64",
            "/opt/intel/mediasdk/lib",
        ]
    };
    dirs.iter().map(PathBuf::from).collect()
}

impl DispatcherSettings {
    /// Settings that search only `dirs`, all at the highest priority.
    pub fn with_search_paths<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            search_paths: dirs.into_iter().map(Into::into).collect(),
            package_dirs: Vec::new(),
            legacy_dirs: Vec::new(),
            min_api_version: ApiVersion::new(2, 0),
        }
    }

    pub fn with_min_api_version(mut self, version: ApiVersion) -> Self {
        self.min_api_version = version;
        self
    }

    /// Load from the process environment.
    pub fn from_env() -> SettingsResult<Self> {
        let env: HashMap<String, String> = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        let file = env.get(CONFIG_FILE_ENV).map(PathBuf::from);
        Self::load(file.as_deref(), &env)
    }

    /// Load from an explicit settings file and environment snapshot.
    pub fn load(file: Option<&Path>, env: &HashMap<String, String>) -> SettingsResult<Self> {
        let mut builder = Cfg::builder();

        if let Some(path) = file {
            let format = match path
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_ascii_lowercase)
                .as_deref()
            {
                Some("toml") => FileFormat::Toml,
                Some("json") => FileFormat::Json,
                Some("yaml" | "yml") => FileFormat::Yaml,
                other => {
                    return Err(SettingsError::UnsupportedFormat(format!(
                        "{}: {}",
                        path.display(),
                        other.unwrap_or("no extension")
                    )));
                }
            };
            let content = std::fs::read_to_string(path)?;
            let content = substitute_env_vars(&content, env)?;
            builder = builder.add_source(File::from_str(&content, format));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .source(Some(env.clone())),
        );

        let mut settings: Self = builder
            .build()
            .map_err(|e| SettingsError::Parse(e.to_string()))?
            .try_deserialize()
            .map_err(|e| SettingsError::Serialization(e.to_string()))?;

        if let Some(list) = env.get(SEARCH_PATH_ENV) {
            let mut paths: Vec<PathBuf> = std::env::split_paths(list)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
            paths.append(&mut settings.search_paths);
            settings.search_paths = paths;
        }

        Ok(settings)
    }

    /// Search locations in priority order.
    pub fn search_locations(&self) -> Vec<SearchLocation> {
        let tier = |dirs: &[PathBuf], priority| {
            dirs.iter()
                .map(move |dir| SearchLocation::new(dir.clone(), priority))
                .collect::<Vec<_>>()
        };
        let mut locations = tier(&self.search_paths, LibPriority::UserDefined);
        locations.extend(tier(&self.package_dirs, LibPriority::Package));
        locations.extend(tier(&self.legacy_dirs, LibPriority::Legacy));
        locations
    }
}

/// Replace `${VAR}` references with values from `env`. Unknown variables are
/// left as written.
pub fn substitute_env_vars(content: &str, env: &HashMap<String, String>) -> SettingsResult<String> {
    let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
        .map_err(|e| SettingsError::Parse(e.to_string()))?;
    Ok(re
        .replace_all(content, |caps: &regex::Captures| {
            env.get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned())
}
