//! The loader: aggregate root of a dispatch.
//!
//! A [`Loader`] owns its filter configs and a cached list of discovered
//! candidates. Discovery runs once, on the first call that needs candidates.
//! Filtering and ranking run on every call, so configs changed after
//! discovery still apply.

use crate::backend::{CandidateError, DynamicLibraryOpener, InitParams, LibraryOpener};
use crate::candidate::Candidate;
use crate::discovery::Discovery;
use crate::lock::dispatch_guard;
use crate::session::Session;
use crate::settings::DispatcherSettings;
use error_stack::{Report, ResultExt};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use vpl_dispatch_kernel::selection;
use vpl_dispatch_kernel::{
    DispatchError, DispatchResult, FilterConfig, ImplDescription, PropertyValue, Rankable,
};

/// Index of a config within its loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfigId(usize);

impl ConfigId {
    pub fn index(self) -> usize {
        self.0
    }
}

pub struct Loader {
    id: Uuid,
    settings: DispatcherSettings,
    opener: Arc<dyn LibraryOpener>,
    configs: Vec<FilterConfig>,
    candidates: Option<Vec<Candidate>>,
}

impl Loader {
    /// A loader using settings from the environment and the platform loader.
    ///
    /// Unreadable settings fall back to the defaults.
    pub fn from_env() -> Self {
        let settings = DispatcherSettings::from_env().unwrap_or_else(|err| {
            warn!("Ignoring dispatcher settings: {}", err);
            DispatcherSettings::default()
        });
        Self::with_opener(settings, Arc::new(DynamicLibraryOpener))
    }

    pub fn with_opener(settings: DispatcherSettings, opener: Arc<dyn LibraryOpener>) -> Self {
        let _guard = dispatch_guard();
        let id = Uuid::now_v7();
        debug!("Created loader {}", id);
        Self {
            id,
            settings,
            opener,
            configs: Vec::new(),
            candidates: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn settings(&self) -> &DispatcherSettings {
        &self.settings
    }

    /// Add an empty config.
    pub fn create_config(&mut self) -> ConfigId {
        self.configs.push(FilterConfig::new());
        ConfigId(self.configs.len() - 1)
    }

    pub fn config(&self, id: ConfigId) -> Option<&FilterConfig> {
        self.configs.get(id.0)
    }

    pub fn config_mut(&mut self, id: ConfigId) -> Option<&mut FilterConfig> {
        self.configs.get_mut(id.0)
    }

    pub fn configs(&self) -> &[FilterConfig] {
        &self.configs
    }

    /// Set the constraint of config `id`.
    pub fn set_filter_property(
        &mut self,
        id: ConfigId,
        path: &str,
        value: PropertyValue,
    ) -> DispatchResult<()> {
        let config = self
            .configs
            .get_mut(id.0)
            .ok_or_else(|| Report::new(DispatchError::InvalidHandle))?;
        config
            .set_property(path, value)
            .map_err(Report::new)
            .attach(format!("setting filter property `{path}`"))
    }

    /// All validated candidates, discovering them on first use.
    pub fn candidates(&mut self) -> &[Candidate] {
        if self.candidates.is_none() {
            let _guard = dispatch_guard();
            let locations = self.settings.search_locations();
            let found = Discovery::new(self.opener.as_ref(), self.settings.min_api_version)
                .run(&locations);
            self.candidates = Some(found);
        }
        self.candidates.as_deref().unwrap_or(&[])
    }

    /// Whether discovery has already run.
    pub fn is_discovered(&self) -> bool {
        self.candidates.is_some()
    }

    /// Candidates that pass every config, ranked.
    pub fn matching(&mut self) -> Vec<&Candidate> {
        self.candidates();
        let candidates = self.candidates.as_deref().unwrap_or(&[]);
        selection::select(candidates, &self.configs)
    }

    /// The `index`-th ranked match.
    pub fn candidate_at(&mut self, index: u32) -> DispatchResult<&Candidate> {
        let matched = self.matching();
        if matched.is_empty() {
            return Err(Report::new(DispatchError::NoMatchingImplementation));
        }
        let available = matched.len();
        matched
            .into_iter()
            .nth(index as usize)
            .ok_or_else(|| Report::new(DispatchError::IndexOutOfRange { index, available }))
    }

    /// Description of the `index`-th ranked match.
    pub fn enumerate(&mut self, index: u32) -> DispatchResult<Arc<ImplDescription>> {
        Ok(self.candidate_at(index)?.shared_description())
    }

    /// Load the `index`-th ranked match and start a session on it.
    ///
    /// The candidate list is left as it was if this fails.
    pub fn create_session(&mut self, index: u32) -> DispatchResult<Session> {
        let candidate = self.candidate_at(index)?.clone();
        let unavailable =
            || DispatchError::ImplementationUnavailable(candidate.path().display().to_string());

        let _guard = dispatch_guard();
        let implementation = self
            .opener
            .open(candidate.path())
            .map_err(|report| report.change_context(unavailable()))?;
        let functions = implementation
            .resolve_functions()
            .map_err(|report| report.change_context(unavailable()))?;

        let params = InitParams::for_description(candidate.description());
        let handle = implementation.initialize(&params).map_err(|report| {
            let context = match report.current_context() {
                CandidateError::InitFailed(code) => DispatchError::SessionInit(*code),
                _ => unavailable(),
            };
            report.change_context(context)
        })?;

        info!(
            "Created session on {:?} (API {}) from {:?}",
            candidate.description().impl_name,
            candidate.description().api_version,
            candidate.path()
        );
        Ok(Session::new(
            implementation,
            handle,
            functions,
            candidate.shared_description(),
        ))
    }
}

impl Drop for Loader {
    fn drop(&mut self) {
        let _guard = dispatch_guard();
        self.configs.clear();
        self.candidates = None;
        debug!("Destroyed loader {}", self.id);
    }
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("id", &self.id)
            .field("configs", &self.configs.len())
            .field(
                "candidates",
                &self.candidates.as_ref().map(|c| c.len()),
            )
            .finish()
    }
}
