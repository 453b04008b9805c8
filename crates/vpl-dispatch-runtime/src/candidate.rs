use std::path::{Path, PathBuf};
use std::sync::Arc;
use vpl_dispatch_kernel::{ImplDescription, LibPriority, Rankable};

/// A validated implementation binary and its copied description.
#[derive(Debug, Clone)]
pub struct Candidate {
    path: PathBuf,
    priority: LibPriority,
    description: Arc<ImplDescription>,
    discovery_index: usize,
}

impl Candidate {
    pub fn new(
        path: PathBuf,
        priority: LibPriority,
        description: Arc<ImplDescription>,
        discovery_index: usize,
    ) -> Self {
        Self {
            path,
            priority,
            description,
            discovery_index,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Shared handle to the description.
    pub fn shared_description(&self) -> Arc<ImplDescription> {
        Arc::clone(&self.description)
    }
}

impl Rankable for Candidate {
    fn description(&self) -> &ImplDescription {
        &self.description
    }

    fn priority(&self) -> LibPriority {
        self.priority
    }

    fn discovery_index(&self) -> usize {
        self.discovery_index
    }
}
