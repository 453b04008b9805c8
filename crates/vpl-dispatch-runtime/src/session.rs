//! Live sessions bound to one implementation.

use crate::backend::{FunctionTable, Implementation, RuntimeSession};
use crate::lock::dispatch_guard;
use error_stack::{Report, ResultExt};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;
use vpl_dispatch_kernel::{DispatchError, DispatchResult, ImplDescription};

/// A runtime session plus the implementation that owns it.
///
/// The session keeps its implementation loaded until it is closed or
/// dropped, independently of the loader that created it.
pub struct Session {
    id: Uuid,
    handle: Option<RuntimeSession>,
    functions: FunctionTable,
    description: Arc<ImplDescription>,
    implementation: Box<dyn Implementation>,
}

impl Session {
    pub(crate) fn new(
        implementation: Box<dyn Implementation>,
        handle: RuntimeSession,
        functions: FunctionTable,
        description: Arc<ImplDescription>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            handle: Some(handle),
            functions,
            description,
            implementation,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn description(&self) -> &ImplDescription {
        &self.description
    }

    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    pub fn library_path(&self) -> &Path {
        self.implementation.path()
    }

    /// The implementation's own session handle.
    pub fn runtime_handle(&self) -> Option<RuntimeSession> {
        self.handle
    }

    /// Close the runtime session and unload the implementation.
    pub fn close(mut self) -> DispatchResult<()> {
        match self.close_runtime() {
            0 => Ok(()),
            status => Err(Report::new(DispatchError::SessionClose(status)))
                .attach(format!("MFXClose in {}", self.library_path().display())),
        }
    }

    fn close_runtime(&mut self) -> i32 {
        let Some(handle) = self.handle.take() else {
            return 0;
        };
        let _guard = dispatch_guard();
        let status = self.implementation.close(handle);
        debug!("Closed session {} ({:?})", self.id, self.description.impl_name);
        status
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let status = self.close_runtime();
        if status != 0 {
            warn!("Session {} closed with status {}", self.id, status);
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("implementation", &self.description.impl_name)
            .field("path", &self.library_path())
            .field("functions", &self.functions.len())
            .finish()
    }
}
