//! Shared-library backend built on `libloading`.

use super::{
    CandidateError, CandidateResult, FunctionTable, Implementation, InitParams, LibraryOpener,
    OPTIONAL_SESSION_FUNCTIONS, REQUIRED_SESSION_FUNCTIONS, RawFunction, RuntimeSession,
};
use crate::abi::{
    CloseFn, FORMAT_IMPL_DESCRIPTION, FORMAT_IMPLEMENTED_FUNCTIONS, InitExFn,
    QueryImplDescriptionFn, RawImplDescription, RawImplementedFunctions, RawInitParam,
    ReleaseImplDescriptionFn, read_description, read_implemented_functions,
};
use crate::lock::dispatch_guard;
use error_stack::{Report, ResultExt};
use libloading::Library;
use std::ffi::c_void;
use std::path::{Path, PathBuf};
use std::ptr;
use tracing::{debug, warn};
use vpl_dispatch_kernel::ImplDescription;

/// Opens implementations with the platform loader.
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicLibraryOpener;

impl LibraryOpener for DynamicLibraryOpener {
    fn open(&self, path: &Path) -> CandidateResult<Box<dyn Implementation>> {
        Ok(Box::new(DynamicImplementation::open(path)?))
    }
}

/// A loaded implementation library.
pub struct DynamicImplementation {
    path: PathBuf,
    library: Option<Library>,
    query: QueryImplDescriptionFn,
    release: ReleaseImplDescriptionFn,
}

impl DynamicImplementation {
    /// Load `path` and resolve the two self-description entry points.
    pub fn open(path: &Path) -> CandidateResult<Self> {
        let _guard = dispatch_guard();

        let library = unsafe { Library::new(path) }
            .map_err(|e| Report::new(CandidateError::LibraryLoad(e.to_string())))
            .attach(format!("loading {}", path.display()))?;

        let query = unsafe { load_symbol::<QueryImplDescriptionFn>(&library, "MFXQueryImplDescription") }?;
        let release =
            unsafe { load_symbol::<ReleaseImplDescriptionFn>(&library, "MFXReleaseImplDescription") }?;

        debug!("Loaded implementation library: {:?}", path);
        Ok(Self {
            path: path.to_path_buf(),
            library: Some(library),
            query,
            release,
        })
    }

    fn symbol<T: Copy>(&self, name: &str) -> CandidateResult<T> {
        let _guard = dispatch_guard();
        let library = self
            .library
            .as_ref()
            .ok_or_else(|| Report::new(CandidateError::LibraryLoad("library unloaded".to_string())))?;
        unsafe { load_symbol::<T>(library, name) }
    }
}

/// # Safety
/// `T` must be the function-pointer type of the exported symbol.
unsafe fn load_symbol<T: Copy>(library: &Library, name: &str) -> CandidateResult<T> {
    let symbol = unsafe { library.get::<T>(name.as_bytes()) }
        .map_err(|e| Report::new(CandidateError::SymbolNotFound(format!("{name}: {e}"))))?;
    Ok(*symbol)
}

impl Implementation for DynamicImplementation {
    fn path(&self) -> &Path {
        &self.path
    }

    fn query_description(&self) -> CandidateResult<ImplDescription> {
        let handle = unsafe { (self.query)(FORMAT_IMPL_DESCRIPTION) };
        if handle.is_null() {
            return Err(Report::new(CandidateError::InvalidDescription(
                "runtime returned no description".to_string(),
            )));
        }
        let parsed = unsafe { read_description(handle.cast::<RawImplDescription>().cast_const()) };
        unsafe { (self.release)(handle) };
        let mut desc =
            parsed.map_err(|e| Report::new(CandidateError::InvalidDescription(e.to_string())))?;

        let functions = unsafe { (self.query)(FORMAT_IMPLEMENTED_FUNCTIONS) };
        if !functions.is_null() {
            desc.implemented_functions = unsafe {
                read_implemented_functions(functions.cast::<RawImplementedFunctions>().cast_const())
            };
            unsafe { (self.release)(functions) };
        }

        Ok(desc)
    }

    fn resolve_functions(&self) -> CandidateResult<FunctionTable> {
        let mut table = FunctionTable::new();
        for &name in REQUIRED_SESSION_FUNCTIONS {
            table.insert(name, self.symbol::<RawFunction>(name)?);
        }
        for &name in OPTIONAL_SESSION_FUNCTIONS {
            if let Ok(function) = self.symbol::<RawFunction>(name) {
                table.insert(name, function);
            }
        }
        Ok(table)
    }

    fn initialize(&self, params: &InitParams) -> CandidateResult<RuntimeSession> {
        let init = self.symbol::<InitExFn>("MFXInitEx")?;
        let param = RawInitParam {
            implementation: params.implementation as u32,
            version: params.version.into(),
            external_threads: 0,
            ext_param: ptr::null_mut(),
            num_ext_param: 0,
            gpu_copy: 0,
            reserved: [0; 21],
        };

        let mut session: *mut c_void = ptr::null_mut();
        let status = unsafe { init(param, &mut session) };
        if status != 0 {
            return Err(Report::new(CandidateError::InitFailed(status)))
                .attach(format!("MFXInitEx in {}", self.path.display()));
        }
        if session.is_null() {
            return Err(Report::new(CandidateError::InitFailed(-1)))
                .attach("MFXInitEx returned a null session");
        }
        Ok(RuntimeSession(session))
    }

    fn close(&self, session: RuntimeSession) -> i32 {
        match self.symbol::<CloseFn>("MFXClose") {
            Ok(close) => unsafe { close(session.0) },
            Err(report) => {
                warn!("Cannot close session in {:?}: {:?}", self.path, report);
                -1
            }
        }
    }
}

impl Drop for DynamicImplementation {
    fn drop(&mut self) {
        let _guard = dispatch_guard();
        if let Some(library) = self.library.take() {
            drop(library);
            debug!("Unloaded implementation library: {:?}", self.path);
        }
    }
}
