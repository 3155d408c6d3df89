//! Symbol-resolution facilities backed by dynamic libraries
//!
//! `LibraryResolver` looks symbols up in a shared library's export table,
//! `ProcAddressResolver` asks the window system's proc-address entry point
//! and `FallbackResolver` chains two of them, the way the generated loader
//! falls back from `wglGetProcAddress` to `GetProcAddress`.

use bindify_core::ApiKind;
use libloading::{Library, Symbol};
use std::ffi::{c_char, c_void, CString};
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

use crate::eval::SymbolResolver;
use crate::LoaderError;

/// Default GL library for the current platform
pub fn default_library() -> &'static str {
    if cfg!(windows) {
        "opengl32.dll"
    } else if cfg!(target_os = "macos") {
        "/System/Library/Frameworks/OpenGL.framework/OpenGL"
    } else {
        "libGL.so.1"
    }
}

/// Proc-address entry point used to load `api` commands
pub fn proc_address_entry(api: ApiKind) -> &'static str {
    match api {
        ApiKind::Glx => "glXGetProcAddressARB",
        ApiKind::Wgl => "wglGetProcAddress",
        ApiKind::Gl if cfg!(windows) => "wglGetProcAddress",
        ApiKind::Gl => "glXGetProcAddressARB",
    }
}

fn open_library(path: &Path) -> Result<Library, LoaderError> {
    // Safety: loading a library runs its initialisers. The caller chooses
    // which GL implementation to trust.
    unsafe { Library::new(path) }.map_err(|e| LoaderError::Open {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

// ============================================================================
// EXPORT TABLE
// ============================================================================

pub struct LibraryResolver {
    path: PathBuf,
    library: Library,
}

impl LibraryResolver {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LoaderError> {
        let path = path.as_ref().to_path_buf();
        let library = open_library(&path)?;
        Ok(Self { path, library })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SymbolResolver for LibraryResolver {
    fn resolve(&self, symbol: &str) -> Option<NonNull<c_void>> {
        let name = CString::new(symbol).ok()?;
        // Safety: the symbol is only read as an address, never called here.
        let found: Symbol<*mut c_void> =
            unsafe { self.library.get(name.as_bytes_with_nul()) }.ok()?;
        NonNull::new(*found)
    }
}

// ============================================================================
// PROC ADDRESS
// ============================================================================

type GetProcAddress = unsafe extern "system" fn(*const c_char) -> *mut c_void;

pub struct ProcAddressResolver {
    entry: GetProcAddress,
    entry_name: &'static str,
    // Keeps `entry` mapped
    _library: Library,
}

impl ProcAddressResolver {
    pub fn open(path: impl AsRef<Path>, entry_name: &'static str) -> Result<Self, LoaderError> {
        let path = path.as_ref();
        let library = open_library(path)?;
        // Safety: both entry points take a NUL-terminated name and return
        // an address, matching `GetProcAddress`.
        let entry = unsafe {
            let symbol: Symbol<GetProcAddress> =
                library
                    .get(entry_name.as_bytes())
                    .map_err(|e| LoaderError::EntryPoint {
                        entry: entry_name.to_string(),
                        path: path.display().to_string(),
                        reason: e.to_string(),
                    })?;
            *symbol
        };
        Ok(Self {
            entry,
            entry_name,
            _library: library,
        })
    }

    pub fn for_api(api: ApiKind, path: impl AsRef<Path>) -> Result<Self, LoaderError> {
        Self::open(path, proc_address_entry(api))
    }

    pub fn entry_name(&self) -> &'static str {
        self.entry_name
    }
}

impl SymbolResolver for ProcAddressResolver {
    fn resolve(&self, symbol: &str) -> Option<NonNull<c_void>> {
        let name = CString::new(symbol).ok()?;
        // Safety: `name` outlives the call and the entry point does not
        // keep the pointer.
        let address = unsafe { (self.entry)(name.as_ptr()) };
        // Some wglGetProcAddress implementations report failure as 1, 2, 3 or -1
        if matches!(address as isize, -1 | 1 | 2 | 3) {
            return None;
        }
        NonNull::new(address)
    }
}

// ============================================================================
// FALLBACK
// ============================================================================

pub struct FallbackResolver<P, F> {
    primary: P,
    fallback: F,
}

impl<P: SymbolResolver, F: SymbolResolver> FallbackResolver<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P: SymbolResolver, F: SymbolResolver> SymbolResolver for FallbackResolver<P, F> {
    fn resolve(&self, symbol: &str) -> Option<NonNull<c_void>> {
        self.primary
            .resolve(symbol)
            .or_else(|| self.fallback.resolve(symbol))
    }
}

/// Proc-address lookup with the library's export table behind it
pub fn platform_resolver(
    api: ApiKind,
    path: impl AsRef<Path>,
) -> Result<FallbackResolver<ProcAddressResolver, LibraryResolver>, LoaderError> {
    let path = path.as_ref();
    let primary = ProcAddressResolver::for_api(api, path)?;
    let fallback = LibraryResolver::open(path)?;
    tracing::debug!(
        entry = primary.entry_name(),
        library = %fallback.path().display(),
        "platform resolver ready"
    );
    Ok(FallbackResolver::new(primary, fallback))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_order() {
        let primary = |s: &str| (s == "glClear").then(NonNull::<c_void>::dangling);
        let fallback = |s: &str| (s == "glFlush").then(NonNull::<c_void>::dangling);
        let chain = FallbackResolver::new(primary, fallback);
        assert!(chain.resolve("glClear").is_some());
        assert!(chain.resolve("glFlush").is_some());
        assert!(chain.resolve("glFinish").is_none());
    }

    #[test]
    fn test_entry_points() {
        assert_eq!(proc_address_entry(ApiKind::Glx), "glXGetProcAddressARB");
        assert_eq!(proc_address_entry(ApiKind::Wgl), "wglGetProcAddress");
    }

    #[test]
    fn test_missing_library_is_an_error() {
        let err = LibraryResolver::open("/nonexistent/libGL-bindify-test.so")
            .err()
            .unwrap();
        assert!(matches!(err, LoaderError::Open { .. }));
        assert!(err.to_string().starts_with("LOADER/"));
    }
}
