//! Runtime resolution of the engine's entry points.
//!
//! The engine library is opened by name at runtime rather than linked, so the
//! crate builds and runs (reporting a binding failure) on machines without it.
//! Resolution happens at most once per binder; the resulting
//! [`CapabilityTable`] is shared read-only by every request.

use std::collections::HashMap;
use std::ffi::c_void;
use std::fmt;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use framegrab_core::config::ThumbnailConfig;
use tracing::{debug, info, warn};

use crate::engine::EngineProvider;
use crate::error::{MediaError, Result};
use crate::libvlc::{self, LibVlc};

/// Address of a resolved entry point.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RawSymbol(NonNull<c_void>);

// Function addresses are immutable for as long as the library stays loaded,
// and the table keeps the library loaded.
unsafe impl Send for RawSymbol {}
unsafe impl Sync for RawSymbol {}

impl RawSymbol {
    pub fn new(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }

    /// Reinterpret as a typed function pointer.
    ///
    /// # Safety
    /// `F` must be an `extern "C" fn` type matching the symbol's real signature.
    pub unsafe fn cast<F: Copy>(self) -> F {
        assert_eq!(
            std::mem::size_of::<F>(),
            std::mem::size_of::<*mut c_void>(),
            "symbol cast target must be pointer-sized"
        );
        let ptr = self.0.as_ptr();
        unsafe { std::mem::transmute_copy::<*mut c_void, F>(&ptr) }
    }
}

impl fmt::Debug for RawSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawSymbol({:p})", self.0)
    }
}

/// An opened shared library. Dropping it closes the library.
pub trait SymbolLibrary: Send + Sync {
    fn resolve(&self, symbol: &str) -> Option<RawSymbol>;
}

/// Opens shared libraries by name.
pub trait SymbolLoader: Send + Sync {
    fn open(&self, name: &str) -> std::result::Result<Box<dyn SymbolLibrary>, String>;
}

/// Loader backed by the platform dynamic linker.
#[derive(Debug, Clone, Copy, Default)]
pub struct DylibLoader;

struct Dylib(libloading::Library);

impl SymbolLoader for DylibLoader {
    fn open(&self, name: &str) -> std::result::Result<Box<dyn SymbolLibrary>, String> {
        // SAFETY: loading runs the library's initialisers; libvlc's are benign.
        let lib = unsafe { libloading::Library::new(name) }.map_err(|e| e.to_string())?;
        Ok(Box::new(Dylib(lib)))
    }
}

impl SymbolLibrary for Dylib {
    fn resolve(&self, symbol: &str) -> Option<RawSymbol> {
        // SAFETY: the symbol is read as an untyped address and only cast to a
        // function type by code that knows its signature.
        let sym = unsafe { self.0.get::<*mut c_void>(symbol.as_bytes()) }.ok()?;
        RawSymbol::new(*sym)
    }
}

/// Names an engine must export, split by how their absence is treated.
#[derive(Debug, Clone, Copy)]
pub struct SymbolSet {
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
}

/// Resolved entry points plus the library that keeps them valid.
pub struct CapabilityTable {
    library_name: String,
    required: HashMap<&'static str, RawSymbol>,
    optional: HashMap<&'static str, RawSymbol>,
    // Declared last so the symbols above never outlive the library.
    _library: Box<dyn SymbolLibrary>,
}

impl CapabilityTable {
    /// Resolve every name in `symbols` from `library`.
    ///
    /// Fails on the first missing required symbol; the library is then dropped
    /// (closed) together with everything resolved so far.
    pub fn resolve(
        library_name: &str,
        library: Box<dyn SymbolLibrary>,
        symbols: &SymbolSet,
    ) -> Result<Self> {
        let mut required = HashMap::with_capacity(symbols.required.len());
        for &name in symbols.required {
            let sym = library
                .resolve(name)
                .ok_or_else(|| MediaError::MissingSymbol {
                    library: library_name.to_string(),
                    symbol: name,
                })?;
            required.insert(name, sym);
        }

        let mut optional = HashMap::new();
        for &name in symbols.optional {
            match library.resolve(name) {
                Some(sym) => {
                    optional.insert(name, sym);
                }
                None => warn!(symbol = name, "optional engine capability not available"),
            }
        }

        Ok(Self {
            library_name: library_name.to_string(),
            required,
            optional,
            _library: library,
        })
    }

    pub fn library_name(&self) -> &str {
        &self.library_name
    }

    /// A required entry point. Returns `None` only for names that were never
    /// part of the required set.
    pub fn required(&self, name: &str) -> Option<RawSymbol> {
        self.required.get(name).copied()
    }

    pub fn optional(&self, name: &str) -> Option<RawSymbol> {
        self.optional.get(name).copied()
    }

    pub fn has(&self, name: &str) -> bool {
        self.required.contains_key(name) || self.optional.contains_key(name)
    }

    pub fn required_count(&self) -> usize {
        self.required.len()
    }

    pub fn optional_count(&self) -> usize {
        self.optional.len()
    }
}

impl fmt::Debug for CapabilityTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityTable")
            .field("library_name", &self.library_name)
            .field("required", &self.required.len())
            .field("optional", &self.optional.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Lazily binds an engine library and hands out its capability table.
///
/// Concurrent first calls serialise on an internal lock: one thread resolves,
/// the rest observe its result. A failed attempt leaves nothing behind, so a
/// later call tries again from scratch.
pub struct EngineBinder<L: SymbolLoader = DylibLoader> {
    loader: L,
    candidates: Vec<String>,
    symbols: SymbolSet,
    table: Mutex<Option<Arc<CapabilityTable>>>,
    resolutions: AtomicUsize,
}

impl<L: SymbolLoader> EngineBinder<L> {
    pub fn new(loader: L, candidates: Vec<String>, symbols: SymbolSet) -> Self {
        Self {
            loader,
            candidates,
            symbols,
            table: Mutex::new(None),
            resolutions: AtomicUsize::new(0),
        }
    }

    /// Bind if not yet bound; otherwise return the existing table.
    pub fn ensure_loaded(&self) -> Result<Arc<CapabilityTable>> {
        let mut slot = self.table.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(table) = slot.as_ref() {
            return Ok(Arc::clone(table));
        }

        let table = Arc::new(self.bind()?);
        self.resolutions.fetch_add(1, Ordering::SeqCst);
        info!(
            library = table.library_name(),
            optional = table.optional_count(),
            "engine library bound"
        );
        *slot = Some(Arc::clone(&table));
        Ok(table)
    }

    pub fn is_loaded(&self) -> bool {
        self.table
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// How many times symbols were actually resolved.
    pub fn resolution_count(&self) -> usize {
        self.resolutions.load(Ordering::SeqCst)
    }

    /// Try each candidate in order. A library that opens but lacks a required
    /// symbol is closed and the next candidate tried; if none binds, the first
    /// such symbol error wins over "not found".
    fn bind(&self) -> Result<CapabilityTable> {
        let mut errors = Vec::new();
        let mut incomplete = None;
        for name in &self.candidates {
            let library = match self.loader.open(name) {
                Ok(library) => library,
                Err(e) => {
                    errors.push(format!("{name}: {e}"));
                    continue;
                }
            };
            debug!(library = %name, "engine library opened");
            match CapabilityTable::resolve(name, library, &self.symbols) {
                Ok(table) => return Ok(table),
                Err(e) => {
                    warn!(library = %name, error = %e, "engine library incomplete");
                    incomplete.get_or_insert(e);
                }
            }
        }
        Err(incomplete.unwrap_or_else(|| MediaError::LibraryNotFound {
            tried: errors.join("; "),
        }))
    }
}

impl EngineBinder<DylibLoader> {
    /// Binder for libvlc using the config's library candidates.
    pub fn libvlc(config: &ThumbnailConfig) -> Self {
        Self::new(DylibLoader, config.library_candidates(), libvlc::SYMBOLS)
    }
}

impl<L: SymbolLoader> EngineProvider for EngineBinder<L> {
    type Engine = LibVlc;

    fn engine(&self) -> Result<LibVlc> {
        LibVlc::new(self.ensure_loaded()?)
    }
}

static GLOBAL: OnceLock<EngineBinder<DylibLoader>> = OnceLock::new();

/// Process-wide libvlc binder. The first caller's config decides which
/// library candidates are tried.
pub fn global_binder(config: &ThumbnailConfig) -> &'static EngineBinder<DylibLoader> {
    GLOBAL.get_or_init(|| EngineBinder::libvlc(config))
}
