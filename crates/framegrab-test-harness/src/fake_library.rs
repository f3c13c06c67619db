use std::collections::HashMap;
use std::ffi::c_void;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use framegrab_media::binder::{RawSymbol, SymbolLibrary, SymbolLoader};
use framegrab_media::libvlc::SYMBOLS;

extern "C" fn fake_entry() {}

/// How often the fake loader was exercised.
#[derive(Debug, Default)]
pub struct LoaderStats {
    opens: AtomicUsize,
    closes: AtomicUsize,
    resolves: AtomicUsize,
}

impl LoaderStats {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn resolves(&self) -> usize {
        self.resolves.load(Ordering::SeqCst)
    }

    /// Libraries opened and not yet closed.
    pub fn open_libraries(&self) -> usize {
        self.opens() - self.closes()
    }
}

/// In-memory stand-in for the dynamic linker.
///
/// Every exported symbol resolves to the same no-op function; tests only
/// inspect which names resolved, never call them.
#[derive(Debug, Default)]
pub struct FakeLoader {
    libraries: HashMap<String, Vec<&'static str>>,
    stats: Arc<LoaderStats>,
}

impl FakeLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_library(mut self, name: &str, symbols: &[&'static str]) -> Self {
        self.libraries.insert(name.to_string(), symbols.to_vec());
        self
    }

    /// A library exporting every libvlc symbol, required and optional.
    pub fn with_complete_libvlc(self, name: &str) -> Self {
        let all: Vec<_> = SYMBOLS
            .required
            .iter()
            .chain(SYMBOLS.optional)
            .copied()
            .collect();
        self.with_library(name, &all)
    }

    /// A libvlc lacking the listed symbols.
    pub fn with_libvlc_without(self, name: &str, missing: &[&str]) -> Self {
        let symbols: Vec<_> = SYMBOLS
            .required
            .iter()
            .chain(SYMBOLS.optional)
            .copied()
            .filter(|s| !missing.contains(s))
            .collect();
        self.with_library(name, &symbols)
    }

    pub fn stats(&self) -> Arc<LoaderStats> {
        Arc::clone(&self.stats)
    }
}

impl SymbolLoader for FakeLoader {
    fn open(&self, name: &str) -> Result<Box<dyn SymbolLibrary>, String> {
        let symbols = self
            .libraries
            .get(name)
            .ok_or_else(|| format!("{name}: cannot open shared object file"))?;
        self.stats.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeLibrary {
            symbols: symbols.clone(),
            stats: Arc::clone(&self.stats),
        }))
    }
}

struct FakeLibrary {
    symbols: Vec<&'static str>,
    stats: Arc<LoaderStats>,
}

impl SymbolLibrary for FakeLibrary {
    fn resolve(&self, symbol: &str) -> Option<RawSymbol> {
        self.stats.resolves.fetch_add(1, Ordering::SeqCst);
        if self.symbols.contains(&symbol) {
            RawSymbol::new(fake_entry as *const () as *mut c_void)
        } else {
            None
        }
    }
}

impl Drop for FakeLibrary {
    fn drop(&mut self) {
        self.stats.closes.fetch_add(1, Ordering::SeqCst);
    }
}
