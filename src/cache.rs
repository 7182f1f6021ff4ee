use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;

use crate::data::loader;
use crate::data::model::{PeakList, ReferenceLibrary};
use crate::error::Error;

// ---------------------------------------------------------------------------
// Read-through file cache
// ---------------------------------------------------------------------------

/// Read-through cache for loaded data files, keyed by source path.
///
/// Loaded data is held behind `Arc` and treated as immutable for the rest of
/// the process; repeated requests for the same path hand out the same
/// snapshot. There is no invalidation: the model is single-threaded
/// request/response with no writer after initial load.
#[derive(Default)]
pub struct DataCache {
    libraries: HashMap<PathBuf, Arc<ReferenceLibrary>>,
    peak_lists: HashMap<PathBuf, Arc<PeakList>>,
}

impl DataCache {
    pub fn new() -> Self {
        DataCache::default()
    }

    /// Fetch the reference library at `path`, loading it on first access.
    pub fn library(&mut self, path: &Path) -> Result<Arc<ReferenceLibrary>, Error> {
        let key = cache_key(path);
        if let Some(library) = self.libraries.get(&key) {
            debug!("reference cache hit: {}", key.display());
            return Ok(Arc::clone(library));
        }

        debug!("reference cache miss: {}", key.display());
        let library = Arc::new(loader::load_reference_csv(path)?);
        self.libraries.insert(key, Arc::clone(&library));
        Ok(library)
    }

    /// Fetch the sample peak list at `path`, loading it on first access.
    pub fn peak_list(&mut self, path: &Path) -> Result<Arc<PeakList>, Error> {
        let key = cache_key(path);
        if let Some(list) = self.peak_lists.get(&key) {
            debug!("peak list cache hit: {}", key.display());
            return Ok(Arc::clone(list));
        }

        debug!("peak list cache miss: {}", key.display());
        let list = Arc::new(loader::load_sample(path)?);
        self.peak_lists.insert(key, Arc::clone(&list));
        Ok(list)
    }
}

/// Canonical cache key. Falls back to the verbatim path when the file cannot
/// be canonicalized; the subsequent load then reports the real error.
fn cache_key(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
