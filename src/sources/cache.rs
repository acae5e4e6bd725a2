use std::{fs, io::Write, path::{Path, PathBuf}};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

/// Opaque, process-local cache of raw fetch responses, keyed by a digest of
/// the request.  Staleness is accepted: there is no consistency guarantee
/// across runs, only saved round-trips.
#[derive(Debug)]
pub struct FetchCache {
    dir: PathBuf,
}

impl FetchCache {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("[sources::cache] Failed to create {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn path_for(&self, request: &str) -> PathBuf {
        let digest = Sha256::digest(request.as_bytes());
        self.dir.join(format!("{}.json", hex::encode(digest)))
    }

    pub fn get(&self, request: &str) -> Option<String> {
        fs::read_to_string(self.path_for(request)).ok()
    }

    /// Store a response body, atomically (write-then-rename).  Failures are
    /// reported but a cache write error never has to abort a fetch.
    pub fn put(&self, request: &str, body: &str) -> Result<()> {
        let target = self.path_for(request);
        let mut tmp = NamedTempFile::new_in(&self.dir)
            .context("[sources::cache] Failed to create temp file")?;
        tmp.write_all(body.as_bytes())
            .context("[sources::cache] Failed to write cache entry")?;
        tmp.persist(&target)
            .with_context(|| format!("[sources::cache] Failed to persist {}", target.display()))?;
        Ok(())
    }
}
