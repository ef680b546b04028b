//! Marker store: the only state carried between hook invocations.
//!
//! Each marker is a small file whose existence is the signal. Markers live in
//! one directory per namespace under the store root and are named by a fixed
//! prefix plus a short hash of the identity they describe (a transcript path,
//! a working directory, a governed file name).
//!
//! Lifecycle: a namespace directory is created on first write. Markers are
//! deleted only by the two-phase gates that consume them; everything else is
//! left for the host to clean up with its temp area.

use crate::core::classify::normalize;
use crate::core::error::GateError;
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use ulid::Ulid;

const KEY_HEX_LEN: usize = 12;

/// Marker namespace discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    /// Session-end audit already reported for this transcript.
    AuditFired,
    /// Retrospective audit already reported for this transcript.
    RetroFired,
    /// Code files were edited in this working directory.
    CodeEdits,
    /// A test command ran in this working directory.
    TestsRun,
    /// The agent was warned about editing this governed file kind.
    GovernedWarned,
}

impl Namespace {
    pub fn dir_name(self) -> &'static str {
        match self {
            Namespace::AuditFired => "hookgate-stop-audit",
            Namespace::RetroFired => "hookgate-stop-retro",
            Namespace::CodeEdits | Namespace::TestsRun => "hookgate-tdd-markers",
            Namespace::GovernedWarned => "hookgate-knowledge-arch",
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            Namespace::AuditFired | Namespace::RetroFired => "fired-",
            Namespace::CodeEdits => "code-edits-",
            Namespace::TestsRun => "tests-run-",
            Namespace::GovernedWarned => "warned-",
        }
    }
}

/// Deterministic short digest of a normalized identity string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MarkerKey(String);

impl MarkerKey {
    pub fn derive(identity: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(normalize(identity));
        let digest = format!("{:x}", hasher.finalize());
        MarkerKey(digest[..KEY_HEX_LEN].to_string())
    }

    pub fn for_path(path: &Path) -> Self {
        Self::derive(&path.to_string_lossy())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Filesystem-backed marker store.
#[derive(Debug, Clone)]
pub struct MarkerStore {
    /// Directory holding one subdirectory per namespace.
    pub root: PathBuf,
}

impl MarkerStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn marker_path(&self, ns: Namespace, key: &MarkerKey) -> PathBuf {
        self.root
            .join(ns.dir_name())
            .join(format!("{}{}", ns.prefix(), key.as_str()))
    }

    /// Whether the marker exists. Storage errors read as absent.
    pub fn exists(&self, ns: Namespace, key: &MarkerKey) -> bool {
        let path = self.marker_path(ns, key);
        match path.try_exists() {
            Ok(found) => found,
            Err(e) => {
                tracing::debug!("marker lookup failed at {}: {}", path.display(), e);
                false
            }
        }
    }

    /// Marker content, if the marker exists and is readable.
    pub fn read(&self, ns: Namespace, key: &MarkerKey) -> Option<String> {
        fs::read_to_string(self.marker_path(ns, key)).ok()
    }

    /// Create or overwrite a marker. The write goes to a sibling temp file and
    /// is renamed into place, so concurrent readers never see a partial marker.
    pub fn set(&self, ns: Namespace, key: &MarkerKey, value: &str) -> Result<(), GateError> {
        let path = self.marker_path(ns, key);
        let dir = self.root.join(ns.dir_name());
        let store_err = |source: io::Error| GateError::StoreError {
            path: path.clone(),
            source,
        };
        fs::create_dir_all(&dir).map_err(store_err)?;
        let tmp = dir.join(format!(".{}{}.{}.tmp", ns.prefix(), key.as_str(), Ulid::new()));
        fs::write(&tmp, value).map_err(store_err)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(store_err(e));
        }
        tracing::debug!("marker set: {}", path.display());
        Ok(())
    }

    /// Remove a marker. A marker that is already gone counts as removed.
    pub fn delete(&self, ns: Namespace, key: &MarkerKey) -> Result<(), GateError> {
        let path = self.marker_path(ns, key);
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!("marker deleted: {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(GateError::StoreError { path, source }),
        }
    }

    /// Delete a marker, logging instead of failing.
    pub fn delete_or_log(&self, ns: Namespace, key: &MarkerKey) {
        if let Err(e) = self.delete(ns, key) {
            tracing::debug!("{}", e);
        }
    }
}
