//! Artifact storage service
//!
//! Generated images and videos live in one shared directory. Every task
//! allocates its own collision-free file name and only ever touches that
//! name. Writes are durable before a URL is handed out, and clearing the
//! directory is serialised against in-flight tasks through [`TaskGuard`].

use chrono::Utc;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{RwLock, RwLockReadGuard};

/// URL prefix artifacts are served under
pub const ARTIFACT_URL_PREFIX: &str = "/artifacts";

/// Suffix of in-progress writes; such files are never referenced
const PARTIAL_SUFFIX: &str = ".part";

/// Names tried before giving up on publishing one artifact
const MAX_PUBLISH_ATTEMPTS: usize = 10_000;

/// Errors raised by the artifact store
#[derive(Error, Debug)]
pub enum StorageError {
    /// Filesystem operation failed
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path involved
        path: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// The name is not a plain artifact file name
    #[error("Invalid artifact name: {0}")]
    InvalidName(String),

    /// No artifact with this name was created by this process
    #[error("Artifact not found: {0}")]
    NotFound(String),
}

impl StorageError {
    fn io(path: &Path, source: io::Error) -> Self {
        StorageError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// What an artifact contains; decides its file name prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Generated or edited image
    Image,
    /// Generated video
    Video,
    /// Generated copy text (JSON)
    Text,
}

impl ArtifactKind {
    fn prefix(self) -> &'static str {
        match self {
            ArtifactKind::Image => "pop_image",
            ArtifactKind::Video => "pop_video",
            ArtifactKind::Text => "pop_text",
        }
    }
}

/// A persisted artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// File name inside the artifact directory
    pub name: String,
    /// Absolute or configured path on disk
    pub path: PathBuf,
    /// URL the artifact is served under
    pub url: String,
}

/// Shared guard held by a task for its whole lifetime
pub type TaskGuard<'a> = RwLockReadGuard<'a, ()>;

/// Shared artifact directory
pub struct ArtifactStore {
    root: PathBuf,
    /// Tasks hold a read guard; clearing takes the write guard
    gate: RwLock<()>,
    /// Names created by this process
    owned: Mutex<HashSet<String>>,
    /// Last timestamp handed out, in milliseconds
    last_stamp: AtomicI64,
}

impl ArtifactStore {
    /// Open (and create if needed) the artifact directory
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|e| StorageError::io(&root, e))?;

        Ok(Self {
            root,
            gate: RwLock::new(()),
            owned: Mutex::new(HashSet::new()),
            last_stamp: AtomicI64::new(0),
        })
    }

    /// Directory artifacts are written to
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Mark the start of a task; clearing waits until the guard is dropped
    pub async fn begin_task(&self) -> TaskGuard<'_> {
        self.gate.read().await
    }

    /// Strictly increasing millisecond timestamp
    fn next_stamp(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let next = |prev: i64| now.max(prev + 1);
        match self
            .last_stamp
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |prev| Some(next(prev)))
        {
            Ok(prev) | Err(prev) => next(prev),
        }
    }

    /// Allocate a file name that no other call in this process can receive
    pub fn allocate_name(&self, kind: ArtifactKind, variant: Option<&str>, extension: &str) -> String {
        format!(
            "{}_{}_{}.{}",
            kind.prefix(),
            sanitize_label(variant),
            self.next_stamp(),
            extension
        )
    }

    /// Durably write bytes under a freshly allocated name
    ///
    /// The data is written to a `.part` file, flushed and synced, then
    /// linked into place. Linking never replaces an existing file: a name
    /// already taken on disk (by an earlier run or another process) is
    /// skipped and a fresh one allocated. The artifact is only registered
    /// (and its URL returned) once it is published.
    pub async fn persist(
        &self,
        kind: ArtifactKind,
        variant: Option<&str>,
        extension: &str,
        bytes: &[u8],
    ) -> Result<Artifact, StorageError> {
        let first_name = self.allocate_name(kind, variant, extension);
        let partial = self.root.join(format!("{}{}", first_name, PARTIAL_SUFFIX));

        if let Err(e) = write_durably(&partial, bytes).await {
            let _ = fs::remove_file(&partial).await;
            return Err(StorageError::io(&partial, e));
        }

        let published = self.publish(&partial, first_name, kind, variant, extension).await;
        let _ = fs::remove_file(&partial).await;
        let (name, path) = published?;

        self.owned_names().insert(name.clone());

        tracing::debug!(
            artifact = %name,
            size = bytes.len(),
            "Artifact persisted"
        );

        Ok(Artifact {
            url: format!("{}/{}", ARTIFACT_URL_PREFIX, name),
            name,
            path,
        })
    }

    /// Map a client-supplied path or URL to an owned artifact name
    ///
    /// Accepts `/artifacts/<name>`, `artifacts/<name>` or a bare name,
    /// optionally followed by a query string.
    pub fn resolve(&self, reference: &str) -> Result<String, StorageError> {
        let without_query = reference.split(['?', '#']).next().unwrap_or_default();
        let trimmed = without_query.trim().trim_start_matches('/');
        let segment = format!("{}/", ARTIFACT_URL_PREFIX.trim_start_matches('/'));
        let name = trimmed.strip_prefix(segment.as_str()).unwrap_or(trimmed);

        if name.is_empty()
            || name.contains(['/', '\\'])
            || name.starts_with('.')
            || name.ends_with(PARTIAL_SUFFIX)
        {
            return Err(StorageError::InvalidName(reference.to_string()));
        }
        if !self.owned_names().contains(name) {
            return Err(StorageError::NotFound(name.to_string()));
        }

        Ok(name.to_string())
    }

    /// Read an owned artifact back
    pub async fn read(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let name = self.resolve(name)?;
        let path = self.root.join(&name);
        fs::read(&path).await.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound(name),
            _ => StorageError::io(&path, e),
        })
    }

    /// Remove every file in the artifact directory
    ///
    /// Waits for all in-flight tasks to finish. Leftover partial writes
    /// from abandoned tasks are removed like any other file. Returns the
    /// number of files deleted; calling it on an empty directory is a no-op.
    pub async fn clear(&self) -> Result<usize, StorageError> {
        let _exclusive = self.gate.write().await;

        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StorageError::io(&self.root, e))?;
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| StorageError::io(&self.root, e))?;

        let mut removed = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::io(&self.root, e))?
        {
            let path = entry.path();
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| StorageError::io(&path, e))?;
            if !file_type.is_file() {
                continue;
            }
            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(StorageError::io(&path, e)),
            }
        }

        self.owned_names().clear();

        tracing::info!(
            dir = %self.root.display(),
            removed = removed,
            "Cleared artifact directory"
        );
        Ok(removed)
    }

    /// Hard-link `partial` under `name`, allocating a new name on collision
    async fn publish(
        &self,
        partial: &Path,
        mut name: String,
        kind: ArtifactKind,
        variant: Option<&str>,
        extension: &str,
    ) -> Result<(String, PathBuf), StorageError> {
        for _ in 0..MAX_PUBLISH_ATTEMPTS {
            let path = self.root.join(&name);
            match fs::hard_link(partial, &path).await {
                Ok(()) => return Ok((name, path)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    tracing::debug!(artifact = %name, "Artifact name already taken on disk");
                    name = self.allocate_name(kind, variant, extension);
                }
                Err(e) => return Err(StorageError::io(&path, e)),
            }
        }
        Err(StorageError::io(
            &self.root.join(&name),
            io::Error::new(
                io::ErrorKind::AlreadyExists,
                "no free artifact name after repeated collisions",
            ),
        ))
    }

    fn owned_names(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        // The set is only mutated by single inserts/clears; a poisoned lock
        // still holds a consistent set.
        self.owned.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

async fn write_durably(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await
}

/// Reduce a variant label to `[A-Za-z0-9_-]`, defaulting to "default"
pub fn sanitize_label(variant: Option<&str>) -> String {
    let cleaned: String = variant
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        "default".to_string()
    } else {
        cleaned
    }
}

/// File extension for image bytes, based on their signature
pub fn image_extension(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "jpg"
    } else if bytes.starts_with(b"RIFF") && bytes.get(8..12) == Some(b"WEBP") {
        "webp"
    } else {
        "png"
    }
}
