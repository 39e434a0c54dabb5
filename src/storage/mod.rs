use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod github;
pub mod local;

pub use github::GithubStore;
pub use local::LocalStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("conflict on {0}: the document changed or already exists")]
    Conflict(String),
    #[error("storage backend refused the credentials")]
    Unauthorized,
    #[error("storage backend answered {status}: {message}")]
    Http { status: u16, message: String },
    #[error("error talking to the storage backend: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("could not decode {0}")]
    Decode(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Committer {
    pub name: String,
    pub email: String,
}

impl Committer {
    pub fn new(name: Option<&str>, email: Option<&str>) -> Self {
        let name = name.filter(|n| !n.is_empty()).unwrap_or("Anonymous");
        let email = email.filter(|e| !e.is_empty()).unwrap_or("anonymous@example.com");
        Committer {
            name: name.to_string(),
            email: email.to_string(),
        }
    }
}

impl Default for Committer {
    fn default() -> Self {
        Committer::new(None, None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEntry {
    pub name: String,
    pub path: String,
    pub sha: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub name: String,
    pub path: String,
    /// Version token, required to replace or delete the file
    pub sha: String,
    pub content: String,
}

pub struct WriteRequest<'a> {
    pub path: &'a str,
    pub content: &'a str,
    pub message: &'a str,
    /// None creates the file and fails if it already exists
    pub sha: Option<&'a str>,
    pub committer: &'a Committer,
}

pub struct DeleteRequest<'a> {
    pub path: &'a str,
    pub message: &'a str,
    pub sha: &'a str,
    pub committer: &'a Committer,
}

/// A versioned document store. Every replace or delete must name the version it expects.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn list(&self, dir: &str) -> StoreResult<Vec<StoreEntry>>;

    async fn read(&self, path: &str) -> StoreResult<StoredFile>;

    /// Returns the version token of the new content.
    async fn write(&self, request: WriteRequest<'_>) -> StoreResult<String>;

    async fn delete(&self, request: DeleteRequest<'_>) -> StoreResult<()>;
}

pub fn join_path(dir: &str, name: &str) -> String {
    let dir = dir.trim_matches('/');
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}
