use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use spdlog::info;

use crate::storage::{ContentStore, DeleteRequest, StoreEntry, StoreError, StoreResult, StoredFile, WriteRequest};

/// Posts kept in a local directory. Useful for writing offline and for tests.
pub struct LocalStore {
    root_dir: PathBuf,
    // Serializes check-then-write so two writers cannot both pass the version check
    write_lock: Mutex<()>,
}

/// blake3 hex digest of the content. Stable across builds, so clients may keep it.
pub fn version_of(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_hex().to_string()
}

impl LocalStore {
    pub fn new(root_dir: PathBuf) -> Self {
        LocalStore {
            root_dir,
            write_lock: Mutex::new(()),
        }
    }

    fn resolve(&self, path: &str) -> StoreResult<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        let escapes = relative.components().any(|c| !matches!(c, Component::Normal(_)));
        if escapes {
            return Err(StoreError::NotFound(path.to_string()));
        }
        Ok(self.root_dir.join(relative))
    }

    fn read_existing(&self, path: &str) -> StoreResult<Option<String>> {
        let full_path = self.resolve(path)?;
        match fs::read_to_string(&full_path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ContentStore for LocalStore {
    async fn list(&self, dir: &str) -> StoreResult<Vec<StoreEntry>> {
        let full_dir = self.resolve(dir)?;
        let entries = match fs::read_dir(&full_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StoreError::NotFound(dir.to_string())),
            Err(e) => return Err(e.into()),
        };

        let mut files = vec![];
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(|s| s.to_string()) else {
                continue;
            };
            let content = fs::read_to_string(entry.path())?;
            files.push(StoreEntry {
                path: crate::storage::join_path(dir, &name),
                name,
                sha: version_of(&content),
            });
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(files)
    }

    async fn read(&self, path: &str) -> StoreResult<StoredFile> {
        let content = self.read_existing(path)?
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        let name = Path::new(path).file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(path)
            .to_string();

        Ok(StoredFile {
            name,
            path: path.to_string(),
            sha: version_of(&content),
            content,
        })
    }

    async fn write(&self, request: WriteRequest<'_>) -> StoreResult<String> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let current = self.read_existing(request.path)?;
        match (current.as_deref(), request.sha) {
            (None, None) => {}
            (Some(existing), Some(sha)) if version_of(existing) == sha => {}
            _ => return Err(StoreError::Conflict(request.path.to_string())),
        }

        let full_path = self.resolve(request.path)?;
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&full_path, request.content)?;
        info!("{} <{}>: {}", request.committer.name, request.committer.email, request.message);

        Ok(version_of(request.content))
    }

    async fn delete(&self, request: DeleteRequest<'_>) -> StoreResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let current = self.read_existing(request.path)?
            .ok_or_else(|| StoreError::NotFound(request.path.to_string()))?;
        if version_of(&current) != request.sha {
            return Err(StoreError::Conflict(request.path.to_string()));
        }

        fs::remove_file(self.resolve(request.path)?)?;
        info!("{} <{}>: {}", request.committer.name, request.committer.email, request.message);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use crate::storage::Committer;

    use super::*;

    fn store() -> (TempDir, LocalStore) {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path().to_path_buf());
        (dir, store)
    }

    fn write_req<'a>(path: &'a str, content: &'a str, sha: Option<&'a str>, committer: &'a Committer) -> WriteRequest<'a> {
        WriteRequest { path, content, message: "test", sha, committer }
    }

    #[test]
    fn test_version_is_content_digest() {
        let version = version_of("hello");
        assert_eq!(version.len(), 64);
        assert!(version.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(version, version_of("hello"));
        assert_ne!(version, version_of("hello\n"));
    }

    #[ntex::test]
    async fn test_create_read_list() {
        let (_dir, store) = store();
        let committer = Committer::default();

        let sha = store.write(write_req("posts/a.md", "hello", None, &committer)).await.unwrap();
        let file = store.read("posts/a.md").await.unwrap();
        assert_eq!(file.content, "hello");
        assert_eq!(file.name, "a.md");
        assert_eq!(file.sha, sha);

        let entries = store.list("posts").await.unwrap();
        assert_eq!(entries, vec![StoreEntry { name: "a.md".to_string(), path: "posts/a.md".to_string(), sha }]);
    }

    #[ntex::test]
    async fn test_create_existing_conflicts() {
        let (_dir, store) = store();
        let committer = Committer::default();

        store.write(write_req("posts/a.md", "one", None, &committer)).await.unwrap();
        let res = store.write(write_req("posts/a.md", "two", None, &committer)).await;
        assert!(matches!(res, Err(StoreError::Conflict(_))));
    }

    #[ntex::test]
    async fn test_stale_version_is_rejected() {
        let (_dir, store) = store();
        let committer = Committer::default();

        let first = store.write(write_req("posts/a.md", "one", None, &committer)).await.unwrap();
        let second = store.write(write_req("posts/a.md", "two", Some(first.as_str()), &committer)).await.unwrap();
        assert_ne!(first, second);

        let res = store.write(write_req("posts/a.md", "three", Some(first.as_str()), &committer)).await;
        assert!(matches!(res, Err(StoreError::Conflict(_))));
        assert_eq!(store.read("posts/a.md").await.unwrap().content, "two");

        let res = store.delete(DeleteRequest { path: "posts/a.md", message: "rm", sha: &first, committer: &committer }).await;
        assert!(matches!(res, Err(StoreError::Conflict(_))));
        store.delete(DeleteRequest { path: "posts/a.md", message: "rm", sha: &second, committer: &committer }).await.unwrap();
        assert!(matches!(store.read("posts/a.md").await, Err(StoreError::NotFound(_))));
    }

    #[ntex::test]
    async fn test_paths_cannot_escape_root() {
        let (_dir, store) = store();
        assert!(matches!(store.read("../etc/passwd").await, Err(StoreError::NotFound(_))));
        assert!(matches!(store.list("missing").await, Err(StoreError::NotFound(_))));
    }
}
