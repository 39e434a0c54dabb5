use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use spdlog::debug;

use crate::storage::{ContentStore, DeleteRequest, StoreEntry, StoreError, StoreResult, StoredFile, WriteRequest};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Posts kept in a GitHub repository, accessed through the REST contents API.
pub struct GithubStore {
    client: Client,
    api_url: String,
    owner: String,
    repo: String,
    branch: Option<String>,
    token: String,
}

#[derive(Deserialize)]
struct ContentsEntry {
    name: String,
    path: String,
    sha: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct ContentsDetail {
    name: String,
    path: String,
    sha: String,
    #[serde(default)]
    content: String,
}

#[derive(Serialize)]
struct PutBody<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
    committer: &'a crate::storage::Committer,
}

#[derive(Serialize)]
struct DeleteBody<'a> {
    message: &'a str,
    sha: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
    committer: &'a crate::storage::Committer,
}

#[derive(Deserialize)]
struct PutResponse {
    content: PutContent,
}

#[derive(Deserialize)]
struct PutContent {
    sha: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl GithubStore {
    pub fn new(owner: &str, repo: &str, branch: Option<String>, token: String, api_url: Option<String>) -> Self {
        GithubStore {
            client: Client::new(),
            api_url: api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            owner: owner.to_string(),
            repo: repo.to_string(),
            branch,
            token,
        }
    }

    fn contents_url(&self, path: &str) -> String {
        format!("{}/repos/{}/{}/contents/{}",
                self.api_url.trim_end_matches('/'),
                self.owner,
                self.repo,
                path.trim_start_matches('/'))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", concat!("gitblog/", env!("CARGO_PKG_VERSION")))
    }

    fn get(&self, path: &str) -> RequestBuilder {
        let builder = self.client.get(self.contents_url(path));
        let builder = match self.branch {
            Some(ref branch) => builder.query(&[("ref", branch.as_str())]),
            None => builder,
        };
        self.authorized(builder)
    }

    async fn check(path: &str, response: Response) -> StoreResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.json::<ErrorBody>().await
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| status.to_string());

        Err(match status {
            StatusCode::NOT_FOUND => StoreError::NotFound(path.to_string()),
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => StoreError::Conflict(path.to_string()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Unauthorized,
            _ => StoreError::Http { status: status.as_u16(), message },
        })
    }
}

/// The API wraps base64 payloads every 60 characters.
pub fn decode_content(path: &str, encoded: &str) -> StoreResult<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD.decode(compact.as_bytes())
        .map_err(|e| StoreError::Decode(format!("{}: {}", path, e)))?;
    String::from_utf8(bytes).map_err(|e| StoreError::Decode(format!("{}: {}", path, e)))
}

pub fn encode_content(content: &str) -> String {
    STANDARD.encode(content.as_bytes())
}

#[async_trait]
impl ContentStore for GithubStore {
    async fn list(&self, dir: &str) -> StoreResult<Vec<StoreEntry>> {
        debug!("Listing github contents of {}", dir);
        let response = Self::check(dir, self.get(dir).send().await?).await?;
        let entries: Vec<ContentsEntry> = response.json().await?;

        Ok(entries.into_iter()
            .filter(|e| e.kind == "file")
            .map(|e| StoreEntry { name: e.name, path: e.path, sha: e.sha })
            .collect())
    }

    async fn read(&self, path: &str) -> StoreResult<StoredFile> {
        debug!("Reading github file {}", path);
        let response = Self::check(path, self.get(path).send().await?).await?;
        let detail: ContentsDetail = response.json().await?;
        let content = decode_content(path, &detail.content)?;

        Ok(StoredFile {
            name: detail.name,
            path: detail.path,
            sha: detail.sha,
            content,
        })
    }

    async fn write(&self, request: WriteRequest<'_>) -> StoreResult<String> {
        let body = PutBody {
            message: request.message,
            content: encode_content(request.content),
            sha: request.sha,
            branch: self.branch.as_deref(),
            committer: request.committer,
        };

        let builder = self.authorized(self.client.put(self.contents_url(request.path))).json(&body);
        let response = Self::check(request.path, builder.send().await?).await?;
        let created: PutResponse = response.json().await?;

        Ok(created.content.sha)
    }

    async fn delete(&self, request: DeleteRequest<'_>) -> StoreResult<()> {
        let body = DeleteBody {
            message: request.message,
            sha: request.sha,
            branch: self.branch.as_deref(),
            committer: request.committer,
        };

        let builder = self.authorized(self.client.delete(self.contents_url(request.path))).json(&body);
        Self::check(request.path, builder.send().await?).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contents_url() {
        let store = GithubStore::new("dogma", "blog-posts", None, "token".to_string(), Some("http://localhost:9000/".to_string()));
        assert_eq!(store.contents_url("posts/a.md"), "http://localhost:9000/repos/dogma/blog-posts/contents/posts/a.md");
        assert_eq!(store.contents_url("/posts"), "http://localhost:9000/repos/dogma/blog-posts/contents/posts");
    }

    #[test]
    fn test_decode_wrapped_content() {
        let encoded = encode_content("---\ntitle: \"안녕\"\n---\n");
        let (head, tail) = encoded.split_at(10);
        let wrapped = format!("{}\n{}\n", head, tail);
        assert_eq!(decode_content("a.md", &wrapped).unwrap(), "---\ntitle: \"안녕\"\n---\n");
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(decode_content("a.md", "***"), Err(StoreError::Decode(_))));
    }

    #[test]
    fn test_put_body_shape() {
        let committer = crate::storage::Committer::default();
        let body = PutBody {
            message: "Add new post: a",
            content: encode_content("x"),
            sha: None,
            branch: None,
            committer: &committer,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["content"], "eA==");
        assert!(json.get("sha").is_none());
        assert_eq!(json["committer"]["name"], "Anonymous");
    }
}
