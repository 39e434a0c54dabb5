use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use spdlog::{info, warn};
use thiserror::Error;

use crate::content::frontmatter::{compose, extract_title, parse};
use crate::content::slug::generate_slug;
use crate::content::{is_post_file, slug_from_file_name, Frontmatter, FrontmatterError};
use crate::storage::{join_path, Committer, ContentStore, DeleteRequest, StoreError, WriteRequest};

#[derive(Debug, Error)]
pub enum PostError {
    #[error(transparent)]
    Frontmatter(#[from] FrontmatterError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

pub type PostResult<T> = Result<T, PostError>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlogPost {
    pub slug: String,
    pub frontmatter: Frontmatter,
    pub content: String,
    pub sha: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ListOptions {
    pub include_drafts: bool,
    pub sort: SortOrder,
}

/// What an author supplies when writing a new post.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPost {
    #[serde(default)]
    pub slug: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_draft")]
    pub draft: bool,
    pub content: String,
}

fn default_draft() -> bool {
    true
}

/// Posts are markdown documents in a single directory of a [`ContentStore`].
pub struct PostRepository {
    store: Arc<dyn ContentStore>,
    posts_dir: String,
}

impl PostRepository {
    pub fn new(store: Arc<dyn ContentStore>, posts_dir: &str) -> Self {
        PostRepository {
            store,
            posts_dir: posts_dir.trim_matches('/').to_string(),
        }
    }

    fn post_path(&self, slug: &str) -> String {
        join_path(&self.posts_dir, &format!("{}.md", slug))
    }

    /// Fetches every post. A post that cannot be read or parsed is logged and left out.
    pub async fn list_posts(&self, options: ListOptions) -> PostResult<Vec<BlogPost>> {
        let entries = self.store.list(&self.posts_dir).await?;
        let reads = entries.iter()
            .filter(|entry| is_post_file(&entry.name))
            .map(|entry| self.fetch(&entry.path));

        let mut posts = vec![];
        for res in join_all(reads).await {
            match res {
                Ok(post) => posts.push(post),
                Err(e) => warn!("Skipping post while listing: {}", e),
            }
        }

        if !options.include_drafts {
            posts.retain(|post| !post.frontmatter.draft);
        }
        sort_by_date(&mut posts, options.sort);

        Ok(posts)
    }

    async fn fetch(&self, path: &str) -> PostResult<BlogPost> {
        let file = self.store.read(path).await?;
        let parsed = match parse(&file.content) {
            Ok(parsed) => parsed,
            Err(e) => {
                let title = extract_title(&file.content);
                if !title.is_empty() {
                    warn!("Post '{}' at {} has an invalid frontmatter", title, path);
                }
                return Err(e.into());
            }
        };
        let slug = slug_from_file_name(&file.name).unwrap_or(&file.name).to_string();

        Ok(BlogPost {
            slug,
            frontmatter: parsed.frontmatter,
            content: parsed.content,
            sha: file.sha,
        })
    }

    pub async fn get_post(&self, slug: &str) -> PostResult<BlogPost> {
        check_slug(slug)?;
        self.fetch(&self.post_path(slug)).await
    }

    pub async fn create_post(&self, new_post: NewPost, committer: &Committer) -> PostResult<String> {
        let slug = match new_post.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(slug) => slug.to_string(),
            None => generate_slug(&new_post.title),
        };
        check_slug(&slug)?;
        if new_post.title.trim().is_empty() || new_post.content.trim().is_empty() {
            return Err(PostError::InvalidRequest("title and content are required".to_string()));
        }

        let frontmatter = Frontmatter {
            title: new_post.title,
            date: String::new(),
            draft: new_post.draft,
            tag: new_post.tags.into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            description: new_post.description,
            subtitle: new_post.subtitle,
        };

        let document = checked_document(&frontmatter, &new_post.content)?;
        let path = self.post_path(&slug);
        let message = format!("Add new post: {}", slug);
        self.store.write(WriteRequest {
            path: &path,
            content: &document,
            message: &message,
            sha: None,
            committer,
        }).await?;

        info!("Post {} created by {}", slug, committer.name);
        Ok(slug)
    }

    /// Replaces the whole document. `sha` must be the version the edit started from.
    pub async fn update_post(&self, slug: &str, frontmatter: &Frontmatter, content: &str, sha: &str, committer: &Committer) -> PostResult<String> {
        check_slug(slug)?;
        if content.trim().is_empty() || sha.is_empty() {
            return Err(PostError::InvalidRequest("content and sha are required".to_string()));
        }

        let document = checked_document(frontmatter, content)?;
        let path = self.post_path(slug);
        let message = format!("Update post: {}", slug);
        let new_sha = self.store.write(WriteRequest {
            path: &path,
            content: &document,
            message: &message,
            sha: Some(sha),
            committer,
        }).await?;

        info!("Post {} updated by {}", slug, committer.name);
        Ok(new_sha)
    }

    pub async fn delete_post(&self, slug: &str, sha: &str, committer: &Committer) -> PostResult<()> {
        check_slug(slug)?;
        if sha.is_empty() {
            return Err(PostError::InvalidRequest("sha is required".to_string()));
        }

        let path = self.post_path(slug);
        let message = format!("Delete post: {}", slug);
        self.store.delete(DeleteRequest {
            path: &path,
            message: &message,
            sha,
            committer,
        }).await?;

        info!("Post {} deleted by {}", slug, committer.name);
        Ok(())
    }

    /// Stores an already written document under `slug`, creating or replacing it.
    /// The document has to pass the frontmatter parser first.
    pub async fn publish(&self, slug: &str, document: &str, committer: &Committer) -> PostResult<String> {
        check_slug(slug)?;
        parse(document)?;

        let path = self.post_path(slug);
        let current_sha = match self.store.read(&path).await {
            Ok(file) => Some(file.sha),
            Err(StoreError::NotFound(_)) => None,
            Err(e) => return Err(e.into()),
        };
        let message = match current_sha {
            Some(_) => format!("Update post: {}", slug),
            None => format!("Add new post: {}", slug),
        };

        let sha = self.store.write(WriteRequest {
            path: &path,
            content: document,
            message: &message,
            sha: current_sha.as_deref(),
            committer,
        }).await?;

        info!("{} by {}", message, committer.name);
        Ok(sha)
    }

    /// Flips the draft flag of the stored post and returns the new value.
    pub async fn toggle_draft(&self, slug: &str, committer: &Committer) -> PostResult<bool> {
        let post = self.get_post(slug).await?;
        let mut frontmatter = post.frontmatter;
        frontmatter.draft = !frontmatter.draft;

        let document = checked_document(&frontmatter, &post.content)?;
        let path = self.post_path(slug);
        let message = format!("Toggle draft status for {}.md", slug);
        self.store.write(WriteRequest {
            path: &path,
            content: &document,
            message: &message,
            sha: Some(&post.sha),
            committer,
        }).await?;

        info!("Post {} draft={} by {}", slug, frontmatter.draft, committer.name);
        Ok(frontmatter.draft)
    }
}

// Rejects metadata that would serialize into a block the parser cannot read back,
// such as a title or description holding a `---` line.
fn checked_document(frontmatter: &Frontmatter, content: &str) -> PostResult<String> {
    let document = compose(frontmatter, content);
    match parse(&document) {
        Ok(_) => Ok(document),
        Err(e) => Err(PostError::InvalidRequest(format!("metadata cannot be stored: {}", e))),
    }
}

fn check_slug(slug: &str) -> PostResult<()> {
    let valid = !slug.is_empty()
        && !slug.contains('/')
        && !slug.contains('\\')
        && !slug.starts_with('.');
    if valid {
        Ok(())
    } else {
        Err(PostError::InvalidRequest(format!("invalid slug '{}'", slug)))
    }
}

/// Dates are free text. Whatever parses as a date or date-time sorts by time,
/// anything else sorts before them, ordered by its text.
fn date_key(date: &str) -> Option<NaiveDateTime> {
    let date = date.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt);
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(date) {
        return Some(dt.naive_utc());
    }
    date.get(..10)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn compare_dates(a: &str, b: &str) -> Ordering {
    match (date_key(a), date_key(b)) {
        (Some(da), Some(db)) => da.cmp(&db),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

pub fn sort_by_date(posts: &mut [BlogPost], order: SortOrder) {
    posts.sort_by(|a, b| {
        let ord = compare_dates(&a.frontmatter.date, &b.frontmatter.date);
        match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
}

/// Tags with the number of posts using them, most used first.
pub fn tag_counts(posts: &[BlogPost]) -> Vec<(String, usize)> {
    let mut tag_map: HashMap<&str, usize> = HashMap::new();
    for post in posts {
        for tag in post.frontmatter.tag.iter() {
            *tag_map.entry(tag.as_str()).or_insert(0) += 1;
        }
    }

    let mut tag_list: Vec<(String, usize)> = tag_map.into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    tag_list.sort_by(|(ta, ca), (tb, cb)| cb.cmp(ca).then_with(|| ta.cmp(tb)));
    tag_list
}

pub fn filter_by_tag(posts: Vec<BlogPost>, tag: &str) -> Vec<BlogPost> {
    posts.into_iter()
        .filter(|post| post.frontmatter.tag.iter().any(|t| t == tag))
        .collect()
}
