use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use gitblog::config::{locate_config, open_store, read_config, CFG_FILE_NAME};
use gitblog::content::frontmatter::{extract_title, parse};
use gitblog::content::slug_from_file_name;
use gitblog::post_repository::PostRepository;
use gitblog::storage::Committer;
use gitblog::util::os_helper::get_name;

use crate::PublishArgs;

fn slug_of(args: &PublishArgs) -> Result<String> {
    if let Some(ref slug) = args.slug {
        return Ok(slug.clone());
    }

    Path::new(&args.file).file_name()
        .and_then(|name| name.to_str())
        .and_then(slug_from_file_name)
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Cannot derive a slug from {}. Use --slug", args.file))
}

fn invalid_document_message(file: &str, document: &str) -> String {
    match extract_title(document) {
        title if title.is_empty() => format!("{} has no valid frontmatter", file),
        title => format!("{} ('{}') has an incomplete frontmatter. title, date, tag and draft are required", file, title),
    }
}

fn committer_of(args: &PublishArgs) -> Committer {
    let name = args.name.clone().unwrap_or_else(get_name);
    Committer::new(Some(&name), args.email.as_deref())
}

pub async fn publish_cmd(args: PublishArgs) -> Result<()> {
    let document = fs::read_to_string(&args.file)
        .with_context(|| format!("Error reading {}", args.file))?;
    let parsed = parse(&document).with_context(|| invalid_document_message(&args.file, &document))?;
    let slug = slug_of(&args)?;

    let config_path = match args.config_path {
        Some(ref path) => PathBuf::from(path),
        None => locate_config().ok_or_else(|| anyhow!("Could not find {}", CFG_FILE_NAME))?,
    };
    let config = read_config(&config_path)?;
    let store = open_store(&config.storage)?;
    let repository = PostRepository::new(store, &config.storage.posts_dir);

    let committer = committer_of(&args);
    let sha = repository.publish(&slug, &document, &committer).await?;
    println!("Published '{}' as {} (version {})", parsed.frontmatter.title, slug, sha);
    if parsed.frontmatter.draft {
        println!("The post is a draft and will not be listed");
    }

    Ok(())
}
