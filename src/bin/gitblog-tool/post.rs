use std::fs::OpenOptions;
use std::io::Write;

use anyhow::{bail, Context, Result};

use gitblog::content::frontmatter::compose;
use gitblog::content::slug::generate_slug;
use gitblog::content::Frontmatter;

use crate::{NewPostArgs, PostOutput};

const BODY_STUB: &str = "## Introduction\n\nThis is a body example.\nPlease remove it and replace with your content.\n";

fn split_tags(tags: Option<&str>) -> Vec<String> {
    tags.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

fn render_post(args: &NewPostArgs) -> String {
    let frontmatter = Frontmatter {
        title: args.title.trim().to_string(),
        date: String::new(),
        draft: args.draft,
        tag: split_tags(args.tags.as_deref()),
        description: args.description.clone(),
        subtitle: None,
    };
    compose(&frontmatter, BODY_STUB)
}

pub fn new_post_cmd(args: NewPostArgs) -> Result<()> {
    if args.title.trim().is_empty() {
        bail!("Title is required");
    }
    let document = render_post(&args);

    match args.output {
        PostOutput::Stdout => print!("{}", document),
        PostOutput::File => {
            let slug = generate_slug(&args.title);
            if slug.is_empty() {
                bail!("Cannot derive a file name from the title '{}'", args.title);
            }
            let file_name = format!("{}.md", slug);
            println!("Creating file {}", file_name);
            let mut file = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&file_name)
                .with_context(|| format!("Error creating {}", file_name))?;
            file.write_all(document.as_bytes())?;
        }
    };

    Ok(())
}
