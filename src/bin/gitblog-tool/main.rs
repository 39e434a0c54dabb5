use std::fmt::{Display, Formatter};

use anyhow::Result;
use clap::{Parser, ValueEnum};

use crate::bootstrap::bootstrap_cmd;
use crate::post::new_post_cmd;
use crate::publish::publish_cmd;

mod bootstrap;
mod decompress;
mod post;
mod publish;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
enum Args {
    /// Bootstrap a new blog
    Bootstrap(BootstrapArgs),
    /// Write a new post document
    New(NewPostArgs),
    /// Send a post document to the configured storage
    Publish(PublishArgs),
}

#[derive(Parser, Debug)]
struct BootstrapArgs {
    /// Directory where the new blog will be generated
    #[arg(short, long)]
    out_dir: String,
}

#[derive(Parser, Debug)]
struct NewPostArgs {
    /// Title of the post
    #[arg(short, long)]
    title: String,

    #[arg(short, long)]
    description: Option<String>,

    /// Comma separated list of tags
    #[arg(long)]
    tags: Option<String>,

    /// Create the post as a draft
    #[arg(long)]
    draft: bool,

    #[arg(short, long, default_value_t = PostOutput::Stdout)]
    output: PostOutput,
}

#[derive(Parser, Debug)]
struct PublishArgs {
    /// Markdown file with the post
    #[arg(short, long)]
    file: String,

    /// Slug of the post. Defaults to the file name
    #[arg(short, long)]
    slug: Option<String>,

    /// Committer name. If empty, OS user real name is being used
    #[arg(short, long)]
    name: Option<String>,

    #[arg(short, long)]
    email: Option<String>,

    /// Config path
    #[arg(short, long)]
    config_path: Option<String>,
}

#[derive(Clone, Debug, ValueEnum)]
enum PostOutput {
    /// Writes the new post content to the stdout
    Stdout,
    /// Writes the new post content to `<slug>.md`
    File,
}

impl Display for PostOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PostOutput::Stdout => write!(f, "stdout"),
            PostOutput::File => write!(f, "file"),
        }
    }
}

#[ntex::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    match args {
        Args::Bootstrap(args) => bootstrap_cmd(args),
        Args::New(args) => new_post_cmd(args),
        Args::Publish(args) => publish_cmd(args).await,
    }
}
