pub mod slug;
pub mod headings;
pub mod frontmatter;
pub mod markdown_renderer;

pub use frontmatter::{Frontmatter, FrontmatterError, ParsedPost};
pub use headings::Heading;

/// Extensions of the files holding posts.
pub const POST_EXTENSIONS: [&str; 2] = [".md", ".mdx"];

/// The slug of a post is its file name without the markdown extension.
pub fn slug_from_file_name(file_name: &str) -> Option<&str> {
    POST_EXTENSIONS.iter()
        .find_map(|ext| file_name.strip_suffix(ext))
        .filter(|slug| !slug.is_empty())
}

pub fn is_post_file(file_name: &str) -> bool {
    slug_from_file_name(file_name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_from_file_name() {
        assert_eq!(slug_from_file_name("hello-world.md"), Some("hello-world"));
        assert_eq!(slug_from_file_name("react-hook.mdx"), Some("react-hook"));
        assert_eq!(slug_from_file_name("notes.txt"), None);
        assert_eq!(slug_from_file_name(".md"), None);
        assert!(!is_post_file("README"));
    }
}
