use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::json;

use crate::content::Frontmatter;

// Unreserved characters of RFC 3986 stay as they are
const SLUG_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// Link to a post page. `base_url` may be empty for a site relative link.
pub fn post_url(base_url: &str, slug: &str) -> String {
    format!("{}/posts/{}", base_url.trim_end_matches('/'), utf8_percent_encode(slug, SLUG_SEGMENT))
}

/// The post description, or a generic one built from the title.
pub fn description_of(frontmatter: &Frontmatter) -> String {
    match frontmatter.description.as_deref().map(str::trim) {
        Some(description) if !description.is_empty() => description.to_string(),
        _ => format!("A post about {}.", frontmatter.title),
    }
}

/// schema.org `BlogPosting` document, ready to embed in a `<script type="application/ld+json">`.
pub fn blog_posting_json_ld(frontmatter: &Frontmatter, author_name: &str, url: &str) -> String {
    let doc = json!({
        "@context": "https://schema.org",
        "@type": "BlogPosting",
        "headline": frontmatter.title,
        "description": description_of(frontmatter),
        "datePublished": frontmatter.date,
        "dateModified": frontmatter.date,
        "url": url,
        "author": {
            "@type": "Person",
            "name": author_name,
        },
        "publisher": {
            "@type": "Person",
            "name": author_name,
        },
        "keywords": frontmatter.tag.join(", "),
    });

    // A closing script tag inside a string would end the element early
    doc.to_string().replace("</", "<\\/")
}

pub fn robots_txt(site_url: &str) -> String {
    format!("User-agent: *\nAllow: /\nDisallow: /api/\n\nSitemap: {}/sitemap.xml\n", site_url.trim_end_matches('/'))
}
