use std::io;
use std::io::ErrorKind;

use ramhorns::Template;

use crate::config::Site;
use crate::content::markdown_renderer::render_body;
use crate::post_repository::BlogPost;
use crate::view::seo::{blog_posting_json_ld, description_of, post_url};

#[derive(ramhorns::Content)]
struct ViewTag<'a> {
    tag: &'a str,
}

#[derive(ramhorns::Content)]
struct TocItem<'a> {
    id: &'a str,
    text: &'a str,
    level: u8,
}

#[derive(ramhorns::Content)]
struct ViewItem<'a> {
    site_title: &'a str,
    author: &'a str,
    canonical_url: &'a str,
    meta_description: &'a str,
    tags: Vec<ViewTag<'a>>,
    keywords: String,
    date: &'a str,
    post_title: &'a str,
    subtitle: Option<&'a str>,
    draft: bool,
    toc: Vec<TocItem<'a>>,
    show_toc: bool,
    json_ld: &'a str,
    post_content: &'a str,
}

pub struct PostRenderer<'a> {
    pub template: Template<'a>,
}

impl<'a> PostRenderer<'a> {
    pub fn new(view_tpl_src: &'a str) -> io::Result<PostRenderer<'a>> {
        let template = match Template::new(view_tpl_src) {
            Ok(x) => x,
            Err(e) => {
                return Err(io::Error::new(ErrorKind::InvalidInput, format!("Error parsing post view template: {}", e)));
            }
        };

        Ok(PostRenderer {
            template,
        })
    }

    pub fn render(&self, post: &BlogPost, site: &Site) -> io::Result<String> {
        let body = render_body(&post.content)?;
        let frontmatter = &post.frontmatter;

        let canonical_url = post_url(&site.url, &post.slug);
        let meta_description = description_of(frontmatter);
        let json_ld = blog_posting_json_ld(frontmatter, &site.author_name, &canonical_url);
        let toc: Vec<TocItem> = body.headings.iter()
            .filter(|h| !h.id.is_empty())
            .map(|h| TocItem { id: h.id.as_str(), text: h.text.as_str(), level: h.level })
            .collect();

        let rendered_page = self.template.render(&ViewItem {
            site_title: site.title.as_str(),
            author: site.author_name.as_str(),
            canonical_url: canonical_url.as_str(),
            meta_description: meta_description.as_str(),
            tags: frontmatter.tag.iter().map(|t| ViewTag { tag: t.as_str() }).collect(),
            keywords: frontmatter.tag.join(", "),
            date: frontmatter.date.as_str(),
            post_title: frontmatter.title.as_str(),
            subtitle: frontmatter.subtitle.as_deref().filter(|s| !s.is_empty()),
            draft: frontmatter.draft,
            show_toc: !toc.is_empty(),
            toc,
            json_ld: json_ld.as_str(),
            post_content: body.html.as_str(),
        });

        Ok(rendered_page)
    }
}

#[cfg(test)]
mod tests {
    use crate::content::Frontmatter;

    use super::*;

    fn site() -> Site {
        Site {
            title: "Dev Log".to_string(),
            description: String::new(),
            url: "https://blog.example.com/".to_string(),
            author_name: "<dogma>".to_string(),
        }
    }

    #[test]
    fn render_view() {
        let template_src = r##"
TITLE=[{{post_title}}]
SUBTITLE=[{{#subtitle}}{{subtitle}}{{/subtitle}}]
AUTHOR=[{{author}}]
URL=[{{canonical_url}}]
DESC=[{{meta_description}}]
TAGS=[{{#tags}}({{tag}}){{/tags}}]
TOC=[{{#toc}}({{level}}#{{id}}){{/toc}}]"##;
        let post_renderer = PostRenderer::new(template_src).unwrap();
        let post = BlogPost {
            slug: "hello".to_string(),
            frontmatter: Frontmatter {
                title: "<Hello>".to_string(),
                date: "2024-01-02".to_string(),
                draft: false,
                tag: vec!["<rust>".to_string(), "web".to_string()],
                description: Some("Greetings".to_string()),
                subtitle: None,
            },
            content: "# Intro\n\ntext\n\n## 🚀\n\n## Intro".to_string(),
            sha: String::new(),
        };

        let res = post_renderer.render(&post, &site()).unwrap();
        assert_eq!(res, r##"
TITLE=[&lt;Hello&gt;]
SUBTITLE=[]
AUTHOR=[&lt;dogma&gt;]
URL=[https://blog.example.com/posts/hello]
DESC=[Greetings]
TAGS=[(&lt;rust&gt;)(web)]
TOC=[(1#intro)(2#intro-1)]"##);

        let content = PostRenderer::new("{{{post_content}}}").unwrap().render(&post, &site()).unwrap();
        assert!(content.contains(r#"<h1 id="intro">Intro</h1>"#));
        assert!(content.contains("<h2>🚀</h2>"));
        assert!(content.contains(r#"<h2 id="intro-1">Intro</h2>"#));
    }

    #[test]
    fn render_json_ld() {
        let post_renderer = PostRenderer::new("{{{json_ld}}}").unwrap();
        let post = BlogPost {
            slug: "hello".to_string(),
            frontmatter: Frontmatter {
                title: "Hello".to_string(),
                date: "2024-01-02".to_string(),
                draft: false,
                tag: vec![],
                description: None,
                subtitle: None,
            },
            content: "text".to_string(),
            sha: String::new(),
        };

        let res = post_renderer.render(&post, &site()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&res).unwrap();
        assert_eq!(value["url"], "https://blog.example.com/posts/hello");
        assert_eq!(value["description"], "A post about Hello.");
    }
}
