use std::io::Cursor;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::post_repository::BlogPost;
use crate::view::seo::post_url;

/* Example
<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url>
    <loc>https://blog.example.com</loc>
    <changefreq>daily</changefreq>
    <priority>1.0</priority>
  </url>
  <url>
    <loc>https://blog.example.com/posts/hello-world</loc>
    <lastmod>2024-01-02</lastmod>
    <changefreq>weekly</changefreq>
    <priority>0.8</priority>
  </url>
</urlset>
*/

pub struct Sitemap<'a> {
    pub site_url: &'a str,
}

impl<'a> Sitemap<'a> {
    /// `posts` are expected to be the published ones only.
    pub fn render(&self, posts: &[BlogPost]) -> quick_xml::Result<Vec<u8>> {
        let base_url = self.site_url.trim_end_matches('/');
        let mut writer = Writer::new(Cursor::new(Vec::new()));

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut urlset = BytesStart::new("urlset");
        urlset.push_attribute(("xmlns", "http://www.sitemaps.org/schemas/sitemap/0.9"));
        writer.write_event(Event::Start(urlset))?;

        push_url(&mut writer, base_url, None, "daily", "1.0")?;
        for post in posts {
            let loc = post_url(base_url, &post.slug);
            let lastmod = Some(post.frontmatter.date.as_str()).filter(|d| !d.is_empty());
            push_url(&mut writer, &loc, lastmod, "weekly", "0.8")?;
        }

        writer.write_event(Event::End(BytesEnd::new("urlset")))?;

        Ok(writer.into_inner().into_inner())
    }
}

fn push_url(writer: &mut Writer<Cursor<Vec<u8>>>, loc: &str, lastmod: Option<&str>, changefreq: &str, priority: &str) -> quick_xml::Result<()> {
    writer.write_event(Event::Start(BytesStart::new("url")))?;
    push_text(writer, "loc", loc)?;
    if let Some(lastmod) = lastmod {
        push_text(writer, "lastmod", lastmod)?;
    }
    push_text(writer, "changefreq", changefreq)?;
    push_text(writer, "priority", priority)?;
    writer.write_event(Event::End(BytesEnd::new("url")))?;
    Ok(())
}

fn push_text(writer: &mut Writer<Cursor<Vec<u8>>>, tag: &str, text: &str) -> quick_xml::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::str;

    use crate::content::Frontmatter;

    use super::*;

    fn post(slug: &str, date: &str) -> BlogPost {
        BlogPost {
            slug: slug.to_string(),
            frontmatter: Frontmatter {
                title: slug.to_string(),
                date: date.to_string(),
                draft: false,
                tag: vec![],
                description: None,
                subtitle: None,
            },
            content: String::new(),
            sha: String::new(),
        }
    }

    #[test]
    fn render_xml() {
        let sitemap = Sitemap { site_url: "https://blog.example.com/" };
        let xml = sitemap.render(&[post("hello-world", "2024-01-02"), post("사용법", "")]).unwrap();
        assert_eq!(str::from_utf8(&xml).unwrap(), EXPECTED);
    }

    const EXPECTED: &str = r##"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"><url><loc>https://blog.example.com</loc><changefreq>daily</changefreq><priority>1.0</priority></url><url><loc>https://blog.example.com/posts/hello-world</loc><lastmod>2024-01-02</lastmod><changefreq>weekly</changefreq><priority>0.8</priority></url><url><loc>https://blog.example.com/posts/%EC%82%AC%EC%9A%A9%EB%B2%95</loc><changefreq>weekly</changefreq><priority>0.8</priority></url></urlset>"##;
}
