use std::io;
use std::io::ErrorKind;

use markdown::Options;

use crate::content::headings::{anchor_headings, extract_headings, Heading};

pub struct RenderedBody {
    pub headings: Vec<Heading>,
    pub html: String,
}

/// Renders a post body to html. Headings carry the same ids the table of contents links to.
pub fn render_body(body: &str) -> io::Result<RenderedBody> {
    let buf = remove_comments(body)?;
    let headings = extract_headings(&buf);
    let html = match markdown::to_html_with_options(buf.as_str(), &Options::gfm()) {
        Ok(x) => x,
        Err(e) => return Err(io::Error::new(ErrorKind::InvalidInput, e.reason)),
    };

    Ok(RenderedBody {
        html: anchor_headings(&html, &headings),
        headings,
    })
}

pub fn remove_comments(md_post: &str) -> io::Result<String> {
    let start_comment = "<!--";
    let end_comment = "-->";

    let mut res = String::with_capacity(md_post.len());
    let mut rest = md_post;

    while let Some(start) = rest.find(start_comment) {
        res.push_str(&rest[..start]);
        let after_start = &rest[start + start_comment.len()..];
        let Some(end) = after_start.find(end_comment) else {
            return Err(io::Error::new(ErrorKind::InvalidData, "Error finding end of comment"));
        };
        rest = &after_start[end + end_comment.len()..];
    }
    res.push_str(rest);

    Ok(res)
}
