use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::Serialize;

use crate::content::slug::generate_slug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    pub id: String,
    pub text: String,
    pub level: u8,
}

/// Hands out ids for a single document. The first use of a base slug keeps it
/// as-is, every repeat gets `-1`, `-2`, ... appended.
#[derive(Default)]
struct SlugCounter {
    seen: HashMap<String, usize>,
}

impl SlugCounter {
    fn unique(&mut self, text: &str) -> String {
        let base = generate_slug(text);
        let count = self.seen.entry(base.clone()).or_insert(0);
        let id = match *count {
            0 => base,
            n => format!("{}-{}", base, n),
        };
        *count += 1;
        id
    }
}

/// Collects the ATX headings (`#` to `######`) of a markdown body in document order.
pub fn extract_headings(body: &str) -> Vec<Heading> {
    lazy_static! {
        static ref HEADING_REGEX: Regex = Regex::new(r"^(?P<hashes>#{1,6})\s+(?P<text>.+)$").unwrap();
    }

    let mut counter = SlugCounter::default();
    let mut headings = vec![];

    for line in body.lines() {
        let Some(cap) = HEADING_REGEX.captures(line) else {
            continue;
        };

        let level = cap["hashes"].len() as u8;
        let text = cap["text"].trim().to_string();
        let id = counter.unique(&text);

        headings.push(Heading { id, text, level });
    }

    headings
}

/// Adds `id` attributes to the `<hN>` tags of rendered html.
///
/// Rendered headings are paired with extracted ones in order; an extracted
/// heading whose level does not match (e.g. a `#` line inside a code fence)
/// is skipped.
pub fn anchor_headings(html: &str, headings: &[Heading]) -> String {
    lazy_static! {
        static ref OPEN_TAG_REGEX: Regex = Regex::new(r"<h(?P<level>[1-6])>").unwrap();
    }

    let mut pending = headings.iter();
    OPEN_TAG_REGEX.replace_all(html, |cap: &Captures| {
        let level: u8 = cap["level"].parse().unwrap_or(0);
        match pending.find(|h| h.level == level) {
            Some(heading) if !heading.id.is_empty() => format!(r#"<h{} id="{}">"#, level, heading.id),
            _ => cap[0].to_string(),
        }
    }).to_string()
}
