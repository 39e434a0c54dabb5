use std::fmt::Write;

use chrono::Local;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frontmatter {
    pub title: String,
    #[serde(default)]
    pub date: String,
    pub draft: bool,
    pub tag: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPost {
    pub frontmatter: Frontmatter,
    pub content: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrontmatterError {
    #[error("Invalid frontmatter")]
    InvalidFrontmatter,
}

/// Value of a single metadata key before it is checked against [`Frontmatter`].
#[derive(Debug, Clone, PartialEq)]
enum RawValue {
    Text(String),
    Flag(bool),
    List(Vec<String>),
}

/// Keys in declaration order. Declaring a key again replaces the value in place.
#[derive(Debug, Default)]
struct RawBlock {
    entries: Vec<(String, RawValue)>,
}

impl RawBlock {
    fn set(&mut self, key: &str, value: RawValue) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    fn get(&self, key: &str) -> Option<&RawValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    fn push_item(&mut self, key: &str, item: String) {
        if let Some((_, RawValue::List(items))) = self.entries.iter_mut().find(|(k, _)| k == key) {
            items.push(item);
        }
    }

    fn text(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            RawValue::Text(s) => Some(s.clone()),
            _ => None,
        }
    }

    /// Optional fields are not type checked: a flag keeps its textual form,
    /// a list is not a meaningful description and is dropped.
    fn optional_text(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            RawValue::Text(s) => Some(s.clone()),
            RawValue::Flag(b) => Some(b.to_string()),
            RawValue::List(_) => None,
        }
    }

    fn into_frontmatter(self) -> Result<Frontmatter, FrontmatterError> {
        let title = self.text("title").ok_or(FrontmatterError::InvalidFrontmatter)?;
        let date = self.text("date").ok_or(FrontmatterError::InvalidFrontmatter)?;
        let draft = match self.get("draft") {
            Some(RawValue::Flag(b)) => *b,
            _ => return Err(FrontmatterError::InvalidFrontmatter),
        };
        let tag = match self.get("tag") {
            Some(RawValue::List(items)) => items.clone(),
            _ => return Err(FrontmatterError::InvalidFrontmatter),
        };

        Ok(Frontmatter {
            title,
            date,
            draft,
            tag,
            description: self.optional_text("description"),
            subtitle: self.optional_text("subtitle"),
        })
    }
}

/// Splits a post document into its metadata block and its body.
///
/// Example of a document
/// ---
/// title: "What I learned"
/// date: "2023-01-01"
/// tag:
///   - rust
/// draft: false
/// ---
///
/// # Body starts here
pub fn parse(raw: &str) -> Result<ParsedPost, FrontmatterError> {
    lazy_static! {
        static ref DOCUMENT_REGEX: Regex = Regex::new(r"(?s)\A---\s*\n(?P<meta>.*?)\n---\s*\n(?P<content>.*)\z").unwrap();
    }

    let cap = DOCUMENT_REGEX.captures(raw).ok_or(FrontmatterError::InvalidFrontmatter)?;
    let block = parse_block(&cap["meta"]);
    let frontmatter = block.into_frontmatter()?;

    Ok(ParsedPost {
        frontmatter,
        content: cap["content"].trim().to_string(),
    })
}

fn is_list_item(line: &str) -> bool {
    line.trim().starts_with('-')
}

fn parse_block(meta: &str) -> RawBlock {
    let lines: Vec<&str> = meta.split('\n').collect();
    let mut block = RawBlock::default();
    let mut last_key: Option<String> = None;

    for (i, line) in lines.iter().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if is_list_item(line) {
            // Items without an open list are dropped
            if let Some(ref key) = last_key {
                block.push_item(key, line[1..].trim().to_string());
            }
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();

        let next_is_item = lines.get(i + 1).map_or(false, |next| is_list_item(next));
        let parsed = if value == "[]" || next_is_item {
            RawValue::List(vec![])
        } else {
            parse_scalar(value)
        };

        block.set(key, parsed);
        last_key = Some(key.to_string());
    }

    block
}

fn parse_scalar(value: &str) -> RawValue {
    if value.is_empty() {
        return RawValue::Text(String::new());
    }

    let value = strip_quotes(value);
    match value {
        "true" => RawValue::Flag(true),
        "false" => RawValue::Flag(false),
        _ => RawValue::Text(value.to_string()),
    }
}

/// Removes one pair of matching outer quotes, nothing else.
fn strip_quotes(value: &str) -> &str {
    let quoted = (value.starts_with('"') && value.ends_with('"'))
        || (value.starts_with('\'') && value.ends_with('\''));
    if !quoted {
        return value;
    }

    // A lone quote character is both the opening and the closing one
    if value.len() < 2 {
        ""
    } else {
        &value[1..value.len() - 1]
    }
}

fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Renders the metadata block, blank line included, ready to be followed by the body.
pub fn serialize(frontmatter: &Frontmatter) -> String {
    let date = if frontmatter.date.is_empty() {
        today()
    } else {
        frontmatter.date.clone()
    };

    let mut buf = String::new();

    let _ = writeln!(&mut buf, "---");
    let _ = writeln!(&mut buf, "title: \"{}\"", frontmatter.title);
    let _ = writeln!(&mut buf, "date: \"{}\"", date);
    if frontmatter.tag.is_empty() {
        let _ = writeln!(&mut buf, "tag: []");
    } else {
        let _ = writeln!(&mut buf, "tag:");
        for tag in frontmatter.tag.iter() {
            let _ = writeln!(&mut buf, "  - {}", tag);
        }
    }
    if let Some(description) = frontmatter.description.as_deref().filter(|d| !d.is_empty()) {
        let _ = writeln!(&mut buf, "description: \"{}\"", description);
    }
    if let Some(subtitle) = frontmatter.subtitle.as_deref().filter(|s| !s.is_empty()) {
        let _ = writeln!(&mut buf, "subtitle: \"{}\"", subtitle);
    }
    let _ = writeln!(&mut buf, "draft: {}", frontmatter.draft);
    let _ = writeln!(&mut buf, "---");
    let _ = writeln!(&mut buf);

    buf
}

/// Serialized metadata followed by the body.
pub fn compose(frontmatter: &Frontmatter, content: &str) -> String {
    format!("{}{}", serialize(frontmatter), content)
}

/// Reads only the title of a document, without validating the rest of the block.
pub fn extract_title(raw: &str) -> String {
    lazy_static! {
        static ref BLOCK_REGEX: Regex = Regex::new(r"(?s)\A---\n(?P<meta>.*?)\n---").unwrap();
        static ref TITLE_REGEX: Regex = Regex::new(r#"(?m)^title:\s*['"]?(?P<title>[^'"\n]+)['"]?$"#).unwrap();
    }

    BLOCK_REGEX.captures(raw)
        .and_then(|block| {
            TITLE_REGEX.captures(&block["meta"]).map(|cap| cap["title"].to_string())
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Frontmatter {
        Frontmatter {
            title: "테스트 포스트".to_string(),
            date: "2023-01-01".to_string(),
            draft: false,
            tag: vec!["javascript".to_string(), "react".to_string()],
            description: None,
            subtitle: None,
        }
    }

    #[test]
    fn test_parse_list() {
        let raw = "---\ntitle: \"T\"\ndate: \"2023-01-01\"\ndraft: false\ntag:\n- javascript\n- react\n---\nBody text.";
        let parsed = parse(raw).unwrap();
        assert_eq!(parsed.frontmatter.tag, ["javascript", "react"]);
        assert_eq!(parsed.content, "Body text.");
        assert_eq!(parsed.frontmatter.title, "T");
        assert!(!parsed.frontmatter.draft);
    }

    #[test]
    fn test_parse_content_is_trimmed() {
        let raw = "---\ntitle: \"테스트 포스트\"\ndate: \"2023-01-01\"\ndraft: false\ntag:\n- javascript\n- react\n---\n\n# 테스트 내용\n\n이것은 테스트 내용입니다.\n\n";
        let parsed = parse(raw).unwrap();
        assert_eq!(parsed.frontmatter, sample());
        assert_eq!(parsed.content, "# 테스트 내용\n\n이것은 테스트 내용입니다.");
    }

    #[test]
    fn test_boolean_coercion() {
        let raw = "---\ntitle: \"테스트\"\ndate: \"2023-01-01\"\ndraft: true\ntag:\n- test\n---\n\n내용";
        assert!(parse(raw).unwrap().frontmatter.draft);

        let raw = "---\ntitle: t\ndate: d\ndraft: 'false'\ntag: []\n---\n";
        assert!(!parse(raw).unwrap().frontmatter.draft);
    }

    #[test]
    fn test_draft_must_be_boolean() {
        let raw = "---\ntitle: t\ndate: d\ndraft: maybe\ntag: []\n---\n";
        assert_eq!(parse(raw), Err(FrontmatterError::InvalidFrontmatter));
    }

    #[test]
    fn test_missing_delimiters() {
        assert_eq!(parse("# 제목\n\n내용"), Err(FrontmatterError::InvalidFrontmatter));
        assert_eq!(parse(""), Err(FrontmatterError::InvalidFrontmatter));
        assert_eq!(parse("---\ntitle: t\ndate: d\ndraft: true\ntag: []\n---"), Err(FrontmatterError::InvalidFrontmatter));
    }

    #[test]
    fn test_required_fields() {
        let full = ["title: t", "date: d", "draft: false", "tag: []"];
        for missing in 0..full.len() {
            let lines: Vec<&str> = full.iter().enumerate()
                .filter(|(i, _)| *i != missing)
                .map(|(_, l)| *l)
                .collect();
            let raw = format!("---\n{}\ndescription: present\n---\nbody", lines.join("\n"));
            assert_eq!(parse(&raw), Err(FrontmatterError::InvalidFrontmatter), "missing {}", full[missing]);
        }
    }

    #[test]
    fn test_title_must_be_text() {
        let raw = "---\ntitle: true\ndate: d\ndraft: false\ntag: []\n---\n";
        assert_eq!(parse(raw), Err(FrontmatterError::InvalidFrontmatter));
    }

    #[test]
    fn test_unquoted_and_empty_values() {
        let raw = "---\ntitle: 테스트 제목\nsubtitle: \ndate: 2025-08-01\ndraft: false\ntag:\n- test\n---\n\n내용";
        let parsed = parse(raw).unwrap();
        assert_eq!(parsed.frontmatter.title, "테스트 제목");
        assert_eq!(parsed.frontmatter.date, "2025-08-01");
        assert_eq!(parsed.frontmatter.subtitle, Some("".to_string()));
    }

    #[test]
    fn test_mixed_quotes() {
        let raw = "---\ntitle: '작은 따옴표 제목'\nsubtitle: \"큰 따옴표 부제목\"\ndescription: 따옴표 없는 설명\ndate: 2025-08-01\ndraft: false\ntag:\n- test\n---\n\n내용";
        let fm = parse(raw).unwrap().frontmatter;
        assert_eq!(fm.title, "작은 따옴표 제목");
        assert_eq!(fm.subtitle.as_deref(), Some("큰 따옴표 부제목"));
        assert_eq!(fm.description.as_deref(), Some("따옴표 없는 설명"));
    }

    #[test]
    fn test_inner_quotes_are_kept() {
        let raw = "---\ntitle: JavaScript의 \"this\" 키워드와 '화살표 함수' 이해하기\nsubtitle: \"Hello World\"를 넘어선 'Real' 프로그래밍\ndescription: It's a beautiful day, isn't it?\ndate: 2025-08-01\ndraft: false\ntag:\n- javascript\n---\n\n내용";
        let fm = parse(raw).unwrap().frontmatter;
        assert_eq!(fm.title, "JavaScript의 \"this\" 키워드와 '화살표 함수' 이해하기");
        assert_eq!(fm.subtitle.as_deref(), Some("\"Hello World\"를 넘어선 'Real' 프로그래밍"));
        assert_eq!(fm.description.as_deref(), Some("It's a beautiful day, isn't it?"));
    }

    #[test]
    fn test_single_outer_layer() {
        let raw = "---\ntitle: \"JavaScript의 'this' 키워드\"\nsubtitle: '프로그래밍에서 \"따옴표\"의 의미'\ndate: 2025-08-01\ndraft: false\ntag:\n- javascript\n---\n\n내용";
        let fm = parse(raw).unwrap().frontmatter;
        assert_eq!(fm.title, "JavaScript의 'this' 키워드");
        assert_eq!(fm.subtitle.as_deref(), Some("프로그래밍에서 \"따옴표\"의 의미"));
    }

    #[test]
    fn test_comments_and_orphan_items() {
        let raw = "---\n- orphan\n# a comment\ntitle: t\ndate: d\ndraft: false\n\n- dropped, draft is not a list\ntag:\n  - a\n\n  - b\n---\nbody";
        let fm = parse(raw).unwrap().frontmatter;
        assert_eq!(fm.tag, ["a", "b"]);
        assert_eq!(fm.title, "t");
        assert!(!fm.draft);
    }

    #[test]
    fn test_item_right_after_scalar_opens_list() {
        // The lookahead wins over the scalar value
        let raw = "---\ntitle: t\ndate: d\ndraft: false\n- x\ntag: []\n---\nbody";
        assert_eq!(parse(raw), Err(FrontmatterError::InvalidFrontmatter));
    }

    #[test]
    fn test_inline_empty_list_then_items() {
        let raw = "---\ntitle: t\ndate: d\ndraft: false\ntag: []\n---\nbody";
        assert!(parse(raw).unwrap().frontmatter.tag.is_empty());
    }

    #[test]
    fn test_colon_in_value() {
        let raw = "---\ntitle: \"Rust: the good parts\"\ndate: 2024-01-01T10:00:00\ndraft: false\ntag: []\n---\nbody";
        let fm = parse(raw).unwrap().frontmatter;
        assert_eq!(fm.title, "Rust: the good parts");
        assert_eq!(fm.date, "2024-01-01T10:00:00");
    }

    #[test]
    fn test_serialize() {
        let mut fm = sample();
        fm.description = Some("desc".to_string());
        assert_eq!(serialize(&fm), "---\ntitle: \"테스트 포스트\"\ndate: \"2023-01-01\"\ntag:\n  - javascript\n  - react\ndescription: \"desc\"\ndraft: false\n---\n\n");

        fm.tag.clear();
        fm.description = None;
        fm.draft = true;
        assert_eq!(serialize(&fm), "---\ntitle: \"테스트 포스트\"\ndate: \"2023-01-01\"\ntag: []\ndraft: true\n---\n\n");
    }

    #[test]
    fn test_serialize_defaults_date_to_today() {
        let mut fm = sample();
        fm.date = String::new();
        let expected = format!("date: \"{}\"\n", today());
        assert!(serialize(&fm).contains(&expected));
    }

    #[test]
    fn test_round_trip() {
        let mut with_optionals = sample();
        with_optionals.description = Some("설명".to_string());
        with_optionals.subtitle = Some("부제목".to_string());
        with_optionals.draft = true;

        let mut no_tags = sample();
        no_tags.tag.clear();

        let body = "\n# Heading\n\nSome text.\n";
        for fm in [sample(), with_optionals, no_tags] {
            let raw = format!("{}\n{}", serialize(&fm), body);
            let parsed = parse(&raw).unwrap();
            assert_eq!(parsed.frontmatter, fm);
            assert_eq!(parsed.content, body.trim());
        }
    }

    #[test]
    fn test_compose() {
        let doc = compose(&sample(), "hello");
        assert!(doc.ends_with("---\n\nhello"));
        assert_eq!(parse(&doc).unwrap().content, "hello");
    }

    #[test]
    fn test_extract_title() {
        assert_eq!(extract_title("---\ntitle: \"테스트 제목\"\ndate: \"2023-01-01\"\n---\n\n# 본문 제목"), "테스트 제목");
        assert_eq!(extract_title("---\ntitle: 따옴표 없는 제목\ndate: \"2023-01-01\"\n---\n"), "따옴표 없는 제목");
        assert_eq!(extract_title("---\ntitle: '단일 따옴표 제목'\n---\n"), "단일 따옴표 제목");
        assert_eq!(extract_title("---\nauthor: \"작성자\"\ntitle: \"여러 줄 중간의 제목\"\ntags: \n  - javascript\n---\n"), "여러 줄 중간의 제목");
        assert_eq!(extract_title("# 제목\n\n내용"), "");
        assert_eq!(extract_title("---\nauthor: \"작성자\"\n---\n"), "");
    }
}
