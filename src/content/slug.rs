use lazy_static::lazy_static;
use regex::Regex;

/// Turns a piece of text into an identifier usable as a URL fragment or DOM id.
///
/// Only ASCII word characters, Hangul syllables and hyphens survive, so a
/// heading made only of emoji or punctuation produces an empty slug.
pub fn generate_slug(text: &str) -> String {
    lazy_static! {
        static ref WHITESPACE_REGEX: Regex = Regex::new(r"\s+").unwrap();
        static ref DISALLOWED_REGEX: Regex = Regex::new(r"[^A-Za-z0-9_가-힣\-]+").unwrap();
        static ref HYPHENS_REGEX: Regex = Regex::new(r"-{2,}").unwrap();
    }

    let lowered = text.to_lowercase();
    let hyphenated = WHITESPACE_REGEX.replace_all(lowered.trim(), "-");
    let stripped = DISALLOWED_REGEX.replace_all(&hyphenated, "");
    let collapsed = HYPHENS_REGEX.replace_all(&stripped, "-");

    collapsed.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_scripts() {
        assert_eq!(generate_slug("React Hook 사용법"), "react-hook-사용법");
        assert_eq!(generate_slug("useState 기본"), "usestate-기본");
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(generate_slug("Hello, World!"), "hello-world");
        assert_eq!(generate_slug("TypeScript & JavaScript"), "typescript-javascript");
        assert_eq!(generate_slug("100% 완료"), "100-완료");
        assert_eq!(generate_slug("Node.js v20.0.0"), "nodejs-v2000");
        assert_eq!(generate_slug("snake_case stays"), "snake_case-stays");
    }

    #[test]
    fn test_emoji_and_edges() {
        assert_eq!(generate_slug("🚀 시작하기"), "시작하기");
        assert_eq!(generate_slug("  --leading and trailing--  "), "leading-and-trailing");
        assert_eq!(generate_slug("!!! ???"), "");
        assert_eq!(generate_slug(""), "");
    }

    #[test]
    fn test_other_scripts_are_stripped() {
        assert_eq!(generate_slug("こんにちは world"), "world");
        assert_eq!(generate_slug("Привет"), "");
    }

    #[test]
    fn test_deterministic() {
        let text = "같은 제목";
        assert_eq!(generate_slug(text), generate_slug(text));
    }
}
