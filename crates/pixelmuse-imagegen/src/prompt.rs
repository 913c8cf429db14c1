use std::sync::OnceLock;

use regex::Regex;

/// A batch prompt line with its optional `#$name` file name directive split off
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptLine {
    /// The trimmed line as written
    pub original: String,
    /// Prompt text without the directive
    pub prompt: String,
    /// Output file name requested by the directive, without extension
    pub suggested_name: Option<String>,
}

impl PromptLine {
    /// Parse one line; returns `None` for blank lines
    pub fn parse(line: &str) -> Option<Self> {
        fn re() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new(r"#\$([A-Za-z0-9_.\-]+)$").expect("must be valid regex"))
        }

        let original = line.trim();
        if original.is_empty() {
            return None;
        }

        let (prompt, suggested_name) = match re().captures(original) {
            Some(captures) => {
                let start = captures.get(0).map_or(original.len(), |m| m.start());
                let name = captures.get(1).map(|m| m.as_str().to_owned());
                (original[..start].trim_end(), name)
            }
            None => (original, None),
        };

        Some(Self {
            original: original.to_owned(),
            prompt: prompt.to_owned(),
            suggested_name,
        })
    }

    /// Split raw batch input into prompt lines, dropping blank ones
    pub fn parse_all<I, S>(lines: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        lines.into_iter().filter_map(|line| Self::parse(line.as_ref())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_is_stripped() {
        let line = PromptLine::parse("a red fox #$fox1").unwrap();
        assert_eq!(line.prompt, "a red fox");
        assert_eq!(line.suggested_name.as_deref(), Some("fox1"));
        assert_eq!(line.original, "a red fox #$fox1");
    }

    #[test]
    fn plain_prompt_is_unchanged() {
        let line = PromptLine::parse("a blue fox").unwrap();
        assert_eq!(line.prompt, "a blue fox");
        assert_eq!(line.suggested_name, None);
    }

    #[test]
    fn directive_must_end_the_line() {
        let line = PromptLine::parse("price tag #$5 on a shelf").unwrap();
        assert_eq!(line.prompt, "price tag #$5 on a shelf");
        assert_eq!(line.suggested_name, None);
    }

    #[test]
    fn names_may_contain_dots_and_dashes() {
        let line = PromptLine::parse("  moon over water#$moon-v2.final  ").unwrap();
        assert_eq!(line.prompt, "moon over water");
        assert_eq!(line.suggested_name.as_deref(), Some("moon-v2.final"));
    }

    #[test]
    fn names_are_ascii_only() {
        let line = PromptLine::parse("café au lait #$café").unwrap();
        assert_eq!(line.prompt, "café au lait #$café");
        assert_eq!(line.suggested_name, None);

        let line = PromptLine::parse("café au lait #$cafe_1").unwrap();
        assert_eq!(line.prompt, "café au lait");
        assert_eq!(line.suggested_name.as_deref(), Some("cafe_1"));
    }

    #[test]
    fn blank_lines_are_dropped() {
        let lines = PromptLine::parse_all("one\n\n   \ntwo #$b\n".lines());
        let prompts: Vec<_> = lines.iter().map(|l| l.prompt.as_str()).collect();
        assert_eq!(prompts, ["one", "two"]);
    }
}
