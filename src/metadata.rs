use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::LazyLock;

static BEGIN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)==UserScript==").unwrap());
static END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)==/UserScript==").unwrap());
static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^//\s*@(\w+)\s+(.+)$").unwrap());

/// Directive names whose values are kept as a list even when they occur only
/// once. Both drive asset resolution, where "one entry" and "many entries"
/// must look the same.
const ALWAYS_LIST: &[&str] = &["require", "grant"];

/// A parsed directive value: a single string, or an ordered list when the
/// name repeats or is an always-list name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveValue {
    Scalar(String),
    List(Vec<String>),
}

impl DirectiveValue {
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            DirectiveValue::Scalar(s) => Some(s),
            DirectiveValue::List(_) => None,
        }
    }

    /// All values regardless of shape, in declaration order.
    pub fn values(&self) -> Vec<&str> {
        match self {
            DirectiveValue::Scalar(s) => vec![s.as_str()],
            DirectiveValue::List(items) => items.iter().map(String::as_str).collect(),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            DirectiveValue::Scalar(s) => Value::String(s.clone()),
            DirectiveValue::List(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
        }
    }
}

/// The full parsed result of a userscript metadata header. Built once per
/// parse and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveMapping {
    directives: HashMap<String, DirectiveValue>,
}

impl DirectiveMapping {
    /// Parse the `==UserScript==` header block out of `raw`.
    ///
    /// The block is everything after the first (case-insensitive) begin
    /// sentinel and before the first end sentinel. A missing begin sentinel
    /// degrades to scanning the whole input; a missing end sentinel lets the
    /// block run to the end. Lines must be `//` comments carrying an
    /// `@name value` pair; anything else is skipped.
    pub fn parse(raw: &str) -> Self {
        let after = match BEGIN.find(raw) {
            Some(m) => &raw[m.end()..],
            None => raw,
        };
        let block = match END.find(after) {
            Some(m) => &after[..m.start()],
            None => after,
        };

        let mut accumulated: HashMap<String, Vec<String>> = HashMap::new();
        for line in block.lines() {
            let line = line.trim();
            if !line.starts_with("//") {
                continue;
            }
            if let Some(captures) = DIRECTIVE.captures(line) {
                let name = captures[1].to_lowercase();
                let value = captures[2].trim().to_string();
                accumulated.entry(name).or_default().push(value);
            }
        }

        let directives = accumulated
            .into_iter()
            .map(|(name, mut values)| {
                let value = if values.len() > 1 || ALWAYS_LIST.contains(&name.as_str()) {
                    DirectiveValue::List(values)
                } else {
                    DirectiveValue::Scalar(values.remove(0))
                };
                (name, value)
            })
            .collect();

        Self { directives }
    }

    pub fn get(&self, name: &str) -> Option<&DirectiveValue> {
        self.directives.get(name)
    }

    pub fn scalar(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(DirectiveValue::as_scalar)
    }

    /// All values declared for `name`, empty if the directive is absent.
    pub fn values(&self, name: &str) -> Vec<&str> {
        self.get(name).map(DirectiveValue::values).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// The mapping as a JSON overlay, for merging into a manifest.
    pub fn to_json(&self) -> Map<String, Value> {
        self.directives
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(body: &str) -> String {
        format!("// ==UserScript==\n{}\n// ==/UserScript==", body)
    }

    #[test]
    fn test_single_directive_is_scalar() {
        let parsed = DirectiveMapping::parse(&block("// @name hello world"));
        assert_eq!(
            parsed.get("name"),
            Some(&DirectiveValue::Scalar("hello world".to_string()))
        );
    }

    #[test]
    fn test_uncommented_directive_is_ignored() {
        let parsed = DirectiveMapping::parse(&block("@name hello world"));
        assert_eq!(parsed.get("name"), None);
    }

    #[test]
    fn test_repeated_directive_accumulates_in_order() {
        let parsed = DirectiveMapping::parse(&block("// @foo 1\n// @foo 2\n// @foo 3"));
        assert_eq!(
            parsed.get("foo"),
            Some(&DirectiveValue::List(vec![
                "1".to_string(),
                "2".to_string(),
                "3".to_string()
            ]))
        );
    }

    #[test]
    fn test_always_list_names_stay_lists() {
        let parsed = DirectiveMapping::parse(&block(
            "// @require http://example.com/a.js\n// @grant GM_getValue",
        ));
        assert_eq!(
            parsed.get("require"),
            Some(&DirectiveValue::List(vec![
                "http://example.com/a.js".to_string()
            ]))
        );
        assert_eq!(
            parsed.get("grant"),
            Some(&DirectiveValue::List(vec!["GM_getValue".to_string()]))
        );
    }

    #[test]
    fn test_names_are_lowercased_and_values_trimmed() {
        let parsed = DirectiveMapping::parse(&block("//   @Name    hello world   "));
        assert_eq!(parsed.scalar("name"), Some("hello world"));
    }

    #[test]
    fn test_sentinels_match_case_insensitively() {
        let raw = "// ==userscript==\n// @version 1.0\n// ==/USERSCRIPT==";
        let parsed = DirectiveMapping::parse(raw);
        assert_eq!(parsed.scalar("version"), Some("1.0"));
    }

    #[test]
    fn test_lines_outside_block_are_ignored() {
        let raw = "// @before 1\n// ==UserScript==\n// @inside 2\n// ==/UserScript==\n// @after 3";
        let parsed = DirectiveMapping::parse(raw);
        assert_eq!(parsed.get("before"), None);
        assert_eq!(parsed.scalar("inside"), Some("2"));
        assert_eq!(parsed.get("after"), None);
    }

    #[test]
    fn test_missing_sentinels_degrade_gracefully() {
        // No begin marker: the whole input is scanned.
        let parsed = DirectiveMapping::parse("// @name no begin");
        assert_eq!(parsed.scalar("name"), Some("no begin"));

        // No end marker: the block runs to the end.
        let parsed = DirectiveMapping::parse("// ==UserScript==\n// @name no end");
        assert_eq!(parsed.scalar("name"), Some("no end"));
    }

    #[test]
    fn test_empty_block_yields_empty_mapping() {
        let parsed = DirectiveMapping::parse(&block(""));
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_malformed_comment_lines_are_skipped() {
        let parsed = DirectiveMapping::parse(&block(
            "// just a comment\n// @nospace\nnot a comment\n// @ok fine",
        ));
        assert_eq!(parsed.get("nospace"), None);
        assert_eq!(parsed.scalar("ok"), Some("fine"));
    }

    #[test]
    fn test_to_json_shapes() {
        let parsed =
            DirectiveMapping::parse(&block("// @name hello\n// @grant GM_getValue"));
        let json = parsed.to_json();
        assert_eq!(json["name"], serde_json::json!("hello"));
        assert_eq!(json["grant"], serde_json::json!(["GM_getValue"]));
    }
}
