//! Front matter synthesis.
//!
//! Front matter is produced by substituting named `{placeholder}`s in a
//! template string. The key set of the output is fixed by the template: a
//! placeholder without a value renders as an explicit empty value rather than
//! disappearing, because downstream tooling relies on a stable set of keys.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// The template used when the policy does not configure one.
pub const DEFAULT_TEMPLATE: &str = "---
title: {title}
description: {description}
weight: {weight}
tags: {tags}
aliases: {aliases}
keywords: {keywords}
type: {type}
---
";

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{|\}\}|\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid placeholder regex")
});

/// The values substituted into a front matter template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    /// Page title.
    pub title: String,
    /// Page description.
    pub description: String,
    /// Ordering weight; renders empty when absent.
    pub weight: Option<u32>,
    /// Tags, in order, without duplicates.
    pub tags: Vec<String>,
    /// Alternative URLs for the page.
    pub aliases: Vec<String>,
    /// Search keywords.
    pub keywords: Vec<String>,
    /// Site generator content type.
    pub kind: String,
}

impl FrontMatter {
    /// Render the values into `template`.
    ///
    /// Text values render as double-quoted scalars and lists as flow
    /// sequences of them (`["a", "b"]`, `[]` when empty), so headings such
    /// as `Step 1: Download` stay valid YAML. The weight renders bare, or
    /// empty when absent. `{{` and `}}` render literal braces, and unknown
    /// placeholders render empty.
    #[must_use]
    pub fn render(&self, template: &Template) -> String {
        PLACEHOLDER
            .replace_all(template.as_str(), |captures: &Captures| {
                match captures.get(1).map(|m| m.as_str()) {
                    None if &captures[0] == "{{" => "{".to_string(),
                    None => "}".to_string(),
                    Some(name) => self.value(name),
                }
            })
            .into_owned()
    }

    fn value(&self, placeholder: &str) -> String {
        match placeholder {
            "title" => quoted(&self.title),
            "description" => quoted(&self.description),
            "weight" => self.weight.map(|w| w.to_string()).unwrap_or_default(),
            "tags" => flow_sequence(&self.tags),
            "aliases" => flow_sequence(&self.aliases),
            "keywords" => flow_sequence(&self.keywords),
            "type" => quoted(&self.kind),
            other => {
                tracing::trace!("front matter placeholder '{other}' has no value");
                String::new()
            }
        }
    }
}

/// A double-quoted scalar. JSON string escapes are valid YAML.
fn quoted(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Render strings as a YAML flow sequence.
fn flow_sequence(items: &[String]) -> String {
    let items: Vec<String> = items.iter().map(|item| quoted(item)).collect();
    format!("[{}]", items.join(", "))
}

/// Append `items` to `tags`, skipping any already present.
pub fn merge_tags<'a>(tags: &mut Vec<String>, items: impl IntoIterator<Item = &'a String>) {
    for item in items {
        if !tags.contains(item) {
            tags.push(item.clone());
        }
    }
}

/// A front matter template with `{placeholder}` slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template(String);

impl Template {
    /// Wrap a template string.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        let mut template = template.into();
        if !template.ends_with('\n') {
            template.push('\n');
        }
        Self(template)
    }

    /// The raw template text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Names of the placeholders used by the template, in order.
    #[must_use]
    pub fn placeholders(&self) -> Vec<&str> {
        PLACEHOLDER
            .captures_iter(&self.0)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect()
    }
}

impl Default for Template {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FrontMatter {
        FrontMatter {
            title: "Introduction".to_string(),
            description: "Start here".to_string(),
            weight: Some(10),
            tags: vec!["kafka".to_string(), "docs".to_string()],
            aliases: Vec::new(),
            keywords: Vec::new(),
            kind: "docs".to_string(),
        }
    }

    #[test]
    fn renders_default_template() {
        let rendered = sample().render(&Template::default());
        assert_eq!(
            rendered,
            "---\ntitle: \"Introduction\"\ndescription: \"Start here\"\nweight: 10\ntags: \
             [\"kafka\", \"docs\"]\naliases: []\nkeywords: []\ntype: \"docs\"\n---\n"
        );
    }

    #[test]
    fn missing_values_render_empty_but_keep_keys() {
        let rendered = FrontMatter::default().render(&Template::default());
        assert!(rendered.contains("\nweight: \n"));
        assert!(rendered.contains("\ndescription: \"\"\n"));
        assert!(rendered.contains("\ntags: []\n"));
    }

    #[test]
    fn unknown_placeholder_renders_empty() {
        let template = Template::new("---\nlayout: {layout}\ntitle: {title}\n---");
        let rendered = sample().render(&template);
        assert_eq!(rendered, "---\nlayout: \ntitle: \"Introduction\"\n---\n");
    }

    #[test]
    fn doubled_braces_are_literal() {
        let template = Template::new("x: {{title}}\ny: {title}");
        assert_eq!(sample().render(&template), "x: {title}\ny: \"Introduction\"\n");
    }

    #[test]
    fn list_values_are_quoted() {
        let mut front = sample();
        front.tags = vec!["say \"hi\"".to_string()];
        let template = Template::new("tags: {tags}");
        assert_eq!(front.render(&template), "tags: [\"say \\\"hi\\\"\"]\n");
    }

    #[test]
    fn awkward_titles_stay_valid_yaml() {
        let mut front = sample();
        front.title = "Step 1: Download the \"code\" # now".to_string();
        front.description = "key: value".to_string();

        let rendered = front.render(&Template::default());
        let yaml = rendered.trim_start_matches("---\n").trim_end_matches("---\n");
        let parsed: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(parsed["title"].as_str(), Some(front.title.as_str()));
        assert_eq!(parsed["description"].as_str(), Some("key: value"));
        assert_eq!(parsed["weight"].as_u64(), Some(10));
        assert_eq!(parsed["type"].as_str(), Some("docs"));
    }

    #[test]
    fn placeholders_in_order() {
        let template = Template::new("{title} {{skip}} {weight}");
        assert_eq!(template.placeholders(), ["title", "weight"]);
    }

    #[test]
    fn merge_tags_preserves_first_occurrence() {
        let mut tags = vec!["a".to_string(), "b".to_string()];
        let extra = ["b".to_string(), "c".to_string(), "a".to_string()];
        merge_tags(&mut tags, &extra);
        assert_eq!(tags, ["a", "b", "c"]);
    }
}
