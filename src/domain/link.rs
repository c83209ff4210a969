//! Link target rewriting.
//!
//! Rules are applied to the target of every inline markdown link and image
//! (`[text](target)`, `![alt](target "title")`), in declared order, each rule
//! seeing the output of the rules before it.

use std::{fmt, str::FromStr, sync::LazyLock};

use regex::{Captures, Regex};

use crate::domain::document::{Block, Body};

static LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(!?\[[^\]]*\]\()([^)\s]+)((?:\s+"[^"]*")?\))"#).expect("valid link regex")
});

/// What a [`LinkRule`] does to a matching target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    /// Insert the value immediately before the first match.
    Prefix,
    /// Replace the whole target with the value.
    Replace,
    /// Replace every occurrence of the search string with the value.
    Substitute,
}

impl FromStr for LinkAction {
    type Err = UnknownActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prefix" => Ok(Self::Prefix),
            "replace" => Ok(Self::Replace),
            "substitute" => Ok(Self::Substitute),
            other => Err(UnknownActionError(other.to_string())),
        }
    }
}

impl fmt::Display for LinkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Prefix => "prefix",
            Self::Replace => "replace",
            Self::Substitute => "substitute",
        })
    }
}

/// A link action name that is not recognised.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown link action '{0}' (expected prefix, replace or substitute)")]
pub struct UnknownActionError(String);

/// One link rewriting rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRule {
    search: String,
    action: LinkAction,
    value: String,
}

impl LinkRule {
    /// Create a rule.
    #[must_use]
    pub fn new(search: impl Into<String>, action: LinkAction, value: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            action,
            value: value.into(),
        }
    }

    /// The string this rule looks for.
    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    /// The rule's action.
    #[must_use]
    pub const fn action(&self) -> LinkAction {
        self.action
    }

    /// The replacement or prefix value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Apply this rule to one link target.
    ///
    /// Returns the target unchanged when the search string does not occur.
    #[must_use]
    pub fn apply(&self, target: &str) -> String {
        let Some(position) = target.find(&self.search) else {
            return target.to_string();
        };

        match self.action {
            LinkAction::Prefix if target.starts_with(&self.value) => target.to_string(),
            LinkAction::Prefix => {
                let mut rewritten = String::with_capacity(target.len() + self.value.len());
                rewritten.push_str(&target[..position]);
                rewritten.push_str(&self.value);
                rewritten.push_str(&target[position..]);
                rewritten
            }
            LinkAction::Replace => self.value.clone(),
            LinkAction::Substitute => target.replace(&self.search, &self.value),
        }
    }
}

/// An ordered list of link rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkRewriter {
    rules: Vec<LinkRule>,
}

impl LinkRewriter {
    /// Create a rewriter from rules in application order.
    #[must_use]
    pub const fn new(rules: Vec<LinkRule>) -> Self {
        Self { rules }
    }

    /// The rules in application order.
    #[must_use]
    pub fn rules(&self) -> &[LinkRule] {
        &self.rules
    }

    /// Apply every rule, in order, to a single target.
    #[must_use]
    pub fn rewrite_target(&self, target: &str) -> String {
        self.rules
            .iter()
            .fold(target.to_string(), |target, rule| rule.apply(&target))
    }

    /// Rewrite the targets of every link in a piece of markdown text.
    #[must_use]
    pub fn rewrite_text(&self, text: &str) -> String {
        if self.rules.is_empty() {
            return text.to_string();
        }

        LINK.replace_all(text, |captures: &Captures| {
            let before = &captures[2];
            let after = self.rewrite_target(before);
            if before != after {
                tracing::debug!("rewrote link target '{before}' -> '{after}'");
            }
            format!("{}{after}{}", &captures[1], &captures[3])
        })
        .into_owned()
    }

    /// Rewrite every link in a body, leaving fenced code untouched.
    #[must_use]
    pub fn rewrite_body(&self, body: Body) -> Body {
        if self.rules.is_empty() {
            return body;
        }

        let blocks = body
            .into_blocks()
            .into_iter()
            .map(|block| match block {
                Block::Line(line) => Block::Line(self.rewrite_text(&line)),
                Block::Heading(mut heading) => {
                    let text = self.rewrite_text(heading.text());
                    heading.set_text(text);
                    Block::Heading(heading)
                }
                fence @ Block::Fence(_) => fence,
            })
            .collect();

        Body::from_blocks(blocks)
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn rewriter(rules: &[(&str, LinkAction, &str)]) -> LinkRewriter {
        LinkRewriter::new(
            rules
                .iter()
                .map(|(search, action, value)| LinkRule::new(*search, *action, *value))
                .collect(),
        )
    }

    #[test_case(LinkAction::Prefix, "/javadoc/", "/39", "/javadoc/Foo.html", "/39/javadoc/Foo.html"; "prefix at start")]
    #[test_case(LinkAction::Prefix, "javadoc/", "/39/", "javadoc/Foo.html", "/39/javadoc/Foo.html"; "prefix relative")]
    #[test_case(LinkAction::Prefix, "/javadoc/", "/39", "/39/javadoc/Foo.html", "/39/javadoc/Foo.html"; "prefix already applied")]
    #[test_case(LinkAction::Prefix, "/x/", "/p", "/a/b", "/a/b"; "prefix no match")]
    #[test_case(LinkAction::Replace, "design.html", "../design", "/39/design.html#x", "../design"; "replace whole target")]
    #[test_case(LinkAction::Replace, "intro", "/intro/", "intro", "/intro/"; "replace exact")]
    #[test_case(LinkAction::Substitute, ".html", "", "/39/a.html#b.html", "/39/a#b"; "substitute every occurrence")]
    #[test_case(LinkAction::Substitute, ".", "_", "a.b", "a_b"; "substitute is literal")]
    fn single_rule(action: LinkAction, search: &str, value: &str, target: &str, expected: &str) {
        assert_eq!(LinkRule::new(search, action, value).apply(target), expected);
    }

    #[test]
    fn rules_apply_in_declared_order() {
        let rules = rewriter(&[
            ("/documentation/", LinkAction::Substitute, "/"),
            ("/javadoc/", LinkAction::Prefix, "/"),
        ]);
        assert_eq!(
            rules.rewrite_target("/documentation/javadoc/Foo.html"),
            "/javadoc/Foo.html"
        );
    }

    #[test]
    fn later_rules_see_earlier_output() {
        let rules = rewriter(&[
            ("/documentation.html", LinkAction::Substitute, "/documentation/"),
            ("/documentation/", LinkAction::Replace, "/docs/"),
        ]);
        assert_eq!(rules.rewrite_target("/39/documentation.html"), "/docs/");

        let reversed = rewriter(&[
            ("/documentation/", LinkAction::Replace, "/docs/"),
            ("/documentation.html", LinkAction::Substitute, "/documentation/"),
        ]);
        assert_eq!(
            reversed.rewrite_target("/39/documentation.html"),
            "/39/documentation/"
        );
    }

    #[test]
    fn rewriting_is_deterministic() {
        let rules = rewriter(&[
            (".html", LinkAction::Substitute, ""),
            ("/generated/", LinkAction::Prefix, "/39"),
        ]);
        let text = "See [config](/generated/topic_config.html) and ![img](/images/a.png \"A\").";
        let once = rules.rewrite_text(text);
        assert_eq!(once, rules.rewrite_text(text));
        assert_eq!(
            once,
            "See [config](/39/generated/topic_config) and ![img](/images/a.png \"A\")."
        );
    }

    #[test]
    fn rewrite_body_skips_fenced_code() {
        let rules = rewriter(&[(".html", LinkAction::Substitute, "/")]);
        let body = Body::parse("[a](x.html)\n```\n[b](y.html)\n```\n## [c](z.html)");
        let rewritten = rules.rewrite_body(body).render();
        assert_eq!(rewritten, "[a](x/)\n```\n[b](y.html)\n```\n## [c](z/)");
    }

    #[test]
    fn no_rules_is_identity() {
        let text = "[a](b.html)";
        assert_eq!(LinkRewriter::default().rewrite_text(text), text);
    }

    #[test]
    fn unknown_action_is_rejected() {
        assert!("append".parse::<LinkAction>().is_err());
        assert_eq!("prefix".parse::<LinkAction>(), Ok(LinkAction::Prefix));
    }
}
