//! Named document transforms.
//!
//! Processors run in declared order on a loaded [`Body`] before its links are
//! rewritten. Each one is a pure function of the body.

use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;

use crate::domain::document::{Block, Body, Heading};

/// A document transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Processor {
    /// Remove `<!-- ... -->` comments, including multi-line ones.
    StripHtmlComments,
    /// Move every heading one level up (`##` becomes `#`), never above 1.
    PromoteHeadings,
    /// Remove numeric prefixes such as `1.`, `1.2` or `1.2.3.` from headings.
    StripHeadingNumbers,
    /// Remove hand-written tables of contents, the protocol guide outline and
    /// navigation breadcrumbs.
    RemoveToc,
    /// Promote the heading containing the given text, and every deeper
    /// heading after it, by one level until the next heading at depth 2 or
    /// above.
    PromoteSection(String),
}

impl Processor {
    /// Apply the transform to a body.
    #[must_use]
    pub fn apply(&self, body: Body) -> Body {
        match self {
            Self::StripHtmlComments => strip_html_comments(&body),
            Self::PromoteHeadings => promote_headings(body),
            Self::StripHeadingNumbers => strip_heading_numbers(body),
            Self::RemoveToc => remove_toc(&body),
            Self::PromoteSection(heading) => promote_section(body, heading),
        }
    }

    /// Parse a processor from its name and optional argument.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is unknown, or if an argument is missing
    /// or supplied where none is expected.
    pub fn from_parts(name: &str, argument: Option<&str>) -> Result<Self, UnknownProcessorError> {
        let processor = match (name, argument) {
            ("strip_html_comments", None) => Self::StripHtmlComments,
            ("promote_headings", None) => Self::PromoteHeadings,
            ("strip_heading_numbers", None) => Self::StripHeadingNumbers,
            ("remove_toc", None) => Self::RemoveToc,
            ("promote_section", Some(heading)) if !heading.trim().is_empty() => {
                Self::PromoteSection(heading.to_string())
            }
            _ => return Err(UnknownProcessorError(name.to_string())),
        };
        Ok(processor)
    }

    /// The processor's configuration name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::StripHtmlComments => "strip_html_comments",
            Self::PromoteHeadings => "promote_headings",
            Self::StripHeadingNumbers => "strip_heading_numbers",
            Self::RemoveToc => "remove_toc",
            Self::PromoteSection(_) => "promote_section",
        }
    }
}

impl FromStr for Processor {
    type Err = UnknownProcessorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_parts(s, None)
    }
}

impl fmt::Display for Processor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PromoteSection(heading) => write!(f, "{}({heading})", self.name()),
            other => f.write_str(other.name()),
        }
    }
}

/// A processor name that is not recognised, or was used with the wrong
/// arguments.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error(
    "unknown processor '{0}' (expected strip_html_comments, promote_headings, \
     strip_heading_numbers, remove_toc or promote_section: <heading>)"
)]
pub struct UnknownProcessorError(String);

/// Run processors in order.
#[must_use]
pub fn run_pipeline<'a>(body: Body, processors: impl IntoIterator<Item = &'a Processor>) -> Body {
    processors.into_iter().fold(body, |body, processor| {
        tracing::trace!("applying processor {processor}");
        processor.apply(body)
    })
}

fn strip_html_comments(body: &Body) -> Body {
    static COMMENT: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->\n*").expect("valid comment regex"));
    reparse_outside_fences(body, |text| COMMENT.replace_all(text, "").into_owned())
}

fn promote_headings(mut body: Body) -> Body {
    for heading in body.headings_mut() {
        heading.set_level(heading.level().saturating_sub(1).max(1));
    }
    body
}

fn strip_heading_numbers(mut body: Body) -> Body {
    static NUMBERING: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^\d+(\.\d+)*\.*\s*").expect("valid numbering regex"));
    for heading in body.headings_mut() {
        let stripped = NUMBERING.replace(heading.text(), "").into_owned();
        heading.set_text(stripped);
    }
    body
}

fn remove_toc(body: &Body) -> Body {
    static TABLE_OF_CONTENTS: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\*\*Table of Contents\*\*\n\n(?:  \* .*\n(?:    \* .*\n)*)*")
            .expect("valid toc regex")
    });
    static PARAMETER_TOC: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(# Configuration parameter reference\n\n)(?:  \* .*\n(?:    \* .*\n)*)+(\n##)")
            .expect("valid parameter toc regex")
    });
    static BREADCRUMBS: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?m)^(\[[\w\s:]+\]\([^\)]+\)\s*){2,}\n\n").expect("valid breadcrumb regex")
    });
    // The hand-written outline at the top of the protocol guide.
    static PRELIMINARIES: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?m)^[ \t]*\*[ \t]+Preliminaries\n(?:[ \t]+\* .*\n)*")
            .expect("valid protocol outline regex")
    });

    reparse_outside_fences(body, |text| {
        let text = TABLE_OF_CONTENTS.replace_all(text, "");
        let text = PARAMETER_TOC.replace_all(&text, "$1$2");
        let text = BREADCRUMBS.replace_all(&text, "");
        PRELIMINARIES.replace_all(&text, "").into_owned()
    })
}

fn promote_section(mut body: Body, marker: &str) -> Body {
    let mut active = false;
    for heading in body.headings_mut() {
        if heading.text().contains(marker) {
            active = true;
            promote(heading);
        } else if active && heading.level() >= 3 {
            promote(heading);
        } else if active {
            active = false;
        }
    }
    body
}

fn promote(heading: &mut Heading) {
    heading.set_level(heading.level().saturating_sub(1).max(1));
}

/// Apply a text transform to every run of blocks between fenced code blocks,
/// then parse the result again.
fn reparse_outside_fences(body: &Body, transform: impl Fn(&str) -> String) -> Body {
    let mut blocks = Vec::with_capacity(body.blocks().len());
    let mut run: Vec<String> = Vec::new();

    let flush = |run: &mut Vec<String>, blocks: &mut Vec<Block>| {
        if run.is_empty() {
            return;
        }
        let text = transform(&run.join("\n"));
        blocks.extend(Body::parse(&text).into_blocks());
        run.clear();
    };

    for block in body.blocks() {
        if let Block::Fence(_) = block {
            flush(&mut run, &mut blocks);
            blocks.push(block.clone());
        } else {
            run.push(block.to_string());
        }
    }
    flush(&mut run, &mut blocks);

    Body::from_blocks(blocks)
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn apply(processor: &Processor, text: &str) -> String {
        processor.apply(Body::parse(text)).render()
    }

    #[test]
    fn promote_headings_floors_at_one() {
        let out = apply(&Processor::PromoteHeadings, "# A\n## B\n### C");
        assert_eq!(out, "# A\n# B\n## C");
    }

    #[test_case("## 1. Intro", "## Intro"; "single number")]
    #[test_case("## 1.2 Design", "## Design"; "dotted")]
    #[test_case("### 4.3.2. Storage", "### Storage"; "trailing dot")]
    #[test_case("## 2024 Roadmap", "## Roadmap"; "numbers only at start")]
    #[test_case("## Kafka 101", "## Kafka 101"; "number in middle")]
    fn strips_heading_numbers(input: &str, expected: &str) {
        assert_eq!(apply(&Processor::StripHeadingNumbers, input), expected);
    }

    #[test]
    fn strip_comments_keeps_fenced_code() {
        let text = "<!--\nlicense\n-->\n# Title\n```\n<!-- keep -->\n```\ntext <!-- x --> end";
        let out = apply(&Processor::StripHtmlComments, text);
        assert_eq!(out, "# Title\n```\n<!-- keep -->\n```\ntext  end");
    }

    #[test]
    fn remove_toc_drops_bullet_contents() {
        let text = "# Doc\n\n**Table of Contents**\n\n  * [One](#one)\n    * [Sub](#sub)\n  * \
                    [Two](#two)\n\n## One\n";
        let out = apply(&Processor::RemoveToc, text);
        assert_eq!(out, "# Doc\n\n\n## One\n");
    }

    #[test]
    fn remove_toc_drops_breadcrumbs() {
        let text = "[Introduction](/intro) [Run Demo](/demo)\n\n# Start\n";
        assert_eq!(apply(&Processor::RemoveToc, text), "# Start\n");
    }

    #[test]
    fn remove_toc_drops_protocol_outline() {
        let text = "# Kafka protocol guide\n\n  * Preliminaries\n    * Network\n    * \
                    [Partitioning](#partitioning)\n\n## Preliminaries\n* Keep this list\n";
        assert_eq!(
            apply(&Processor::RemoveToc, text),
            "# Kafka protocol guide\n\n\n## Preliminaries\n* Keep this list\n"
        );
    }

    #[test]
    fn promote_section_stops_at_next_top_heading() {
        let text = "## Setup\n### Migration to KRaft\n#### Phase 1\n##### Detail\n## Other\n### Keep";
        let processor = Processor::PromoteSection("Migration to KRaft".to_string());
        let out = apply(&processor, text);
        assert_eq!(
            out,
            "## Setup\n## Migration to KRaft\n### Phase 1\n#### Detail\n## Other\n### Keep"
        );
    }

    #[test]
    fn pipeline_runs_in_order() {
        let body = Body::parse("## 1. Intro");
        let processors = [Processor::StripHeadingNumbers, Processor::PromoteHeadings];
        assert_eq!(run_pipeline(body, &processors).render(), "# Intro");
    }

    #[test]
    fn parse_names() {
        assert_eq!("remove_toc".parse::<Processor>(), Ok(Processor::RemoveToc));
        assert!("promote_section".parse::<Processor>().is_err());
        assert!(Processor::from_parts("promote_headings", Some("x")).is_err());
        assert_eq!(
            Processor::from_parts("promote_section", Some("KRaft")),
            Ok(Processor::PromoteSection("KRaft".to_string()))
        );
        assert!("bogus".parse::<Processor>().is_err());
    }
}
