//! Splitting one markdown document into several at a heading depth.

use std::{fmt, str::FromStr};

use crate::domain::{
    document::{Block, Body},
    slug::{Slug, SlugAllocator},
};

/// Slug used for the introductory sub-document.
const INTRO_SLUG: &str = "overview";

/// What happens to content that appears before the first split heading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Preamble {
    /// Discard it.
    #[default]
    Drop,
    /// Emit it as a leading sub-document titled after the section.
    Intro,
}

impl FromStr for Preamble {
    type Err = UnknownPreambleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "drop" => Ok(Self::Drop),
            "intro" => Ok(Self::Intro),
            other => Err(UnknownPreambleError(other.to_string())),
        }
    }
}

impl fmt::Display for Preamble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Drop => "drop",
            Self::Intro => "intro",
        })
    }
}

/// A preamble mode that is not recognised.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown preamble mode '{0}' (expected drop or intro)")]
pub struct UnknownPreambleError(String);

/// One sub-document produced by a split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Title taken from the leading heading.
    pub title: String,
    /// Unique filename stem within the section.
    pub slug: Slug,
    /// The sub-document body, leading heading included.
    pub body: Body,
}

/// How the source's heading structure related to the split depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundaries {
    /// The source was split at this many headings.
    Found(usize),
    /// The source has headings, but none at the split depth.
    NoneAtDepth,
    /// The source has no headings at all.
    NoHeadings,
}

/// The result of splitting a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    /// Sub-documents in source order.
    pub parts: Vec<Part>,
    /// What the splitter found.
    pub boundaries: Boundaries,
}

/// Splits documents at every heading of one depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadingSplitter {
    depth: u8,
    preamble: Preamble,
}

impl HeadingSplitter {
    /// Create a splitter for headings at `depth` (clamped to `1..=6`).
    #[must_use]
    pub fn new(depth: u8, preamble: Preamble) -> Self {
        Self {
            depth: depth.clamp(1, 6),
            preamble,
        }
    }

    /// The heading depth this splitter splits at.
    #[must_use]
    pub const fn depth(&self) -> u8 {
        self.depth
    }

    /// Partition `body` into sub-documents.
    ///
    /// Every heading at exactly the split depth starts a new sub-document
    /// that runs up to the next such heading. A body with no heading at the
    /// split depth yields a single sub-document equal to the whole input,
    /// titled after its first heading or, failing that, `fallback_title`.
    #[must_use]
    pub fn split(&self, body: &Body, fallback_title: &str) -> Split {
        let blocks = body.blocks();
        let starts: Vec<usize> = blocks
            .iter()
            .enumerate()
            .filter(|(_, block)| matches!(block, Block::Heading(h) if h.level() == self.depth))
            .map(|(i, _)| i)
            .collect();

        let mut slugs = SlugAllocator::new();

        let Some(&first) = starts.first() else {
            let (title, boundaries) = match body.headings().next() {
                Some(heading) => (non_empty(heading.plain_text(), fallback_title), Boundaries::NoneAtDepth),
                None => (fallback_title.to_string(), Boundaries::NoHeadings),
            };
            let slug = slugs.allocate(&title);
            return Split {
                parts: vec![Part {
                    title,
                    slug,
                    body: body.clone(),
                }],
                boundaries,
            };
        };

        let mut parts = Vec::with_capacity(starts.len() + 1);

        let preamble = Body::from_blocks(blocks[..first].to_vec());
        if self.preamble == Preamble::Intro && !preamble.is_blank() {
            parts.push(Part {
                title: fallback_title.to_string(),
                slug: slugs.claim(Slug::from_title(INTRO_SLUG)),
                body: preamble,
            });
        }

        for (n, &start) in starts.iter().enumerate() {
            let end = starts.get(n + 1).copied().unwrap_or(blocks.len());
            let title = match &blocks[start] {
                Block::Heading(heading) => non_empty(heading.plain_text(), fallback_title),
                _ => fallback_title.to_string(),
            };
            let slug = slugs.allocate(&title);
            parts.push(Part {
                title,
                slug,
                body: Body::from_blocks(blocks[start..end].to_vec()),
            });
        }

        Split {
            parts,
            boundaries: Boundaries::Found(starts.len()),
        }
    }
}

fn non_empty(title: String, fallback: &str) -> String {
    if title.is_empty() {
        fallback.to_string()
    } else {
        title
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "Preamble text\n\n## A\nalpha\n### A.1\nalpha one\n## B\nbeta\n### B.1\nbeta \
                          one\n## C\ngamma\n### C.1\n";

    fn slugs(split: &Split) -> Vec<&str> {
        split.parts.iter().map(|p| p.slug.as_str()).collect()
    }

    #[test]
    fn splits_at_depth_two() {
        let split = HeadingSplitter::new(2, Preamble::Drop).split(&Body::parse(SOURCE), "Ops");

        assert_eq!(split.boundaries, Boundaries::Found(3));
        assert_eq!(slugs(&split), ["a", "b", "c"]);
        assert_eq!(split.parts[0].body.render(), "## A\nalpha\n### A.1\nalpha one");
        assert_eq!(split.parts[1].body.render(), "## B\nbeta\n### B.1\nbeta one");
        assert_eq!(split.parts[2].body.render(), "## C\ngamma\n### C.1\n");
        assert_eq!(split.parts[2].title, "C");
    }

    #[test]
    fn intro_keeps_preamble_and_reconstructs_source() {
        let body = Body::parse(SOURCE);
        let split = HeadingSplitter::new(2, Preamble::Intro).split(&body, "Operations");

        assert_eq!(slugs(&split), ["overview", "a", "b", "c"]);
        assert_eq!(split.parts[0].title, "Operations");

        let rebuilt: Vec<String> = split.parts.iter().map(|p| p.body.render()).collect();
        assert_eq!(rebuilt.join("\n"), SOURCE);
    }

    #[test]
    fn blank_preamble_is_not_an_intro() {
        let body = Body::parse("\n\n## Only\ntext");
        let split = HeadingSplitter::new(2, Preamble::Intro).split(&body, "S");
        assert_eq!(slugs(&split), ["only"]);
    }

    #[test]
    fn no_heading_at_depth_yields_whole_document() {
        let body = Body::parse("# Top\ntext\n### Deep\nmore");
        let split = HeadingSplitter::new(2, Preamble::Drop).split(&body, "Fallback");

        assert_eq!(split.boundaries, Boundaries::NoneAtDepth);
        assert_eq!(split.parts.len(), 1);
        assert_eq!(split.parts[0].title, "Top");
        assert_eq!(split.parts[0].body, body);
    }

    #[test]
    fn no_headings_at_all_uses_fallback_title() {
        let body = Body::parse("just text");
        let split = HeadingSplitter::new(2, Preamble::Drop).split(&body, "Security");

        assert_eq!(split.boundaries, Boundaries::NoHeadings);
        assert_eq!(slugs(&split), ["security"]);
        assert_eq!(split.parts[0].body, body);
    }

    #[test]
    fn duplicate_titles_get_suffixes() {
        let body = Body::parse("## Examples\n1\n## Examples\n2\n## Examples\n3");
        let split = HeadingSplitter::new(2, Preamble::Drop).split(&body, "S");
        assert_eq!(slugs(&split), ["examples", "examples-2", "examples-3"]);
    }

    #[test]
    fn headings_in_code_do_not_split() {
        let body = Body::parse("## Real\n```\n## Fake\n```\ntext");
        let split = HeadingSplitter::new(2, Preamble::Drop).split(&body, "S");
        assert_eq!(split.parts.len(), 1);
    }

    #[test]
    fn title_comes_from_plain_heading_text() {
        let body = Body::parse("## [Producer API](#producerapi)\ntext");
        let split = HeadingSplitter::new(2, Preamble::Drop).split(&body, "S");
        assert_eq!(split.parts[0].title, "Producer API");
        assert_eq!(split.parts[0].slug.as_str(), "producer-api");
    }

    #[test]
    fn parse_preamble() {
        assert_eq!("intro".parse::<Preamble>(), Ok(Preamble::Intro));
        assert!("keep".parse::<Preamble>().is_err());
    }
}
