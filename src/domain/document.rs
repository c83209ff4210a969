//! In-memory markdown documents.
//!
//! A [`Document`] is a markdown body split into block-level elements plus the
//! front matter values that will be rendered above it. Only ATX headings and
//! fenced code blocks are recognised structurally; every other line is kept
//! verbatim so that rendering a parsed body reproduces the original text.

use std::{fmt, path::PathBuf, sync::LazyLock};

use regex::Regex;

use crate::domain::front_matter::FrontMatter;

static HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(#{1,6})(?:[ \t]+(.*?))?(?:[ \t]+#+)?[ \t]*$").expect("valid heading regex")
});

/// An ATX heading (`## Title`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    level: u8,
    text: String,
}

impl Heading {
    /// Create a heading. The level is clamped to `1..=6`.
    #[must_use]
    pub fn new(level: u8, text: impl Into<String>) -> Self {
        Self {
            level: level.clamp(1, 6),
            text: text.into(),
        }
    }

    /// Parse a single line as an ATX heading.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let captures = HEADING.captures(line)?;
        let level = u8::try_from(captures[1].len()).ok()?;
        let text = captures.get(2).map_or("", |m| m.as_str());
        Some(Self::new(level, text))
    }

    /// Depth of the heading, 1 to 6.
    #[must_use]
    pub const fn level(&self) -> u8 {
        self.level
    }

    /// Raw heading text, inline markup included.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Change the heading depth. The level is clamped to `1..=6`.
    pub fn set_level(&mut self, level: u8) {
        self.level = level.clamp(1, 6);
    }

    /// Replace the heading text.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// The heading text with inline markup removed, suitable for a title.
    ///
    /// Links keep their label, HTML tags are dropped, and emphasis and code
    /// markers are stripped.
    #[must_use]
    pub fn plain_text(&self) -> String {
        static LINK: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"!?\[([^\]]*)\]\([^)]*\)").expect("valid link regex")
        });
        static TAG: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"</?[A-Za-z][^>]*>").expect("valid tag regex"));

        let text = LINK.replace_all(&self.text, "$1");
        let text = TAG.replace_all(&text, "");
        let text: String = text
            .chars()
            .filter(|c| !matches!(c, '*' | '`' | '\\'))
            .collect();
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

impl fmt::Display for Heading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.level {
            f.write_str("#")?;
        }
        if !self.text.is_empty() {
            write!(f, " {}", self.text)?;
        }
        Ok(())
    }
}

/// A block-level markdown element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// An ATX heading line.
    Heading(Heading),
    /// A fenced code block, fences included, kept verbatim.
    Fence(String),
    /// A single line of any other content, kept verbatim.
    Line(String),
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Heading(heading) => heading.fmt(f),
            Self::Fence(text) | Self::Line(text) => f.write_str(text),
        }
    }
}

/// An ordered sequence of blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Body {
    blocks: Vec<Block>,
}

impl Body {
    /// Parse markdown text into blocks.
    ///
    /// Lines inside fenced code blocks are never treated as headings. An
    /// unterminated fence runs to the end of the text.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut blocks = Vec::new();
        let mut fence: Option<(String, Vec<&str>)> = None;

        for line in text.split('\n') {
            if let Some((marker, lines)) = fence.as_mut() {
                lines.push(line);
                if line.trim_start().starts_with(marker.as_str()) && lines.len() > 1 {
                    let (_, lines) = fence.take().unwrap_or_default();
                    blocks.push(Block::Fence(lines.join("\n")));
                }
                continue;
            }

            if let Some(marker) = fence_marker(line) {
                fence = Some((marker, vec![line]));
            } else if let Some(heading) = Heading::parse(line) {
                blocks.push(Block::Heading(heading));
            } else {
                blocks.push(Block::Line(line.to_string()));
            }
        }

        if let Some((_, lines)) = fence {
            blocks.push(Block::Fence(lines.join("\n")));
        }

        Self { blocks }
    }

    /// Build a body from already parsed blocks.
    #[must_use]
    pub const fn from_blocks(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// The blocks in document order.
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Consume the body, returning its blocks.
    #[must_use]
    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    /// Iterate over the headings in document order.
    pub fn headings(&self) -> impl Iterator<Item = &Heading> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Heading(heading) => Some(heading),
            _ => None,
        })
    }

    /// Iterate mutably over the headings in document order.
    pub fn headings_mut(&mut self) -> impl Iterator<Item = &mut Heading> {
        self.blocks.iter_mut().filter_map(|block| match block {
            Block::Heading(heading) => Some(heading),
            _ => None,
        })
    }

    /// Whether the body has no blocks, or only blank lines.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.blocks
            .iter()
            .all(|block| matches!(block, Block::Line(line) if line.trim().is_empty()))
    }

    /// Render the body back to markdown text.
    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            block.fmt(f)?;
        }
        Ok(())
    }
}

/// Returns the opening fence marker (three backticks or tildes) of `line`.
fn fence_marker(line: &str) -> Option<String> {
    let trimmed = line.trim_start();
    ["```", "~~~"]
        .into_iter()
        .find(|marker| trimmed.starts_with(marker))
        .map(str::to_string)
}

/// A markdown document on its way from the input tree to the output tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Values rendered into the front matter template.
    pub front_matter: FrontMatter,
    /// The markdown body.
    pub body: Body,
    /// Where the document was read from, relative to the version root.
    pub source_path: PathBuf,
    /// Ordering weight within its section.
    pub weight: Option<u32>,
}

impl Document {
    /// Create a document with empty front matter and no weight.
    #[must_use]
    pub fn new(source_path: impl Into<PathBuf>, body: Body) -> Self {
        Self {
            front_matter: FrontMatter::default(),
            body,
            source_path: source_path.into(),
            weight: None,
        }
    }

    /// Parse a document from markdown text.
    #[must_use]
    pub fn parse(source_path: impl Into<PathBuf>, text: &str) -> Self {
        Self::new(source_path, Body::parse(text))
    }
}
