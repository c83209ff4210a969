//! Domain models for documentation restructuring.
//!
//! Everything in this module is pure: documents, policies and transforms are
//! plain values, and nothing here touches the filesystem except
//! [`Policy::load`].

/// In-memory markdown documents.
pub mod document;
pub use document::{Block, Body, Document, Heading};

pub mod front_matter;
pub use front_matter::{FrontMatter, Template};

pub mod link;
pub use link::{LinkAction, LinkRewriter, LinkRule};

pub mod processor;
pub use processor::Processor;

/// The restructuring policy and its validation.
pub mod policy;
pub use policy::{ConfigurationError, Policy, Violation};

pub mod section;
pub use section::{FileEntry, InputDir, Section, SpecialFileRule, SpecialProcessor, Strategy};

/// Collision-safe filename slugs.
pub mod slug;
pub use slug::{Slug, SlugAllocator};

pub mod split;
pub use split::{Boundaries, HeadingSplitter, Part, Preamble, Split};
