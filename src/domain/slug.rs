use std::{collections::HashMap, fmt, ops::Deref};

/// Slug used when a title contains nothing usable.
const FALLBACK: &str = "section";

/// Filename stem reserved for section and version index pages.
pub const INDEX_STEM: &str = "_index";

/// A filename-safe identifier derived from a title.
///
/// Slugs are lowercase, contain only alphanumeric characters and single
/// dashes, and never start or end with a dash.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slug(String);

impl Slug {
    /// Derive a slug from arbitrary text.
    ///
    /// Every run of non-alphanumeric characters collapses to a single `-`.
    /// Text with no alphanumeric characters produces `section`.
    #[must_use]
    pub fn from_title(title: &str) -> Self {
        let mut slug = String::with_capacity(title.len());
        let mut pending_dash = false;

        for c in title.chars() {
            if c.is_alphanumeric() {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.extend(c.to_lowercase());
            } else {
                pending_dash = true;
            }
        }

        if slug.is_empty() {
            slug.push_str(FALLBACK);
        }

        Self(slug)
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The markdown filename for this slug.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.md", self.0)
    }
}

impl Deref for Slug {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hands out unique slugs within one output directory.
///
/// The first occurrence of a slug is used as-is; later collisions get a
/// numeric suffix (`-2`, `-3`, ...) in order of first occurrence.
#[derive(Debug, Default)]
pub struct SlugAllocator {
    seen: HashMap<String, usize>,
}

impl SlugAllocator {
    /// Create an allocator with the index page stem already reserved.
    #[must_use]
    pub fn new() -> Self {
        let mut allocator = Self::default();
        allocator.seen.insert(INDEX_STEM.to_string(), 1);
        allocator
    }

    /// Claim a unique slug derived from `title`.
    pub fn allocate(&mut self, title: &str) -> Slug {
        self.claim(Slug::from_title(title))
    }

    /// Claim `base`, suffixing it if it has already been handed out.
    pub fn claim(&mut self, base: Slug) -> Slug {
        let Some(count) = self.seen.get(base.as_str()).copied() else {
            self.seen.insert(base.0.clone(), 1);
            return base;
        };

        let mut n = count + 1;
        loop {
            let candidate = format!("{base}-{n}");
            if !self.seen.contains_key(&candidate) {
                self.seen.insert(base.0.clone(), n);
                self.seen.insert(candidate.clone(), 1);
                return Slug(candidate);
            }
            n += 1;
        }
    }
}
