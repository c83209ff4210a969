//! Data files extracted from pages outside the versioned documentation.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::Serialize;

use crate::{
    domain::{SpecialFileRule, SpecialProcessor},
    storage::Layout,
};

const COMMITTERS_HEADING: &str = "# The committers";
const TABLE_SEPARATOR: &str = "---|---|---|---";
const POWERED_BY_ARRAY: &str = "var poweredByItems = [";

/// Run one special file rule, returning the path of the data file written.
///
/// # Errors
///
/// Returns an error if the input file is missing or unreadable, if the
/// expected content cannot be found in it, or if the data file cannot be
/// written.
pub fn process(rule: &SpecialFileRule, layout: &Layout) -> Result<PathBuf, SpecialFileError> {
    let input = layout.input_dir(&rule.input_dir).join(&rule.file);
    let content = fs::read_to_string(&input).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => SpecialFileError::NotFound(input.clone()),
        _ => SpecialFileError::Io {
            path: input.clone(),
            source,
        },
    })?;

    tracing::info!("processing special file {} with {}", input.display(), rule.processor);

    let json = match rule.processor {
        SpecialProcessor::Committers => {
            let committers = parse_committers(&content);
            tracing::info!("extracted {} committers", committers.len());
            serde_json::to_string_pretty(&committers)?
        }
        SpecialProcessor::PoweredBy => {
            let array = extract_powered_by(&content)?;
            match serde_json::from_str::<serde_json::Value>(array) {
                Ok(value) => serde_json::to_string_pretty(&value)?,
                Err(e) => {
                    tracing::warn!("poweredByItems is not valid JSON ({e}); writing it verbatim");
                    array.to_string()
                }
            }
        }
    };

    let output = layout.data().join(rule.processor.output_file());
    write(&output, &json)?;
    Ok(output)
}

fn write(path: &Path, content: &str) -> Result<(), SpecialFileError> {
    let io_error = |source| SpecialFileError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    fs::write(path, content).map_err(io_error)
}

/// One committer, as consumed by the site's data templates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Committer {
    /// Absolute path of the portrait.
    pub image: String,
    /// Display name.
    pub name: String,
    /// Role, such as "PMC member".
    pub title: String,
    /// `LinkedIn` profile URL.
    #[serde(rename = "linkedIn")]
    pub linkedin: Option<String>,
    /// Twitter profile URL.
    pub twitter: Option<String>,
    /// GitHub profile URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    /// Personal website.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// Mastodon profile URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mastodon: Option<String>,
}

/// Parse the committers table.
///
/// Each committer starts on a row whose first cell is an image
/// (`![](path) | Name`), followed by a line with the username, a line with
/// the role, and then one link per line until the next blank line or table
/// separator.
#[must_use]
pub fn parse_committers(content: &str) -> Vec<Committer> {
    let lines: Vec<&str> = content.lines().map(str::trim).collect();
    let start = lines
        .iter()
        .position(|line| *line == COMMITTERS_HEADING)
        .map_or(0, |i| i + 1);

    let mut committers = Vec::new();
    let mut i = start;
    while i + 1 < lines.len() {
        let line = lines[i];
        let Some(rest) = line.strip_prefix("![](") else {
            i += 1;
            continue;
        };

        let mut cells = rest.split('|');
        let image = cells.next().unwrap_or_default().trim().trim_end_matches(')');
        let name = cells.next().unwrap_or_default().trim();
        let title = lines.get(i + 2).copied().unwrap_or_default();

        let mut committer = Committer {
            image: format!("/{image}"),
            name: name.to_string(),
            title: title.to_string(),
            ..Committer::default()
        };

        let mut j = i + 3;
        while let Some(&link) = lines.get(j) {
            if link.starts_with("![](") {
                break;
            }
            j += 1;
            if link.is_empty() || link == TABLE_SEPARATOR {
                break;
            }
            let Some(url) = link_target(link) else {
                continue;
            };
            if link.contains("[/in/") {
                committer.linkedin = Some(url);
            } else if link.contains("[@") && link.contains("hachyderm.io") {
                committer.mastodon = Some(url);
            } else if link.contains("[@") {
                committer.twitter = Some(url);
            } else if link.contains("[github.com/") {
                committer.github = Some(url);
            } else if !["@", "/in/", "github"].iter().any(|x| link.contains(x)) {
                committer.website = Some(url);
            }
        }

        committers.push(committer);
        i = j.max(i + 1);
    }

    committers
}

fn link_target(line: &str) -> Option<String> {
    let (_, after) = line.split_once("](")?;
    let (url, _) = after.split_once(')')?;
    Some(url.to_string())
}

/// Find the `poweredByItems` array literal inside the page's first script
/// block.
fn extract_powered_by(content: &str) -> Result<&str, SpecialFileError> {
    let start = content
        .find("<script>")
        .ok_or(SpecialFileError::Missing("<script> block"))?;
    let end = content[start..]
        .find("</script>")
        .map(|i| start + i)
        .ok_or(SpecialFileError::Missing("</script> tag"))?;
    let script = &content[start..end];

    let declaration = script
        .find(POWERED_BY_ARRAY)
        .ok_or(SpecialFileError::Missing("poweredByItems array"))?;
    let open = declaration + POWERED_BY_ARRAY.len() - 1;

    let mut depth = 0usize;
    for (offset, c) in script[open..].char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(&script[open..=open + offset]);
                }
            }
            _ => {}
        }
    }

    Err(SpecialFileError::Missing("closing bracket of poweredByItems"))
}

/// A special file could not be processed.
#[derive(Debug, thiserror::Error)]
pub enum SpecialFileError {
    /// The input file does not exist.
    #[error("{} not found", .0.display())]
    NotFound(PathBuf),
    /// The input could not be read or the output could not be written.
    #[error("{}: {source}", .path.display())]
    Io {
        /// The path that failed.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },
    /// Expected content is missing from the input.
    #[error("could not find {0}")]
    Missing(&'static str),
    /// The extracted data could not be serialized.
    #[error("failed to serialize data: {0}")]
    Json(#[from] serde_json::Error),
}
