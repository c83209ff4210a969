use std::{
    fs::File,
    io::{self, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use crate::domain::{Document, FrontMatter, Template};

/// Read a pre-processed markdown file.
///
/// Any front matter block at the very start of the file is discarded; the
/// document is always emitted with freshly synthesized front matter.
///
/// # Errors
///
/// Returns [`LoadError::NotFound`] if the file does not exist, and
/// [`LoadError::Io`] if it cannot be read or is not UTF-8.
pub fn read_document(path: &Path, source_path: impl Into<PathBuf>) -> Result<Document, LoadError> {
    let mut file = File::open(path).map_err(|io_error| match io_error.kind() {
        io::ErrorKind::NotFound => LoadError::NotFound,
        _ => LoadError::Io(io_error),
    })?;

    let mut content = String::new();
    file.read_to_string(&mut content)?;

    Ok(Document::parse(source_path, strip_front_matter(&content)))
}

/// Write a document with its front matter rendered through `template`.
///
/// Parent directories are created automatically if they don't exist.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_document(path: &Path, document: &Document, template: &Template) -> io::Result<()> {
    let front_matter = document.front_matter.render(template);
    let body = document.body.render();
    write_text(path, &format!("{front_matter}\n{body}"))
}

/// Write a page that consists of front matter only, such as a section index.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_front_matter(
    path: &Path,
    front_matter: &FrontMatter,
    template: &Template,
) -> io::Result<()> {
    write_text(path, &front_matter.render(template))
}

fn write_text(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(text.as_bytes())?;
    writer.flush()
}

/// Remove a leading `---` delimited front matter block and the blank lines
/// after it.
fn strip_front_matter(content: &str) -> &str {
    let mut lines = content.split_inclusive('\n');
    match lines.next() {
        Some(first) if first.trim_end() == "---" => {}
        _ => return content,
    }

    let mut offset = content.find('\n').map_or(content.len(), |i| i + 1);
    for line in lines {
        offset += line.len();
        if line.trim_end() == "---" {
            return content[offset..].trim_start_matches(['\n', '\r']);
        }
    }

    // Unterminated: not front matter after all.
    content
}

/// Errors that can occur when loading a markdown source.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file was not found.
    #[error("file not found")]
    NotFound,
    /// An I/O error occurred.
    #[error("failed to read markdown: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;
    use test_case::test_case;

    use super::*;

    #[test_case("---\ntitle: x\n---\n\n# Body\n", "# Body\n"; "front matter and blank lines")]
    #[test_case("# Body\n---\nmore\n", "# Body\n---\nmore\n"; "rule later in file")]
    #[test_case("---\nnever closed\n", "---\nnever closed\n"; "unterminated")]
    #[test_case("---\n---\ntext", "text"; "empty front matter")]
    fn strips_leading_front_matter(input: &str, expected: &str) {
        assert_eq!(strip_front_matter(input), expected);
    }

    #[test]
    fn read_missing_file_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let result = read_document(&tmp.path().join("missing.md"), "missing.md");
        assert!(matches!(result, Err(LoadError::NotFound)));
    }

    #[test]
    fn write_then_read_keeps_body() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/dir/page.md");

        let mut document = Document::parse("page.md", "# Page\n\ntext\n");
        document.front_matter.title = "Page".to_string();
        document.front_matter.weight = Some(20);
        let template = Template::new("---\ntitle: {title}\nweight: {weight}\n---");

        write_document(&path, &document, &template).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "---\ntitle: \"Page\"\nweight: 20\n---\n\n# Page\n\ntext\n");

        let read = read_document(&path, "page.md").unwrap();
        assert_eq!(read.body, document.body);
    }

    #[test]
    fn index_pages_have_no_body() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("_index.md");
        let front = FrontMatter {
            title: "Security".to_string(),
            ..FrontMatter::default()
        };

        write_front_matter(&path, &front, &Template::new("---\ntitle: {title}\n---")).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "---\ntitle: \"Security\"\n---\n"
        );
    }
}
