//! Source units

use std::path::Path;

use compenv_core_types::SourceId;

use crate::errors::{EnvError, Result};

/// One source file handed to a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    pub id: SourceId,
    pub path: String,
    pub text: String,
}

impl SourceUnit {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: SourceId::new(),
            path: path.into(),
            text: text.into(),
        }
    }

    /// Read a unit from disk (UTF-8)
    ///
    /// # Errors
    /// * `Io` - the file cannot be read or is not valid UTF-8
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| EnvError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::new(path.display().to_string(), text))
    }

    pub fn line_count(&self) -> usize {
        count_lines(&self.text)
    }

    /// Lowercased file extension, if any
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.path)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
    }
}

/// `\n`, `\r` and `\r\n` each count as one break
pub fn count_line_breaks(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut breaks = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => breaks += 1,
            b'\r' => {
                breaks += 1;
                if bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    breaks
}

pub fn ends_with_line_break(text: &str) -> bool {
    text.ends_with('\n') || text.ends_with('\r')
}

/// Lines of `text`; an unterminated last line still counts
pub fn count_lines(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    let breaks = count_line_breaks(text);
    if ends_with_line_break(text) {
        breaks
    } else {
        breaks + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_lines() {
        assert_eq!(count_lines("a\nb\n"), 2);
        assert_eq!(count_lines("a\nb"), 2);
        assert_eq!(count_lines(""), 0);
        assert_eq!(count_lines("\n"), 1);
        assert_eq!(count_lines("single"), 1);
        assert_eq!(count_lines("\n\n\n"), 3);
    }

    #[test]
    fn test_crlf_counts_once() {
        assert_eq!(count_lines("a\r\nb\r\n"), 2);
        assert_eq!(count_lines("a\rb\rc"), 3);
        assert_eq!(count_lines("a\r\n\rb"), 3);
        assert_eq!(count_line_breaks("\r\n"), 1);
        assert_eq!(count_line_breaks("\n\r"), 2);
    }

    #[test]
    fn test_unit_ids_are_unique() {
        let a = SourceUnit::new("a.kt", "x");
        let b = SourceUnit::new("a.kt", "x");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_extension_is_lowercased() {
        assert_eq!(SourceUnit::new("src/Main.KT", "").extension().as_deref(), Some("kt"));
        assert_eq!(SourceUnit::new("Makefile", "").extension(), None);
    }

    #[test]
    fn test_from_file_missing_is_io_error() {
        let result = SourceUnit::from_file(Path::new("/definitely/not/here.kt"));
        assert!(matches!(result, Err(EnvError::Io { .. })));
    }
}
