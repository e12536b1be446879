//! Input checks and output path resolution for one document.

use std::fs::{File, Metadata};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::CliError;

/// Document format, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InputKind {
    Text,
    Html,
    Markdown,
}

impl InputKind {
    /// Detect the format from the (case-insensitive) extension of `path`.
    pub(crate) fn from_path(path: &Path) -> Result<Self, CliError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("txt") => Ok(Self::Text),
            Some("htm" | "html") => Ok(Self::Html),
            Some("md" | "markdown") => Ok(Self::Markdown),
            _ => Err(CliError::UnknownExtension(path.to_path_buf())),
        }
    }

    /// Human-readable name for messages.
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Text => "Plain text",
            Self::Html => "HTML",
            Self::Markdown => "Markdown",
        }
    }
}

/// Check that `path` is a readable regular file no larger than `max_size`.
pub(crate) fn check_input(path: &Path, max_size: u64) -> Result<Metadata, CliError> {
    let metadata = std::fs::metadata(path).map_err(|e| input_error(path, e))?;

    if !metadata.is_file() {
        return Err(CliError::NotAFile(path.to_path_buf()));
    }
    if metadata.len() > max_size {
        return Err(CliError::InputTooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            limit: max_size,
        });
    }

    Ok(metadata)
}

/// Open the input for reading.
pub(crate) fn open_input(path: &Path) -> Result<File, CliError> {
    File::open(path).map_err(|e| input_error(path, e))
}

/// Map an I/O error on the input to "missing" or "unreadable".
pub(crate) fn input_error(path: &Path, source: std::io::Error) -> CliError {
    if source.kind() == ErrorKind::NotFound {
        CliError::InputNotFound(path.to_path_buf())
    } else {
        CliError::InputUnreadable {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Output path: `<stem><suffix><ext>` in `directory` or next to the input.
///
/// HTML input produces a `.txt` file; other kinds keep their extension.
pub(crate) fn output_path(
    input: &Path,
    kind: InputKind,
    suffix: &str,
    directory: Option<&Path>,
) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = match kind {
        InputKind::Html => "txt".to_owned(),
        InputKind::Text | InputKind::Markdown => input
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };

    let filename = if extension.is_empty() {
        format!("{stem}{suffix}")
    } else {
        format!("{stem}{suffix}.{extension}")
    };

    match directory {
        Some(dir) => dir.join(filename),
        None => input.with_file_name(filename),
    }
}

/// Refuse to write the output over the input.
pub(crate) fn ensure_distinct(input: &Path, output: &Path) -> Result<(), CliError> {
    let same = match (input.canonicalize(), output.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => input == output,
    };
    if same {
        return Err(CliError::OutputIsInput(output.to_path_buf()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(
            InputKind::from_path(Path::new("a.txt")).unwrap(),
            InputKind::Text
        );
        assert_eq!(
            InputKind::from_path(Path::new("a.HTM")).unwrap(),
            InputKind::Html
        );
        assert_eq!(
            InputKind::from_path(Path::new("dir/a.Html")).unwrap(),
            InputKind::Html
        );
        assert_eq!(
            InputKind::from_path(Path::new("notes.md")).unwrap(),
            InputKind::Markdown
        );
    }

    #[test]
    fn test_unknown_extension() {
        for name in ["a.pdf", "README", "archive.tar.gz"] {
            let err = InputKind::from_path(Path::new(name)).unwrap_err();
            assert!(matches!(err, CliError::UnknownExtension(_)), "{name}");
        }
    }

    #[test]
    fn test_output_path_next_to_input() {
        assert_eq!(
            output_path(
                Path::new("/docs/myfile.txt"),
                InputKind::Text,
                "_plaintext",
                None
            ),
            PathBuf::from("/docs/myfile_plaintext.txt")
        );
    }

    #[test]
    fn test_output_path_keeps_extension_case() {
        assert_eq!(
            output_path(Path::new("Mail.TXT"), InputKind::Text, "_plaintext", None),
            PathBuf::from("Mail_plaintext.TXT")
        );
    }

    #[test]
    fn test_output_path_html_becomes_txt() {
        assert_eq!(
            output_path(
                Path::new("/web/page.html"),
                InputKind::Html,
                "_plaintext",
                Some(Path::new("/out"))
            ),
            PathBuf::from("/out/page_plaintext.txt")
        );
    }

    #[test]
    fn test_input_error_kinds_are_distinct() {
        let missing = input_error(Path::new("x.txt"), ErrorKind::NotFound.into());
        assert!(matches!(missing, CliError::InputNotFound(_)));

        let denied = input_error(Path::new("x.txt"), ErrorKind::PermissionDenied.into());
        assert!(matches!(denied, CliError::InputUnreadable { .. }));
        assert!(denied.to_string().contains("cannot be read"));
    }

    #[test]
    fn test_check_input_missing() {
        let dir = TempDir::new().unwrap();
        let err = check_input(&dir.path().join("absent.txt"), 100).unwrap_err();
        assert!(matches!(err, CliError::InputNotFound(_)));
    }

    #[test]
    fn test_check_input_directory() {
        let dir = TempDir::new().unwrap();
        let err = check_input(dir.path(), 100).unwrap_err();
        assert!(matches!(err, CliError::NotAFile(_)));
    }

    #[test]
    fn test_check_input_too_large() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.txt");
        std::fs::write(&path, "0123456789").unwrap();

        let err = check_input(&path, 4).unwrap_err();
        assert!(matches!(
            err,
            CliError::InputTooLarge {
                size: 10,
                limit: 4,
                ..
            }
        ));
        assert!(check_input(&path, 10).is_ok());
    }

    #[test]
    fn test_ensure_distinct() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("same.txt");
        std::fs::write(&path, "x").unwrap();

        assert!(matches!(
            ensure_distinct(&path, &path),
            Err(CliError::OutputIsInput(_))
        ));
        assert!(ensure_distinct(&path, &dir.path().join("other.txt")).is_ok());
    }
}
