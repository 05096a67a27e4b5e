/// Maximum accepted length of an uploaded filename, in bytes.
pub const MAX_FILENAME_LEN: usize = 200;

/// Why an uploaded filename was refused.
#[derive(Debug, PartialEq, Eq)]
pub enum FilenameError {
    Empty,
    TooLong,
    /// `/` or `\` present.
    ContainsPathSeparator,
    /// `..` on its own.
    PathTraversal,
    /// NUL, CR, LF and other ASCII control characters.
    ControlCharacter,
    /// Leading dot.
    Hidden,
}

impl FilenameError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "Filename cannot be empty",
            Self::TooLong => "Filename is too long",
            Self::ContainsPathSeparator => "Invalid filename: path separators are not allowed",
            Self::PathTraversal => "Invalid filename: '..' is not allowed",
            Self::ControlCharacter => "Invalid filename: control characters are not allowed",
            Self::Hidden => "Invalid filename: hidden files (starting with '.') are not allowed",
        }
    }
}

/// Validate the client-supplied name of a photo and return it trimmed.
///
/// The result becomes part of the stored name and of the `Content-Disposition`
/// header on download, so it must be a single flat path component without
/// characters that could split a header.
pub fn validate_flat_filename(filename: &str) -> Result<&str, FilenameError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err(FilenameError::Empty);
    }
    if trimmed.len() > MAX_FILENAME_LEN {
        return Err(FilenameError::TooLong);
    }
    if trimmed.chars().any(|c| c.is_ascii_control()) {
        return Err(FilenameError::ControlCharacter);
    }
    if trimmed.contains(['/', '\\']) {
        return Err(FilenameError::ContainsPathSeparator);
    }
    if trimmed == ".." {
        return Err(FilenameError::PathTraversal);
    }
    if trimmed.starts_with('.') {
        return Err(FilenameError::Hidden);
    }

    Ok(trimmed)
}
