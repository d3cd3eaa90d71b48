/// Error type for the bkmtree library
///
/// Every fallible operation in the crate returns this enum. Lookups of a missing
/// id are not errors (they return `None`); mutations on a missing id are.
#[derive(Debug, thiserror::Error)]
pub enum BkmError {
    /// Database-related errors (SQLite): connection, constraint, malformed SQL
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O errors (reading/writing bookmark files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request errors from the icon provider
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing errors
    #[error("Invalid URL: {0}")]
    UrlParse(String),

    #[error("Folder with ID {0} not found")]
    FolderNotFound(usize),

    #[error("Bookmark with ID {0} not found")]
    BookmarkNotFound(usize),

    /// Required field missing or empty
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Moving a folder under itself or one of its descendants
    #[error("Cannot move folder {folder} under folder {target}: target is inside the moved folder")]
    CyclicMove { folder: usize, target: usize },

    /// The walker reached the same folder twice
    #[error("Folder {0} was reached twice while walking the tree")]
    CycleDetected(usize),

    /// Folder nesting beyond what the walker follows
    #[error("Folder {folder} is nested deeper than {limit} levels")]
    TooDeep { folder: usize, limit: usize },

    /// Bookmark file is not parseable as the Netscape format
    #[error("Bookmark file decode error: {0}")]
    Decode(String),

    /// Icon provider returned something unusable
    #[error("Icon provider error: {0}")]
    Icon(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("YAML error: {0}")]
    Yaml(String),

    /// Generic error for cases that don't fit other categories
    #[error("{0}")]
    Other(String),
}

/// Result type alias using BkmError
pub type Result<T> = std::result::Result<T, BkmError>;

/// Coarse classification used by front ends to pick a client-facing status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Decode,
    Storage,
    External,
}

impl BkmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BkmError::FolderNotFound(_) | BkmError::BookmarkNotFound(_) => ErrorKind::NotFound,
            BkmError::InvalidInput(_)
            | BkmError::UrlParse(_)
            | BkmError::CyclicMove { .. } => ErrorKind::Validation,
            BkmError::Decode(_) => ErrorKind::Decode,
            BkmError::Database(_) | BkmError::CycleDetected(_) | BkmError::TooDeep { .. } => {
                ErrorKind::Storage
            }
            BkmError::Io(_)
            | BkmError::Http(_)
            | BkmError::Icon(_)
            | BkmError::Config(_)
            | BkmError::Yaml(_)
            | BkmError::Other(_) => ErrorKind::External,
        }
    }

    /// HTTP-style status a request layer should answer with
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::NotFound => 404,
            ErrorKind::Validation | ErrorKind::Decode => 400,
            ErrorKind::Storage | ErrorKind::External => 500,
        }
    }
}

impl From<String> for BkmError {
    fn from(s: String) -> Self {
        BkmError::Other(s)
    }
}

impl From<&str> for BkmError {
    fn from(s: &str) -> Self {
        BkmError::Other(s.to_string())
    }
}

impl From<tl::ParseError> for BkmError {
    fn from(err: tl::ParseError) -> Self {
        BkmError::Decode(err.to_string())
    }
}

impl From<serde_yaml::Error> for BkmError {
    fn from(err: serde_yaml::Error) -> Self {
        BkmError::Yaml(err.to_string())
    }
}
