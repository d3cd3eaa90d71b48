use serde::{Deserialize, Serialize};

/// Represents a bookmark and the folder owning it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Bookmark {
    pub id: usize,
    pub title: String,
    pub url: String,
    /// Inline image: a `data:` URI or, for legacy rows, bare base64. Empty when unknown.
    #[serde(default)]
    pub favicon: String,
    #[serde(default)]
    pub starred: bool,
    /// `None` for bookmarks living at the root
    pub folder_id: Option<usize>,
}

impl Bookmark {
    /// Create a new, unstarred Bookmark without favicon
    pub fn new(id: usize, title: String, url: String, folder_id: Option<usize>) -> Self {
        Self {
            id,
            title,
            url,
            favicon: String::new(),
            starred: false,
            folder_id,
        }
    }

    pub fn has_favicon(&self) -> bool {
        !self.favicon.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bookmark_creation() {
        let bookmark = Bookmark::new(
            1,
            "GoLang".to_string(),
            "https://golang.org/".to_string(),
            Some(2),
        );

        assert_eq!(bookmark.id, 1);
        assert_eq!(bookmark.url, "https://golang.org/");
        assert_eq!(bookmark.folder_id, Some(2));
        assert!(!bookmark.starred);
        assert!(!bookmark.has_favicon());
    }

    #[test]
    fn test_bookmark_deserialization_defaults() {
        let json = r#"{"id":7,"title":"X","url":"https://x.test","folder_id":null}"#;
        let bookmark: Bookmark = serde_json::from_str(json).unwrap();

        assert_eq!(bookmark.favicon, "");
        assert!(!bookmark.starred);
        assert_eq!(bookmark.folder_id, None);
    }
}
