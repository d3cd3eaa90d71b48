use serde::{Deserialize, Serialize};

/// A named tree node holding bookmarks and child folders
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Folder {
    pub id: usize,
    pub title: String,
    /// `None` for folders living at the root
    pub parent_id: Option<usize>,
    /// Cached number of folders whose parent is this folder
    pub child_folder_count: usize,
}

impl Folder {
    pub fn new(id: usize, title: String, parent_id: Option<usize>) -> Self {
        Self {
            id,
            title,
            parent_id,
            child_folder_count: 0,
        }
    }

    pub fn is_root_level(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn has_children(&self) -> bool {
        self.child_folder_count > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_creation() {
        let folder = Folder::new(2, "Development".to_string(), Some(1));

        assert_eq!(folder.id, 2);
        assert_eq!(folder.parent_id, Some(1));
        assert_eq!(folder.child_folder_count, 0);
        assert!(!folder.is_root_level());
        assert!(!folder.has_children());
    }

    #[test]
    fn test_folder_serialization() {
        let folder = Folder {
            id: 1,
            title: "IT".to_string(),
            parent_id: None,
            child_folder_count: 3,
        };

        let json = serde_json::to_string(&folder).unwrap();
        assert!(json.contains("\"parent_id\":null"));
        assert!(json.contains("\"child_folder_count\":3"));

        let deserialized: Folder = serde_json::from_str(&json).unwrap();
        assert_eq!(folder, deserialized);
    }
}
