use std::path::PathBuf;

pub fn get_default_dbdir() -> PathBuf {
    if let Ok(path) = std::env::var("BKMTREE_DBDIR") {
        return PathBuf::from(path);
    }

    if let Ok(path) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(path).join("bkmtree");
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local/share/bkmtree");
    }

    #[cfg(target_os = "windows")]
    if let Ok(appdata) = std::env::var("APPDATA") {
        return PathBuf::from(appdata).join("bkmtree");
    }

    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

pub fn get_default_db_path() -> PathBuf {
    get_default_dbdir().join("bookmarks.db")
}

pub fn get_config_dir() -> PathBuf {
    if let Ok(path) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(path).join("bkmtree");
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config/bkmtree");
    }

    #[cfg(target_os = "windows")]
    if let Ok(appdata) = std::env::var("APPDATA") {
        return PathBuf::from(appdata).join("bkmtree");
    }

    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Folder id 0 is the wire form of "the root"
pub fn folder_ref(id: Option<usize>) -> Option<usize> {
    id.filter(|&id| id != 0)
}

/// Cut `s` to at most `max` chars, appending an ellipsis when shortened
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, None)]
    #[case(Some(0), None)]
    #[case(Some(7), Some(7))]
    fn test_folder_ref(#[case] input: Option<usize>, #[case] expected: Option<usize>) {
        assert_eq!(folder_ref(input), expected);
    }

    #[rstest]
    #[case("short", 10, "short")]
    #[case("exactly10!", 10, "exactly10!")]
    #[case("a longer title", 6, "a lon…")]
    fn test_truncate(#[case] input: &str, #[case] max: usize, #[case] expected: &str) {
        assert_eq!(truncate(input, max), expected);
    }

    #[test]
    fn test_default_db_path_file_name() {
        assert!(get_default_db_path().ends_with("bookmarks.db"));
    }
}
