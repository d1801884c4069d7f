//! Filesystem path helpers

use std::path::PathBuf;

/// Expand a leading `~` to the user's home directory
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = std::env::home_dir()
    {
        return home.join(stripped);
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_path_plain() {
        assert_eq!(expand_path("/tmp/data"), PathBuf::from("/tmp/data"));
        assert_eq!(expand_path("relative/dir"), PathBuf::from("relative/dir"));
    }

    #[test]
    fn test_expand_path_tilde() {
        if let Some(home) = std::env::home_dir() {
            assert_eq!(expand_path("~/data"), home.join("data"));
        }
    }
}
