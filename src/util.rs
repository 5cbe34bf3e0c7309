use std::path::PathBuf;

/// Expands a leading `~` in a path to the user's home directory.
/// Paths without a tilde (or with no resolvable home) come back unchanged.
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// `~/.grimoire`, where the config file and default rule database live.
pub fn app_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".grimoire"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde("/tmp/a.json"), PathBuf::from("/tmp/a.json"));
        assert_eq!(expand_tilde("rel/a.json"), PathBuf::from("rel/a.json"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/scripts/tb.json"), home.join("scripts/tb.json"));
            assert_eq!(expand_tilde("~"), home);
        }
    }
}
