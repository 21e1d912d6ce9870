//! Process settings read from the environment.

use std::path::PathBuf;

use ito::DEFAULT_BIND;

/// Listen address override.
pub const BIND_VAR: &str = "ITO_BIND";

/// Path to a theme catalog JSON file.
pub const THEMES_VAR: &str = "ITO_THEMES";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind: String,
    /// `None` means the built-in catalog.
    pub themes: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v: &String| !v.trim().is_empty());
        Self {
            bind: get(BIND_VAR).unwrap_or_else(|| DEFAULT_BIND.to_string()),
            themes: get(THEMES_VAR).map(PathBuf::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings(vars: &[(&str, &str)]) -> Settings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_from_lookup_empty_uses_defaults() {
        let s = settings(&[]);
        assert_eq!(s.bind, "0.0.0.0:3000");
        assert_eq!(s.themes, None);
    }

    #[test]
    fn test_from_lookup_reads_overrides() {
        let s = settings(&[(BIND_VAR, "127.0.0.1:9000"), (THEMES_VAR, "/etc/ito/themes.json")]);
        assert_eq!(s.bind, "127.0.0.1:9000");
        assert_eq!(s.themes, Some(PathBuf::from("/etc/ito/themes.json")));
    }

    #[test]
    fn test_from_lookup_blank_values_are_unset() {
        let s = settings(&[(BIND_VAR, "  "), (THEMES_VAR, "")]);
        assert_eq!(s.bind, "0.0.0.0:3000");
        assert_eq!(s.themes, None);
    }
}
