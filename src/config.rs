//! Optional config file loading. Search order: ./wotscrape.toml, then
//! $XDG_CONFIG_HOME/wotscrape/config.toml (or ~/.config/wotscrape/config.toml).

use serde::Deserialize;
use std::path::PathBuf;

/// Config file contents. All fields optional; only present keys override defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case", default, deny_unknown_fields)]
pub struct Config {
    /// Root for per-book chapter directories and EPUB output. Relative paths are relative to CWD.
    pub data_dir: Option<PathBuf>,
    /// HTTP User-Agent header.
    pub user_agent: Option<String>,
    /// Delay in seconds between requests.
    pub request_delay_secs: Option<u64>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// EPUB creator metadata (default: "Wheel of Time WIKI").
    pub author: Option<String>,
}

/// Search order: (1) ./wotscrape.toml, (2) $XDG_CONFIG_HOME/wotscrape/config.toml.
/// Missing file returns Ok(None). Invalid TOML or I/O error reading a present file returns Err.
pub fn load_config() -> Result<Option<Config>, String> {
    let cwd = std::env::current_dir()
        .map_err(|e| format!("Cannot determine current directory: {}", e))?;
    let mut paths = vec![cwd.join("wotscrape.toml")];
    if let Some(d) = dirs::config_dir() {
        paths.push(d.join("wotscrape").join("config.toml"));
    }
    for path in &paths {
        if path.exists() {
            let s = std::fs::read_to_string(path)
                .map_err(|e| format!("Cannot read config {}: {}", path.display(), e))?;
            let config: Config = toml::from_str(&s)
                .map_err(|e| format!("Invalid config {}: {}", path.display(), e))?;
            log::debug!("loaded config from {}", path.display());
            return Ok(Some(config));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_config() {
        let c: Config = toml::from_str("").unwrap();
        assert!(c.data_dir.is_none());
        assert!(c.user_agent.is_none());
        assert!(c.request_delay_secs.is_none());
        assert!(c.timeout_secs.is_none());
        assert!(c.author.is_none());
    }

    #[test]
    fn parse_full_config() {
        let s = r#"
            data_dir = "books"
            user_agent = "Custom/1.0"
            request_delay_secs = 3
            timeout_secs = 60
            author = "Tar Valon Library"
        "#;
        let c: Config = toml::from_str(s).unwrap();
        assert_eq!(c.data_dir.as_deref(), Some(std::path::Path::new("books")));
        assert_eq!(c.user_agent.as_deref(), Some("Custom/1.0"));
        assert_eq!(c.request_delay_secs, Some(3));
        assert_eq!(c.timeout_secs, Some(60));
        assert_eq!(c.author.as_deref(), Some("Tar Valon Library"));
    }

    #[test]
    fn parse_partial_config() {
        let c: Config = toml::from_str("timeout_secs = 10").unwrap();
        assert_eq!(c.timeout_secs, Some(10));
        assert!(c.data_dir.is_none());
    }

    #[test]
    fn unknown_key_errors() {
        assert!(toml::from_str::<Config>("output_dir = \"x\"").is_err());
    }

    #[test]
    fn invalid_toml_errors() {
        assert!(toml::from_str::<Config>("data_dir = [").is_err());
    }
}
