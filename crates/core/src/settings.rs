//! `wikirc.toml` settings
//!
//! Everything has a default so an absent file or section is valid:
//!
//! ```toml
//! [wiki]
//! database = "/var/lib/wikirc/wiki.db"
//! name = "xwiki"
//! base_url = "https://wiki.example.org/xwiki/"
//! bot_user = "XWiki.IRCBot"
//!
//! [notifications]
//! exclusion_patterns = ["IRC\\.Archive.*"]
//!
//! [feed]
//! poll_interval_ms = 1000
//! batch_size = 100
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::context::{Execution, ExecutionContext};
use crate::error::{Error, Result};

pub const SETTINGS_FILE: &str = "wikirc.toml";
const DATABASE_FILE: &str = "wiki.db";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub wiki: WikiSettings,
    pub notifications: NotificationSettings,
    pub feed: FeedSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WikiSettings {
    /// SQLite file; defaults to the platform data directory
    pub database: Option<PathBuf>,
    /// Wiki the bot runs in
    pub name: String,
    /// External URL root used in notification links
    pub base_url: String,
    /// Identity the bot acts as when reading configuration
    pub bot_user: String,
}

impl Default for WikiSettings {
    fn default() -> Self {
        Self {
            database: None,
            name: "xwiki".to_string(),
            base_url: "http://localhost:8080/xwiki/".to_string(),
            bot_user: "XWiki.superadmin".to_string(),
        }
    }
}

/// Patterns applied in addition to the ones stored in the wiki
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub exclusion_patterns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    pub poll_interval_ms: u64,
    pub batch_size: u32,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            batch_size: 100,
        }
    }
}

impl Settings {
    /// Load settings from a file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let settings = Self::from_toml(&content)?;
        tracing::info!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// `<config dir>/wikirc.toml`
    pub fn default_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join(SETTINGS_FILE))
    }

    /// Configured database file, or `<data dir>/wiki.db`
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.wiki.database {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.data_dir().join(DATABASE_FILE)),
        }
    }

    /// Execution acting as the configured bot user
    pub fn execution(&self) -> Execution {
        Execution::bound(ExecutionContext::new(
            self.wiki.name.as_str(),
            self.wiki.base_url.as_str(),
            self.wiki.bot_user.as_str(),
        ))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.feed.poll_interval_ms.max(1))
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "onyx", "wikirc").ok_or_else(|| {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine data directory",
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_empty_file_uses_defaults() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.wiki.name, "xwiki");
        assert_eq!(settings.poll_interval(), Duration::from_millis(1000));
        assert!(settings.notifications.exclusion_patterns.is_empty());
    }

    #[test]
    fn test_partial_sections() {
        let settings = Settings::from_toml(
            r#"
            [wiki]
            base_url = "https://wiki.example.org/xwiki/"

            [notifications]
            exclusion_patterns = ['IRC\.Archive.*', 'Sandbox\..*']
            "#,
        )
        .unwrap();

        assert_eq!(settings.wiki.name, "xwiki");
        assert_eq!(settings.wiki.base_url, "https://wiki.example.org/xwiki/");
        assert_eq!(
            settings.notifications.exclusion_patterns,
            vec!["IRC\\.Archive.*", "Sandbox\\..*"]
        );
        assert_eq!(settings.feed.batch_size, 100);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            Settings::from_toml("[wiki\nname = 1"),
            Err(Error::Settings(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);

        assert_eq!(Settings::load(&path).unwrap(), Settings::default());

        let database = dir.path().join("custom.db");
        std::fs::write(
            &path,
            format!(
                "[wiki]\ndatabase = {:?}\nbot_user = \"XWiki.IRCBot\"\n\n[feed]\npoll_interval_ms = 250\n",
                database.display().to_string()
            ),
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.database_path().unwrap(), database);
        assert_eq!(settings.poll_interval(), Duration::from_millis(250));

        let execution = settings.execution();
        let context = execution.context().unwrap();
        assert_eq!(context.user, "XWiki.IRCBot");
        assert_eq!(context.wiki, "xwiki");
    }
}
