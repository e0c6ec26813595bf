//! Staffbook configuration.
//!
//! Loaded from `~/.staffbook/config.toml`. Every key is optional; a missing
//! file means defaults.
//!
//! ```toml
//! user = "rita"
//! data-dir = "/srv/staffbook"
//! notify-command = ["/usr/local/bin/hr-notify"]
//! generator-command = ["skillgen", "--json"]
//! sources = ["LinkedIn", "Referral"]
//!
//! [roles]
//! ann = "approver"
//!
//! [scopes]
//! rita = "Sales"
//!
//! [departments]
//! Sales = ["Account Executive"]
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::catalog::Catalog;
use crate::model::Role;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Config {
    /// The acting user when neither `--as` nor `STAFFBOOK_USER` is set.
    pub user: Option<String>,

    /// Overrides the storage root (`~/.staffbook/data`).
    pub data_dir: Option<PathBuf>,

    /// Program and arguments run for each notification.
    /// Notifications go to the outbox file when empty.
    pub notify_command: Vec<String>,

    /// Program and arguments that propose skills for a matrix.
    pub generator_command: Vec<String>,

    /// User name to role. Unlisted users are recruiters.
    pub roles: BTreeMap<String, Role>,

    /// User name to the one department they work in.
    pub scopes: BTreeMap<String, String>,

    /// Replaces the built-in departments and positions.
    pub departments: Option<BTreeMap<String, Vec<String>>>,

    /// Replaces the built-in recruiting sources.
    pub sources: Option<Vec<String>>,
}

impl Config {
    /// Load config from `~/.staffbook/config.toml`, or defaults if it doesn't exist.
    pub fn load() -> Result<Self, String> {
        let Some(path) = Self::path() else {
            return Ok(Self::default());
        };

        let contents = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(format!("failed to read {}: {e}", path.display())),
        };

        let config = Self::parse(&contents)
            .map_err(|e| format!("invalid config at {}: {e}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// The config file path: `~/.staffbook/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".staffbook").join("config.toml"))
    }

    /// The built-in catalog with any configured overrides applied.
    pub fn catalog(&self) -> Catalog {
        let mut catalog = Catalog::default();
        if let Some(departments) = &self.departments {
            catalog.departments.clone_from(departments);
        }
        if let Some(sources) = &self.sources {
            catalog.sources.clone_from(sources);
        }
        catalog
    }

    pub fn role_of(&self, user: &str) -> Role {
        self.roles.get(user).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let config = Config::parse("").unwrap();

        assert!(config.user.is_none());
        assert!(config.notify_command.is_empty());
        assert_eq!(config.catalog(), Catalog::default());
        assert_eq!(config.role_of("anyone"), Role::Recruiter);
    }

    #[test]
    fn full_config() {
        let config = Config::parse(
            r#"
            user = "rita"
            data-dir = "/tmp/staffbook"
            notify-command = ["hr-notify", "--channel", "hiring"]
            sources = ["Referral"]

            [roles]
            ann = "approver"
            root = "admin"

            [scopes]
            rita = "Sales"

            [departments]
            Sales = ["Account Executive"]
            "#,
        )
        .unwrap();

        assert_eq!(config.user.as_deref(), Some("rita"));
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/staffbook")));
        assert_eq!(config.notify_command.len(), 3);
        assert_eq!(config.role_of("ann"), Role::Approver);
        assert_eq!(config.role_of("root"), Role::Admin);
        assert_eq!(config.scopes["rita"], "Sales");

        let catalog = config.catalog();
        assert_eq!(catalog.sources, ["Referral"]);
        assert_eq!(catalog.departments.len(), 1);
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(Config::parse("[roles]\nann = \"boss\"").is_err());
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(Config::parse("default-identity = \"x\"").is_err());
    }
}
