//! Process-wide configuration, loaded once at startup.
//!
//! ```json
//! {
//!   "storageKind": "file",
//!   "connectionTarget": "data/used_names.csv",
//!   "roster": ["Alice", "Bob"]
//! }
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::{ConfigError, NameRoster};

/// Which `DrawStore` adapter backs the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StorageKind {
    /// CSV file at `connectionTarget`.
    File,
    /// `used_names` table; `connectionTarget` is a `postgres://` or `sqlite:` URL.
    RelationalTable,
    /// Process-local, lost on exit. `connectionTarget` is ignored.
    Memory,
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StorageKind::File => "file",
            StorageKind::RelationalTable => "relationalTable",
            StorageKind::Memory => "memory",
        };
        f.write_str(s)
    }
}

impl FromStr for StorageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(StorageKind::File),
            "relationalTable" | "relational-table" | "relational_table" => {
                Ok(StorageKind::RelationalTable)
            }
            "memory" => Ok(StorageKind::Memory),
            other => Err(format!(
                "unknown storage kind {other:?} (expected file, relationalTable or memory)"
            )),
        }
    }
}

/// Relational backends recognized from the connection URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationalBackend {
    Postgres,
    Sqlite,
}

impl RelationalBackend {
    pub fn from_url(url: &str) -> Option<Self> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Some(RelationalBackend::Postgres)
        } else if url.starts_with("sqlite:") {
            Some(RelationalBackend::Sqlite)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotaConfig {
    pub storage_kind: StorageKind,
    #[serde(default)]
    pub connection_target: String,
    pub roster: Vec<String>,
}

impl RotaConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Check the connection target against the storage kind and build the
    /// roster. Any error here is fatal at startup.
    pub fn validate(&self) -> Result<NameRoster, ConfigError> {
        let roster = NameRoster::new(self.roster.iter().map(String::as_str))?;
        self.validate_target()?;
        Ok(roster)
    }

    fn validate_target(&self) -> Result<(), ConfigError> {
        let target = self.connection_target.trim();
        match self.storage_kind {
            StorageKind::Memory => Ok(()),
            _ if target.is_empty() => Err(ConfigError::MissingConnectionTarget),
            StorageKind::File => Ok(()),
            StorageKind::RelationalTable => match RelationalBackend::from_url(target) {
                Some(_) => Ok(()),
                None => Err(ConfigError::InvalidConnectionTarget {
                    kind: self.storage_kind.to_string(),
                    target: target.to_string(),
                    reason: "expected a postgres:// or sqlite: URL".to_string(),
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn config(kind: StorageKind, target: &str, roster: &[&str]) -> RotaConfig {
        RotaConfig {
            storage_kind: kind,
            connection_target: target.to_string(),
            roster: roster.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn parses_camel_case_json() {
        let cfg = RotaConfig::from_json_str(
            r#"{"storageKind":"relationalTable","connectionTarget":"sqlite://rota.db","roster":["Alice","Bob"]}"#,
        )
        .unwrap();
        assert_eq!(cfg.storage_kind, StorageKind::RelationalTable);
        assert_eq!(cfg.connection_target, "sqlite://rota.db");
        assert_eq!(cfg.validate().unwrap().len(), 2);
    }

    #[test]
    fn memory_kind_needs_no_target() {
        let cfg = RotaConfig::from_json_str(r#"{"storageKind":"memory","roster":["Alice"]}"#).unwrap();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn unknown_kind_is_a_parse_error() {
        let err = RotaConfig::from_json_str(
            r#"{"storageKind":"redis","connectionTarget":"x","roster":["A"]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn empty_roster_fails_validation() {
        let err = config(StorageKind::File, "used.csv", &[]).validate().unwrap_err();
        assert!(matches!(err, ConfigError::EmptyRoster));
    }

    #[rstest]
    #[case::file_blank(StorageKind::File, "  ")]
    #[case::table_blank(StorageKind::RelationalTable, "")]
    fn missing_target_fails_validation(#[case] kind: StorageKind, #[case] target: &str) {
        let err = config(kind, target, &["Alice"]).validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingConnectionTarget));
    }

    #[rstest]
    #[case::mysql("mysql://localhost/rota")]
    #[case::bare_path("rota.db")]
    fn non_relational_url_fails_validation(#[case] target: &str) {
        let err = config(StorageKind::RelationalTable, target, &["Alice"])
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConnectionTarget { .. }));
    }

    #[rstest]
    #[case::postgres("postgres://u:p@db:5432/rota", RelationalBackend::Postgres)]
    #[case::postgresql("postgresql://db/rota", RelationalBackend::Postgres)]
    #[case::sqlite_file("sqlite://rota.db", RelationalBackend::Sqlite)]
    #[case::sqlite_memory("sqlite::memory:", RelationalBackend::Sqlite)]
    fn recognizes_relational_backends(#[case] url: &str, #[case] expected: RelationalBackend) {
        assert_eq!(RelationalBackend::from_url(url), Some(expected));
    }

    #[test]
    fn unreadable_file_reports_its_path() {
        let err = RotaConfig::from_path("/definitely/not/here/rota.json").unwrap_err();
        assert!(matches!(err, ConfigError::Read { ref path, .. } if path.ends_with("rota.json")));
    }

    #[rstest]
    #[case("file", StorageKind::File)]
    #[case("relationalTable", StorageKind::RelationalTable)]
    #[case("relational-table", StorageKind::RelationalTable)]
    #[case("memory", StorageKind::Memory)]
    fn storage_kind_from_str(#[case] raw: &str, #[case] expected: StorageKind) {
        assert_eq!(raw.parse::<StorageKind>().unwrap(), expected);
    }
}
