/// Reading and writing the backup tool's ini-style configuration file
///
/// Format: `[section]` headers, `key=value` lines, `#` comments. The
/// `[global]` section is special; every other section is a stanza. Section
/// and key order are preserved so that a parse/serialize cycle is stable.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::error::Result;

/// Structured view of the tool's configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    pub global: IndexMap<String, String>,
    pub stanzas: IndexMap<String, IndexMap<String, String>>,
}

impl ConfigDocument {
    /// Parse configuration text.
    ///
    /// Unrecognized lines (no `=`, malformed headers) are skipped rather
    /// than rejected; duplicate keys within a section keep the last value.
    pub fn parse(text: &str) -> Self {
        let mut doc = ConfigDocument::default();
        let mut current: Option<String> = None;

        for line in text.lines() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                let name = line[1..line.len() - 1].to_string();
                if name == "global" {
                    current = None;
                } else {
                    doc.stanzas.entry(name.clone()).or_default();
                    current = Some(name);
                }
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim().to_string();
                // Values may themselves contain '=' (connection options)
                let value = value.trim().to_string();

                match &current {
                    None => {
                        doc.global.insert(key, value);
                    }
                    Some(stanza) => {
                        doc.stanzas.entry(stanza.clone()).or_default().insert(key, value);
                    }
                }
            }
        }

        doc
    }

    /// Serialize back to configuration text: `[global]` first, then each
    /// stanza in order, separated by blank lines.
    pub fn serialize(&self) -> String {
        let mut out = String::from("[global]\n");

        for (key, value) in &self.global {
            out.push_str(&format!("{}={}\n", key, value));
        }

        for (stanza, settings) in &self.stanzas {
            out.push_str(&format!("\n[{}]\n", stanza));
            for (key, value) in settings {
                out.push_str(&format!("{}={}\n", key, value));
            }
        }

        out
    }
}

/// File-backed access to the tool's configuration
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and parse the configuration file.
    /// A missing or unreadable file yields an empty document.
    pub fn load(&self) -> ConfigDocument {
        match fs::read_to_string(&self.path) {
            Ok(text) => ConfigDocument::parse(&text),
            Err(e) => {
                tracing::warn!("could not read {}: {}", self.path.display(), e);
                ConfigDocument::default()
            }
        }
    }

    /// Serialize and write the configuration file
    pub fn save(&self, doc: &ConfigDocument) -> Result<()> {
        fs::write(&self.path, doc.serialize())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_global_and_stanza() {
        let doc =
            ConfigDocument::parse("[global]\nrepo1-path=/var/lib/backup\n\n[main]\npg1-path=/data\n");

        assert_eq!(doc.global.get("repo1-path").unwrap(), "/var/lib/backup");
        assert_eq!(doc.stanzas["main"].get("pg1-path").unwrap(), "/data");
    }

    #[test]
    fn test_leading_keys_belong_to_global() {
        // Keys before any section header land in [global]
        let doc = ConfigDocument::parse("log-level-console=info\n[main]\npg1-port=5432\n");
        assert_eq!(doc.global.get("log-level-console").unwrap(), "info");
    }

    #[test]
    fn test_comments_and_blanks_skipped() {
        let doc = ConfigDocument::parse("# repo settings\n\n[global]\n  # indented comment\nrepo1-retention-full=7\n");
        assert_eq!(doc.global.len(), 1);
        assert_eq!(doc.global.get("repo1-retention-full").unwrap(), "7");
    }

    #[test]
    fn test_value_keeps_embedded_equals() {
        let doc = ConfigDocument::parse("[global]\nrepo1-s3-uri=endpoint=s3.local&region=eu\n");
        assert_eq!(
            doc.global.get("repo1-s3-uri").unwrap(),
            "endpoint=s3.local&region=eu"
        );
    }

    #[test]
    fn test_duplicate_key_last_wins() {
        let doc = ConfigDocument::parse("[global]\nrepo1-path=/a\nrepo1-path=/b\n");
        assert_eq!(doc.global.get("repo1-path").unwrap(), "/b");
    }

    #[test]
    fn test_round_trip_is_idempotent() {
        let text = "# header comment\n[global]\nrepo1-path=/var/lib/backup\nlog-level-console = info\n\n[main]\npg1-path=/data\npg1-port=5432\n\n[replica]\npg1-path=/data2\n";

        let once = ConfigDocument::parse(text);
        let twice = ConfigDocument::parse(&once.serialize());

        assert_eq!(once, twice);
    }

    #[test]
    fn test_serialize_orders_global_first() {
        let mut doc = ConfigDocument::default();
        doc.stanzas
            .entry("main".to_string())
            .or_default()
            .insert("pg1-path".to_string(), "/data".to_string());
        doc.global
            .insert("repo1-path".to_string(), "/var/lib/backup".to_string());

        let text = doc.serialize();
        assert!(text.starts_with("[global]\nrepo1-path=/var/lib/backup\n"));
        assert!(text.contains("\n[main]\npg1-path=/data\n"));
    }

    #[test]
    fn test_store_missing_file_yields_empty_document() {
        let store = ConfigStore::new("/nonexistent/pgbackrest.conf");
        assert_eq!(store.load(), ConfigDocument::default());
    }

    #[test]
    fn test_store_save_and_reload() {
        let file = NamedTempFile::new().unwrap();

        let mut doc = ConfigDocument::default();
        doc.global
            .insert("repo1-retention-full".to_string(), "7".to_string());

        let store = ConfigStore::new(file.path());
        store.save(&doc).unwrap();
        assert_eq!(store.load(), doc);
    }
}
