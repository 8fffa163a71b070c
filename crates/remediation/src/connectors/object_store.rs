//! File and object-store connector.
//!
//! Operates value-level inside the object: mask and encrypt replace every
//! occurrence of the matched value, restore replaces the applied value
//! back. Delete removes occurrences and cannot be reversed, so
//! `supports_restore_after_delete` is false.

use crate::connector::{Connector, ConnectorConfig, RemediationTarget};
use async_trait::async_trait;
use privguard_core::types::SourceType;
use privguard_core::{Error, Result};
use std::path::{Path, PathBuf};

/// Connector over a mounted filesystem or object-store gateway
pub struct ObjectStoreConnector {
    source_type: SourceType,
    base_path: PathBuf,
}

impl ObjectStoreConnector {
    pub fn new(source_type: SourceType, config: ConnectorConfig) -> Result<Self> {
        let base_path = config
            .base_path
            .ok_or_else(|| {
                Error::connector(source_type.as_str(), "profile config is missing base_path")
            })?
            .into();
        Ok(Self {
            source_type,
            base_path,
        })
    }

    /// Resolve the object path under the configured root, refusing
    /// traversal outside it.
    fn resolve(&self, target: &RemediationTarget) -> Result<PathBuf> {
        let relative = Path::new(&target.path);
        if relative
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(Error::connector(
                self.source_type.as_str(),
                format!("path escapes the source root: {}", target.path),
            ));
        }
        let stripped = relative.strip_prefix("/").unwrap_or(relative);
        Ok(self.base_path.join(stripped))
    }

    async fn read(&self, target: &RemediationTarget) -> Result<(PathBuf, String)> {
        let path = self.resolve(target)?;
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            Error::connector(
                self.source_type.as_str(),
                format!("read {} failed: {e}", path.display()),
            )
        })?;
        Ok((path, content))
    }

    async fn replace_all(
        &self,
        target: &RemediationTarget,
        from: &str,
        to: &str,
    ) -> Result<()> {
        let (path, content) = self.read(target).await?;
        if !content.contains(from) {
            // Already applied: idempotent success
            return Ok(());
        }
        let rewritten = content.replace(from, to);
        tokio::fs::write(&path, rewritten).await.map_err(|e| {
            Error::connector(
                self.source_type.as_str(),
                format!("write {} failed: {e}", path.display()),
            )
        })?;
        Ok(())
    }
}

#[async_trait]
impl Connector for ObjectStoreConnector {
    fn source_type(&self) -> SourceType {
        self.source_type
    }

    fn supports_restore_after_delete(&self) -> bool {
        false
    }

    async fn get_original_value(&self, target: &RemediationTarget) -> Result<String> {
        let (_, content) = self.read(target).await?;
        if content.contains(&target.match_value) {
            Ok(target.match_value.clone())
        } else {
            Err(Error::not_found(format!(
                "value in object {}",
                target.path
            )))
        }
    }

    async fn mask(&self, target: &RemediationTarget, masked: &str) -> Result<()> {
        self.replace_all(target, &target.match_value, masked).await
    }

    async fn delete(&self, target: &RemediationTarget) -> Result<()> {
        let (path, content) = self.read(target).await?;
        if !content.contains(&target.match_value) {
            return Err(Error::not_found(format!(
                "value in object {}",
                target.path
            )));
        }
        let rewritten = content.replace(&target.match_value, "");
        tokio::fs::write(&path, rewritten).await.map_err(|e| {
            Error::connector(
                self.source_type.as_str(),
                format!("write {} failed: {e}", path.display()),
            )
        })?;
        Ok(())
    }

    async fn encrypt(&self, target: &RemediationTarget, key_ref: &str) -> Result<()> {
        let cipher = crate::crypto::CredentialCipher::from_key_ref(key_ref)?;
        let encrypted = cipher.encrypt(&target.match_value)?;
        self.replace_all(target, &target.match_value, &encrypted)
            .await
    }

    async fn restore_value(&self, target: &RemediationTarget, value: &str) -> Result<()> {
        // The applied value travels in match_value on rollback
        self.replace_all(target, &target.match_value, value).await
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connector(dir: &Path) -> ObjectStoreConnector {
        ObjectStoreConnector::new(
            SourceType::Filesystem,
            ConnectorConfig {
                dsn: None,
                base_path: Some(dir.to_string_lossy().into_owned()),
                id_column: None,
                params: serde_json::json!({}),
            },
        )
        .unwrap()
    }

    fn target(path: &str, value: &str) -> RemediationTarget {
        RemediationTarget {
            path: path.to_string(),
            field: None,
            record_id: None,
            match_value: value.to_string(),
        }
    }

    #[tokio::test]
    async fn test_mask_and_restore_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("users.csv");
        std::fs::write(&file, "name,pan\nasha,ABCDE1234F\n").unwrap();

        let connector = connector(dir.path());
        let t = target("users.csv", "ABCDE1234F");

        let original = connector.get_original_value(&t).await.unwrap();
        assert_eq!(original, "ABCDE1234F");

        connector.mask(&t, "XXXXXX234F").await.unwrap();
        let content = std::fs::read_to_string(&file).unwrap();
        assert!(content.contains("XXXXXX234F"));
        assert!(!content.contains("ABCDE1234F"));

        // Rollback: the applied value is the address, the original the payload
        let rollback_target = target("users.csv", "XXXXXX234F");
        connector
            .restore_value(&rollback_target, "ABCDE1234F")
            .await
            .unwrap();
        let content = std::fs::read_to_string(&file).unwrap();
        assert_eq!(content, "name,pan\nasha,ABCDE1234F\n");
    }

    #[tokio::test]
    async fn test_mask_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("data.txt");
        std::fs::write(&file, "value=SECRET42\n").unwrap();

        let connector = connector(dir.path());
        let t = target("data.txt", "SECRET42");
        connector.mask(&t, "[REDACTED]").await.unwrap();
        connector.mask(&t, "[REDACTED]").await.unwrap();
        assert_eq!(
            std::fs::read_to_string(&file).unwrap(),
            "value=[REDACTED]\n"
        );
    }

    #[tokio::test]
    async fn test_delete_not_restorable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("d.txt"), "x").unwrap();
        let connector = connector(dir.path());
        assert!(!connector.supports_restore_after_delete());
    }

    #[tokio::test]
    async fn test_path_traversal_refused() {
        let dir = tempfile::tempdir().unwrap();
        let connector = connector(dir.path());
        let t = target("../etc/passwd", "root");
        assert!(connector.get_original_value(&t).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_value_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("f.txt"), "nothing here").unwrap();
        let connector = connector(dir.path());
        let t = target("f.txt", "ABSENT");
        assert!(matches!(
            connector.get_original_value(&t).await,
            Err(Error::NotFound { .. })
        ));
    }
}
