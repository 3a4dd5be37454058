// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-agent session credential persistence.
//!
//! Credential blobs are opaque to this service; the bridge produces and
//! consumes them. One file per agent under the configured directory.

use std::path::{Path, PathBuf};

use tracing::debug;

use sokoni_core::SokoniError;

fn credential_path(dir: &Path, agent_id: &str) -> PathBuf {
    dir.join(format!("{agent_id}.json"))
}

/// Loads the persisted credential blob for an agent, if any.
pub async fn load_credentials(dir: &Path, agent_id: &str) -> Option<String> {
    tokio::fs::read_to_string(credential_path(dir, agent_id))
        .await
        .ok()
}

/// Persists an updated credential blob.
pub async fn save_credentials(
    dir: &Path,
    agent_id: &str,
    blob: &str,
) -> Result<(), SokoniError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| SokoniError::Internal(format!("failed to create credentials dir: {e}")))?;
    tokio::fs::write(credential_path(dir, agent_id), blob)
        .await
        .map_err(|e| SokoniError::Internal(format!("failed to persist credentials: {e}")))
}

/// Deletes persisted credentials. Missing files are not an error.
pub async fn wipe_credentials(dir: &Path, agent_id: &str) {
    match tokio::fs::remove_file(credential_path(dir, agent_id)).await {
        Ok(()) => debug!(agent_id, "credentials wiped"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(agent_id, error = %e, "failed to wipe credentials"),
    }
}

/// Whether credential material exists on disk for this agent.
pub fn credentials_exist(dir: &Path, agent_id: &str) -> bool {
    credential_path(dir, agent_id).exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_load_wipe_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creds");

        assert!(!credentials_exist(&path, "a1"));
        assert!(load_credentials(&path, "a1").await.is_none());

        save_credentials(&path, "a1", "{\"noise_key\":\"abc\"}")
            .await
            .unwrap();
        assert!(credentials_exist(&path, "a1"));
        assert_eq!(
            load_credentials(&path, "a1").await.as_deref(),
            Some("{\"noise_key\":\"abc\"}")
        );

        wipe_credentials(&path, "a1").await;
        assert!(!credentials_exist(&path, "a1"));
        // Wiping twice is fine.
        wipe_credentials(&path, "a1").await;
    }
}
