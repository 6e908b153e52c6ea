// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::DownloadError;
use crate::model::Episode;

/// Sidecar describing a downloaded episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadMetadata {
    pub episode_url: String,
    pub episode_name: String,
    pub episode_number: f32,
    /// File name of the video, relative to the sidecar's directory
    pub video_filename: String,
    pub downloaded_at: String,
    /// "sha256:<hex>" digest of the video file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}

impl DownloadMetadata {
    /// Create metadata for an episode whose video was just stored
    pub fn from_episode(
        episode: &Episode,
        video_filename: &str,
        content_hash: Option<String>,
    ) -> Self {
        Self {
            episode_url: episode.url.clone(),
            episode_name: episode.name.clone(),
            episode_number: episode.episode_number,
            video_filename: video_filename.to_string(),
            downloaded_at: Utc::now().to_rfc3339(),
            content_hash,
        }
    }
}

/// Write download metadata to a JSON file
pub async fn write_download_metadata(
    metadata: &DownloadMetadata,
    path: &Path,
) -> Result<(), DownloadError> {
    let json = serde_json::to_string_pretty(metadata)?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| DownloadError::MetadataWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Read download metadata from a JSON file
pub async fn read_download_metadata(path: &Path) -> Result<DownloadMetadata, DownloadError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| read_failed(path, e))?;
    parse_download_metadata(&content, path)
}

/// Blocking variant of [`read_download_metadata`] for synchronous callers
pub fn read_download_metadata_blocking(path: &Path) -> Result<DownloadMetadata, DownloadError> {
    let content = std::fs::read_to_string(path).map_err(|e| read_failed(path, e))?;
    parse_download_metadata(&content, path)
}

fn read_failed(path: &Path, source: std::io::Error) -> DownloadError {
    DownloadError::MetadataReadFailed {
        path: path.to_path_buf(),
        source,
    }
}

fn parse_download_metadata(content: &str, path: &Path) -> Result<DownloadMetadata, DownloadError> {
    serde_json::from_str(content).map_err(|e| DownloadError::MetadataParseFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_episode() -> Episode {
        Episode {
            id: 101,
            anime_id: 7,
            url: "/watch/bebop-1".to_string(),
            name: "Asteroid Blues".to_string(),
            episode_number: 1.0,
            date_upload: None,
            scanlator: None,
        }
    }

    #[test]
    fn from_episode_converts_fields() {
        let metadata = DownloadMetadata::from_episode(
            &make_episode(),
            "001-Asteroid-Blues.mkv",
            Some("sha256:abc123".to_string()),
        );

        assert_eq!(metadata.episode_url, "/watch/bebop-1");
        assert_eq!(metadata.episode_name, "Asteroid Blues");
        assert_eq!(metadata.episode_number, 1.0);
        assert_eq!(metadata.video_filename, "001-Asteroid-Blues.mkv");
        assert_eq!(metadata.content_hash, Some("sha256:abc123".to_string()));
        assert!(!metadata.downloaded_at.is_empty());
    }

    #[tokio::test]
    async fn written_metadata_reads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("001-Asteroid-Blues.json");
        let metadata = DownloadMetadata::from_episode(&make_episode(), "video.mkv", None);

        write_download_metadata(&metadata, &path).await.unwrap();

        assert_eq!(read_download_metadata(&path).await.unwrap(), metadata);
        assert_eq!(read_download_metadata_blocking(&path).unwrap(), metadata);
    }

    #[test]
    fn hash_is_omitted_when_absent() {
        let metadata = DownloadMetadata::from_episode(&make_episode(), "video.mkv", None);
        let json = serde_json::to_string(&metadata).unwrap();
        assert!(!json.contains("content_hash"));
    }

    #[tokio::test]
    async fn read_nonexistent_returns_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.json");

        assert!(matches!(
            read_download_metadata(&path).await.unwrap_err(),
            DownloadError::MetadataReadFailed { .. }
        ));
        assert!(matches!(
            read_download_metadata_blocking(&path).unwrap_err(),
            DownloadError::MetadataReadFailed { .. }
        ));
    }

    #[tokio::test]
    async fn read_garbage_returns_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            read_download_metadata(&path).await.unwrap_err(),
            DownloadError::MetadataParseFailed { .. }
        ));
        assert!(matches!(
            read_download_metadata_blocking(&path).unwrap_err(),
            DownloadError::MetadataParseFailed { .. }
        ));
    }
}
