// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;
use tracing::debug;
use url::Url;

use crate::error::DownloadError;
use crate::model::{Anime, Episode};
use crate::source::Source;

use super::DownloadOracle;
use super::filename::{episode_stem, sanitize_name};
use super::metadata::{
    DownloadMetadata, read_download_metadata, read_download_metadata_blocking,
    write_download_metadata,
};

const HASH_BUFFER_SIZE: usize = 64 * 1024;

/// Options for the directory-backed download oracle
#[derive(Debug, Clone)]
pub struct DirectoryOracleOptions {
    /// Verify recorded SHA-256 digests before handing out a locator
    pub verify_checksums: bool,
}

impl Default for DirectoryOracleOptions {
    fn default() -> Self {
        Self {
            verify_checksums: true,
        }
    }
}

/// Download oracle reading a downloads directory
///
/// Layout: `<root>/<source id>/<anime title>/<episode stem>.json`, a sidecar
/// naming the video file stored next to it.
#[derive(Debug, Clone)]
pub struct DirectoryOracle {
    root: PathBuf,
    options: DirectoryOracleOptions,
}

impl DirectoryOracle {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_options(root, DirectoryOracleOptions::default())
    }

    pub fn with_options(root: impl Into<PathBuf>, options: DirectoryOracleOptions) -> Self {
        Self {
            root: root.into(),
            options,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the downloads of one series
    pub fn anime_dir(&self, source_id: i64, anime: &Anime) -> PathBuf {
        let title = sanitize_name(&anime.title);
        let title = if title.is_empty() {
            format!("anime-{}", anime.id)
        } else {
            title
        };

        self.root.join(source_id.to_string()).join(title)
    }

    /// Path of the sidecar describing a downloaded episode
    pub fn metadata_path(&self, source_id: i64, anime: &Anime, episode: &Episode) -> PathBuf {
        self.anime_dir(source_id, anime)
            .join(format!("{}.json", episode_stem(episode)))
    }

    /// Record an episode whose video already sits in its series directory
    ///
    /// Hashes the video and writes the sidecar. Returns the sidecar path.
    pub async fn record_download(
        &self,
        anime: &Anime,
        episode: &Episode,
        video_filename: &str,
    ) -> Result<PathBuf, DownloadError> {
        let dir = self.anime_dir(anime.source_id, anime);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| DownloadError::CreateDirectoryFailed {
                path: dir.clone(),
                source: e,
            })?;

        let video_path = dir.join(video_filename);
        let content_hash = hash_file(&video_path).await?;

        let metadata = DownloadMetadata::from_episode(episode, video_filename, Some(content_hash));
        let metadata_path = self.metadata_path(anime.source_id, anime, episode);
        write_download_metadata(&metadata, &metadata_path).await?;

        Ok(metadata_path)
    }

    /// Sidecar and video path for an episode, if both are present
    async fn locate(
        &self,
        source_id: i64,
        anime: &Anime,
        episode: &Episode,
    ) -> Result<(DownloadMetadata, PathBuf), DownloadError> {
        let metadata_path = self.metadata_path(source_id, anime, episode);
        if !tokio::fs::try_exists(&metadata_path).await.unwrap_or(false) {
            return Err(not_downloaded(episode));
        }

        let metadata = read_download_metadata(&metadata_path).await?;
        let video_path = self.video_path(source_id, anime, &metadata);

        match tokio::fs::metadata(&video_path).await {
            Ok(info) if info.is_file() => Ok((metadata, video_path)),
            _ => Err(DownloadError::VideoMissing(video_path)),
        }
    }

    /// Blocking variant of [`Self::locate`] for synchronous callers
    fn locate_blocking(
        &self,
        source_id: i64,
        anime: &Anime,
        episode: &Episode,
    ) -> Result<(DownloadMetadata, PathBuf), DownloadError> {
        let metadata_path = self.metadata_path(source_id, anime, episode);
        if !metadata_path.exists() {
            return Err(not_downloaded(episode));
        }

        let metadata = read_download_metadata_blocking(&metadata_path)?;
        let video_path = self.video_path(source_id, anime, &metadata);

        if !video_path.is_file() {
            return Err(DownloadError::VideoMissing(video_path));
        }

        Ok((metadata, video_path))
    }

    fn video_path(&self, source_id: i64, anime: &Anime, metadata: &DownloadMetadata) -> PathBuf {
        self.anime_dir(source_id, anime)
            .join(Path::new(&metadata.video_filename).file_name().unwrap_or_default())
    }
}

fn not_downloaded(episode: &Episode) -> DownloadError {
    DownloadError::NotDownloaded {
        episode: episode.name.clone(),
    }
}

#[async_trait]
impl DownloadOracle for DirectoryOracle {
    fn is_downloaded(&self, episode: &Episode, anime: &Anime) -> Result<bool, DownloadError> {
        match self.locate_blocking(anime.source_id, anime, episode) {
            Ok(_) => Ok(true),
            Err(DownloadError::NotDownloaded { .. } | DownloadError::VideoMissing(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn materialize_locator(
        &self,
        source: &Source,
        anime: &Anime,
        episode: &Episode,
    ) -> Result<Url, DownloadError> {
        let (metadata, video_path) = self.locate(source.id(), anime, episode).await?;

        if self.options.verify_checksums
            && let Some(expected) = metadata.content_hash
        {
            let actual = hash_file(&video_path).await?;
            if actual != expected {
                return Err(DownloadError::ChecksumMismatch {
                    path: video_path,
                    expected,
                    actual,
                });
            }
        }

        let absolute = tokio::fs::canonicalize(&video_path)
            .await
            .map_err(|_| DownloadError::VideoMissing(video_path.clone()))?;

        debug!(episode = %episode.name, path = %absolute.display(), "materialized download");

        Url::from_file_path(&absolute).map_err(|_| DownloadError::InvalidPath(absolute))
    }
}

/// Compute the "sha256:<hex>" digest of a file
pub async fn hash_file(path: &Path) -> Result<String, DownloadError> {
    let hash_err = |e| DownloadError::HashFailed {
        path: path.to_path_buf(),
        source: e,
    };

    let mut file = tokio::fs::File::open(path).await.map_err(hash_err)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; HASH_BUFFER_SIZE];

    loop {
        let read = file.read(&mut buffer).await.map_err(hash_err)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("sha256:{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_anime() -> Anime {
        Anime {
            id: 7,
            source_id: 1001,
            title: "Cowboy Bebop".to_string(),
            url: "/anime/bebop".to_string(),
        }
    }

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

    fn make_source() -> Source {
        Source::unsupported(1001, "Streamy")
    }

    async fn store_video(oracle: &DirectoryOracle, contents: &[u8]) -> PathBuf {
        let dir = oracle.anime_dir(1001, &make_anime());
        std::fs::create_dir_all(&dir).unwrap();
        let video = dir.join("001-Asteroid-Blues.mkv");
        std::fs::write(&video, contents).unwrap();
        oracle
            .record_download(&make_anime(), &make_episode(), "001-Asteroid-Blues.mkv")
            .await
            .unwrap();
        video
    }

    #[test]
    fn layout_uses_source_id_and_sanitized_title() {
        let oracle = DirectoryOracle::new("/downloads");
        let path = oracle.metadata_path(1001, &make_anime(), &make_episode());
        assert_eq!(
            path,
            PathBuf::from("/downloads/1001/Cowboy-Bebop/001-Asteroid-Blues.json")
        );
    }

    #[test]
    fn missing_download_is_not_downloaded() {
        let dir = tempdir().unwrap();
        let oracle = DirectoryOracle::new(dir.path());
        assert!(!oracle.is_downloaded(&make_episode(), &make_anime()).unwrap());
    }

    #[tokio::test]
    async fn recorded_download_is_downloaded() {
        let dir = tempdir().unwrap();
        let oracle = DirectoryOracle::new(dir.path());
        store_video(&oracle, b"video bytes").await;

        assert!(oracle.is_downloaded(&make_episode(), &make_anime()).unwrap());
    }

    #[tokio::test]
    async fn sidecar_without_video_is_not_downloaded() {
        let dir = tempdir().unwrap();
        let oracle = DirectoryOracle::new(dir.path());
        let video = store_video(&oracle, b"video bytes").await;
        std::fs::remove_file(video).unwrap();

        assert!(!oracle.is_downloaded(&make_episode(), &make_anime()).unwrap());
    }

    #[tokio::test]
    async fn corrupt_sidecar_is_an_error() {
        let dir = tempdir().unwrap();
        let oracle = DirectoryOracle::new(dir.path());
        let path = oracle.metadata_path(1001, &make_anime(), &make_episode());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "garbage").unwrap();

        assert!(oracle.is_downloaded(&make_episode(), &make_anime()).is_err());
    }

    #[tokio::test]
    async fn materialize_returns_file_url() {
        let dir = tempdir().unwrap();
        let oracle = DirectoryOracle::new(dir.path());
        store_video(&oracle, b"video bytes").await;

        let url = oracle
            .materialize_locator(&make_source(), &make_anime(), &make_episode())
            .await
            .unwrap();

        assert_eq!(url.scheme(), "file");
        assert!(url.path().ends_with("/1001/Cowboy-Bebop/001-Asteroid-Blues.mkv"));
    }

    #[tokio::test]
    async fn materialize_detects_tampered_video() {
        let dir = tempdir().unwrap();
        let oracle = DirectoryOracle::new(dir.path());
        let video = store_video(&oracle, b"video bytes").await;
        std::fs::write(video, b"something else").unwrap();

        let result = oracle
            .materialize_locator(&make_source(), &make_anime(), &make_episode())
            .await;

        assert!(matches!(
            result.unwrap_err(),
            DownloadError::ChecksumMismatch { .. }
        ));
    }

    #[tokio::test]
    async fn checksum_verification_can_be_disabled() {
        let dir = tempdir().unwrap();
        let oracle = DirectoryOracle::with_options(
            dir.path(),
            DirectoryOracleOptions {
                verify_checksums: false,
            },
        );
        let video = store_video(&oracle, b"video bytes").await;
        std::fs::write(video, b"something else").unwrap();

        let result = oracle
            .materialize_locator(&make_source(), &make_anime(), &make_episode())
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn sidecar_without_hash_skips_verification() {
        let dir = tempdir().unwrap();
        let oracle = DirectoryOracle::new(dir.path());
        let anime_dir = oracle.anime_dir(1001, &make_anime());
        std::fs::create_dir_all(&anime_dir).unwrap();
        std::fs::write(anime_dir.join("ep.mkv"), b"video").unwrap();
        let metadata = DownloadMetadata::from_episode(&make_episode(), "ep.mkv", None);
        write_download_metadata(
            &metadata,
            &oracle.metadata_path(1001, &make_anime(), &make_episode()),
        )
        .await
        .unwrap();

        let url = oracle
            .materialize_locator(&make_source(), &make_anime(), &make_episode())
            .await
            .unwrap();

        assert!(url.path().ends_with("ep.mkv"));
    }

    #[tokio::test]
    async fn materialize_reports_missing_download() {
        let dir = tempdir().unwrap();
        let oracle = DirectoryOracle::new(dir.path());

        let result = oracle
            .materialize_locator(&make_source(), &make_anime(), &make_episode())
            .await;

        assert!(matches!(
            result.unwrap_err(),
            DownloadError::NotDownloaded { .. }
        ));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn materialize_reports_missing_video() {
        let dir = tempdir().unwrap();
        let oracle = DirectoryOracle::new(dir.path());
        let video = store_video(&oracle, b"video bytes").await;
        std::fs::remove_file(&video).unwrap();

        let result = oracle
            .materialize_locator(&make_source(), &make_anime(), &make_episode())
            .await;

        assert!(matches!(
            result.unwrap_err(),
            DownloadError::VideoMissing(path) if path == video
        ));
    }

    #[tokio::test]
    async fn hash_file_matches_known_digest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("abc.txt");
        std::fs::write(&path, b"abc").unwrap();

        assert_eq!(
            hash_file(&path).await.unwrap(),
            "sha256:ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
