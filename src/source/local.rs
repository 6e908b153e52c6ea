// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::error::SourceError;
use crate::model::{Episode, Link};

use super::LocalIndexSource;

/// Check if a path has a video file extension we can hand to a player
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            matches!(
                ext.to_lowercase().as_str(),
                "mkv" | "mp4" | "m4v" | "webm" | "avi" | "mov" | "ts" | "wmv" | "flv"
            )
        })
}

/// Local library rooted at a directory
///
/// Episode URLs are paths relative to the root. A path naming a video file
/// yields that file; a path naming a directory yields every video file
/// directly inside it, sorted by file name.
#[derive(Debug, Clone)]
pub struct LocalDirectorySource {
    root: PathBuf,
    name: String,
}

impl LocalDirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            name: "Local library".to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map an episode URL onto the library, refusing paths that escape the root
    fn episode_path(&self, episode: &Episode) -> Result<PathBuf, SourceError> {
        let relative = Path::new(episode.url.trim_start_matches('/'));

        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || episode.url.trim().is_empty() {
            return Err(SourceError::NotFound(relative.to_path_buf()));
        }

        Ok(self.root.join(relative))
    }

    async fn scan_directory(&self, dir: &Path) -> Result<Vec<PathBuf>, SourceError> {
        let read_err = |e| SourceError::ReadDirectoryFailed {
            path: dir.to_path_buf(),
            source: e,
        };

        let mut entries = tokio::fs::read_dir(dir).await.map_err(read_err)?;
        let mut videos = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
            let path = entry.path();
            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            if is_file && is_video_file(&path) {
                videos.push(path);
            }
        }

        videos.sort();
        Ok(videos)
    }
}

#[async_trait]
impl LocalIndexSource for LocalDirectorySource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_links(&self, episode: &Episode) -> Result<Vec<Link>, SourceError> {
        let path = self.episode_path(episode)?;

        let path = tokio::fs::canonicalize(&path)
            .await
            .map_err(|_| SourceError::NotFound(path.clone()))?;

        let is_dir = tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);

        let videos = if is_dir {
            self.scan_directory(&path).await?
        } else if is_video_file(&path) {
            vec![path]
        } else {
            return Err(SourceError::NotFound(path));
        };

        debug!(episode = %episode.name, count = videos.len(), "indexed local episode files");

        Ok(videos
            .iter()
            .filter_map(|video| Url::from_file_path(video).ok())
            .map(|url| Link::local(url.to_string()))
            .collect())
    }
}
