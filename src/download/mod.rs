// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod directory;
mod filename;
mod metadata;

pub use directory::{DirectoryOracle, DirectoryOracleOptions, hash_file};
pub use filename::{episode_stem, sanitize_name};
pub use metadata::{
    DownloadMetadata, read_download_metadata, read_download_metadata_blocking,
    write_download_metadata,
};

use async_trait::async_trait;
use url::Url;

use crate::error::DownloadError;
use crate::model::{Anime, Episode};
use crate::source::Source;

/// Knows which episodes are stored locally and where
///
/// Owned by the download subsystem; the resolver only reads from it.
#[async_trait]
pub trait DownloadOracle: Send + Sync {
    /// Whether the episode's media is fully stored on this machine
    fn is_downloaded(&self, episode: &Episode, anime: &Anime) -> Result<bool, DownloadError>;

    /// Locate the playable file of a downloaded episode
    async fn materialize_locator(
        &self,
        source: &Source,
        anime: &Anime,
        episode: &Episode,
    ) -> Result<Url, DownloadError>;
}
