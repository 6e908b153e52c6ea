// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod http;
mod local;

pub use http::{HttpSource, HttpSourceOptions};
pub use local::{LocalDirectorySource, is_video_file};

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SourceError;
use crate::model::{Episode, EpisodeInfo, LOCAL_SOURCE_ID, Link};

/// A source that looks up episode links over the network
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Stable source id
    fn id(&self) -> i64;

    /// Human readable source name
    fn name(&self) -> &str;

    /// Fetch every playable link for an episode, best first
    ///
    /// An empty list means the source found nothing; that is not an error.
    async fn fetch_links(&self, episode: &EpisodeInfo) -> Result<Vec<Link>, SourceError>;
}

/// A source backed by media stored on this machine
#[async_trait]
pub trait LocalIndexSource: Send + Sync {
    fn id(&self) -> i64 {
        LOCAL_SOURCE_ID
    }

    fn name(&self) -> &str;

    /// Look up the links for an episode in the local index
    async fn fetch_links(&self, episode: &Episode) -> Result<Vec<Link>, SourceError>;
}

/// Identity of a source no backend can serve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo {
    pub id: i64,
    pub name: String,
}

/// The source an episode is played from
///
/// The set of variants is closed; the resolver matches on it exhaustively.
#[derive(Clone)]
pub enum Source {
    Remote(Arc<dyn RemoteSource>),
    LocalIndex(Arc<dyn LocalIndexSource>),
    /// A source known by id only, e.g. from an extension that is no longer installed
    Unsupported(SourceInfo),
}

impl Source {
    /// Wrap a remote network source
    pub fn remote(source: impl RemoteSource + 'static) -> Self {
        Source::Remote(Arc::new(source))
    }

    /// Wrap a locally indexed source
    pub fn local(source: impl LocalIndexSource + 'static) -> Self {
        Source::LocalIndex(Arc::new(source))
    }

    /// A source with no usable backend, known only by id and name
    pub fn unsupported(id: i64, name: impl Into<String>) -> Self {
        Source::Unsupported(SourceInfo {
            id,
            name: name.into(),
        })
    }

    pub fn id(&self) -> i64 {
        match self {
            Source::Remote(source) => source.id(),
            Source::LocalIndex(source) => source.id(),
            Source::Unsupported(info) => info.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Source::Remote(source) => source.name(),
            Source::LocalIndex(source) => source.name(),
            Source::Unsupported(info) => &info.name,
        }
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant = match self {
            Source::Remote(_) => "Remote",
            Source::LocalIndex(_) => "LocalIndex",
            Source::Unsupported(_) => "Unsupported",
        };

        f.debug_struct(variant)
            .field("id", &self.id())
            .field("name", &self.name())
            .finish()
    }
}
