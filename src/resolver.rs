// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Picks the backend for an episode and resolves its playable links.
//!
//! Priority, first match wins:
//! 1. the episode is downloaded: the stored file, or nothing
//! 2. a remote source: whatever it returns, in order
//! 3. the local library: its first link, or nothing
//! 4. anything else: [`ResolveError::UnsupportedSource`]
//!
//! Exactly one backend is consulted per call. Download and local-library
//! failures resolve to "no links"; remote failures follow
//! [`RemoteFailurePolicy`].

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::bridge::Bridge;
use crate::download::DownloadOracle;
use crate::error::{DownloadError, ResolveError, SourceError};
use crate::model::{Anime, Episode, Link};
use crate::report::{Backend, NoopReporter, ResolveEvent, SharedResolveReporter};
use crate::source::{LocalIndexSource, RemoteSource, Source, SourceInfo};

/// Locator returned by [`LinkResolver::resolve_first`] for the local library
///
/// The library is not queried on that path, so the link only says "play
/// from local storage" and carries no real file location.
pub const LOCAL_PLACEHOLDER_URL: &str = "path";

/// What to do when a remote source fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemoteFailurePolicy {
    /// Return the failure to the caller as [`ResolveError::Remote`]
    #[default]
    Propagate,
    /// Treat the failure like an empty result, as the other backends do
    Swallow,
}

/// Options for the link resolver
#[derive(Debug, Clone, Default)]
pub struct ResolverOptions {
    pub remote_failures: RemoteFailurePolicy,
}

/// Resolves episodes to playable links from a blocking caller
///
/// Holds no per-call state; share it freely between threads.
pub struct LinkResolver {
    oracle: Arc<dyn DownloadOracle>,
    bridge: Bridge,
    options: ResolverOptions,
    reporter: SharedResolveReporter,
}

impl LinkResolver {
    /// Create a resolver that runs backend work through `bridge`
    pub fn new(oracle: Arc<dyn DownloadOracle>, bridge: Bridge) -> Self {
        Self {
            oracle,
            bridge,
            options: ResolverOptions::default(),
            reporter: NoopReporter::shared(),
        }
    }

    /// Replace the resolver options
    pub fn with_options(mut self, options: ResolverOptions) -> Self {
        self.options = options;
        self
    }

    /// Route resolution events to `reporter` instead of discarding them
    pub fn with_reporter(mut self, reporter: SharedResolveReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Options the resolver was configured with
    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Resolve every link the selected backend produces for an episode
    pub fn resolve_all(
        &self,
        episode: &Episode,
        anime: &Anime,
        source: &Source,
    ) -> Result<Vec<Link>, ResolveError> {
        if self.is_already_resolved(episode, anime) {
            return Ok(self.downloaded(episode, anime, source).into_iter().collect());
        }

        match source {
            Source::Remote(remote) => self.remote(episode, remote),
            Source::LocalIndex(local) => Ok(self.local(episode, local).into_iter().collect()),
            Source::Unsupported(info) => Err(unsupported(info)),
        }
    }

    /// Resolve a single link for an episode
    ///
    /// Remote sources yield their first (preferred) link. The local library
    /// is not queried: a placeholder tagged "local" is returned instead, see
    /// [`LOCAL_PLACEHOLDER_URL`].
    pub fn resolve_first(
        &self,
        episode: &Episode,
        anime: &Anime,
        source: &Source,
    ) -> Result<Option<Link>, ResolveError> {
        if self.is_already_resolved(episode, anime) {
            return Ok(self.downloaded(episode, anime, source));
        }

        match source {
            Source::Remote(remote) => Ok(self.remote(episode, remote)?.into_iter().next()),
            Source::LocalIndex(_) => {
                self.reporter.report(ResolveEvent::PlaceholderReturned {
                    episode: episode.name.clone(),
                });
                Ok(Some(Link::local(LOCAL_PLACEHOLDER_URL)))
            }
            Source::Unsupported(info) => Err(unsupported(info)),
        }
    }

    /// Whether the episode is already stored locally
    ///
    /// Oracle errors count as "not downloaded".
    pub fn is_already_resolved(&self, episode: &Episode, anime: &Anime) -> bool {
        let downloaded = self
            .oracle
            .is_downloaded(episode, anime)
            .unwrap_or_else(|e| {
                warn!(episode = %episode.name, error = %e, "download status unavailable");
                false
            });

        self.reporter.report(ResolveEvent::OracleConsulted {
            episode: episode.name.clone(),
            downloaded,
        });

        downloaded
    }

    fn downloaded(&self, episode: &Episode, anime: &Anime, source: &Source) -> Option<Link> {
        self.selected(Backend::Download, source.name(), episode);

        let oracle = Arc::clone(&self.oracle);
        let (task_source, task_anime, task_episode) =
            (source.clone(), anime.clone(), episode.clone());

        let result: Result<_, DownloadError> = self.bridge.run(async move {
            oracle
                .materialize_locator(&task_source, &task_anime, &task_episode)
                .await
        });

        match result {
            Ok(url) => {
                self.resolved(Backend::Download, episode, 1);
                Some(Link::download(url.to_string()))
            }
            Err(e) => {
                self.swallowed(Backend::Download, episode, &e);
                None
            }
        }
    }

    fn remote(
        &self,
        episode: &Episode,
        remote: &Arc<dyn RemoteSource>,
    ) -> Result<Vec<Link>, ResolveError> {
        self.selected(Backend::Remote, remote.name(), episode);

        let task_remote = Arc::clone(remote);
        let info = episode.to_episode_info();

        let result: Result<_, SourceError> = self
            .bridge
            .run(async move { task_remote.fetch_links(&info).await });

        match result {
            Ok(links) => {
                self.resolved(Backend::Remote, episode, links.len());
                Ok(links)
            }
            Err(e) => match self.options.remote_failures {
                RemoteFailurePolicy::Propagate => Err(ResolveError::Remote {
                    name: remote.name().to_string(),
                    source: e,
                }),
                RemoteFailurePolicy::Swallow => {
                    self.swallowed(Backend::Remote, episode, &e);
                    Ok(Vec::new())
                }
            },
        }
    }

    fn local(&self, episode: &Episode, local: &Arc<dyn LocalIndexSource>) -> Option<Link> {
        self.selected(Backend::LocalIndex, local.name(), episode);

        let task_local = Arc::clone(local);
        let task_episode = episode.clone();

        let result: Result<_, SourceError> = self
            .bridge
            .run(async move { task_local.fetch_links(&task_episode).await });

        match result {
            Ok(links) => {
                let link = links.into_iter().next().map(|link| Link::local(link.url));
                self.resolved(Backend::LocalIndex, episode, usize::from(link.is_some()));
                link
            }
            Err(e) => {
                self.swallowed(Backend::LocalIndex, episode, &e);
                None
            }
        }
    }

    fn selected(&self, backend: Backend, source: &str, episode: &Episode) {
        debug!(%backend, source, episode = %episode.name, "resolving links");
        self.reporter.report(ResolveEvent::BackendSelected {
            backend,
            source: source.to_string(),
            episode: episode.name.clone(),
        });
    }

    fn resolved(&self, backend: Backend, episode: &Episode, count: usize) {
        self.reporter.report(ResolveEvent::LinksResolved {
            backend,
            episode: episode.name.clone(),
            count,
        });
    }

    fn swallowed(&self, backend: Backend, episode: &Episode, error: &dyn std::error::Error) {
        warn!(%backend, episode = %episode.name, %error, "backend failed; resolving to no links");
        self.reporter.report(ResolveEvent::BackendFailed {
            backend,
            episode: episode.name.clone(),
            error: error.to_string(),
        });
    }
}

impl fmt::Debug for LinkResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkResolver")
            .field("bridge", &self.bridge)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

fn unsupported(info: &SourceInfo) -> ResolveError {
    ResolveError::UnsupportedSource {
        id: info.id,
        name: info.name.clone(),
    }
}
