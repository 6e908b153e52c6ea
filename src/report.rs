// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;
use std::sync::Arc;

/// The backend a resolution was served from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    Download,
    Remote,
    LocalIndex,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Backend::Download => "download",
            Backend::Remote => "remote",
            Backend::LocalIndex => "local index",
        };
        f.write_str(name)
    }
}

/// Events emitted while resolving links
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveEvent {
    /// The download oracle was asked about an episode
    OracleConsulted { episode: String, downloaded: bool },

    /// A backend was chosen for the episode
    BackendSelected {
        backend: Backend,
        source: String,
        episode: String,
    },

    /// A backend failed and its error was dropped
    BackendFailed {
        backend: Backend,
        episode: String,
        error: String,
    },

    /// Resolution finished with `count` links
    LinksResolved {
        backend: Backend,
        episode: String,
        count: usize,
    },

    /// A local placeholder link was returned without querying the library
    PlaceholderReturned { episode: String },
}

/// Trait for observing link resolution.
///
/// Implementations can use this to drive a spinner, log messages,
/// or collect statistics.
pub trait ResolveReporter: Send + Sync {
    /// Report a resolution event
    fn report(&self, event: ResolveEvent);
}

/// A shared reference to a resolve reporter
pub type SharedResolveReporter = Arc<dyn ResolveReporter>;

/// A no-op reporter that silently ignores all events.
/// Useful for tests or quiet mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ResolveReporter for NoopReporter {
    fn report(&self, _event: ResolveEvent) {}
}

impl NoopReporter {
    /// Create a new NoopReporter wrapped in an Arc
    pub fn shared() -> SharedResolveReporter {
        Arc::new(Self)
    }
}
