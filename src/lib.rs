// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub mod bridge;
pub mod download;
pub mod error;
pub mod http;
pub mod model;
pub mod report;
pub mod resolver;
pub mod source;

// Re-export main types for convenience
pub use bridge::{Bridge, Completion};
pub use download::{DirectoryOracle, DirectoryOracleOptions, DownloadOracle};
pub use error::{BridgeError, DownloadError, ResolveError, SourceError};
pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use model::{Anime, Episode, EpisodeInfo, Link};
pub use report::{Backend, NoopReporter, ResolveEvent, ResolveReporter, SharedResolveReporter};
pub use resolver::{LOCAL_PLACEHOLDER_URL, LinkResolver, RemoteFailurePolicy, ResolverOptions};
pub use source::{
    HttpSource, HttpSourceOptions, LocalDirectorySource, LocalIndexSource, RemoteSource, Source,
};
