// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while waiting on an asynchronous operation from a blocking caller
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("Operation was abandoned before it completed (cancelled or panicked)")]
    Abandoned,

    #[error("Cannot block on a current-thread runtime")]
    CurrentThreadRuntime,
}

/// Errors that can occur when a source fetches episode links
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP request failed for {url}: {source}")]
    HttpFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Invalid link response from {url}: {source}")]
    InvalidResponse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid source URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Episode path does not exist: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectoryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Source task failed: {0}")]
    Bridge(#[from] BridgeError),
}

/// Errors that can occur when locating a downloaded episode
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Episode '{episode}' is not downloaded")]
    NotDownloaded { episode: String },

    #[error("Failed to read download metadata {path}: {source}")]
    MetadataReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse download metadata JSON in {path}: {source}")]
    MetadataParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write download metadata {path}: {source}")]
    MetadataWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize download metadata: {0}")]
    MetadataSerializeFailed(#[from] serde_json::Error),

    #[error("Failed to create directory {path}: {source}")]
    CreateDirectoryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Downloaded video file is missing: {0}")]
    VideoMissing(PathBuf),

    #[error("Cannot build a file URL for {0}")]
    InvalidPath(PathBuf),

    #[error("Failed to hash {path}: {source}")]
    HashFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("Download task failed: {0}")]
    Bridge(#[from] BridgeError),
}

/// Errors surfaced to callers of the link resolver
///
/// Soft failures (nothing found, download or local lookups failing) never
/// appear here; they resolve to an empty result instead.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Source '{name}' (id {id}) is not supported")]
    UnsupportedSource { id: i64, name: String },

    #[error("Remote source '{name}' failed: {source}")]
    Remote {
        name: String,
        #[source]
        source: SourceError,
    },
}
