// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Tag for links pointing at a downloaded file
pub const DOWNLOAD_TAG: &str = "download";

/// Tag for links served from the local library
pub const LOCAL_TAG: &str = "local";

/// A playable resource handed to the player
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    /// Locator the player opens (http(s) or file URL)
    pub url: String,
    /// Where the link came from: "download", "local", or a source-defined label such as a quality
    pub tag: String,
}

impl Link {
    pub fn new(url: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            tag: tag.into(),
        }
    }

    /// Link to a downloaded file
    pub fn download(url: impl Into<String>) -> Self {
        Self::new(url, DOWNLOAD_TAG)
    }

    /// Link into the local library
    pub fn local(url: impl Into<String>) -> Self {
        Self::new(url, LOCAL_TAG)
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.tag, self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_provenance_tags() {
        assert_eq!(Link::download("file:///a/b.mkv").tag, "download");
        assert_eq!(Link::local("file:///lib/ep1.mkv").tag, "local");
    }

    #[test]
    fn display_shows_tag_then_url() {
        let link = Link::new("https://cdn/x.m3u8", "1080p");
        assert_eq!(link.to_string(), "[1080p] https://cdn/x.m3u8");
    }
}
