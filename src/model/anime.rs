// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source id reserved for the on-device library
pub const LOCAL_SOURCE_ID: i64 = 0;

/// A series in the user's library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anime {
    pub id: i64,
    /// Id of the source the series was added from
    pub source_id: i64,
    pub title: String,
    /// Source-relative URL of the series
    pub url: String,
}

impl Anime {
    /// Whether this series comes from the on-device library
    pub fn is_local(&self) -> bool {
        self.source_id == LOCAL_SOURCE_ID
    }
}

/// A single episode of a series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: i64,
    pub anime_id: i64,
    /// Source-relative URL; for the local library this is a path under the library root
    pub url: String,
    pub name: String,
    /// Episode number, negative when unknown
    pub episode_number: f32,
    pub date_upload: Option<DateTime<Utc>>,
    /// Fansub group or uploader, when known
    pub scanlator: Option<String>,
}

/// The request descriptor remote sources receive for an episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeInfo {
    pub url: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_upload: Option<DateTime<Utc>>,
    pub episode_number: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scanlator: Option<String>,
}

impl Episode {
    /// Build the descriptor handed to remote sources
    pub fn to_episode_info(&self) -> EpisodeInfo {
        EpisodeInfo {
            url: self.url.clone(),
            name: self.name.clone(),
            date_upload: self.date_upload,
            episode_number: self.episode_number,
            scanlator: self.scanlator.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_anime(source_id: i64) -> Anime {
        Anime {
            id: 7,
            source_id,
            title: "Cowboy Bebop".to_string(),
            url: "/anime/cowboy-bebop".to_string(),
        }
    }

    #[test]
    fn local_library_anime_is_local() {
        assert!(make_anime(LOCAL_SOURCE_ID).is_local());
        assert!(!make_anime(4_242).is_local());
    }

    #[test]
    fn episode_info_carries_request_fields() {
        let episode = Episode {
            id: 101,
            anime_id: 7,
            url: "/watch/bebop-5".to_string(),
            name: "Ballad of Fallen Angels".to_string(),
            episode_number: 5.0,
            date_upload: DateTime::parse_from_rfc3339("1998-11-20T00:00:00Z")
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            scanlator: Some("Bebop Subs".to_string()),
        };

        let info = episode.to_episode_info();

        assert_eq!(info.url, "/watch/bebop-5");
        assert_eq!(info.name, "Ballad of Fallen Angels");
        assert_eq!(info.episode_number, 5.0);
        assert!(info.date_upload.is_some());
        assert_eq!(info.scanlator.as_deref(), Some("Bebop Subs"));
    }
}
