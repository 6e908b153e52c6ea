// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod anime;
mod link;

pub use anime::{Anime, Episode, EpisodeInfo, LOCAL_SOURCE_ID};
pub use link::{DOWNLOAD_TAG, LOCAL_TAG, Link};
