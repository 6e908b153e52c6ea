// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::model::Episode;

/// Maximum length for a sanitized name
const MAX_NAME_LENGTH: usize = 100;

/// Generate the file stem used for an episode's download files
///
/// Format: "NNN-sanitized-name" or "unnumbered-sanitized-name"
pub fn episode_stem(episode: &Episode) -> String {
    let number_prefix = if episode.episode_number >= 0.0 {
        format!("{:0>3}", episode.episode_number.to_string())
    } else {
        "unnumbered".to_string()
    };

    let name = sanitize_name(&episode.name);
    if name.is_empty() {
        format!("{}-episode", number_prefix)
    } else {
        format!("{}-{}", number_prefix, name)
    }
}

/// Sanitize a title or source name for use as a path component
///
/// Keeps ASCII letters, digits, `_` and `.`; every other run of characters
/// becomes a single `-`. Never returns a bare "." or ".." so the result stays
/// inside its parent.
pub fn sanitize_name(name: &str) -> String {
    let mut sanitized = String::with_capacity(name.len());
    let mut pending_separator = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '_' | '.') {
            if pending_separator && !sanitized.is_empty() {
                sanitized.push('-');
            }
            pending_separator = false;
            sanitized.push(c);
        } else {
            pending_separator = true;
        }
    }

    let trimmed = sanitized.trim_matches(is_edge_char);
    clip_to_boundary(trimmed, MAX_NAME_LENGTH).to_string()
}

fn is_edge_char(c: char) -> bool {
    c == '-' || c == '.'
}

/// Shorten an ASCII name to `max_len`, preferring to cut at a separator
fn clip_to_boundary(name: &str, max_len: usize) -> &str {
    if name.len() <= max_len {
        return name;
    }

    let clipped = &name[..max_len];
    match clipped.rfind('-') {
        Some(pos) if pos > max_len / 2 => &clipped[..pos],
        _ => clipped.trim_end_matches(is_edge_char),
    }
}
