//! Pure mapping between node URIs and the path strings the SFTP
//! channel expects.
//!
//! Whether a tree addresses the remote side absolutely is decided once
//! at the root: either the URI path starts with a doubled separator or
//! the query carries `absolute=true`. Descendants inherit that mode,
//! it is never re-derived from a child's own URI.

use percent_encoding::percent_decode_str;
use url::Url;

/// Maps a URI path onto the remote path for the channel.
///
/// In relative mode exactly one leading separator is stripped (a URI
/// path always carries one). In absolute mode a run of leading
/// separators collapses to a single one. An empty result for a
/// container becomes the current-directory token.
pub fn remote_path(uri_path: &str, absolute: bool, container: bool) -> String {
    let decoded = percent_decode_str(uri_path).decode_utf8_lossy();
    let path = if absolute {
        format!("/{}", decoded.trim_start_matches('/'))
    } else {
        decoded
            .strip_prefix('/')
            .unwrap_or(decoded.as_ref())
            .to_string()
    };

    if path.is_empty() && container {
        ".".to_string()
    } else {
        path
    }
}

/// Base name of a remote path. A path without separator is its own
/// name.
pub fn name(path: &str) -> &str {
    match path.rfind('/') {
        Some(index) => &path[index + 1..],
        None => path,
    }
}

/// Whether `url` forces absolute remote addressing.
pub fn is_absolute(url: &Url) -> bool {
    if url.path().starts_with("//") {
        return true;
    }
    url.query_pairs().any(|(key, value)| key == "absolute" && value == "true")
}

/// URI of a child entry, one segment below `url`.
pub fn child(url: &Url, name: &str) -> Url {
    let mut child = url.clone();
    let path = url.path();
    if path.ends_with('/') {
        child.set_path(&format!("{path}{name}"));
    } else {
        child.set_path(&format!("{path}/{name}"));
    }
    child
}

/// URI of a sibling entry: same parent path, new base name.
pub fn sibling(url: &Url, name: &str) -> Url {
    let mut sibling = url.clone();
    let path = url.path();
    let parent = match path.rfind('/') {
        Some(index) => &path[..index],
        None => "",
    };
    sibling.set_path(&format!("{parent}/{name}"));
    sibling
}
