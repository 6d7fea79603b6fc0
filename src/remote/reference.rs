//! Playlist reference normalization

use url::Url;

/// Turn a playlist URL or bare playlist id into a URL the extractor accepts
///
/// Anything that parses as an http(s) URL is passed through untouched;
/// everything else is treated as an opaque playlist id.
pub fn playlist_url(reference: &str) -> String {
    let reference = reference.trim();

    match Url::parse(reference) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => url.to_string(),
        _ => format!(
            "https://www.youtube.com/playlist?list={}",
            urlencoding::encode(reference)
        ),
    }
}
