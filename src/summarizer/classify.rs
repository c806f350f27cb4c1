// file: src/summarizer/classify.rs
// description: failure classification for untyped remote errors
// reference: https://docs.rs/regex

use crate::error::RemoteErrorKind;
use lazy_static::lazy_static;
use regex::Regex;

pub const STATUS_PAYLOAD_TOO_LARGE: u16 = 413;
pub const STATUS_TOO_MANY_REQUESTS: u16 = 429;

lazy_static! {
    static ref CONTENT_TOO_LARGE_RE: Regex = Regex::new(
        r"(?i)token[\s_-]*limit|too[\s_-]+large|context[\s_-]+length|maximum number of tokens|exceeds the maximum"
    )
    .expect("content-too-large regex is valid");

    static ref QUOTA_RE: Regex =
        Regex::new(r"(?i)quota|rate[\s_-]*limit|resource[\s_-]*exhausted|too many requests")
            .expect("quota regex is valid");

    static ref NETWORK_RE: Regex =
        Regex::new(r"(?i)time[\s_-]*out|timed out|connection|network|dns|reset by peer")
            .expect("network regex is valid");
}

/// Classify a failure from its status code and message text.
///
/// Content-size signals win over everything else so an oversized prompt is
/// never retried, even when it arrives with a status from the retryable set.
pub fn classify(status: Option<u16>, message: &str, retryable_statuses: &[u16]) -> RemoteErrorKind {
    if status == Some(STATUS_PAYLOAD_TOO_LARGE) || CONTENT_TOO_LARGE_RE.is_match(message) {
        return RemoteErrorKind::ContentTooLarge;
    }

    if status == Some(STATUS_TOO_MANY_REQUESTS) || QUOTA_RE.is_match(message) {
        return RemoteErrorKind::Quota;
    }

    if NETWORK_RE.is_match(message) {
        return RemoteErrorKind::TransientNetwork;
    }

    match status {
        Some(code) if retryable_statuses.contains(&code) => RemoteErrorKind::TransientStatus,
        _ => RemoteErrorKind::Unclassified,
    }
}
