//! Header-only serialization sizes.
//!
//! Measures how many bytes the request line / status line plus the header
//! section of a message occupy in HTTP/1.x wire form, without allocating the
//! serialized text. HTTP/2 and HTTP/3 messages are measured in HTTP/1.1
//! framing.

use http::header::{HeaderMap, HOST};
use http::{Method, StatusCode, Uri, Version};
use thiserror::Error;

const CRLF: usize = 2;
const HEADER_SEPARATOR: usize = 2; // ": "

/// Reasons a message head cannot be measured.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HeadError {
    /// HTTP/0.9 messages have no header section.
    #[error("{0:?} has no header section")]
    UnsupportedVersion(Version),
}

/// Header-only serialization length of a request.
///
/// Layout: `METHOD SP target SP version CRLF`, a `Host` line taken from the
/// `Host` header or the URI authority, every other header line, then the
/// terminating CRLF.
pub fn request_head_len(
    method: &Method,
    uri: &Uri,
    version: Version,
    headers: &HeaderMap,
) -> Result<usize, HeadError> {
    let version = version_token(version)?;

    // An authority-only URI is written with a "/" target.
    let target = uri.path_and_query().map_or(1, |pq| pq.as_str().len());

    let mut len = method.as_str().len() + 1 + target + 1 + version.len() + CRLF;

    let host = headers
        .get(HOST)
        .map(|v| v.as_bytes().len())
        .or_else(|| uri.authority().map(|a| a.as_str().len()))
        .filter(|n| *n > 0);
    if let Some(host_len) = host {
        len += HOST.as_str().len() + HEADER_SEPARATOR + host_len + CRLF;
    }

    len += header_lines_len(headers, true);
    Ok(len + CRLF)
}

/// Header-only serialization length of a response.
///
/// Layout: `version SP code SP reason CRLF`, every header line, then the
/// terminating CRLF. `reason` is the phrase the server sent; without one the
/// canonical phrase for `status` is measured.
pub fn response_head_len(
    status: StatusCode,
    reason: Option<&[u8]>,
    version: Version,
    headers: &HeaderMap,
) -> Result<usize, HeadError> {
    let version = version_token(version)?;
    let reason = reason
        .map(<[u8]>::len)
        .unwrap_or_else(|| status.canonical_reason().map_or(0, str::len));

    let len = version.len() + 1 + 3 + 1 + reason + CRLF;
    Ok(len + header_lines_len(headers, false) + CRLF)
}

fn header_lines_len(headers: &HeaderMap, skip_host: bool) -> usize {
    headers
        .iter()
        .filter(|(name, _)| !(skip_host && **name == HOST))
        .map(|(name, value)| name.as_str().len() + HEADER_SEPARATOR + value.as_bytes().len() + CRLF)
        .sum()
}

fn version_token(version: Version) -> Result<&'static str, HeadError> {
    if version == Version::HTTP_09 {
        Err(HeadError::UnsupportedVersion(version))
    } else if version == Version::HTTP_10 {
        Ok("HTTP/1.0")
    } else {
        Ok("HTTP/1.1")
    }
}
