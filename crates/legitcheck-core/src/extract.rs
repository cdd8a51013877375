//! Candidate identifier extraction.
//!
//! Two inputs carry identifiers implicitly:
//!
//! - a decoded QR payload, which is either a verification URL or a bare id;
//! - an uploaded file, whose stamped page contains the verification URL as
//!   literal text in an uncompressed content stream.
//!
//! Anything that yields no identifier is noise. Extraction never fails.

use lazy_static::lazy_static;
use regex::bytes::Regex as BytesRegex;

use crate::identifier::VERIFY_PATH;
use crate::types::DocumentId;

lazy_static! {
    static ref EMBEDDED_URL_RE: BytesRegex =
        BytesRegex::new(r"/verify\?id=(doc_[0-9]+_[a-z0-9]+)").expect("url pattern compiles");
    static ref EMBEDDED_ID_RE: BytesRegex =
        BytesRegex::new(r"doc_[0-9]+_[a-z0-9]+").expect("id pattern compiles");
}

/// Where an extracted identifier came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// The `id` query parameter of a verification URL.
    VerificationUrl,
    /// A bare identifier.
    BareIdentifier,
}

/// An identifier found inside a payload or a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedToken {
    pub id: DocumentId,
    pub source: TokenSource,
}

/// Extract an identifier from a decoded QR payload.
///
/// Patterns are tried in order: a URL containing `/verify?id=` yields its `id`
/// query parameter; otherwise the whole payload must be a bare identifier. A
/// URL whose `id` parameter is missing or malformed is noise; it does not fall
/// through to the bare-identifier test.
pub fn token_from_payload(payload: &str) -> Option<EmbeddedToken> {
    let payload = payload.trim();

    if payload.contains(VERIFY_PATH) {
        let raw = query_param(payload, "id")?;
        return DocumentId::parse(&raw).ok().map(|id| EmbeddedToken {
            id,
            source: TokenSource::VerificationUrl,
        });
    }

    DocumentId::parse(payload).ok().map(|id| EmbeddedToken {
        id,
        source: TokenSource::BareIdentifier,
    })
}

/// Extract an identifier embedded in raw file bytes.
///
/// The bytes are searched as text: first for a verification URL, then for
/// any bare identifier. The first match of the first pattern that matches wins.
pub fn token_from_bytes(bytes: &[u8]) -> Option<EmbeddedToken> {
    if let Some(caps) = EMBEDDED_URL_RE.captures(bytes) {
        if let Some(id) = caps.get(1).and_then(|m| parse_ascii(m.as_bytes())) {
            return Some(EmbeddedToken {
                id,
                source: TokenSource::VerificationUrl,
            });
        }
    }

    EMBEDDED_ID_RE
        .find(bytes)
        .and_then(|m| parse_ascii(m.as_bytes()))
        .map(|id| EmbeddedToken {
            id,
            source: TokenSource::BareIdentifier,
        })
}

fn parse_ascii(bytes: &[u8]) -> Option<DocumentId> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| DocumentId::parse(s).ok())
}

/// Percent-decoded value of the first `key` parameter in a URL's query.
fn query_param(url: &str, key: &str) -> Option<String> {
    let (_, query) = url.split_once('?')?;
    let query = query.split('#').next().unwrap_or_default();

    query
        .split('&')
        .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
        .find(|(k, _)| *k == key)
        .and_then(|(_, v)| urlencoding::decode(v).ok())
        .map(|v| v.into_owned())
}
