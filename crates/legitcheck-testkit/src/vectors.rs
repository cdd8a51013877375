//! Golden test vectors.
//!
//! Fixed inputs with known outputs for the content hash, verification URLs
//! and QR payload extraction. Any implementation that talks to the same
//! registry must agree with these.

use legitcheck_core::{derive_verification_url, digest, token_from_payload, DocumentId};

/// A content hash with a known digest.
#[derive(Debug, Clone)]
pub struct HashVector {
    pub name: &'static str,
    pub input: &'static [u8],
    /// Lowercase hex SHA-256.
    pub expected_hex: &'static str,
}

/// Get all hash vectors.
pub fn all_vectors() -> Vec<HashVector> {
    vec![
        HashVector {
            name: "empty input",
            input: b"",
            expected_hex: "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
        },
        HashVector {
            name: "abc",
            input: b"abc",
            expected_hex: "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
        },
        HashVector {
            name: "two-block message",
            input: b"abcdbcdecdefdefgefghfghighijhijkijkljklmklmnlmnomnopnopq",
            expected_hex: "248d6a61d20638b8e5c026930c3e6039a33ce45964ff2167f6ecedd419db06c1",
        },
        HashVector {
            name: "pangram",
            input: b"The quick brown fox jumps over the lazy dog",
            expected_hex: "d7a8fbb307d7809469ca9abcb0082e4f8d5651e46d3cdb762d02d0bf37c9e592",
        },
    ]
}

/// A verification URL derivation.
#[derive(Debug, Clone)]
pub struct UrlVector {
    pub id: &'static str,
    pub origin: &'static str,
    pub expected: &'static str,
}

pub fn url_vectors() -> Vec<UrlVector> {
    vec![
        UrlVector {
            id: "doc_1700000000000_abc123xyz",
            origin: "https://legitcheck.example",
            expected: "https://legitcheck.example/verify?id=doc_1700000000000_abc123xyz",
        },
        UrlVector {
            id: "doc_0_0",
            origin: "http://localhost:3000",
            expected: "http://localhost:3000/verify?id=doc_0_0",
        },
    ]
}

/// A decoded QR payload and the identifier it should yield.
#[derive(Debug, Clone)]
pub struct PayloadVector {
    pub name: &'static str,
    pub payload: &'static str,
    pub expected: Option<&'static str>,
}

pub fn payload_vectors() -> Vec<PayloadVector> {
    vec![
        PayloadVector {
            name: "verification url",
            payload: "https://legitcheck.example/verify?id=doc_1700000000000_abc123xyz",
            expected: Some("doc_1700000000000_abc123xyz"),
        },
        PayloadVector {
            name: "url with trailing parameters",
            payload: "https://legitcheck.example/verify?id=doc_1700000000000_abc123xyz&lang=en#top",
            expected: Some("doc_1700000000000_abc123xyz"),
        },
        PayloadVector {
            name: "id not the first parameter",
            payload: "https://legitcheck.example/verify?src=qr&id=doc_1700000000000_abc123xyz#x",
            expected: None,
        },
        PayloadVector {
            name: "bare identifier with whitespace",
            payload: " doc_1700000000000_abc123xyz\n",
            expected: Some("doc_1700000000000_abc123xyz"),
        },
        PayloadVector {
            name: "uppercase identifier",
            payload: "https://legitcheck.example/verify?id=DOC_1_ABC",
            expected: None,
        },
        PayloadVector {
            name: "url without id",
            payload: "https://legitcheck.example/verify?id=",
            expected: None,
        },
        PayloadVector {
            name: "unrelated url",
            payload: "https://example.com/menu",
            expected: None,
        },
        PayloadVector {
            name: "identifier inside prose",
            payload: "see doc_1_a",
            expected: None,
        },
    ]
}

/// Check every vector, returning `(name, matches, actual)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    let hashes = all_vectors().into_iter().map(|v| {
        let hex = digest(v.input).to_hex();
        (v.name.to_string(), hex == v.expected_hex, hex)
    });

    let urls = url_vectors().into_iter().map(|v| {
        let actual = match DocumentId::parse(v.id) {
            Ok(id) => derive_verification_url(&id, v.origin),
            Err(e) => e.to_string(),
        };
        (format!("url {}", v.id), actual == v.expected, actual)
    });

    let payloads = payload_vectors().into_iter().map(|v| {
        let actual = token_from_payload(v.payload).map(|t| t.id.to_string());
        let matches = actual.as_deref() == v.expected;
        (v.name.to_string(), matches, actual.unwrap_or_default())
    });

    hashes.chain(urls).chain(payloads).collect()
}
