//! Document identifier generation and verification URLs.
//!
//! Identifiers are `doc_<t>_<r>` where `t` is the generation time in Unix
//! milliseconds and `r` a random lowercase base-36 suffix. Uniqueness rests on
//! the randomness of the suffix; collisions are not checked here (the store's
//! create-if-absent is the only guard).

use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;

use crate::types::{now_millis, DocumentId};

/// Path and query prefix of the public verification surface.
pub const VERIFY_PATH: &str = "/verify?id=";

/// Length of the random suffix appended to generated identifiers.
pub const SUFFIX_LEN: usize = 9;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

lazy_static! {
    // ASCII digits only: `\d` would also admit other Unicode decimal digits.
    static ref IDENTIFIER_RE: Regex =
        Regex::new(r"^doc_[0-9]+_[a-z0-9]+$").expect("identifier pattern compiles");
}

/// Source of fresh document identifiers.
///
/// The issuance service takes this as a dependency so tests can pin the
/// identifier of a document before issuing it.
pub trait IdGenerator: Send + Sync {
    /// Produce a new identifier.
    fn generate(&self) -> DocumentId;
}

/// Time-ordered identifiers with a random base-36 suffix.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn generate(&self) -> DocumentId {
        generate()
    }
}

/// Generate an identifier from the current time.
pub fn generate() -> DocumentId {
    let millis = u64::try_from(now_millis()).unwrap_or_default();
    DocumentId::from_parts(millis, &random_suffix(SUFFIX_LEN))
}

/// A random lowercase base-36 string of `len` characters.
pub fn random_suffix(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

/// Build the verification URL for an identifier.
///
/// Plain concatenation: `{origin}/verify?id={id}`. The origin is used as
/// given; normalizing a trailing slash is the caller's job.
pub fn derive_verification_url(id: &DocumentId, origin: &str) -> String {
    format!("{}{}{}", origin, VERIFY_PATH, id)
}

/// Whether `s` has the identifier format.
pub fn is_valid_format(s: &str) -> bool {
    IDENTIFIER_RE.is_match(s)
}
