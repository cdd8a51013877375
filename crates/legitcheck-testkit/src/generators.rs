//! Proptest generators for property-based testing.

use bytes::Bytes;
use proptest::prelude::*;

use legitcheck_core::{DocumentId, DocumentMetadata};

use crate::fixtures::sample_pdf;

/// Generate a plausible issuance time in Unix milliseconds.
pub fn millis() -> impl Strategy<Value = u64> {
    0u64..=4_102_444_800_000
}

/// Generate a well-formed identifier.
pub fn document_id() -> impl Strategy<Value = DocumentId> {
    (millis(), "[a-z0-9]{1,12}").prop_map(|(ms, suffix)| {
        DocumentId::parse(&format!("doc_{}_{}", ms, suffix))
            .expect("generated identifier matches the format")
    })
}

/// Generate an http(s) origin.
pub fn origin() -> impl Strategy<Value = String> {
    ("https?", "[a-z]{1,12}", prop::option::of(1024u16..=65535)).prop_map(
        |(scheme, host, port)| match port {
            Some(port) => format!("{}://{}.example:{}", scheme, host, port),
            None => format!("{}://{}.example", scheme, host),
        },
    )
}

/// Generate a decoded QR payload that carries no identifier.
pub fn noise_payload() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Za-z0-9 :;,.=]{0,48}",
        "https://[a-z]{1,10}\\.example/[a-z]{0,10}",
        "WIFI:S:[a-z]{1,8};T:WPA;P:[a-z0-9]{8};;",
    ]
    .prop_filter("payload must not contain an identifier", |s| {
        !s.contains("doc_") && !s.contains("verify?id=")
    })
}

/// Generate valid issuance metadata.
pub fn metadata() -> impl Strategy<Value = DocumentMetadata> {
    (
        "[A-Z][A-Za-z0-9 ]{0,40}",
        "[A-Za-z ]{1,80}",
        prop_oneof![Just("certificate"), Just("transcript"), Just("medical_record")],
        "[A-Z][a-z]{1,10} [A-Z][a-z]{1,12}",
        "[a-z]{1,12}@[a-z]{1,10}\\.(org|com|edu)",
    )
        .prop_map(|(title, description, kind, name, email)| DocumentMetadata {
            title,
            description: format!("{} document", description.trim()),
            document_type: kind.to_string(),
            recipient_name: name,
            recipient_email: email,
            original_file_name: None,
        })
}

/// Parameters for generating a sample PDF.
#[derive(Debug, Clone)]
pub struct PdfParams {
    pub pages: usize,
    pub text: String,
}

impl Arbitrary for PdfParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (1usize..=4, "[A-Za-z0-9 .,]{0,60}")
            .prop_map(|(pages, text)| PdfParams { pages, text })
            .boxed()
    }
}

/// Build the PDF described by `params`.
pub fn pdf_from_params(params: &PdfParams) -> Bytes {
    sample_pdf(params.pages, &params.text)
}
