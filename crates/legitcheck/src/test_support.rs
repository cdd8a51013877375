//! Shared helpers for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use bytes::Bytes;
use legitcheck_core::identifier::generate;
use legitcheck_core::{DocumentId, DocumentMetadata, IdGenerator, Issuer, IssuerKind, IssuerStatus};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

/// Hands out a fixed sequence of identifiers, then random ones.
pub(crate) struct FixedIds(Mutex<VecDeque<DocumentId>>);

impl FixedIds {
    pub(crate) fn new(ids: &[&str]) -> Self {
        Self(Mutex::new(
            ids.iter().map(|s| DocumentId::parse(s).unwrap()).collect(),
        ))
    }
}

impl IdGenerator for FixedIds {
    fn generate(&self) -> DocumentId {
        self.0.lock().unwrap().pop_front().unwrap_or_else(generate)
    }
}

pub(crate) fn verified_issuer() -> Issuer {
    Issuer {
        id: "issuer_1".into(),
        user_id: "user_1".into(),
        organization_name: "State University".into(),
        kind: IssuerKind::Education,
        description: "Public research university".into(),
        status: IssuerStatus::Verified,
        created_at: 1_600_000_000_000,
        approved_at: Some(1_600_000_100_000),
        approved_by: Some("admin".into()),
    }
}

pub(crate) fn metadata(title: &str) -> DocumentMetadata {
    DocumentMetadata {
        title: title.into(),
        description: "Bachelor of Science".into(),
        document_type: "certificate".into(),
        recipient_name: "Sam Doe".into(),
        recipient_email: "sam@example.org".into(),
        original_file_name: Some(format!("{title}.pdf")),
    }
}

/// A one-page PDF showing `text`.
pub(crate) fn sample_pdf(text: &str) -> Bytes {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 24i64.into()]),
            Operation::new("Td", vec![100i64.into(), 600i64.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1i64,
            "MediaBox" => vec![0i64.into(), 0i64.into(), 612i64.into(), 792i64.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    Bytes::from(out)
}
