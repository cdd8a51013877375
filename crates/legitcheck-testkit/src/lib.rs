//! # LegitCheck Testkit
//!
//! Testing utilities for LegitCheck.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: sample PDFs, an in-memory service pair, a fixed identifier
//!   source, failure-injecting stores and a scripted camera
//! - **Generators**: Proptest strategies for identifiers, metadata and PDFs
//! - **Golden vectors**: Known hashes, URLs and payload extractions
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use legitcheck_testkit::fixtures::{sample_pdf, TestFixture};
//!
//! async fn example() {
//!     let fixture = TestFixture::new();
//!     let doc = fixture.issue("Diploma", sample_pdf(1, "Diploma")).await.unwrap();
//!     let res = fixture.verify_id(doc.id.as_str()).await;
//!     assert!(res.document.is_some());
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use legitcheck_testkit::generators::{pdf_from_params, PdfParams};
//!
//! proptest! {
//!     #[test]
//!     fn stamping_is_deterministic(params: PdfParams) {
//!         let pdf = pdf_from_params(&params);
//!         let url = "https://legitcheck.example/verify?id=doc_1_a";
//!         prop_assert_eq!(
//!             legitcheck_stamp::stamp(&pdf, url).unwrap(),
//!             legitcheck_stamp::stamp(&pdf, url).unwrap()
//!         );
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{
    sample_pdf, verified_issuer, FailingBlobStore, FailingStore, FixedIdGenerator,
    ScriptedFrames, TestFixture,
};
pub use generators::{pdf_from_params, PdfParams};
pub use vectors::{all_vectors, verify_all_vectors, HashVector};
