//! # LegitCheck Stamp
//!
//! Everything that touches QR codes and PDF bytes:
//!
//! - [`qr`] renders a verification URL as an RGB raster or an SVG data URL
//! - [`stamper`] draws the QR code and the URL onto the last page of a PDF
//! - [`scan`] drives a camera until a decoded frame yields an identifier
//!
//! Stamping is CPU-bound and synchronous. Async callers should run it on a
//! blocking thread.

pub mod error;
pub mod qr;
pub mod scan;
pub mod stamper;

pub use error::{Result, ScanError, StampError};
pub use qr::{encode, svg_data_url, ErrorCorrection, QrOptions, QrRaster};
pub use scan::{scan, FrameSource, ScanCanceller, ScanOutcome, ScanReport};
pub use stamper::{stamp, StampLayout, Stamper};
