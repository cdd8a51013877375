//! Service configuration.

use legitcheck_stamp::{QrOptions, StampLayout};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServiceError};

/// Configuration shared by issuance and verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Serving origin, e.g. `https://legitcheck.example`. Verification URLs
    /// are `{origin}/verify?id={id}`.
    pub origin: String,
    /// Top-level directory for stamped PDFs in the blob store.
    pub blob_prefix: String,
    /// QR raster drawn onto the PDF.
    pub stamp_qr: QrOptions,
    /// QR rendering stored on the record for display.
    pub display_qr: QrOptions,
    pub layout: StampLayout,
    /// Refuse to issue for issuers that are not `verified`.
    pub require_verified_issuer: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:3000".to_string(),
            blob_prefix: "issued_docs".to_string(),
            stamp_qr: QrOptions::default(),
            display_qr: QrOptions {
                width: 200,
                margin: 4,
                ..QrOptions::default()
            },
            layout: StampLayout::default(),
            require_verified_issuer: true,
        }
    }
}

impl ServiceConfig {
    /// A default configuration serving from `origin`.
    pub fn with_origin(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Self::default()
        }
    }

    /// Parse a JSON configuration. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ServiceError::Config(e.to_string()))?;
        config.validate()
    }

    /// Check the configuration and normalize the origin.
    pub fn validate(mut self) -> Result<Self> {
        let origin = self.origin.trim().trim_end_matches('/');
        if origin.is_empty() {
            return Err(ServiceError::Config("origin is empty".into()));
        }
        let has_host = origin
            .strip_prefix("https://")
            .or_else(|| origin.strip_prefix("http://"))
            .is_some_and(|host| !host.is_empty());
        if !has_host {
            return Err(ServiceError::Config(format!(
                "origin must be an http(s) URL, got {:?}",
                self.origin
            )));
        }
        self.origin = origin.to_string();

        self.blob_prefix = self.blob_prefix.trim_matches('/').to_string();
        if self.blob_prefix.is_empty() {
            return Err(ServiceError::Config("blob_prefix is empty".into()));
        }

        for (name, qr) in [("stamp_qr", &self.stamp_qr), ("display_qr", &self.display_qr)] {
            qr.validate()
                .map_err(|e| ServiceError::Config(format!("{}: {}", name, e)))?;
        }
        Ok(self)
    }
}
