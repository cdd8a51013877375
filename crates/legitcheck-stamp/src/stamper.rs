//! Embedding the verification QR code and link into a PDF.
//!
//! The stamp goes on the last page at a fixed bottom-left anchor:
//!
//! ```text
//!   ┌──────────┐  y = margin + qr_lift + qr_size
//!   │   QR     │
//!   └──────────┘  y = margin + qr_lift
//!   Verify at:    y = margin + qr_lift - label_gap
//!   https://…     y = margin + qr_lift - url_gap
//!   x = margin
//! ```
//!
//! The new content stream is written uncompressed, so the verification URL
//! appears as literal text in the output bytes. Identifier extraction from
//! uploaded files relies on that.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StampError};
use crate::qr::{self, QrOptions, QrRaster};

/// Maximum depth followed when looking up inherited page attributes.
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Placement and typography of the stamp, in PDF user-space units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StampLayout {
    pub qr_size: u32,
    pub margin: u32,
    /// How far the QR code sits above the margin.
    pub qr_lift: u32,
    /// Baseline of the label, measured down from the bottom of the QR code.
    pub label_gap: u32,
    /// Baseline of the URL, measured down from the bottom of the QR code.
    pub url_gap: u32,
    pub label_size: u32,
    pub url_size: u32,
    pub label: String,
    pub label_color: [u8; 3],
    pub url_color: [u8; 3],
}

impl Default for StampLayout {
    fn default() -> Self {
        Self {
            qr_size: 80,
            margin: 20,
            qr_lift: 40,
            label_gap: 15,
            url_gap: 25,
            label_size: 8,
            url_size: 6,
            label: "Verify at:".to_string(),
            label_color: [0, 0, 0],
            url_color: [0, 0, 255],
        }
    }
}

impl StampLayout {
    fn qr_origin(&self) -> (i64, i64) {
        (
            i64::from(self.margin),
            i64::from(self.margin + self.qr_lift),
        )
    }
}

/// Stamps PDFs with a verification QR code and link.
#[derive(Debug, Clone, Default)]
pub struct Stamper {
    layout: StampLayout,
    qr: QrOptions,
}

impl Stamper {
    pub fn new(layout: StampLayout, qr: QrOptions) -> Self {
        Self { layout, qr }
    }

    pub fn layout(&self) -> &StampLayout {
        &self.layout
    }

    /// Stamp `pdf` with `verification_url`, returning the new PDF bytes.
    ///
    /// The output is deterministic for a given input and URL.
    pub fn stamp(&self, pdf: &[u8], verification_url: &str) -> Result<Vec<u8>> {
        let mut doc = Document::load_mem(pdf)
            .map_err(|e| StampError::MalformedDocument(e.to_string()))?;

        let page_id = doc
            .get_pages()
            .into_values()
            .last()
            .ok_or_else(|| StampError::MalformedDocument("document has no pages".into()))?;

        let raster = qr::encode(verification_url, &self.qr)?;
        let image_id = doc.add_object(image_stream(&raster));
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });

        let mut resources = effective_resources(&doc, page_id);
        let image_name = register(&doc, &mut resources, "XObject", "LcQr", image_id);
        let font_name = register(&doc, &mut resources, "Font", "LcF", font_id);

        let (origin_x, origin_y) = media_origin(&doc, page_id);
        let ops = self.operations(
            verification_url,
            &image_name,
            &font_name,
            (origin_x, origin_y),
        );
        let content = Content { operations: ops }
            .encode()
            .map_err(|e| StampError::Write(e.to_string()))?;

        // Isolate whatever graphics state the existing content leaves behind.
        let open_id = doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
        let stamp_id = doc.add_object(Stream::new(dictionary! {}, content));
        let contents = page_contents(&doc, page_id, open_id, stamp_id);

        let page = doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|e| StampError::MalformedDocument(e.to_string()))?;
        page.set("Resources", Object::Dictionary(resources));
        page.set("Contents", contents);

        let mut out = Vec::with_capacity(pdf.len() + raster.pixels.len() + 1024);
        doc.save_to(&mut out)
            .map_err(|e| StampError::Write(e.to_string()))?;

        tracing::debug!(
            input_size = pdf.len(),
            output_size = out.len(),
            "stamped document"
        );
        Ok(out)
    }

    fn operations(
        &self,
        url: &str,
        image: &str,
        font: &str,
        (ox, oy): (i64, i64),
    ) -> Vec<Operation> {
        let layout = &self.layout;
        let (qx, qy) = layout.qr_origin();
        let (x, y) = (ox + qx, oy + qy);
        let size = i64::from(layout.qr_size);

        let mut ops = vec![
            Operation::new("Q", vec![]),
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![size.into(), 0i64.into(), 0i64.into(), size.into(), x.into(), y.into()],
            ),
            Operation::new("Do", vec![Object::Name(image.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ];

        let lines = [
            (
                layout.label.as_str(),
                layout.label_size,
                layout.label_color,
                layout.label_gap,
            ),
            (url, layout.url_size, layout.url_color, layout.url_gap),
        ];
        for (text, size, color, gap) in lines {
            ops.extend([
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![
                        Object::Name(font.as_bytes().to_vec()),
                        i64::from(size).into(),
                    ],
                ),
                Operation::new("rg", color.iter().map(|&c| channel(c)).collect()),
                Operation::new("Td", vec![x.into(), (y - i64::from(gap)).into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ]);
        }

        ops
    }
}

/// Stamp with the default layout and QR options.
pub fn stamp(pdf: &[u8], verification_url: &str) -> Result<Vec<u8>> {
    Stamper::default().stamp(pdf, verification_url)
}

fn channel(c: u8) -> Object {
    match c {
        0 => 0i64.into(),
        255 => 1i64.into(),
        _ => (f32::from(c) / 255.0).into(),
    }
}

fn image_stream(raster: &QrRaster) -> Stream {
    // Raw samples: no filter, so the stream stays readable in the output.
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(raster.width),
            "Height" => i64::from(raster.height),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8i64,
        },
        raster.pixels.clone(),
    )
}

fn resolve_dict(doc: &Document, obj: &Object) -> Option<Dictionary> {
    match obj {
        Object::Dictionary(dict) => Some(dict.clone()),
        Object::Reference(id) => doc
            .get_object(*id)
            .and_then(Object::as_dict)
            .ok()
            .cloned(),
        _ => None,
    }
}

/// Look up a page attribute, following the `Parent` chain for inherited ones.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node = page_id;
    for _ in 0..MAX_INHERITANCE_DEPTH {
        let dict = doc.get_object(node).and_then(Object::as_dict).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        node = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
    }
    None
}

/// The page's resources as an owned dictionary, inherited ones included.
fn effective_resources(doc: &Document, page_id: ObjectId) -> Dictionary {
    inherited(doc, page_id, b"Resources")
        .and_then(|obj| resolve_dict(doc, obj))
        .unwrap_or_default()
}

/// Add `id` under a fresh name in the `category` sub-dictionary.
fn register(
    doc: &Document,
    resources: &mut Dictionary,
    category: &str,
    prefix: &str,
    id: ObjectId,
) -> String {
    let mut entries = resources
        .get(category.as_bytes())
        .ok()
        .and_then(|obj| resolve_dict(doc, obj))
        .unwrap_or_default();

    let name = (0..)
        .map(|n| format!("{}{}", prefix, n))
        .find(|candidate| !entries.has(candidate.as_bytes()))
        .unwrap_or_else(|| prefix.to_string());

    entries.set(name.clone(), Object::Reference(id));
    resources.set(category, Object::Dictionary(entries));
    name
}

/// Lower-left corner of the page's media box.
fn media_origin(doc: &Document, page_id: ObjectId) -> (i64, i64) {
    let Some(obj) = inherited(doc, page_id, b"MediaBox") else {
        return (0, 0);
    };
    let array = match obj {
        Object::Reference(id) => doc.get_object(*id).and_then(Object::as_array).ok(),
        other => other.as_array().ok(),
    };
    let number = |o: &Object| match o {
        Object::Integer(i) => Some(*i),
        Object::Real(r) => Some(r.round() as i64),
        _ => None,
    };
    match array.map(|a| a.as_slice()) {
        Some([llx, lly, ..]) => (number(llx).unwrap_or(0), number(lly).unwrap_or(0)),
        _ => (0, 0),
    }
}

/// New `Contents` value: `[open, existing..., stamp]`.
fn page_contents(doc: &Document, page_id: ObjectId, open: ObjectId, stamp: ObjectId) -> Object {
    let existing = doc
        .get_object(page_id)
        .and_then(Object::as_dict)
        .and_then(|page| page.get(b"Contents"))
        .ok();

    let mut parts = vec![Object::Reference(open)];
    match existing {
        Some(Object::Array(items)) => parts.extend(items.iter().cloned()),
        Some(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => parts.extend(items.iter().cloned()),
            _ => parts.push(Object::Reference(*id)),
        },
        _ => {}
    }
    parts.push(Object::Reference(stamp));
    Object::Array(parts)
}
