//! Source image probing.
//!
//! [`probe`] takes the immutable per-request snapshot of a source image:
//! dimensions, modification time, and format tag. Every resize decision
//! downstream (no-op short-circuit, cache key, geometry, dispatch) works off
//! this snapshot, so a file changing mid-request cannot produce a mixed
//! result.
//!
//! Raster dimensions come from the `image` crate's header sniffing (no full
//! decode); SVG dimensions are read from the root element's `width`/`height`
//! attributes with a `viewBox` fallback.

use crate::store::{BlobStore, StoreError};
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("could not read dimensions: {0}")]
    Dimensions(String),
}

/// The four formats the pipeline understands, dispatched exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Gif,
    Jpeg,
    Png,
    Svg,
}

impl ImageFormat {
    /// Map a lowercase file extension to a format tag.
    pub fn from_extension(ext: &str) -> Option<Self> {
        Some(match ext {
            "gif" => ImageFormat::Gif,
            "jpg" | "jpeg" => ImageFormat::Jpeg,
            "png" => ImageFormat::Png,
            "svg" => ImageFormat::Svg,
            _ => return None,
        })
    }

    pub fn is_vector(self) -> bool {
        matches!(self, ImageFormat::Svg)
    }
}

/// Immutable snapshot of a source image, taken once per operation.
#[derive(Debug, Clone)]
pub struct ImageSource {
    /// Store-relative path.
    pub path: String,
    pub width: u32,
    pub height: u32,
    /// Seconds since the Unix epoch.
    pub mtime: u64,
    /// Lowercased extension as it appears on disk.
    pub extension: String,
    pub format: ImageFormat,
}

/// Probe a source file through the store.
///
/// SVG files without usable `width`/`height` or `viewBox` report `0 × 0`;
/// callers treat unknown dimensions as "never equal to a request".
pub fn probe(
    store: &impl BlobStore,
    path: &str,
    extension: &str,
    format: ImageFormat,
) -> Result<ImageSource, ProbeError> {
    let mtime = store.mtime(path)?;
    let bytes = store.read(path)?;

    let (width, height) = match format {
        ImageFormat::Svg => svg_dimensions(&bytes),
        _ => raster_dimensions(&bytes)?,
    };

    Ok(ImageSource {
        path: path.to_string(),
        width,
        height,
        mtime,
        extension: extension.to_string(),
        format,
    })
}

/// Header-only dimension read via the `image` crate.
fn raster_dimensions(bytes: &[u8]) -> Result<(u32, u32), ProbeError> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ProbeError::Dimensions(e.to_string()))?;
    reader
        .into_dimensions()
        .map_err(|e| ProbeError::Dimensions(e.to_string()))
}

/// Intrinsic SVG dimensions: explicit `width`/`height` attributes first,
/// then the `viewBox`, else `(0, 0)`.
fn svg_dimensions(bytes: &[u8]) -> (u32, u32) {
    let Ok(text) = std::str::from_utf8(bytes) else {
        return (0, 0);
    };
    let Ok(doc) = roxmltree::Document::parse(text) else {
        return (0, 0);
    };
    let root = doc.root_element();

    let explicit = (
        root.attribute("width").and_then(parse_length),
        root.attribute("height").and_then(parse_length),
    );
    if let (Some(w), Some(h)) = explicit {
        return (w, h);
    }

    if let Some(view_box) = root.attribute("viewBox") {
        let parts: Vec<f64> = view_box
            .split([' ', ','])
            .filter(|s| !s.is_empty())
            .filter_map(|s| s.parse().ok())
            .collect();
        if let [_, _, w, h] = parts[..]
            && w > 0.0
            && h > 0.0
        {
            return (w.round() as u32, h.round() as u32);
        }
    }

    (0, 0)
}

/// Parse a pixel length: bare numbers and `px` units only. Physical units
/// have no meaning without a rendering context, so they count as absent.
fn parse_length(value: &str) -> Option<u32> {
    let trimmed = value.trim().trim_end_matches("px").trim();
    let parsed: f64 = trimmed.parse().ok()?;
    (parsed > 0.0).then(|| parsed.round() as u32)
}
