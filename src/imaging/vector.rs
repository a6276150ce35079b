//! SVG resize path.
//!
//! Vector sources are never rasterized. The document is rewritten so the
//! root `<svg>` element carries the target dimensions, and for anchor crop
//! modes a `preserveAspectRatio` directive with `slice` scaling, which makes
//! the renderer reproduce the crop that the raster path performs with pixel
//! offsets. All child content passes through untouched.

use super::geometry::Mode;
use super::probe::ImageSource;
use crate::store::{BlobStore, StoreError};
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VectorError {
    #[error("invalid svg document: {0}")]
    Malformed(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Alignment half of the `preserveAspectRatio` value for each crop anchor.
/// Proportional and box fits keep whatever the document already declares.
fn align_token(mode: Mode) -> Option<&'static str> {
    match mode {
        Mode::Proportional | Mode::Box => None,
        Mode::LeftTop => Some("xMinYMin"),
        Mode::CenterTop => Some("xMidYMin"),
        Mode::RightTop => Some("xMaxYMin"),
        Mode::LeftCenter => Some("xMinYMid"),
        Mode::CenterCenter => Some("xMidYMid"),
        Mode::RightCenter => Some("xMaxYMid"),
        Mode::LeftBottom => Some("xMinYMax"),
        Mode::CenterBottom => Some("xMidYMax"),
        Mode::RightBottom => Some("xMaxYMax"),
    }
}

/// Rewrite the root element of an SVG source for the resolved canvas size
/// and write the result to `cache_path`.
pub fn resize(
    store: &impl BlobStore,
    source: &ImageSource,
    width: u32,
    height: u32,
    mode: Mode,
    cache_path: &str,
) -> Result<(), VectorError> {
    let bytes = store.read(&source.path)?;
    let doc = String::from_utf8_lossy(&bytes);
    let rewritten = rewrite_root(&doc, width, height, align_token(mode))
        .map_err(|e| VectorError::Malformed(e.to_string()))?;
    store.write(cache_path, rewritten.as_bytes())?;
    Ok(())
}

fn rewrite_root(
    doc: &str,
    width: u32,
    height: u32,
    align: Option<&str>,
) -> Result<String, quick_xml::Error> {
    let mut reader = Reader::from_str(doc);
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut root_seen = false;

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(e) if !root_seen && e.local_name().as_ref() == b"svg" => {
                root_seen = true;
                writer.write_event(Event::Start(resized_root(&e, width, height, align)?))?;
            }
            Event::Empty(e) if !root_seen && e.local_name().as_ref() == b"svg" => {
                root_seen = true;
                writer.write_event(Event::Empty(resized_root(&e, width, height, align)?))?;
            }
            event => writer.write_event(event)?,
        }
    }

    let out = writer.into_inner().into_inner();
    Ok(String::from_utf8_lossy(&out).into_owned())
}

fn resized_root(
    original: &BytesStart<'_>,
    width: u32,
    height: u32,
    align: Option<&str>,
) -> Result<BytesStart<'static>, quick_xml::Error> {
    let name = String::from_utf8_lossy(original.name().as_ref()).into_owned();
    let mut root = BytesStart::new(name);
    let mut has_view_box = false;

    for attr in original.attributes() {
        let attr: Attribute<'_> = attr.map_err(quick_xml::Error::from)?;
        match attr.key.as_ref() {
            b"width" | b"height" => {}
            b"preserveAspectRatio" if align.is_some() => {}
            key => {
                if key == b"viewBox" {
                    has_view_box = true;
                }
                root.push_attribute(attr);
            }
        }
    }

    if let Some(align) = align {
        root.push_attribute(("preserveAspectRatio", format!("{align} slice").as_str()));
    }
    if !has_view_box {
        // Without a viewBox the crop directive has nothing to scale against.
        root.push_attribute(("viewBox", format!("0 0 {width} {height}").as_str()));
    }
    root.push_attribute(("width", format!("{width}px").as_str()));
    root.push_attribute(("height", format!("{height}px").as_str()));
    Ok(root)
}
