//! Raster resize pipeline.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (GIF, JPEG, PNG) | `image` crate (pure Rust decoders) |
//! | Resample | `image::imageops` with `Lanczos3` filter |
//! | Position/crop | `image::imageops::overlay` at a signed offset |
//! | Encode → GIF | `image::codecs::gif::GifEncoder` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (configurable quality) |
//! | Encode → PNG | `png` crate (RGBA, or re-indexed palette) |
//! | Palette quantization | `color_quant::NeuQuant` |
//!
//! The crop is not a separate step: the source is resampled once to the
//! draw rectangle from [`Geometry`] and drawn onto the canvas at a
//! non-positive offset, so the canvas clips the overflow. The canvas is
//! pre-filled fully transparent; GIF and PNG sources keep their alpha
//! through the RGBA pipeline, JPEG flattens transparency to black on encode.

use super::geometry::Geometry;
use super::probe::{ImageFormat, ImageSource};
use crate::store::{BlobStore, StoreError};
use image::buffer::ConvertBuffer;
use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ExtendedColorType, ImageEncoder, RgbImage, Rgba, RgbaImage, imageops};
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RasterError {
    #[error("no codec available for \"{0}\"")]
    Codec(&'static str),
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Whether a decoder for the format is compiled in. Vector formats never
/// take this path.
pub fn codec_available(format: ImageFormat) -> bool {
    match decode_format(format) {
        Ok(fmt) => fmt.reading_enabled(),
        Err(_) => false,
    }
}

fn decode_format(format: ImageFormat) -> Result<image::ImageFormat, RasterError> {
    match format {
        ImageFormat::Gif => Ok(image::ImageFormat::Gif),
        ImageFormat::Jpeg => Ok(image::ImageFormat::Jpeg),
        ImageFormat::Png => Ok(image::ImageFormat::Png),
        ImageFormat::Svg => Err(RasterError::Codec("svg")),
    }
}

/// Resize a raster source and write the encoded artifact to `cache_path`.
///
/// The output format follows the source format, except that GIF falls back
/// to PNG encoding when GIF write support is not compiled in — the cache
/// path keeps its pre-fallback `.gif` name in that case (accepted naming
/// inconsistency, documented on [`crate::resize::Resizer`]).
pub fn resize(
    store: &impl BlobStore,
    source: &ImageSource,
    geometry: &Geometry,
    jpeg_quality: u8,
    cache_path: &str,
) -> Result<(), RasterError> {
    let bytes = store.read(&source.path)?;
    let fmt = decode_format(source.format)?;
    if !fmt.reading_enabled() {
        return Err(RasterError::Codec(fmt.extensions_str()[0]));
    }

    // Palette probe must happen on the encoded bytes, before decoding
    // expands the palette away.
    let palette_colors = match source.format {
        ImageFormat::Png => opaque_palette_colors(&bytes),
        _ => None,
    };

    let decoded = image::load_from_memory_with_format(&bytes, fmt)
        .map_err(|e| RasterError::Decode(e.to_string()))?;

    // Single resample that both scales and positions; the canvas clips
    // whatever the draw rectangle spills past its edges.
    let scaled = decoded
        .resize_exact(geometry.draw_w, geometry.draw_h, FilterType::Lanczos3)
        .into_rgba8();
    let mut canvas = RgbaImage::from_pixel(geometry.canvas_w, geometry.canvas_h, Rgba([0, 0, 0, 0]));
    imageops::overlay(&mut canvas, &scaled, geometry.offset_x, geometry.offset_y);

    let encoded = match source.format {
        ImageFormat::Gif => {
            if image::ImageFormat::Gif.writing_enabled() {
                encode_gif(&canvas)?
            } else {
                encode_png(&canvas, None)?
            }
        }
        ImageFormat::Jpeg => encode_jpeg(&canvas, jpeg_quality)?,
        ImageFormat::Png => encode_png(&canvas, palette_colors)?,
        ImageFormat::Svg => return Err(RasterError::Codec("svg")),
    };

    store.write(cache_path, &encoded)?;
    Ok(())
}

/// Palette size of an indexed, fully opaque PNG — `None` for truecolor
/// sources, palettes of 256+ colors, or any declared transparency.
/// Transparent palette images are deliberately left on the RGBA path.
fn opaque_palette_colors(bytes: &[u8]) -> Option<usize> {
    let reader = png::Decoder::new(Cursor::new(bytes)).read_info().ok()?;
    let info = reader.info();
    if info.color_type != png::ColorType::Indexed || info.trns.is_some() {
        return None;
    }
    let colors = info.palette.as_ref()?.len() / 3;
    (colors > 0 && colors < 256).then_some(colors)
}

fn encode_gif(canvas: &RgbaImage) -> Result<Vec<u8>, RasterError> {
    let mut out = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut out);
        encoder
            .encode(
                canvas.as_raw(),
                canvas.width(),
                canvas.height(),
                ExtendedColorType::Rgba8,
            )
            .map_err(|e| RasterError::Encode(e.to_string()))?;
    }
    Ok(out)
}

fn encode_jpeg(canvas: &RgbaImage, quality: u8) -> Result<Vec<u8>, RasterError> {
    // Dropping alpha leaves transparent regions black, matching a
    // zero-filled truecolor canvas.
    let rgb: RgbImage = canvas.convert();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| RasterError::Encode(e.to_string()))?;
    Ok(out)
}

/// Encode PNG output. When the source was an opaque palette image,
/// `palette_colors` re-indexes the resampled result back to a palette of the
/// same size; otherwise the canvas is written as straight RGBA.
fn encode_png(canvas: &RgbaImage, palette_colors: Option<usize>) -> Result<Vec<u8>, RasterError> {
    let mut out = Vec::new();
    let mut encoder = png::Encoder::new(&mut out, canvas.width(), canvas.height());
    encoder.set_depth(png::BitDepth::Eight);

    match palette_colors {
        Some(colors) => {
            // The quantizer needs at least two network entries.
            let quant = color_quant::NeuQuant::new(10, colors.max(2), canvas.as_raw());
            let indices: Vec<u8> = canvas
                .pixels()
                .map(|p| quant.index_of(&p.0) as u8)
                .collect();
            let palette: Vec<u8> = quant
                .color_map_rgba()
                .chunks_exact(4)
                .flat_map(|c| [c[0], c[1], c[2]])
                .collect();

            encoder.set_color(png::ColorType::Indexed);
            encoder.set_palette(palette);
            write_png(encoder, &indices)
        }
        None => {
            encoder.set_color(png::ColorType::Rgba);
            write_png(encoder, canvas.as_raw())
        }
    }?;
    Ok(out)
}

fn write_png(encoder: png::Encoder<'_, &mut Vec<u8>>, data: &[u8]) -> Result<(), RasterError> {
    let mut writer = encoder
        .write_header()
        .map_err(|e| RasterError::Encode(e.to_string()))?;
    writer
        .write_image_data(data)
        .map_err(|e| RasterError::Encode(e.to_string()))?;
    writer
        .finish()
        .map_err(|e| RasterError::Encode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::geometry::{Mode, resolve};
    use crate::store::tests::MemStore;
    use image::codecs::png::PngEncoder;

    fn source(path: &str, ext: &str, format: ImageFormat, w: u32, h: u32) -> ImageSource {
        ImageSource {
            path: path.to_string(),
            width: w,
            height: h,
            mtime: 1,
            extension: ext.to_string(),
            format,
        }
    }

    fn rgba_png_bytes(img: &RgbaImage) -> Vec<u8> {
        let mut out = Vec::new();
        PngEncoder::new(&mut out)
            .write_image(
                img.as_raw(),
                img.width(),
                img.height(),
                ExtendedColorType::Rgba8,
            )
            .unwrap();
        out
    }

    fn indexed_png_bytes(w: u32, h: u32, palette: &[u8], trns: Option<&[u8]>) -> Vec<u8> {
        let mut out = Vec::new();
        let mut enc = png::Encoder::new(&mut out, w, h);
        enc.set_color(png::ColorType::Indexed);
        enc.set_depth(png::BitDepth::Eight);
        enc.set_palette(palette.to_vec());
        if let Some(t) = trns {
            enc.set_trns(t.to_vec());
        }
        let mut writer = enc.write_header().unwrap();
        let colors = (palette.len() / 3) as u32;
        let data: Vec<u8> = (0..w * h).map(|i| (i % colors) as u8).collect();
        writer.write_image_data(&data).unwrap();
        writer.finish().unwrap();
        out
    }

    #[test]
    fn codec_availability() {
        assert!(codec_available(ImageFormat::Gif));
        assert!(codec_available(ImageFormat::Jpeg));
        assert!(codec_available(ImageFormat::Png));
        assert!(!codec_available(ImageFormat::Svg));
    }

    #[test]
    fn png_downscale_produces_expected_dimensions() {
        let store = MemStore::new();
        let img = RgbaImage::from_pixel(8, 4, Rgba([200, 40, 40, 255]));
        store.insert("pic.png", 1, rgba_png_bytes(&img));

        let src = source("pic.png", "png", ImageFormat::Png, 8, 4);
        let geometry = resolve(8, 4, 4, 0, Mode::Proportional);
        resize(&store, &src, &geometry, 80, "out.png").unwrap();

        let out = image::load_from_memory(&store.read("out.png").unwrap()).unwrap();
        assert_eq!((out.width(), out.height()), (4, 2));
    }

    #[test]
    fn anchor_crop_clips_to_canvas() {
        let store = MemStore::new();
        // Left half red, right half blue.
        let img = RgbaImage::from_fn(8, 4, |x, _| {
            if x < 4 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        });
        store.insert("pic.png", 1, rgba_png_bytes(&img));

        let src = source("pic.png", "png", ImageFormat::Png, 8, 4);
        let geometry = resolve(8, 4, 4, 4, Mode::LeftTop);
        assert_eq!((geometry.draw_w, geometry.draw_h), (8, 4));
        resize(&store, &src, &geometry, 80, "out.png").unwrap();

        let out = image::load_from_memory(&store.read("out.png").unwrap())
            .unwrap()
            .into_rgba8();
        assert_eq!((out.width(), out.height()), (4, 4));
        // The left anchor keeps the red half.
        let p = out.get_pixel(1, 1);
        assert!(p[0] > p[2], "expected red-dominant pixel, got {p:?}");
    }

    #[test]
    fn jpeg_roundtrip_with_quality() {
        let store = MemStore::new();
        let img = RgbaImage::from_pixel(10, 10, Rgba([90, 120, 150, 255]));
        let rgb: RgbImage = img.convert();
        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, 90)
            .write_image(rgb.as_raw(), 10, 10, ExtendedColorType::Rgb8)
            .unwrap();
        store.insert("pic.jpg", 1, jpeg);

        let src = source("pic.jpg", "jpg", ImageFormat::Jpeg, 10, 10);
        let geometry = resolve(10, 10, 5, 5, Mode::CenterCenter);
        resize(&store, &src, &geometry, 80, "out.jpg").unwrap();

        let out = image::load_from_memory(&store.read("out.jpg").unwrap()).unwrap();
        assert_eq!((out.width(), out.height()), (5, 5));
    }

    #[test]
    fn gif_source_encodes_gif_output() {
        let store = MemStore::new();
        let img = RgbaImage::from_pixel(6, 6, Rgba([10, 200, 10, 255]));
        let gif = encode_gif(&img).unwrap();
        store.insert("anim.gif", 1, gif);

        let src = source("anim.gif", "gif", ImageFormat::Gif, 6, 6);
        let geometry = resolve(6, 6, 3, 3, Mode::CenterCenter);
        resize(&store, &src, &geometry, 80, "out.gif").unwrap();

        let bytes = store.read("out.gif").unwrap();
        assert_eq!(&bytes[..3], b"GIF");
        let out = image::load_from_memory(&bytes).unwrap();
        assert_eq!((out.width(), out.height()), (3, 3));
    }

    #[test]
    fn transparent_gif_stays_transparent() {
        let store = MemStore::new();
        // Alpha-zero pixels become the GIF transparent index on encode.
        let img = RgbaImage::from_pixel(6, 6, Rgba([0, 0, 0, 0]));
        store.insert("ghost.gif", 1, encode_gif(&img).unwrap());

        let src = source("ghost.gif", "gif", ImageFormat::Gif, 6, 6);
        let geometry = resolve(6, 6, 3, 3, Mode::CenterCenter);
        resize(&store, &src, &geometry, 80, "out.gif").unwrap();

        let bytes = store.read("out.gif").unwrap();
        assert_eq!(&bytes[..3], b"GIF");
        let out = image::load_from_memory(&bytes).unwrap().into_rgba8();
        assert!(out.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn fully_transparent_png_stays_transparent() {
        let store = MemStore::new();
        let img = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0]));
        store.insert("clear.png", 1, rgba_png_bytes(&img));

        let src = source("clear.png", "png", ImageFormat::Png, 4, 4);
        let geometry = resolve(4, 4, 2, 2, Mode::CenterCenter);
        resize(&store, &src, &geometry, 80, "out.png").unwrap();

        let out = image::load_from_memory(&store.read("out.png").unwrap())
            .unwrap()
            .into_rgba8();
        assert!(out.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn opaque_palette_source_reindexes_output() {
        let store = MemStore::new();
        let palette = [0u8, 0, 0, 255, 255, 255, 200, 30, 30, 30, 30, 200];
        store.insert("chart.png", 1, indexed_png_bytes(8, 8, &palette, None));

        let src = source("chart.png", "png", ImageFormat::Png, 8, 8);
        let geometry = resolve(8, 8, 4, 4, Mode::CenterCenter);
        resize(&store, &src, &geometry, 80, "out.png").unwrap();

        let bytes = store.read("out.png").unwrap();
        let reader = png::Decoder::new(Cursor::new(&bytes[..]))
            .read_info()
            .unwrap();
        assert_eq!(reader.info().color_type, png::ColorType::Indexed);
    }

    #[test]
    fn transparent_palette_source_skips_reindexing() {
        let store = MemStore::new();
        let palette = [0u8, 0, 0, 255, 255, 255];
        let trns = [0u8]; // first palette entry fully transparent
        store.insert("logo.png", 1, indexed_png_bytes(8, 8, &palette, Some(&trns)));

        let src = source("logo.png", "png", ImageFormat::Png, 8, 8);
        let geometry = resolve(8, 8, 4, 4, Mode::CenterCenter);
        resize(&store, &src, &geometry, 80, "out.png").unwrap();

        let bytes = store.read("out.png").unwrap();
        let reader = png::Decoder::new(Cursor::new(&bytes[..]))
            .read_info()
            .unwrap();
        assert_eq!(reader.info().color_type, png::ColorType::Rgba);
    }

    #[test]
    fn undecodable_source_is_a_decode_error() {
        let store = MemStore::new();
        store.insert("bad.png", 1, b"definitely not a png".to_vec());

        let src = source("bad.png", "png", ImageFormat::Png, 8, 8);
        let geometry = resolve(8, 8, 4, 4, Mode::CenterCenter);
        let err = resize(&store, &src, &geometry, 80, "out.png").unwrap_err();
        assert!(matches!(err, RasterError::Decode(_)));
        assert!(!store.exists("out.png"));
    }
}
