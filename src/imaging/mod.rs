//! Image inspection and resizing — pure Rust, zero system dependencies.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader` (raster), `roxmltree` (SVG) |
//! | **Geometry** | pure dimension math in [`geometry`] |
//! | **Raster resize** | Lanczos3 resample + canvas overlay, `image` + `png` encoders |
//! | **Vector resize** | root-element rewrite with `quick-xml` |
//!
//! The module is split into:
//! - **Geometry**: Pure functions resolving a request to canvas, draw
//!   rectangle and offsets (unit testable)
//! - **Probe**: Source snapshot — dimensions, mtime, format tag
//! - **Raster**: GIF/JPEG/PNG decode, resample, encode
//! - **Vector**: SVG markup rewrite, never rasterized

pub mod geometry;
pub mod probe;
pub mod raster;
pub mod vector;

pub use geometry::{Geometry, Mode, resolve};
pub use probe::{ImageFormat, ImageSource, probe};
