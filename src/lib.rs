//! # imgcache
//!
//! A deterministic, content-addressed image resize cache. Give it a source
//! image, target dimensions, and a resize mode; it returns the path of a
//! cached rendition, generating it only when no fresh artifact exists.
//!
//! # Architecture: Resolve, Then Maybe Work
//!
//! Every request runs the same short pipeline:
//!
//! ```text
//! 1. Validate   extension allow-list, source existence
//! 2. Probe      dimensions + mtime, once per request
//! 3. Derive     8-hex cache key from all request parameters
//! 4. Serve      cache hit → return the path, no pixel work at all
//! 5. Generate   raster resample or SVG rewrite, atomic write, return
//! ```
//!
//! The cache key covers the source path, its mtime, both requested
//! dimensions and the mode, so any change to any input lands on a new
//! artifact and stale entries are simply never referenced again — there is
//! no invalidation step.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`resize`] | Orchestrator — validation, cache lookup, hook dispatch, pipeline selection |
//! | [`cache`] | Key derivation and the bucketed `assets/images/` path scheme |
//! | [`imaging`] | Geometry math, source probing, raster and vector pipelines |
//! | [`store`] | [`BlobStore`] abstraction over file access; [`FsStore`] for disk |
//! | [`hooks`] | Interception points that let callers take over a request |
//! | [`config`] | `imgcache.toml` loading and validation |
//!
//! # Design Decisions
//!
//! ## Crop Without a Crop Step
//!
//! Anchor crops are expressed as geometry, not a separate image operation:
//! the source is resampled once to a draw rectangle at least as large as the
//! canvas, drawn at a non-positive offset, and the canvas clips the rest.
//! One resample means one round of filter loss.
//!
//! ## Vectors Stay Vectors
//!
//! SVG sources are never rasterized. The root element is rewritten with the
//! target size and, for crop modes, a `preserveAspectRatio="… slice"`
//! directive that makes the renderer reproduce the crop. Output stays
//! resolution independent and tiny.
//!
//! ## Pure-Rust Imaging
//!
//! Raster work uses the `image`, `png` and `color_quant` crates — no
//! ImageMagick, no libgd, no system packages. A build of this crate is
//! self-contained.

pub mod cache;
pub mod config;
pub mod hooks;
pub mod imaging;
pub mod resize;
pub mod store;

pub use cache::{CACHE_DIR, CacheEntry};
pub use config::{ConfigError, ResizeConfig};
pub use hooks::{HookContext, ResizeHook};
pub use imaging::geometry::{Geometry, Mode, resolve};
pub use imaging::probe::{ImageFormat, ImageSource};
pub use resize::{ResizeError, Resizer};
pub use store::{BlobStore, FsStore, StoreError};
