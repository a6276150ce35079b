//! Resize orchestration.
//!
//! [`Resizer`] ties the pieces together: validate the request, probe the
//! source, derive the cache entry, serve a hit when one exists, let hooks
//! intercept, then dispatch to the raster or vector pipeline and place the
//! result. Every request resolves to a store path; recoverable problems
//! (missing codec, oversized source) degrade to the original path rather
//! than failing the caller.

use crate::cache;
use crate::config::ResizeConfig;
use crate::hooks::{HookContext, ResizeHook, run_hooks};
use crate::imaging::geometry::{self, Mode};
use crate::imaging::probe::{ImageFormat, ProbeError, probe};
use crate::imaging::raster::{self, RasterError};
use crate::imaging::vector::{self, VectorError};
use crate::store::{BlobStore, StoreError};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Error, Debug)]
pub enum ResizeError {
    #[error("image \"{0}\" could not be found")]
    SourceNotFound(String),
    #[error("image type \"{0}\" was not allowed to be processed")]
    UnsupportedType(String),
    #[error("image \"{0}\" could not be processed (no codec available)")]
    CodecUnavailable(String),
    #[error("image \"{image}\" ({width}x{height}) exceeds the configured dimension limits")]
    DimensionLimitExceeded {
        image: String,
        width: u32,
        height: u32,
    },
    #[error("image could not be decoded: {0}")]
    DecodeFailed(String),
    #[error("image could not be encoded: {0}")]
    EncodeFailed(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Deterministic, cache-backed image resizer over a [`BlobStore`].
///
/// Two encoding caveats worth knowing: when GIF write support is not
/// compiled into the `image` crate, GIF sources are PNG-encoded but keep
/// their derived `.gif` cache name; and output is never progressive or
/// interlaced, as the pure-Rust encoders expose no such mode.
pub struct Resizer<S: BlobStore> {
    config: ResizeConfig,
    store: S,
    hooks: Vec<Box<dyn ResizeHook>>,
}

impl<S: BlobStore> Resizer<S> {
    pub fn new(config: ResizeConfig, store: S) -> Self {
        Self {
            config,
            store,
            hooks: Vec::new(),
        }
    }

    /// Register a hook; hooks run in registration order.
    pub fn with_hook(mut self, hook: Box<dyn ResizeHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ResizeConfig {
        &self.config
    }

    /// Resolve a resized rendition of `image` and return its store path.
    ///
    /// `None` for `mode` picks `center_top` when both dimensions are given
    /// and a plain proportional fit otherwise. Requests the pipeline cannot
    /// serve (missing codec, source past the configured dimension limits)
    /// fall back to the original path; hard failures return `None`.
    pub fn get(&self, image: &str, width: u32, height: u32, mode: Option<Mode>) -> Option<String> {
        self.degrade(image, self.run(image, width, height, mode, None, false))
    }

    /// Like [`get`](Self::get), but place the result at `target` as well.
    /// `force` regenerates even when the target or cache entry is fresh.
    pub fn get_to(
        &self,
        image: &str,
        width: u32,
        height: u32,
        mode: Option<Mode>,
        target: &str,
        force: bool,
    ) -> Option<String> {
        self.degrade(image, self.run(image, width, height, mode, Some(target), force))
    }

    /// Resize `image` in place, overwriting the original file.
    pub fn resize(&self, image: &str, width: u32, height: u32, mode: Option<Mode>) -> bool {
        self.degrade(image, self.run(image, width, height, mode, Some(image), true))
            .is_some()
    }

    fn degrade(&self, image: &str, result: Result<String, ResizeError>) -> Option<String> {
        match result {
            Ok(path) => Some(path),
            Err(
                err @ (ResizeError::CodecUnavailable(_) | ResizeError::DimensionLimitExceeded { .. }),
            ) => {
                debug!(image, "{err}; serving the original");
                Some(image.to_string())
            }
            Err(err) => {
                error!(image, "{err}");
                None
            }
        }
    }

    fn run(
        &self,
        image: &str,
        width: u32,
        height: u32,
        mode: Option<Mode>,
        target: Option<&str>,
        force: bool,
    ) -> Result<String, ResizeError> {
        if image.is_empty() || !self.store.exists(image) {
            return Err(ResizeError::SourceNotFound(image.to_string()));
        }

        let extension = Path::new(image)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if !self.config.allows_extension(&extension) {
            return Err(ResizeError::UnsupportedType(extension));
        }
        // An extension can be allowed by configuration without a pipeline
        // for it (e.g. "webp"); such requests serve the original.
        let format = ImageFormat::from_extension(&extension)
            .ok_or_else(|| ResizeError::CodecUnavailable(image.to_string()))?;

        let source = probe(&self.store, image, &extension, format).map_err(|e| match e {
            ProbeError::Store(StoreError::NotFound(path)) => ResizeError::SourceNotFound(path),
            ProbeError::Store(e) => ResizeError::Store(e),
            ProbeError::Dimensions(msg) => ResizeError::DecodeFailed(msg),
        })?;

        // No-op when the request matches the source on every constrained
        // axis; a zero dimension constrains nothing.
        if (width == 0 || width == source.width) && (height == 0 || height == source.height) {
            return match target {
                Some(target) if self.target_is_stale(target, source.mtime)? => {
                    self.store.copy(image, target)?;
                    Ok(target.to_string())
                }
                Some(target) => Ok(target.to_string()),
                None => Ok(image.to_string()),
            };
        }

        let mode = mode.unwrap_or(if width > 0 && height > 0 {
            Mode::CenterTop
        } else {
            Mode::Proportional
        });

        let entry = cache::derive(width, height, image, mode, source.mtime);

        if !self.config.debug {
            // `force` only bypasses the target freshness check; the canonical
            // artifact is keyed by mtime and stays valid.
            if let Some(target) = target
                && !force
                && !self.target_is_stale(target, source.mtime)?
            {
                return Ok(target.to_string());
            }
            if self.store.exists(&entry.path) {
                return match target {
                    Some(target) => {
                        self.store.copy(&entry.path, target)?;
                        Ok(target.to_string())
                    }
                    None => Ok(entry.path),
                };
            }
        }

        let ctx = HookContext {
            image,
            width,
            height,
            mode,
            cache_path: &entry.path,
            source: &source,
            target,
        };
        if let Some(path) = run_hooks(&self.hooks, &ctx) {
            return Ok(path);
        }

        if source.format.is_vector() {
            // An SVG without a usable intrinsic size cannot drive aspect
            // math; use the requested dimensions verbatim when both are
            // given, otherwise there is nothing to derive the other from.
            let (canvas_w, canvas_h) = if source.width > 0 && source.height > 0 {
                let geometry = geometry::resolve(source.width, source.height, width, height, mode);
                (geometry.canvas_w, geometry.canvas_h)
            } else if width > 0 && height > 0 {
                (width, height)
            } else {
                return Err(ResizeError::DecodeFailed(format!(
                    "could not determine the dimensions of \"{image}\""
                )));
            };
            vector::resize(&self.store, &source, canvas_w, canvas_h, mode, &entry.path)
            .map_err(|e| match e {
                VectorError::Malformed(msg) => ResizeError::DecodeFailed(msg),
                VectorError::Store(e) => ResizeError::Store(e),
            })?;
        } else {
            if !raster::codec_available(source.format) {
                return Err(ResizeError::CodecUnavailable(image.to_string()));
            }
            if source.width > self.config.max_width
                || source.height > self.config.max_height
                || width > self.config.max_width
                || height > self.config.max_height
            {
                return Err(ResizeError::DimensionLimitExceeded {
                    image: image.to_string(),
                    width: source.width,
                    height: source.height,
                });
            }
            let geometry = geometry::resolve(source.width, source.height, width, height, mode);
            raster::resize(
                &self.store,
                &source,
                &geometry,
                self.config.jpeg_quality,
                &entry.path,
            )
            .map_err(|e| match e {
                RasterError::Codec(_) => ResizeError::CodecUnavailable(image.to_string()),
                RasterError::Decode(msg) => ResizeError::DecodeFailed(msg),
                RasterError::Encode(msg) => ResizeError::EncodeFailed(msg),
                RasterError::Store(e) => ResizeError::Store(e),
            })?;
        }

        match target {
            Some(target) => {
                self.store.copy(&entry.path, target)?;
                Ok(target.to_string())
            }
            None => {
                if self.config.use_ftp {
                    self.store.chmod(&entry.path, self.config.default_chmod)?;
                }
                Ok(entry.path)
            }
        }
    }

    fn target_is_stale(&self, target: &str, source_mtime: u64) -> Result<bool, ResizeError> {
        if !self.store.exists(target) {
            return Ok(true);
        }
        Ok(source_mtime > self.store.mtime(target)?)
    }
}
