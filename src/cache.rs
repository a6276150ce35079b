//! Deterministic cache naming for resized images.
//!
//! Every resize operation maps to exactly one artifact under
//! [`CACHE_DIR`]. The name is **content-addressed**: the key hashes every
//! parameter that influences the output — requested dimensions, source path,
//! normalized mode, and the source's modification time. A new upload (new
//! mtime) or a changed parameter produces a new key, so artifacts are never
//! overwritten in place and a stale cache entry can never be served.
//!
//! Two concurrent requests with identical parameters derive the identical
//! path; both may produce the artifact, which is harmless because the bytes
//! are identical and the store writes atomically.
//!
//! The single-hex-character bucket directory (16 buckets) bounds directory
//! fan-out when a site accumulates many thousands of variants.

use crate::imaging::Mode;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Root of the cache tree, relative to the store root.
pub const CACHE_DIR: &str = "assets/images";

/// A derived cache location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// 8 lowercase hex characters.
    pub key: String,
    /// `assets/images/{last char of key}/{stem}-{key}.{ext}`.
    pub path: String,
}

/// Derive the cache key and cache-relative path for a resize operation.
///
/// `width`/`height` of `0` mean "unset" and serialize as `0` — never absent —
/// so concatenation stays unambiguous. `mode` must already be normalized
/// (legacy aliases resolved); its canonical token is hashed.
pub fn derive(width: u32, height: u32, source_path: &str, mode: Mode, mtime: u64) -> CacheEntry {
    let digest =
        Sha256::digest(format!("-w{width}-h{height}-{source_path}-{mode}-{mtime}").as_bytes());
    let key = format!("{digest:x}")[..8].to_string();

    let source = Path::new(source_path);
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let ext = source
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase();

    // The last key character buckets the file into one of 16 directories.
    let bucket = key.chars().next_back().unwrap();
    let path = format!("{CACHE_DIR}/{bucket}/{stem}-{key}.{ext}");

    CacheEntry { key, path }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_deterministic() {
        let a = derive(640, 480, "files/photo.jpg", Mode::CenterTop, 1700000000);
        let b = derive(640, 480, "files/photo.jpg", Mode::CenterTop, 1700000000);
        assert_eq!(a, b);
    }

    #[test]
    fn key_is_eight_lowercase_hex_chars() {
        let e = derive(640, 480, "files/photo.jpg", Mode::CenterTop, 1700000000);
        assert_eq!(e.key.len(), 8);
        assert!(
            e.key
                .chars()
                .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
        );
    }

    #[test]
    fn key_varies_with_each_parameter() {
        let base = derive(640, 480, "files/photo.jpg", Mode::CenterTop, 1700000000);
        let variants = [
            derive(641, 480, "files/photo.jpg", Mode::CenterTop, 1700000000),
            derive(640, 481, "files/photo.jpg", Mode::CenterTop, 1700000000),
            derive(640, 480, "files/other.jpg", Mode::CenterTop, 1700000000),
            derive(640, 480, "files/photo.jpg", Mode::LeftBottom, 1700000000),
            derive(640, 480, "files/photo.jpg", Mode::CenterTop, 1700000001),
        ];
        for v in variants {
            assert_ne!(v.key, base.key);
        }
    }

    #[test]
    fn unset_dimensions_serialize_as_zero() {
        // (100, "0.png") and (10, "00.png") would concatenate identically if
        // an unset height were omitted instead of serialized as 0.
        let a = derive(100, 0, "0.png", Mode::Proportional, 1);
        let b = derive(10, 0, "00.png", Mode::Proportional, 1);
        assert_ne!(a.key, b.key);
    }

    #[test]
    fn path_shape_is_bucket_stem_key_ext() {
        let e = derive(200, 100, "files/media/My Photo.JPG", Mode::Box, 42);
        let bucket = e.key.chars().last().unwrap();
        assert_eq!(e.path, format!("{CACHE_DIR}/{bucket}/My Photo-{}.jpg", e.key));
    }

    #[test]
    fn svg_keeps_its_extension() {
        let e = derive(200, 100, "icons/logo.svg", Mode::CenterCenter, 7);
        assert!(e.path.ends_with(&format!("logo-{}.svg", e.key)));
    }
}
