//! Pure geometry for resize and crop operations.
//!
//! All functions here are pure and testable without any I/O or images.
//!
//! Three families of resize modes are supported:
//!
//! * `proportional` — proportional resize driven by the longer source edge
//! * `box` — proportional resize that fits inside the given dimensions
//! * nine directional anchors (`left_top` … `right_bottom`) — the image is
//!   scaled to cover the target canvas and the anchor decides which part of
//!   the overflow survives the crop
//!
//! The crop itself is not a separate step: [`resolve`] produces a draw
//! rectangle that is at least as large as the canvas together with a
//! non-positive offset, and the renderer clips whatever falls outside.

use std::fmt;
use std::str::FromStr;

/// Resize mode. `0`-valued requested dimensions mean "unset".
///
/// Parsing accepts the legacy alias `crop`, which maps to
/// [`Mode::CenterCenter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Proportional,
    /// Fit-in-box: proportional resize that never exceeds either dimension.
    Box,
    LeftTop,
    CenterTop,
    RightTop,
    LeftCenter,
    CenterCenter,
    RightCenter,
    LeftBottom,
    CenterBottom,
    RightBottom,
}

impl Mode {
    /// Canonical token, used verbatim in cache-key derivation.
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Proportional => "proportional",
            Mode::Box => "box",
            Mode::LeftTop => "left_top",
            Mode::CenterTop => "center_top",
            Mode::RightTop => "right_top",
            Mode::LeftCenter => "left_center",
            Mode::CenterCenter => "center_center",
            Mode::RightCenter => "right_center",
            Mode::LeftBottom => "left_bottom",
            Mode::CenterBottom => "center_bottom",
            Mode::RightBottom => "right_bottom",
        }
    }

    /// True for the nine directional crop anchors.
    pub fn is_anchor(self) -> bool {
        !matches!(self, Mode::Proportional | Mode::Box)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown mode token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown resize mode \"{0}\"")]
pub struct ParseModeError(pub String);

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "proportional" => Mode::Proportional,
            "box" => Mode::Box,
            "left_top" => Mode::LeftTop,
            "center_top" => Mode::CenterTop,
            "right_top" => Mode::RightTop,
            "left_center" => Mode::LeftCenter,
            "center_center" => Mode::CenterCenter,
            "right_center" => Mode::RightCenter,
            "left_bottom" => Mode::LeftBottom,
            "center_bottom" => Mode::CenterBottom,
            "right_bottom" => Mode::RightBottom,
            // Legacy alias kept for old URLs and stored settings.
            "crop" => Mode::CenterCenter,
            other => return Err(ParseModeError(other.to_string())),
        })
    }
}

/// Draw geometry for a single resize operation.
///
/// `canvas_w × canvas_h` is the output image size. The source is resampled
/// once to `draw_w × draw_h` and placed at `(offset_x, offset_y)`; anchor
/// modes produce a draw rectangle covering the canvas with offsets ≤ 0, so
/// the canvas clips the overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub canvas_w: u32,
    pub canvas_h: u32,
    pub draw_w: u32,
    pub draw_h: u32,
    pub offset_x: i64,
    pub offset_y: i64,
}

/// Compute draw geometry for resizing `src_w × src_h` to the requested
/// dimensions under `mode`. A requested dimension of `0` means "unset" and
/// is derived from the source aspect ratio.
///
/// Pure and total. Callers guarantee `src_w` and `src_h` are non-zero; both
/// requested dimensions unset yields the identity geometry.
pub fn resolve(src_w: u32, src_h: u32, req_w: u32, req_h: u32, mode: Mode) -> Geometry {
    match (req_w, req_h) {
        (0, 0) => exact(src_w, src_h),
        (w, 0) => scale_to_width(src_w, src_h, w),
        (0, h) => scale_to_height(src_w, src_h, h),
        (w, h) => match mode {
            Mode::Proportional => {
                // Landscape-or-square is width-driven, portrait height-driven.
                if src_w >= src_h {
                    scale_to_width(src_w, src_h, w)
                } else {
                    scale_to_height(src_w, src_h, h)
                }
            }
            Mode::Box => {
                // Pick the axis that does not overflow the box.
                if scaled_height(src_w, src_h, w) <= h {
                    scale_to_width(src_w, src_h, w)
                } else {
                    scale_to_height(src_w, src_h, h)
                }
            }
            _ => anchor_crop(src_w, src_h, w, h, mode),
        },
    }
}

fn exact(w: u32, h: u32) -> Geometry {
    Geometry {
        canvas_w: w,
        canvas_h: h,
        draw_w: w,
        draw_h: h,
        offset_x: 0,
        offset_y: 0,
    }
}

/// Height obtained by scaling the source to width `w`, rounded half away
/// from zero (matching the original integer-pixel behavior), floored at 1.
fn scaled_height(src_w: u32, src_h: u32, w: u32) -> u32 {
    ((src_h as f64 * w as f64 / src_w as f64).round() as u32).max(1)
}

fn scaled_width(src_w: u32, src_h: u32, h: u32) -> u32 {
    ((src_w as f64 * h as f64 / src_h as f64).round() as u32).max(1)
}

fn scale_to_width(src_w: u32, src_h: u32, w: u32) -> Geometry {
    exact(w, scaled_height(src_w, src_h, w))
}

fn scale_to_height(src_w: u32, src_h: u32, h: u32) -> Geometry {
    exact(scaled_width(src_w, src_h, h), h)
}

/// Scale the source so it covers the `w × h` canvas, then position it so
/// the anchored edge (or center) of the scaled image lands in the viewport.
fn anchor_crop(src_w: u32, src_h: u32, w: u32, h: u32, mode: Mode) -> Geometry {
    let mut draw_w = w;
    let mut draw_h = h;

    // Exact aspect match needs no correction; otherwise try height-driven
    // scaling first and fall back to width-driven when the scaled image
    // would not cover the canvas horizontally.
    if w as u64 * src_h as u64 != h as u64 * src_w as u64 {
        let iw = scaled_width(src_w, src_h, h);
        if iw < w {
            draw_h = scaled_height(src_w, src_h, w);
        } else {
            draw_w = iw;
        }
    }

    let spill_x = (draw_w - w) as i64;
    let spill_y = (draw_h - h) as i64;

    let offset_x = match mode {
        Mode::LeftTop | Mode::LeftCenter | Mode::LeftBottom => 0,
        Mode::CenterTop | Mode::CenterCenter | Mode::CenterBottom => -(spill_x / 2),
        _ => -spill_x,
    };
    let offset_y = match mode {
        Mode::LeftTop | Mode::CenterTop | Mode::RightTop => 0,
        Mode::LeftCenter | Mode::CenterCenter | Mode::RightCenter => -(spill_y / 2),
        _ => -spill_y,
    };

    Geometry {
        canvas_w: w,
        canvas_h: h,
        draw_w,
        draw_h,
        offset_x,
        offset_y,
    }
}
