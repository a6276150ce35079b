//! Resize interception hooks.
//!
//! Hooks run after cache lookup and before any pixel work. A hook that
//! returns `Some(path)` takes over the request entirely: the returned path
//! is the final result and neither the built-in resize nor later hooks run.

use crate::imaging::geometry::Mode;
use crate::imaging::probe::ImageSource;

/// Everything a hook gets to see about the request it may take over.
pub struct HookContext<'a> {
    /// Source path as passed to the resizer.
    pub image: &'a str,
    pub width: u32,
    pub height: u32,
    pub mode: Mode,
    /// Cache path the built-in pipeline would write to.
    pub cache_path: &'a str,
    pub source: &'a ImageSource,
    /// Explicit output path, when the caller requested one.
    pub target: Option<&'a str>,
}

pub trait ResizeHook: Sync {
    /// Return `Some(path)` to replace the built-in resize with `path` as
    /// the result, or `None` to pass the request along.
    fn on_resize(&self, ctx: &HookContext<'_>) -> Option<String>;
}

/// Run hooks in registration order; the first `Some` wins.
pub fn run_hooks(hooks: &[Box<dyn ResizeHook>], ctx: &HookContext<'_>) -> Option<String> {
    hooks.iter().find_map(|hook| hook.on_resize(ctx))
}
