use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use crate::error::LayoutError;

#[derive(Clone, Copy, Debug, Default)]
pub struct PathPolicy {
    pub follow_symlinks: bool,
}

/// Ensure `rel` can be re-rooted safely: not absolute and no `..` components.
pub fn validate_relative(rel: &Path) -> Result<(), LayoutError> {
    if rel.is_absolute() || rel.has_root() {
        return Err(LayoutError::Absolute(rel.to_path_buf()));
    }
    if rel.components().any(|c| matches!(c, Component::ParentDir | Component::Prefix(_))) {
        return Err(LayoutError::ParentTraversal(rel.to_path_buf()));
    }
    Ok(())
}

/// Map `source` (somewhere under `input_root`) to its output directory and
/// file name: `input_root/rel/name.ext` becomes (`output_root/rel`, `name`).
pub fn destination_for(
    input_root: &Path,
    output_root: &Path,
    source: &Path,
) -> Result<(PathBuf, OsString), LayoutError> {
    let outside = || LayoutError::OutsideRoot {
        path: source.to_path_buf(),
        root: input_root.to_path_buf(),
    };
    let parent = source.parent().ok_or_else(outside)?;
    let rel = parent.strip_prefix(input_root).map_err(|_| outside())?;
    validate_relative(rel).map_err(|_| outside())?;

    let name = source
        .file_stem()
        .ok_or_else(|| LayoutError::NoFileName(source.to_path_buf()))?
        .to_os_string();
    Ok((output_root.join(rel), name))
}

/// `rel` rendered with `/` separators, for glob matching and display.
pub fn slash_path(rel: &Path) -> String {
    rel.to_string_lossy().replace('\\', "/")
}
