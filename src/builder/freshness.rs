//! The freshness oracle: a pure function of filesystem mtimes answering
//! "is this object stale?" and "is this artifact stale?". No content
//! hashing and no header dependency scanning beyond the direct source.

use std::path::Path;

use crate::error::Result;
use crate::util::fs::{mtime, newer_than};

/// Recompile `source` into `object`? Yes if `object` is missing, or if
/// `source`'s mtime is strictly newer than `object`'s.
pub fn source_is_stale(source: &Path, object: &Path) -> Result<bool> {
    let source_mtime = mtime(source)?;
    let object_mtime = mtime(object)?;
    Ok(newer_than(source_mtime, object_mtime))
}

/// Relink `output`? Yes if it's missing, or any of `objects` or
/// `dep_outputs` is newer than it.
pub fn link_is_stale(output: &Path, objects: &[impl AsRef<Path>], dep_outputs: &[impl AsRef<Path>]) -> Result<bool> {
    let output_mtime = mtime(output)?;
    if output_mtime.is_none() {
        return Ok(true);
    }
    for obj in objects {
        if newer_than(mtime(obj.as_ref())?, output_mtime) {
            return Ok(true);
        }
    }
    for dep in dep_outputs {
        if newer_than(mtime(dep.as_ref())?, output_mtime) {
            return Ok(true);
        }
    }
    Ok(false)
}
