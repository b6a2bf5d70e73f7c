//! ffmpeg concat-demuxer playlists.
//!
//! Each entry is written as a `file` line followed by a `duration` line. The
//! demuxer ignores the duration of the final entry, so the last image is
//! listed a second time without one to make it hold for its full interval.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::timing::TimingPlan;

/// File name of the playlist inside the working directory
pub const CONCAT_FILE_NAME: &str = "concat.txt";

/// Quote a path for a `file '...'` directive
pub fn escape_path(path: &Path) -> String {
    path.display()
        .to_string()
        .replace('\\', "/")
        .replace('\'', "'\\''")
}

fn absolute_from(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Render `plan` as playlist text, resolving relative image paths against `base`
pub fn render_concat(plan: &TimingPlan, base: &Path) -> String {
    let mut text = String::new();

    for (image, duration) in plan.entries() {
        let path = escape_path(&absolute_from(image, base));
        text.push_str(&format!("file '{}'\n", path));
        text.push_str(&format!("duration {:.3}\n", duration));
    }

    if let Some(last) = plan.sequence().last() {
        text.push_str(&format!("file '{}'\n", escape_path(&absolute_from(last, base))));
    }

    text
}

/// Write the playlist for `plan` into `dir`, returning its path
pub fn write_concat_file<P: AsRef<Path>>(dir: P, plan: &TimingPlan) -> Result<PathBuf> {
    let dir = dir.as_ref();
    let base = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        std::env::current_dir()?.join(dir)
    };

    let path = dir.join(CONCAT_FILE_NAME);
    std::fs::write(&path, render_concat(plan, &base))?;

    debug!("Wrote {} playlist entries to {}", plan.len(), path.display());
    Ok(path)
}
