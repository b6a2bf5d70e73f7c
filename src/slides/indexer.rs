use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info};

use crate::error::{PlanError, Result};
use crate::slides::types::{Slide, SlideSet};

/// Discovers `slide-<digits>.png` images and orders them numerically
pub struct SlideIndexer;

fn slide_name_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^slide-(\d+)\.png$").ok())
        .as_ref()
}

impl SlideIndexer {
    /// Parse the page number out of a rasterizer file name.
    ///
    /// Returns `None` for anything that does not follow the naming
    /// convention, including page 0 and numbers that overflow `u32`.
    pub fn parse_index(file_name: &str) -> Option<u32> {
        let captures = slide_name_pattern()?.captures(file_name)?;
        let index: u32 = captures.get(1)?.as_str().parse().ok()?;
        (index > 0).then_some(index)
    }

    /// Index a directory listing. `names` are bare file names inside `dir`.
    pub fn from_listing<P, I, S>(dir: P, names: I) -> Result<SlideSet>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let dir = dir.as_ref();

        let set: SlideSet = names
            .into_iter()
            .filter_map(|name| {
                let name = name.as_ref();
                match Self::parse_index(name) {
                    Some(index) => Some(Slide::new(index, dir.join(name))),
                    None => {
                        debug!("Ignoring non-slide file: {}", name);
                        None
                    }
                }
            })
            .collect();

        if set.is_empty() {
            return Err(PlanError::NoSlidesFound {
                path: dir.display().to_string(),
            }
            .into());
        }

        Ok(set)
    }

    /// Read `dir` and index the slide images in it
    pub fn scan<P: AsRef<Path>>(dir: P) -> Result<SlideSet> {
        let dir = dir.as_ref();
        let mut names = Vec::new();

        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }

        let set = Self::from_listing(dir, names)?;
        info!("Found {} slide images in {:?}", set.len(), dir);
        Ok(set)
    }
}
