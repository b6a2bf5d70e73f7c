use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One rasterized page of the deck
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    /// 1-based page number taken from the file name
    pub index: u32,

    /// Location of the page image
    pub path: PathBuf,
}

impl Slide {
    pub fn new<P: Into<PathBuf>>(index: u32, path: P) -> Self {
        Self { index, path: path.into() }
    }

    /// File name of the image, for logs and tables
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("")
    }
}

/// Slides of one job, sorted by index, with random access by index
///
/// Gaps in the index sequence are tolerated; duplicates are not kept.
#[derive(Debug, Clone, Default)]
pub struct SlideSet {
    slides: Vec<Slide>,
    lookup: HashMap<u32, usize>,
}

impl SlideSet {
    /// Build a set from slides in any order. When two files share an index
    /// the one with the smallest path wins.
    pub fn from_slides<I: IntoIterator<Item = Slide>>(slides: I) -> Self {
        let mut slides: Vec<Slide> = slides.into_iter().collect();
        slides.sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.path.cmp(&b.path)));
        slides.dedup_by_key(|slide| slide.index);

        let lookup = slides
            .iter()
            .enumerate()
            .map(|(position, slide)| (slide.index, position))
            .collect();

        Self { slides, lookup }
    }

    /// All slides in ascending index order
    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn iter(&self) -> impl Iterator<Item = &Slide> {
        self.slides.iter()
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Image for a page number
    pub fn path_for(&self, index: u32) -> Option<&Path> {
        self.lookup
            .get(&index)
            .map(|&position| self.slides[position].path.as_path())
    }

    /// Lowest page number, if any
    pub fn first_index(&self) -> Option<u32> {
        self.slides.first().map(|slide| slide.index)
    }

    /// Highest page number, if any
    pub fn last_index(&self) -> Option<u32> {
        self.slides.last().map(|slide| slide.index)
    }

    /// Image paths in display order
    pub fn paths(&self) -> Vec<PathBuf> {
        self.slides.iter().map(|slide| slide.path.clone()).collect()
    }
}

impl FromIterator<Slide> for SlideSet {
    fn from_iter<I: IntoIterator<Item = Slide>>(iter: I) -> Self {
        Self::from_slides(iter)
    }
}
