//! Parse source font file names.
//!
//! Names look like `NotoSansCJKsc-BoldItalic.otf`: a brand prefix, a family
//! followed by an optional language and vertical density, a `-`, then the
//! slant, horizontal density and weight. Anything that does not fit that
//! pattern exactly is rejected rather than guessed at.

use crate::axis::{match_prefix, match_suffix, Axis, Family, Height, Slant, Variant, Weight, Width};

/// File extensions of fonts that are considered.
pub const EXTENSIONS: &[&str] = &["ttf", "otf"];

/// The brand prefix of the default catalog.
pub const DEFAULT_BRAND: &str = "Noto";

// at least one character of family and a four byte extension
const MIN_EXTRA_LEN: usize = 5;

/// What a file name says about the font it contains.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Classification {
    pub family: Family,
    /// The language or script qualifier; empty for the default coverage.
    pub language: String,
    pub variant: Variant,
}

/// Classifies file names against the axis vocabularies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Classifier {
    brand: String,
}

impl Default for Classifier {
    fn default() -> Self {
        Classifier::new(DEFAULT_BRAND)
    }
}

impl Classifier {
    pub fn new(brand: impl Into<String>) -> Self {
        Classifier {
            brand: brand.into(),
        }
    }

    /// Classify the final component of `path`.
    ///
    /// Returns `None` for any name that does not follow the naming scheme.
    pub fn classify(&self, path: &str) -> Option<Classification> {
        let name = path.rsplit('/').next().unwrap_or(path);
        if name.len() < self.brand.len() + MIN_EXTRA_LEN {
            return None;
        }
        let (stem, extension) = name.rsplit_once('.')?;
        if !EXTENSIONS.contains(&extension) {
            return None;
        }
        let stem = stem.strip_prefix(self.brand.as_str())?;
        let (domain, styling) = stem.split_once('-')?;

        let (family, domain) = match_prefix::<Family>(domain)?;
        let (height, language) =
            match_suffix::<Height>(domain).unwrap_or((Height::DEFAULT, domain));

        let (slant, styling) = match_suffix::<Slant>(styling).unwrap_or((Slant::DEFAULT, styling));
        let (width, styling) = match_prefix::<Width>(styling).unwrap_or((Width::DEFAULT, styling));
        let (weight, styling) =
            match_prefix::<Weight>(styling).unwrap_or((Weight::DEFAULT, styling));
        if !styling.is_empty() {
            return None;
        }

        Some(Classification {
            family,
            language: language.to_owned(),
            variant: Variant {
                weight,
                width,
                height,
                slant,
            },
        })
    }
}
