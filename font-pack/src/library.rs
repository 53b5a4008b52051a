//! The classified source fonts of a run.

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    axis::{Family, Variant},
    classify::Classification,
};

/// A handle to the bytes of a source font in a [`FontLibrary`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceId(usize);

/// One classified source font.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FontDescriptor {
    pub source: SourceId,
    /// The name of the archive entry the font was read from.
    pub file_name: String,
    pub variant: Variant,
}

/// Source fonts grouped by family and language.
///
/// Groups are kept sorted by file name, so their order does not depend on
/// the order fonts were added in.
#[derive(Debug, Default)]
pub struct FontLibrary {
    families: BTreeMap<Family, BTreeMap<String, Vec<FontDescriptor>>>,
    languages: BTreeSet<String>,
    sources: Vec<Vec<u8>>,
}

impl FontLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a classified font and its bytes.
    pub fn insert(
        &mut self,
        file_name: String,
        classification: Classification,
        data: Vec<u8>,
    ) -> SourceId {
        let source = SourceId(self.sources.len());
        self.sources.push(data);
        let group = self
            .families
            .entry(classification.family)
            .or_default()
            .entry(classification.language.clone())
            .or_default();
        let position = group.partition_point(|d| d.file_name < file_name);
        group.insert(
            position,
            FontDescriptor {
                source,
                file_name,
                variant: classification.variant,
            },
        );
        self.languages.insert(classification.language);
        source
    }

    /// The fonts of one family and language, sorted by file name.
    pub fn group(&self, family: Family, language: &str) -> &[FontDescriptor] {
        self.families
            .get(&family)
            .and_then(|languages| languages.get(language))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every language seen in any family, in ascending order.
    ///
    /// This includes the empty language of fonts without a qualifier.
    pub fn languages(&self) -> impl Iterator<Item = &str> + '_ {
        self.languages.iter().map(String::as_str)
    }

    /// The families with at least one font.
    pub fn families(&self) -> impl Iterator<Item = Family> + '_ {
        self.families.keys().copied()
    }

    /// The bytes of a source font.
    pub fn data(&self, source: SourceId) -> &[u8] {
        &self.sources[source.0]
    }

    /// The number of fonts in the library.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
