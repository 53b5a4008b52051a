//! Order the fonts of one package for merging.

use log::debug;

use crate::{
    axis::{Family, Variant},
    library::{FontDescriptor, FontLibrary},
    plan::PackageSpec,
    select::{select, Distance},
};

/// The fonts of a package in merge order.
///
/// Earlier fonts take precedence when several fonts cover the same
/// character.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeSequence<'a> {
    fonts: Vec<&'a FontDescriptor>,
}

impl<'a> MergeSequence<'a> {
    pub fn iter(&self) -> impl Iterator<Item = &'a FontDescriptor> + '_ {
        self.fonts.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    fn push_best(
        &mut self,
        library: &'a FontLibrary,
        family: Family,
        language: &str,
        target: &Variant,
    ) {
        match select(library.group(family, language), target) {
            Some(font) if Distance::between(&font.variant, target).is_exact() => {
                debug!("{family} '{language}': selected {}", font.file_name);
                self.fonts.push(font);
            }
            Some(font) => {
                debug!(
                    "{family} '{language}': selected {} as the closest match",
                    font.file_name
                );
                self.fonts.push(font);
            }
            None => debug!("{family} '{language}': no fonts"),
        }
    }
}

/// Select and order the fonts for `package`.
///
/// The order is: the primary family's unqualified font, the prepended
/// families, every other language of the primary family (sorted), and
/// finally the appended families.
pub fn compose<'a>(library: &'a FontLibrary, package: &PackageSpec) -> MergeSequence<'a> {
    let target = package.variant();
    let mut sequence = MergeSequence::default();

    sequence.push_best(library, package.family, "", &target);
    for family in &package.prepend {
        sequence.push_best(library, *family, "", &target);
    }
    for language in library.languages().filter(|l| !l.is_empty()) {
        sequence.push_best(library, package.family, language, &target);
    }
    for family in &package.append {
        sequence.push_best(library, *family, "", &target);
    }
    sequence
}
