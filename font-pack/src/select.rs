//! Pick the best available font for a requested variant.

use std::cmp::{Ordering, Reverse};

use crate::{
    axis::{Token, Variant},
    library::FontDescriptor,
};

/// How far a candidate is from a target variant.
///
/// Fields are compared in declaration order: a difference in slant always
/// outweighs any difference in weight, and so on down to vertical density.
/// Candidates at the same distance prefer the larger index on each axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Distance {
    slant: usize,
    weight: usize,
    width: usize,
    height: usize,
    preference: Reverse<(usize, usize, usize, usize)>,
}

impl Distance {
    pub fn between(candidate: &Variant, target: &Variant) -> Self {
        Distance {
            slant: candidate.slant.index().abs_diff(target.slant.index()),
            weight: candidate.weight.index().abs_diff(target.weight.index()),
            width: candidate.width.index().abs_diff(target.width.index()),
            height: candidate.height.index().abs_diff(target.height.index()),
            preference: Reverse((
                candidate.slant.index(),
                candidate.weight.index(),
                candidate.width.index(),
                candidate.height.index(),
            )),
        }
    }

    /// `true` if the candidate is exactly the target.
    pub fn is_exact(&self) -> bool {
        self.slant == 0 && self.weight == 0 && self.width == 0 && self.height == 0
    }
}

/// Order two candidates for `target`, closest first.
///
/// Fonts with identical axis values (the `.otf` and `.ttf` of one face) are
/// ordered by file name.
fn compare(a: &FontDescriptor, b: &FontDescriptor, target: &Variant) -> Ordering {
    Distance::between(&a.variant, target)
        .cmp(&Distance::between(&b.variant, target))
        .then_with(|| a.file_name.cmp(&b.file_name))
}

/// Select the candidate closest to `target`.
///
/// Returns `None` only if there are no candidates. The result does not
/// depend on the order of `candidates`.
pub fn select<'a>(
    candidates: &'a [FontDescriptor],
    target: &Variant,
) -> Option<&'a FontDescriptor> {
    candidates.iter().min_by(|a, b| compare(a, b, target))
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use crate::{
        axis::{Height, Slant, Weight, Width},
        library::FontLibrary,
    };

    use super::*;

    /// Build descriptors through a library so they have real source ids.
    fn candidates(variants: &[(&str, Variant)]) -> Vec<FontDescriptor> {
        let mut library = FontLibrary::new();
        variants
            .iter()
            .map(|(name, variant)| {
                let classification = crate::classify::Classification {
                    family: crate::axis::Family::Sans,
                    language: String::new(),
                    variant: *variant,
                };
                let source = library.insert(name.to_string(), classification, Vec::new());
                FontDescriptor {
                    source,
                    file_name: name.to_string(),
                    variant: *variant,
                }
            })
            .collect()
    }

    fn weight(weight: Weight) -> Variant {
        Variant {
            weight,
            ..Default::default()
        }
    }

    #[test]
    fn empty_has_no_match() {
        assert_eq!(select(&[], &Variant::default()), None);
    }

    #[test]
    fn exact_weight_wins() {
        // weight indices 2, 5 and 7, target 5
        let fonts = candidates(&[
            ("a", weight(Weight::Light)),
            (
                "b",
                Variant::new(Weight::Medium, Width::Condensed, Height::Ui, Slant::Upright),
            ),
            ("c", weight(Weight::Bold)),
        ]);
        let target = weight(Weight::Medium);
        assert_eq!(select(&fonts, &target).unwrap().file_name, "b");
    }

    #[test]
    fn slant_outweighs_everything_else() {
        let fonts = candidates(&[
            (
                "italic",
                Variant::new(Weight::Bold, Width::Normal, Height::Normal, Slant::Italic),
            ),
            (
                "upright",
                Variant::new(
                    Weight::Thin,
                    Width::ExtraCondensed,
                    Height::Ui,
                    Slant::Upright,
                ),
            ),
        ]);
        let target = Variant::new(Weight::Bold, Width::Normal, Height::Normal, Slant::Upright);
        assert_eq!(select(&fonts, &target).unwrap().file_name, "upright");
    }

    #[test]
    fn weight_outweighs_density() {
        let fonts = candidates(&[
            (
                "condensed-bold",
                Variant::new(
                    Weight::Bold,
                    Width::ExtraCondensed,
                    Height::Ui,
                    Slant::Upright,
                ),
            ),
            ("regular", weight(Weight::Regular)),
        ]);
        let target = weight(Weight::Bold);
        assert_eq!(select(&fonts, &target).unwrap().file_name, "condensed-bold");
    }

    #[test]
    fn ties_prefer_larger_index() {
        // Light and Medium are both one step from Regular
        let fonts = candidates(&[
            ("light", weight(Weight::DemiLight)),
            ("medium", weight(Weight::Medium)),
        ]);
        let target = weight(Weight::Regular);
        assert_eq!(select(&fonts, &target).unwrap().file_name, "medium");
    }

    #[test]
    fn identical_variants_prefer_first_name() {
        let fonts = candidates(&[
            ("NotoSans-Regular.ttf", Variant::default()),
            ("NotoSans-Regular.otf", Variant::default()),
        ]);
        assert_eq!(
            select(&fonts, &Variant::default()).unwrap().file_name,
            "NotoSans-Regular.otf"
        );
    }

    fn all_variants() -> Vec<Variant> {
        let mut out = Vec::new();
        for &weight in Weight::ALL {
            for &width in Width::ALL {
                for &height in Height::ALL {
                    for &slant in Slant::ALL {
                        out.push(Variant::new(weight, width, height, slant));
                    }
                }
            }
        }
        out
    }

    #[test]
    fn never_dominated_and_order_independent() {
        let variants = all_variants();
        let mut rng = StdRng::seed_from_u64(0x2545_f491);
        for _ in 0..200 {
            let mut picked = Vec::new();
            for (i, variant) in variants.iter().enumerate() {
                if rng.gen_ratio(1, 23) {
                    picked.push((format!("font{i}"), *variant));
                }
            }
            if picked.is_empty() {
                continue;
            }
            let named: Vec<_> = picked.iter().map(|(n, v)| (n.as_str(), *v)).collect();
            let fonts = candidates(&named);
            let mut reversed = fonts.clone();
            reversed.reverse();

            for target in variants.iter().step_by(7) {
                let best = select(&fonts, target).unwrap();
                let best_distance = Distance::between(&best.variant, target);
                for other in &fonts {
                    assert!(Distance::between(&other.variant, target) >= best_distance);
                }
                assert_eq!(select(&reversed, target), Some(best));
                assert_eq!(select(&fonts, target), Some(best));
            }
        }
    }

    #[test]
    fn exact_match_has_zero_distance() {
        for variant in all_variants() {
            assert!(Distance::between(&variant, &variant).is_exact());
        }
    }
}
