//! The fixed vocabularies used to classify source font names.
//!
//! Every enumeration is ordered: the position of a value is its index on the
//! axis, and the order in which tokens are tried when matching a file name.
//! Tokens that are prefixes or suffixes of other tokens must therefore come
//! after them (`SansMono` before `Sans`).

use std::{fmt::Display, str::FromStr};

use serde::Deserialize;
use thiserror::Error;

/// A value that can appear as a token in a source file name.
pub trait Token: Copy + Eq + 'static {
    /// Every value, in matching and index order.
    const ALL: &'static [Self];

    /// The human readable kind of token, used in errors.
    const KIND: &'static str;

    /// The text of this value in a file name.
    ///
    /// This is empty for the value an axis takes when the name does not
    /// mention it; empty tokens never match.
    fn token(self) -> &'static str;

    /// The name used in plan files and logs.
    fn name(self) -> &'static str;

    /// The position of this value on its axis.
    fn index(self) -> usize;
}

/// One of the four style axes a font is classified along.
pub trait Axis: Token {
    /// The value used when a file name does not mention the axis.
    const DEFAULT: Self;
}

/// A token that is not part of a vocabulary.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownToken {
    kind: &'static str,
    value: String,
}

macro_rules! tokens {
    (
        $(#[$attr:meta])*
        $name:ident, $kind:literal {
            $( $(#[$vattr:meta])* $variant:ident => $token:literal, )*
        }
    ) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
        #[serde(try_from = "String")]
        pub enum $name {
            $( $(#[$vattr])* $variant, )*
        }

        impl Token for $name {
            const ALL: &'static [Self] = &[$(Self::$variant),*];
            const KIND: &'static str = $kind;

            fn token(self) -> &'static str {
                match self {
                    $(Self::$variant => $token,)*
                }
            }

            fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant),)*
                }
            }

            fn index(self) -> usize {
                self as usize
            }
        }

        impl FromStr for $name {
            type Err = UnknownToken;

            /// Accepts either the name of a value or its file name token.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.name() == s || (!v.token().is_empty() && v.token() == s))
                    .ok_or_else(|| UnknownToken {
                        kind: $kind,
                        value: s.to_owned(),
                    })
            }
        }

        impl TryFrom<String> for $name {
            type Error = UnknownToken;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

tokens! {
    /// A source font family.
    ///
    /// The display families are matched (so that they are not mistaken for
    /// `Serif` and `Sans`) but no default package uses them: it is unclear
    /// whether they are the compact or the loose variant of their family.
    Family, "family" {
        SerifDisplay => "SerifDisplay",
        SansDisplay => "SansDisplay",
        SansMono => "SansMono",
        Serif => "Serif",
        Sans => "Sans",
        Mono => "Mono",
        Emoji => "Emoji",
        KufiArabic => "KufiArabic",
        NaskhArabic => "NaskhArabic",
        NastaliqUrdu => "NastaliqUrdu",
    }
}

tokens! {
    /// Stroke weight.
    Weight, "weight" {
        Thin => "Thin",
        ExtraLight => "ExtraLight",
        Light => "Light",
        DemiLight => "DemiLight",
        Regular => "Regular",
        Medium => "Medium",
        SemiBold => "SemiBold",
        Bold => "Bold",
        ExtraBold => "ExtraBold",
        Black => "Black",
    }
}

tokens! {
    /// Horizontal density.
    Width, "width" {
        ExtraCondensed => "ExtraCondensed",
        Condensed => "Condensed",
        SemiCondensed => "SemiCondensed",
        Normal => "",
    }
}

tokens! {
    /// Vertical density.
    Height, "height" {
        /// Reduced line height for user interfaces.
        Ui => "UI",
        Normal => "",
    }
}

tokens! {
    /// Slant.
    Slant, "slant" {
        Upright => "",
        Italic => "Italic",
    }
}

impl Axis for Weight {
    const DEFAULT: Self = Weight::Regular;
}

impl Axis for Width {
    const DEFAULT: Self = Width::Normal;
}

impl Axis for Height {
    const DEFAULT: Self = Height::Normal;
}

impl Axis for Slant {
    const DEFAULT: Self = Slant::Upright;
}

macro_rules! axis_default {
    ($($name:ident),*) => {
        $(
            impl Default for $name {
                fn default() -> Self {
                    <Self as Axis>::DEFAULT
                }
            }
        )*
    };
}

axis_default!(Weight, Width, Height, Slant);

/// A position on all four style axes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Variant {
    pub weight: Weight,
    pub width: Width,
    pub height: Height,
    pub slant: Slant,
}

impl Variant {
    pub fn new(weight: Weight, width: Width, height: Height, slant: Slant) -> Self {
        Variant {
            weight,
            width,
            height,
            slant,
        }
    }
}

impl Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.weight, self.width, self.height, self.slant
        )
    }
}

/// Match the first token that starts `text`, returning it and the rest.
pub(crate) fn match_prefix<T: Token>(text: &str) -> Option<(T, &str)> {
    T::ALL
        .iter()
        .filter(|v| !v.token().is_empty())
        .find_map(|v| text.strip_prefix(v.token()).map(|rest| (*v, rest)))
}

/// Match the first token that ends `text`, returning it and the rest.
pub(crate) fn match_suffix<T: Token>(text: &str) -> Option<(T, &str)> {
    T::ALL
        .iter()
        .filter(|v| !v.token().is_empty())
        .find_map(|v| text.strip_suffix(v.token()).map(|rest| (*v, rest)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_order<T: Token + std::fmt::Debug>() {
        for (i, value) in T::ALL.iter().enumerate() {
            assert_eq!(value.index(), i, "{value:?}");
        }
    }

    #[test]
    fn index_is_position() {
        check_order::<Family>();
        check_order::<Weight>();
        check_order::<Width>();
        check_order::<Height>();
        check_order::<Slant>();
    }

    fn check_single_default<T: Axis>() {
        let empty = T::ALL.iter().filter(|v| v.token().is_empty()).count();
        assert!(empty <= 1, "{}", T::KIND);
        if empty == 1 {
            assert!(T::DEFAULT.token().is_empty(), "{}", T::KIND);
        }
    }

    #[test]
    fn at_most_one_default_sentinel() {
        check_single_default::<Weight>();
        check_single_default::<Width>();
        check_single_default::<Height>();
        check_single_default::<Slant>();
        assert!(Family::ALL.iter().all(|f| !f.token().is_empty()));
    }

    #[test]
    fn longer_families_win() {
        assert_eq!(
            match_prefix::<Family>("SansMonoCJKsc"),
            Some((Family::SansMono, "CJKsc"))
        );
        assert_eq!(
            match_prefix::<Family>("SerifDisplay"),
            Some((Family::SerifDisplay, ""))
        );
        assert_eq!(match_prefix::<Family>("Sans"), Some((Family::Sans, "")));
        assert_eq!(match_prefix::<Family>("Color"), None);
    }

    #[test]
    fn suffix_matching() {
        assert_eq!(
            match_suffix::<Slant>("BoldItalic"),
            Some((Slant::Italic, "Bold"))
        );
        assert_eq!(match_suffix::<Slant>("Bold"), None);
        assert_eq!(
            match_suffix::<Height>("ArabicUI"),
            Some((Height::Ui, "Arabic"))
        );
    }

    #[test]
    fn empty_tokens_never_match() {
        assert_eq!(match_prefix::<Width>("Bold"), None);
        assert_eq!(match_prefix::<Width>(""), None);
    }

    #[test]
    fn parse_names_and_tokens() {
        assert_eq!("Ui".parse::<Height>(), Ok(Height::Ui));
        assert_eq!("UI".parse::<Height>(), Ok(Height::Ui));
        assert_eq!("Normal".parse::<Width>(), Ok(Width::Normal));
        assert_eq!("Upright".parse::<Slant>(), Ok(Slant::Upright));
        assert_eq!("SemiBold".parse::<Weight>(), Ok(Weight::SemiBold));
        let err = "Heavy".parse::<Weight>().unwrap_err();
        assert_eq!(err.to_string(), "unknown weight 'Heavy'");
        // the empty token is not a name
        assert!("".parse::<Width>().is_err());
    }

    #[test]
    fn defaults() {
        let variant = Variant::default();
        assert_eq!(variant.weight, Weight::Regular);
        assert_eq!(variant.width, Width::Normal);
        assert_eq!(variant.height, Height::Normal);
        assert_eq!(variant.slant, Slant::Upright);
    }
}
