//! The package catalog and run settings.
//!
//! A plan is normally the built in Noto catalog. It can be replaced by a TOML
//! file:
//!
//! ```toml
//! chunk_size = 1048576
//!
//! [[package]]
//! name = "notosansbold"
//! family = "Sans"
//! weight = "Bold"
//! prepend = ["Emoji"]
//! append = ["KufiArabic", "NaskhArabic", "NastaliqUrdu"]
//! description = "provides the \"Noto Sans Bold\" font collection."
//! ```
//!
//! Keys that are left out take their value from the default plan.

use std::{
    collections::HashSet,
    io,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;

use crate::{
    axis::{Family, Height, Slant, Variant, Weight, Width},
    chunk,
    classify::DEFAULT_BRAND,
};

/// The default maximum size of one chunk of compressed data.
pub const DEFAULT_CHUNK_SIZE: usize = 20 * 1024 * 1024;

/// The default version given to generated crates.
pub const DEFAULT_VERSION: &str = "0.1.0";

const DEFAULT_NOTICE: &str = "\
Noto is a trademark of Google Inc. Noto fonts are open source.
All Noto fonts are published under the SIL Open Font License, Version 1.1.";

/// Errors in a plan.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("failed to read plan '{}': {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse plan: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("chunk size must be greater than zero")]
    ZeroChunkSize,
    #[error("the plan has no packages")]
    NoPackages,
    #[error("invalid package name '{0}'")]
    InvalidName(String),
    #[error("duplicate package name '{0}'")]
    DuplicatePackage(String),
    #[error("package '{package}' uses the {family} family more than once")]
    DuplicateFamily { package: String, family: Family },
}

/// Everything a run needs to know besides its input and output.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Plan {
    /// The prefix every source file name starts with.
    pub brand: String,
    /// The maximum number of compressed bytes in one chunk.
    pub chunk_size: usize,
    /// The version of the generated crates.
    pub version: String,
    /// Font licensing text included in generated files.
    pub notice: String,
    #[serde(rename = "package")]
    pub packages: Vec<PackageSpec>,
}

/// One output package.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageSpec {
    /// The crate name, also used as the output directory name.
    pub name: String,
    /// The family that provides the language coverage.
    pub family: Family,
    #[serde(default)]
    pub weight: Weight,
    #[serde(default)]
    pub width: Width,
    #[serde(default)]
    pub height: Height,
    #[serde(default)]
    pub slant: Slant,
    /// Families whose default fonts follow the primary default font.
    #[serde(default)]
    pub prepend: Vec<Family>,
    /// Families whose default fonts follow every language.
    #[serde(default)]
    pub append: Vec<Family>,
    #[serde(default)]
    pub description: String,
}

impl PackageSpec {
    /// The axis values requested for every font in the package.
    pub fn variant(&self) -> Variant {
        Variant::new(self.weight, self.width, self.height, self.slant)
    }

    fn validate(&self) -> Result<(), PlanError> {
        if !is_crate_name(&self.name) {
            return Err(PlanError::InvalidName(self.name.clone()));
        }
        let mut seen = HashSet::new();
        let families = std::iter::once(&self.family)
            .chain(&self.prepend)
            .chain(&self.append);
        for family in families {
            if !seen.insert(*family) {
                return Err(PlanError::DuplicateFamily {
                    package: self.name.clone(),
                    family: *family,
                });
            }
        }
        Ok(())
    }
}

fn is_crate_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl Plan {
    /// Parse and validate a plan.
    pub fn from_toml(text: &str) -> Result<Self, PlanError> {
        let plan: Plan = toml::from_str(text)?;
        plan.validate()?;
        Ok(plan)
    }

    /// Read, parse and validate a plan file.
    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let text = std::fs::read_to_string(path).map_err(|source| PlanError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn validate(&self) -> Result<(), PlanError> {
        if !chunk::is_valid_chunk_size(self.chunk_size) {
            return Err(PlanError::ZeroChunkSize);
        }
        if self.packages.is_empty() {
            return Err(PlanError::NoPackages);
        }
        let mut names = HashSet::new();
        for package in &self.packages {
            package.validate()?;
            if !names.insert(package.name.as_str()) {
                return Err(PlanError::DuplicatePackage(package.name.clone()));
            }
        }
        Ok(())
    }
}

impl Default for Plan {
    fn default() -> Self {
        Plan {
            brand: DEFAULT_BRAND.to_owned(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            version: DEFAULT_VERSION.to_owned(),
            notice: DEFAULT_NOTICE.to_owned(),
            packages: noto_catalog(),
        }
    }
}

/// The fifteen packages of the Noto catalog: five styles each of sans,
/// serif and mono.
fn noto_catalog() -> Vec<PackageSpec> {
    const ARABIC: &[Family] = &[
        Family::KufiArabic,
        Family::NaskhArabic,
        Family::NastaliqUrdu,
    ];
    let groups: [(&str, &str, Family, &str, &[Family]); 3] = [
        (
            "notosans",
            "Noto Sans",
            Family::Sans,
            "a proportional-width, sans-serif",
            ARABIC,
        ),
        (
            "notoserif",
            "Noto Serif",
            Family::Serif,
            "a proportional-width, serif",
            ARABIC,
        ),
        (
            "notomono",
            "Noto Mono",
            Family::SansMono,
            "a fixed-width",
            &[],
        ),
    ];
    let regular = Variant::default();
    let bold = Variant {
        weight: Weight::Bold,
        ..regular
    };
    let bold_italic = Variant {
        slant: Slant::Italic,
        ..bold
    };
    let italic = Variant {
        slant: Slant::Italic,
        ..regular
    };
    let condensed = Variant {
        width: Width::Condensed,
        height: Height::Ui,
        ..regular
    };
    let styles = [
        ("", "", regular),
        ("bold", " Bold", bold),
        ("bolditalic", " Bold Italic", bold_italic),
        ("italic", " Italic", italic),
        ("condensed", " Condensed", condensed),
    ];

    let mut packages = Vec::with_capacity(groups.len() * styles.len());
    for (prefix, display, family, kind, append) in groups {
        for (suffix, display_suffix, variant) in styles {
            packages.push(PackageSpec {
                name: format!("{prefix}{suffix}"),
                family,
                weight: variant.weight,
                width: variant.width,
                height: variant.height,
                slant: variant.slant,
                prepend: vec![Family::Emoji],
                append: append.to_vec(),
                description: format!(
                    "provides the \"{display}{display_suffix}\" font collection. It is {kind} font."
                ),
            });
        }
    }
    packages
}
