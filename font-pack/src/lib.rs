//! Package a font archive into Rust crates.
//!
//! The fonts of a zip archive are classified by file name into families,
//! languages and styles. For every package of a [`Plan`], the best font of
//! each language is selected, the selection is merged into one OpenType
//! collection, and the collection is compressed and written out as a crate
//! that embeds it as `u64` array literals.

pub mod axis;
pub mod chunk;
pub mod classify;
pub mod compose;
mod error;
pub mod library;
pub mod merge;
mod package;
pub mod plan;
pub mod pool;
pub mod scan;
pub mod select;
mod templates;

use std::{fs, num::NonZeroUsize, path::Path};

use log::info;
use rayon::prelude::*;

pub use error::Error;
pub use package::{write_package, PackageReport};
pub use plan::{PackageSpec, Plan, PlanError};

use chunk::ChunkEncoder;
use classify::Classifier;
use library::FontLibrary;
use merge::{CollectionMerger, Merger};
use package::Generator;
use pool::BufferPool;

/// Settings of a run that are not part of the plan.
#[derive(Clone, Debug, Default)]
pub struct Options {
    /// The number of worker threads and merge buffers; defaults to the
    /// available parallelism.
    pub jobs: Option<usize>,
    /// Decode every package after writing it and compare with the merged
    /// collection.
    pub verify: bool,
}

/// Generate every package of `plan` from the fonts in the archive at `input`.
pub fn run(
    input: &Path,
    output_dir: &Path,
    plan: &Plan,
    options: &Options,
) -> Result<Vec<PackageReport>, Error> {
    plan.validate()?;
    let jobs = options.jobs.unwrap_or_else(default_jobs).max(1);
    let threads = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;

    threads.install(|| {
        let library = scan::scan_archive(input, &Classifier::new(plan.brand.as_str()))?;
        info!(
            "classified {} source fonts in {} families",
            library.len(),
            library.families().count()
        );

        fs::create_dir_all(output_dir).map_err(|source| Error::CreateDir {
            path: output_dir.to_owned(),
            source,
        })?;
        let pool = BufferPool::new(jobs);
        generate(
            &library,
            plan,
            &pool,
            &CollectionMerger,
            output_dir,
            options.verify,
        )
    })
}

/// Generate every package of `plan` from an already loaded library.
///
/// Packages are generated in parallel, each holding one buffer of `pool`
/// while it runs. The first error stops the run; packages written before it
/// are left in place.
pub fn generate<M: Merger>(
    library: &FontLibrary,
    plan: &Plan,
    pool: &BufferPool,
    merger: &M,
    output_dir: &Path,
    verify: bool,
) -> Result<Vec<PackageReport>, Error> {
    let encoder = ChunkEncoder::new(plan.chunk_size).map_err(|_| PlanError::ZeroChunkSize)?;
    let generator = Generator {
        library,
        plan,
        pool,
        merger,
        encoder,
        output_dir,
        verify,
    };
    plan.packages
        .par_iter()
        .map(|package| generator.generate(package))
        .collect()
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}
