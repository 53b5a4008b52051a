//! Errors that end a run.

use std::{io, path::PathBuf};

use thiserror::Error;
use zip::result::ZipError;

use crate::{
    chunk::{DecodeError, EncodeError},
    merge::MergeError,
    plan::PlanError,
};

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to open archive '{}': {source}", path.display())]
    OpenArchive { path: PathBuf, source: io::Error },
    #[error("failed to read archive: {0}")]
    Archive(#[from] ZipError),
    #[error("failed to read '{name}' from archive: {source}")]
    ReadEntry { name: String, source: ZipError },
    #[error("failed to create directory '{}': {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("failed to write '{}': {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error(
        "no fonts in the archive match package '{package}'; \
         use --plan to list only the packages the archive provides"
    )]
    EmptyPackage { package: String },
    #[error("failed to merge package '{package}': {source}")]
    Merge {
        package: String,
        source: MergeError,
    },
    #[error("failed to encode package '{package}': {source}")]
    Encode {
        package: String,
        source: EncodeError,
    },
    #[error("package '{package}' does not decode: {source}")]
    Decode {
        package: String,
        source: DecodeError,
    },
    #[error("package '{package}' decodes to different bytes than were merged")]
    VerifyMismatch { package: String },
    #[error("failed to write the manifest of '{package}': {source}")]
    Manifest {
        package: String,
        source: toml::ser::Error,
    },
    #[error("failed to start worker threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error(transparent)]
    Plan(#[from] PlanError),
}
