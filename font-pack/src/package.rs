//! Generate the crate for one output package.

use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use log::{debug, info};

use crate::{
    chunk::{ChunkEncoder, EncodedBlob, EncodingManifest},
    compose::compose,
    error::Error,
    library::FontLibrary,
    merge::Merger,
    plan::{PackageSpec, Plan},
    pool::BufferPool,
    templates,
};

/// What was generated for one package.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageReport {
    pub name: String,
    /// The names of the merged source fonts, in merge order.
    pub fonts: Vec<String>,
    /// The size of the merged collection.
    pub merged_len: usize,
    pub manifest: EncodingManifest,
}

/// The state shared by every package task of a run.
pub(crate) struct Generator<'a, M> {
    pub(crate) library: &'a FontLibrary,
    pub(crate) plan: &'a Plan,
    pub(crate) pool: &'a BufferPool,
    pub(crate) merger: &'a M,
    pub(crate) encoder: ChunkEncoder,
    pub(crate) output_dir: &'a Path,
    pub(crate) verify: bool,
}

impl<M: Merger> Generator<'_, M> {
    pub(crate) fn generate(&self, package: &PackageSpec) -> Result<PackageReport, Error> {
        let dir = self.output_dir.join(&package.name);
        info!("generating merged font {}", dir.display());

        let sequence = compose(self.library, package);
        if sequence.is_empty() {
            return Err(Error::EmptyPackage {
                package: package.name.clone(),
            });
        }
        let fonts: Vec<&[u8]> = sequence
            .iter()
            .map(|font| self.library.data(font.source))
            .collect();

        let mut buffer = self.pool.acquire();
        self.merger
            .merge(&fonts, &mut buffer)
            .map_err(|source| Error::Merge {
                package: package.name.clone(),
                source,
            })?;
        let encoded = self
            .encoder
            .encode(&buffer)
            .map_err(|source| Error::Encode {
                package: package.name.clone(),
                source,
            })?;
        debug!(
            "{}: {} fonts, {} bytes merged, {} compressed in {} chunks",
            package.name,
            sequence.len(),
            buffer.len(),
            encoded.manifest.compressed_len,
            encoded.chunks.len()
        );

        write_package(&dir, package, self.plan, &encoded)?;

        if self.verify {
            let decoded = encoded.decode().map_err(|source| Error::Decode {
                package: package.name.clone(),
                source,
            })?;
            if decoded != *buffer {
                return Err(Error::VerifyMismatch {
                    package: package.name.clone(),
                });
            }
        }

        Ok(PackageReport {
            name: package.name.clone(),
            fonts: sequence.iter().map(|font| font.file_name.clone()).collect(),
            merged_len: buffer.len(),
            manifest: encoded.manifest,
        })
    }
}

/// Write the files of a generated crate into `dir`.
///
/// Chunk files from an earlier run are removed first, since a package can
/// shrink to fewer chunks.
pub fn write_package(
    dir: &Path,
    package: &PackageSpec,
    plan: &Plan,
    encoded: &EncodedBlob,
) -> Result<(), Error> {
    let src = dir.join("src");
    let chunk_dir = src.join("chunks");
    if chunk_dir.exists() {
        debug!("removing {}", chunk_dir.display());
        fs::remove_dir_all(&chunk_dir).map_err(|source| Error::Write {
            path: chunk_dir.clone(),
            source,
        })?;
    }
    fs::create_dir_all(&chunk_dir).map_err(|source| Error::CreateDir {
        path: chunk_dir.clone(),
        source,
    })?;

    let cargo_toml = templates::cargo_toml(package, plan).map_err(|source| Error::Manifest {
        package: package.name.clone(),
        source,
    })?;
    write_file(dir.join("Cargo.toml"), &cargo_toml)?;
    write_file(dir.join("LICENSE"), &templates::license(plan))?;
    write_file(dir.join("README.md"), &templates::readme(package, plan))?;
    write_file(src.join("lib.rs"), &templates::lib_rs(package, plan))?;
    write_file(
        src.join("chunks.rs"),
        &templates::chunks_rs(&encoded.manifest, plan),
    )?;

    for chunk in &encoded.chunks {
        let path = chunk_dir.join(format!("chunk{}.rs", chunk.index()));
        File::create(&path)
            .map(BufWriter::new)
            .and_then(|mut out| {
                templates::write_chunk(&mut out, chunk, plan)?;
                out.flush()
            })
            .map_err(|source| Error::Write { path, source })?;
    }
    Ok(())
}

fn write_file(path: PathBuf, contents: &str) -> Result<(), Error> {
    fs::write(&path, contents).map_err(|source| Error::Write { path, source })
}
