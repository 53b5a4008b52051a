//! The text of generated package files.

use std::{collections::BTreeMap, fmt::Write as _, io};

use serde::Serialize;

use crate::{
    chunk::{Chunk, EncodingManifest},
    plan::{PackageSpec, Plan},
};

const WORDS_PER_LINE: usize = 4;

/// Version requirement of the decoder used by generated crates.
pub const DECODER_VERSION: &str = "5.0";

const CODE_LICENSE: &str = "\
This package contains additional code for the purpose of redistributing the
fonts. This additional code is licensed under the Apache License, Version 2.0
(the \"License\"); you may not use it except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an \"AS IS\" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
";

const COVERAGE: &str = "\
This font collection provides broad unicode coverage.
Special software is required to use OpenType font collections.";

// everything in lib.rs after the crate docs
const LIB_BODY: &str = r#"
use std::{
    io::{self, Read},
    sync::OnceLock,
};

mod chunks;

use chunks::{CHUNKS, CHUNK_SIZE, COMPRESSED_SIZE, DECOMPRESSED_SIZE};

static OTC: OnceLock<Vec<u8>> = OnceLock::new();

/// The font data as an OpenType collection.
///
/// The embedded data is decompressed on first use and kept for the lifetime
/// of the process.
pub fn otc() -> &'static [u8] {
    OTC.get_or_init(|| {
        let mut data = Vec::with_capacity(DECOMPRESSED_SIZE);
        if COMPRESSED_SIZE > 0 {
            let reader = ChunkReader {
                chunks: CHUNKS,
                offset: 0,
                remaining: COMPRESSED_SIZE,
            };
            brotli_decompressor::Decompressor::new(reader, 4096)
                .read_to_end(&mut data)
                .expect("embedded font data is valid");
        }
        data
    })
}

/// Reads the little-endian bytes of the embedded words, skipping the
/// padding at the end of each chunk.
struct ChunkReader {
    chunks: &'static [&'static [u64]],
    offset: usize,
    remaining: usize,
}

impl Read for ChunkReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut written = 0;
        while written < buf.len() && self.remaining > 0 {
            let Some((chunk, rest)) = self.chunks.split_first() else {
                break;
            };
            let word = match chunk.get(self.offset / 8) {
                Some(word) if self.offset < CHUNK_SIZE => word,
                _ => {
                    self.chunks = rest;
                    self.offset = 0;
                    continue;
                }
            };
            let byte = self.offset % 8;
            let n = (8 - byte)
                .min(CHUNK_SIZE - self.offset)
                .min(buf.len() - written)
                .min(self.remaining);
            buf[written..written + n].copy_from_slice(&word.to_le_bytes()[byte..byte + n]);
            written += n;
            self.remaining -= n;
            self.offset += n;
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn decodes_to_declared_size() {
        assert_eq!(super::otc().len(), super::DECOMPRESSED_SIZE);
    }
}
"#;

#[derive(Serialize)]
struct CargoManifest<'a> {
    package: CargoPackage<'a>,
    dependencies: BTreeMap<&'a str, &'a str>,
}

#[derive(Serialize)]
struct CargoPackage<'a> {
    name: &'a str,
    version: &'a str,
    edition: &'a str,
    description: String,
    license: &'a str,
    readme: &'a str,
}

/// The first lines of every generated source file.
fn header(plan: &Plan) -> String {
    let mut out = String::from(
        "// THIS FILE IS AUTOGENERATED.\n// Any changes to this file will be overwritten.\n",
    );
    if !plan.notice.is_empty() {
        out.push_str("//\n");
        for line in plan.notice.lines() {
            push_comment_line(&mut out, "//", line);
        }
    }
    out
}

fn push_comment_line(out: &mut String, marker: &str, line: &str) {
    out.push_str(marker);
    if !line.is_empty() {
        out.push(' ');
        out.push_str(line);
    }
    out.push('\n');
}

/// `Package <name> <description>`, the sentence both the docs and readme
/// start with.
fn summary(package: &PackageSpec) -> String {
    if package.description.is_empty() {
        format!("Package {}.", package.name)
    } else {
        format!("Package {} {}", package.name, package.description)
    }
}

pub fn cargo_toml(package: &PackageSpec, plan: &Plan) -> Result<String, toml::ser::Error> {
    let manifest = CargoManifest {
        package: CargoPackage {
            name: &package.name,
            version: &plan.version,
            edition: "2021",
            description: summary(package),
            license: "OFL-1.1 AND Apache-2.0",
            readme: "README.md",
        },
        dependencies: BTreeMap::from([("brotli-decompressor", DECODER_VERSION)]),
    };
    toml::to_string(&manifest)
}

pub fn license(plan: &Plan) -> String {
    let mut out = String::new();
    if !plan.notice.is_empty() {
        out.push_str(&plan.notice);
        out.push_str("\n\n");
    }
    out.push_str(CODE_LICENSE);
    out
}

pub fn readme(package: &PackageSpec, plan: &Plan) -> String {
    let mut out = format!("# {}\n\n{}\n{COVERAGE}\n\n", package.name, summary(package));
    let _ = writeln!(
        out,
        "## Usage\n\n```rust\nlet collection: &[u8] = {}::otc();\n```\n",
        package.name.replace('-', "_")
    );
    out.push_str("## License\n\n");
    out.push_str(&license(plan));
    out
}

pub fn lib_rs(package: &PackageSpec, plan: &Plan) -> String {
    let mut out = header(plan);
    out.push('\n');
    for line in summary(package).lines().chain(COVERAGE.lines()) {
        push_comment_line(&mut out, "//!", line);
    }
    out.push_str(LIB_BODY);
    out
}

pub fn chunks_rs(manifest: &EncodingManifest, plan: &Plan) -> String {
    let mut out = header(plan);
    out.push('\n');
    for id in &manifest.chunk_ids {
        let _ = writeln!(out, "mod {};", id.to_lowercase());
    }
    if !manifest.chunk_ids.is_empty() {
        out.push('\n');
    }
    let entries = manifest
        .chunk_ids
        .iter()
        .map(|id| format!("&{}::{id}", id.to_lowercase()))
        .collect::<Vec<_>>()
        .join(", ");
    let _ = writeln!(out, "pub(crate) static CHUNKS: &[&[u64]] = &[{entries}];");
    let _ = writeln!(
        out,
        "pub(crate) const CHUNK_SIZE: usize = {};",
        manifest.chunk_size
    );
    let _ = writeln!(
        out,
        "pub(crate) const COMPRESSED_SIZE: usize = {};",
        manifest.compressed_len
    );
    let _ = writeln!(
        out,
        "pub(crate) const DECOMPRESSED_SIZE: usize = {};",
        manifest.decompressed_len
    );
    out
}

/// Write the source of one chunk module.
pub fn write_chunk<W: io::Write>(out: &mut W, chunk: &Chunk, plan: &Plan) -> io::Result<()> {
    out.write_all(header(plan).as_bytes())?;
    writeln!(
        out,
        "\npub(crate) static {}: [u64; {}] = [",
        chunk.id(),
        chunk.words().len()
    )?;
    for line in chunk.words().chunks(WORDS_PER_LINE) {
        out.write_all(b"   ")?;
        for word in line {
            write!(out, " 0x{word:016X},")?;
        }
        out.write_all(b"\n")?;
    }
    writeln!(out, "];")
}
