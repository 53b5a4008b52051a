//! Combine single fonts into an OpenType collection.
//!
//! Each input font keeps its own [table directory], in input order, so the
//! first font in the collection is the one consulted first by software that
//! falls back through collection members. Tables whose bytes are identical
//! are written once and shared by every directory that refers to them.
//!
//! The output only depends on the ordered input bytes: merging the same fonts
//! twice produces byte-identical collections.
//!
//! [table directory]: https://learn.microsoft.com/typography/opentype/spec/otff#table-directory

use std::collections::{BTreeMap, HashMap};
use std::io::Write;

use read_fonts::{types::Tag, FontRef, ReadError};
use thiserror::Error;

const TTC_HEADER_TAG: Tag = Tag::new(b"ttcf");
// tag, major version, minor version, numFonts
const TTC_HEADER_LEN: usize = 12;
const TABLE_DIRECTORY_HEADER_LEN: usize = 12;
const TABLE_RECORD_LEN: usize = 16;

/// An error encountered while merging fonts.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("no fonts to merge")]
    NoFonts,

    #[error("font {index} is not a single OpenType font: {error}")]
    InvalidFont { index: usize, error: ReadError },

    #[error("font {index}: table '{tag}' lies outside of the font data")]
    MalformedTable { index: usize, tag: Tag },

    #[error("merged collection would exceed the 4 GiB offset limit")]
    TooLarge,

    #[error("failed to write collection: {0}")]
    Io(#[from] std::io::Error),
}

/// Build a font collection from a sequence of fonts.
#[derive(Debug, Clone, Default)]
pub struct CollectionBuilder<'a> {
    fonts: Vec<FontEntry<'a>>,
}

#[derive(Debug, Clone)]
struct FontEntry<'a> {
    sfnt_version: u32,
    tables: BTreeMap<Tag, TableEntry<'a>>,
}

#[derive(Debug, Clone, Copy)]
struct TableEntry<'a> {
    checksum: u32,
    data: &'a [u8],
}

/// A table record of the output, with its final position.
#[derive(Debug, Clone, Copy)]
struct PlacedTable {
    tag: Tag,
    checksum: u32,
    offset: u32,
    length: u32,
}

impl<'a> CollectionBuilder<'a> {
    /// Create a new, empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a font to the collection.
    ///
    /// The data must be a single font (not itself a collection). Tables are
    /// copied verbatim along with the checksums recorded in the source.
    pub fn add_font(&mut self, data: &'a [u8]) -> Result<&mut Self, MergeError> {
        let index = self.fonts.len();
        let font = FontRef::new(data).map_err(|error| MergeError::InvalidFont { index, error })?;
        let mut tables = BTreeMap::new();
        for record in font.table_directory.table_records() {
            let tag = record.tag();
            let start = record.offset() as usize;
            let table = start
                .checked_add(record.length() as usize)
                .and_then(|end| data.get(start..end))
                .ok_or(MergeError::MalformedTable { index, tag })?;
            if tables.contains_key(&tag) {
                log::warn!("font {index} has a duplicate '{tag}' table, keeping the first");
                continue;
            }
            tables.insert(
                tag,
                TableEntry {
                    checksum: record.checksum(),
                    data: table,
                },
            );
        }
        self.fonts.push(FontEntry {
            sfnt_version: font.table_directory.sfnt_version(),
            tables,
        });
        Ok(self)
    }

    /// The number of fonts added so far.
    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    /// `true` if no fonts have been added.
    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// Assemble the collection, writing it to `sink`.
    pub fn build_into<W: Write + ?Sized>(&self, sink: &mut W) -> Result<(), MergeError> {
        if self.fonts.is_empty() {
            return Err(MergeError::NoFonts);
        }
        let (directory_offsets, directories, shared) = self.layout()?;

        sink.write_all(&TTC_HEADER_TAG.to_be_bytes())?;
        sink.write_all(&1u16.to_be_bytes())?;
        sink.write_all(&0u16.to_be_bytes())?;
        sink.write_all(&(self.fonts.len() as u32).to_be_bytes())?;
        for offset in &directory_offsets {
            sink.write_all(&offset.to_be_bytes())?;
        }

        for (font, records) in self.fonts.iter().zip(&directories) {
            let num_tables = records.len() as u16;
            let search = SearchRange::compute(num_tables);
            sink.write_all(&font.sfnt_version.to_be_bytes())?;
            sink.write_all(&num_tables.to_be_bytes())?;
            sink.write_all(&search.search_range.to_be_bytes())?;
            sink.write_all(&search.entry_selector.to_be_bytes())?;
            sink.write_all(&search.range_shift.to_be_bytes())?;
            for record in records {
                sink.write_all(&record.tag.to_be_bytes())?;
                sink.write_all(&record.checksum.to_be_bytes())?;
                sink.write_all(&record.offset.to_be_bytes())?;
                sink.write_all(&record.length.to_be_bytes())?;
            }
        }

        let padding = [0u8; 4];
        for table in shared {
            sink.write_all(table)?;
            sink.write_all(&padding[..round4(table.len()) - table.len()])?;
        }
        Ok(())
    }

    /// Assemble the collection into a new buffer.
    pub fn build(&self) -> Result<Vec<u8>, MergeError> {
        let mut data = Vec::new();
        self.build_into(&mut data)?;
        Ok(data)
    }

    /// Compute the position of every directory and table.
    ///
    /// Returns the directory offsets, the placed records of each directory
    /// and the distinct table blobs in the order they are written.
    #[allow(clippy::type_complexity)]
    fn layout(&self) -> Result<(Vec<u32>, Vec<Vec<PlacedTable>>, Vec<&'a [u8]>), MergeError> {
        let mut position = TTC_HEADER_LEN + self.fonts.len() * 4;
        let mut directory_offsets = Vec::with_capacity(self.fonts.len());
        for font in &self.fonts {
            directory_offsets.push(to_offset(position)?);
            position += TABLE_DIRECTORY_HEADER_LEN + font.tables.len() * TABLE_RECORD_LEN;
        }

        let mut placed: HashMap<&'a [u8], u32> = HashMap::new();
        let mut shared = Vec::new();
        let mut directories = Vec::with_capacity(self.fonts.len());
        for font in &self.fonts {
            let mut records = Vec::with_capacity(font.tables.len());
            for (tag, table) in &font.tables {
                let offset = match placed.get(table.data) {
                    Some(offset) => *offset,
                    None => {
                        let offset = to_offset(position)?;
                        position += round4(table.data.len());
                        placed.insert(table.data, offset);
                        shared.push(table.data);
                        offset
                    }
                };
                records.push(PlacedTable {
                    tag: *tag,
                    checksum: table.checksum,
                    offset,
                    length: to_offset(table.data.len())?,
                });
            }
            directories.push(records);
        }
        // the end of the last table must also be addressable
        to_offset(position)?;
        log::debug!(
            "laid out {} fonts sharing {} distinct tables in {position} bytes",
            self.fonts.len(),
            shared.len()
        );
        Ok((directory_offsets, directories, shared))
    }
}

/// Merge `fonts`, in order, into a single collection written to `sink`.
pub fn merge<W: Write + ?Sized>(fonts: &[&[u8]], sink: &mut W) -> Result<(), MergeError> {
    let mut builder = CollectionBuilder::new();
    for font in fonts {
        builder.add_font(font)?;
    }
    builder.build_into(sink)
}

/// The binary search assists of a table directory.
///
/// See <https://learn.microsoft.com/en-us/typography/opentype/spec/otff#table-directory>
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SearchRange {
    search_range: u16,
    entry_selector: u16,
    range_shift: u16,
}

impl SearchRange {
    fn compute(num_tables: u16) -> Self {
        if num_tables == 0 {
            return SearchRange {
                search_range: 0,
                entry_selector: 0,
                range_shift: 0,
            };
        }
        let entry_selector = u16::BITS - 1 - num_tables.leading_zeros();
        let search_range = (1u32 << entry_selector) * TABLE_RECORD_LEN as u32;
        let range_shift = num_tables as u32 * TABLE_RECORD_LEN as u32 - search_range;
        SearchRange {
            search_range: search_range.min(u16::MAX as u32) as u16,
            entry_selector: entry_selector as u16,
            range_shift: range_shift.min(u16::MAX as u32) as u16,
        }
    }
}

fn to_offset(position: usize) -> Result<u32, MergeError> {
    u32::try_from(position).map_err(|_| MergeError::TooLarge)
}

/// <https://github.com/google/woff2/blob/a0d0ed7da27b708c0a4e96ad7a998bddc933c06e/src/round.h#L19>
fn round4(sz: usize) -> usize {
    (sz + 3) & !3
}
