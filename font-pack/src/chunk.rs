//! Compressed, size bounded chunks of `u64` words.
//!
//! A merged collection is compressed with brotli and the compressed stream is
//! cut into chunks of at most `chunk_size` bytes. Each chunk is stored as
//! little-endian `u64` words so it can be embedded as an array literal, and
//! each is zero padded to a whole number of words on its own. [`decode`]
//! strips the padding using the chunk size and compressed length recorded in
//! the [`EncodingManifest`].

use std::io::{self, Read, Write};

use brotli_decompressor::{BrotliDecompressStream, BrotliResult, BrotliState, StandardAlloc};
use thiserror::Error;

const QUALITY: u32 = 11;
const LG_WINDOW: u32 = 24;
const BUFFER_SIZE: usize = 4096;
const WORD_LEN: usize = std::mem::size_of::<u64>();

/// `true` if `size` can be used as the maximum chunk size.
pub fn is_valid_chunk_size(size: usize) -> bool {
    size != 0
}

/// Errors while encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
    #[error("compression failed: {0}")]
    Io(#[from] io::Error),
}

/// Errors while reassembling chunks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("compressed stream is invalid, decoding failed")]
    InvalidStream,
    #[error("decompressed size greater than declared")]
    MaxSizeExceeded,
    #[error("unconsumed data in the compressed stream after decoding")]
    ExcessInputData,
    #[error("decoded {actual} bytes but {expected} were declared")]
    LengthMismatch { expected: usize, actual: usize },
}

/// One slice of the compressed stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    index: usize,
    len: usize,
    words: Vec<u64>,
}

impl Chunk {
    pub fn index(&self) -> usize {
        self.index
    }

    /// The identifier used for this chunk in generated code.
    pub fn id(&self) -> String {
        format!("CHUNK{}", self.index)
    }

    /// The number of compressed bytes in the chunk, excluding padding.
    pub fn payload_len(&self) -> usize {
        self.len
    }

    pub fn words(&self) -> &[u64] {
        &self.words
    }
}

/// How to reassemble a blob from its chunks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EncodingManifest {
    pub decompressed_len: usize,
    pub compressed_len: usize,
    /// Every chunk but the last holds exactly this many compressed bytes.
    pub chunk_size: usize,
    pub chunk_ids: Vec<String>,
}

/// The result of encoding one blob.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EncodedBlob {
    pub manifest: EncodingManifest,
    pub chunks: Vec<Chunk>,
}

impl EncodedBlob {
    /// Reassemble the original blob.
    pub fn decode(&self) -> Result<Vec<u8>, DecodeError> {
        let words: Vec<&[u64]> = self.chunks.iter().map(Chunk::words).collect();
        decode(&words, &self.manifest)
    }
}

/// Compresses blobs and splits them into chunks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkEncoder {
    max_chunk_size: usize,
}

impl ChunkEncoder {
    pub fn new(max_chunk_size: usize) -> Result<Self, EncodeError> {
        if !is_valid_chunk_size(max_chunk_size) {
            return Err(EncodeError::InvalidChunkSize);
        }
        Ok(ChunkEncoder { max_chunk_size })
    }

    /// Compress `blob` and split the result into chunks.
    ///
    /// An empty blob produces no chunks.
    pub fn encode(&self, blob: &[u8]) -> Result<EncodedBlob, EncodeError> {
        let compressed = if blob.is_empty() {
            Vec::new()
        } else {
            compress(blob)?
        };
        Ok(self.split(blob.len(), &compressed))
    }

    fn split(&self, decompressed_len: usize, compressed: &[u8]) -> EncodedBlob {
        let chunks: Vec<_> = compressed
            .chunks(self.max_chunk_size)
            .enumerate()
            .map(|(index, segment)| Chunk {
                index,
                len: segment.len(),
                words: segment.chunks(WORD_LEN).map(le_word).collect(),
            })
            .collect();
        EncodedBlob {
            manifest: EncodingManifest {
                decompressed_len,
                compressed_len: compressed.len(),
                chunk_size: self.max_chunk_size,
                chunk_ids: chunks.iter().map(Chunk::id).collect(),
            },
            chunks,
        }
    }
}

// zero-pads a short final word
fn le_word(bytes: &[u8]) -> u64 {
    let mut word = [0u8; WORD_LEN];
    word[..bytes.len()].copy_from_slice(bytes);
    u64::from_le_bytes(word)
}

fn compress(blob: &[u8]) -> Result<Vec<u8>, io::Error> {
    let mut writer = brotli::CompressorWriter::new(
        Vec::with_capacity(blob.len() / 2),
        BUFFER_SIZE,
        QUALITY,
        LG_WINDOW,
    );
    writer.write_all(blob)?;
    Ok(writer.into_inner())
}

/// Reads the bytes of a sequence of word chunks.
///
/// At most `chunk_size` bytes are read from each chunk, which drops the
/// padding of every chunk, and reading stops after `len` bytes in total.
#[derive(Clone, Debug)]
pub struct ChunkReader<'a> {
    chunks: &'a [&'a [u64]],
    chunk_size: usize,
    offset: usize,
    remaining: usize,
}

impl<'a> ChunkReader<'a> {
    pub fn new(chunks: &'a [&'a [u64]], chunk_size: usize, len: usize) -> Self {
        ChunkReader {
            chunks,
            chunk_size,
            offset: 0,
            remaining: len,
        }
    }

    /// The number of bytes left before the declared length is reached.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    fn next_chunk(&mut self) {
        if let Some((_, rest)) = self.chunks.split_first() {
            self.chunks = rest;
        }
        self.offset = 0;
    }
}

impl Read for ChunkReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut written = 0;
        while written < buf.len() && self.remaining > 0 {
            let Some(chunk) = self.chunks.first() else {
                break;
            };
            if self.offset >= self.chunk_size {
                self.next_chunk();
                continue;
            }
            // a chunk shorter than the chunk size ends early
            let Some(word) = chunk.get(self.offset / WORD_LEN) else {
                self.next_chunk();
                continue;
            };
            let byte = self.offset % WORD_LEN;
            let n = (WORD_LEN - byte)
                .min(self.chunk_size - self.offset)
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

/// Reassemble a blob from the words of its chunks.
///
/// The stream must decompress to exactly the declared length and end at the
/// last compressed byte.
pub fn decode(chunks: &[&[u64]], manifest: &EncodingManifest) -> Result<Vec<u8>, DecodeError> {
    let expected = manifest.decompressed_len;
    if manifest.compressed_len == 0 {
        return match expected {
            0 => Ok(Vec::new()),
            _ => Err(DecodeError::LengthMismatch {
                expected,
                actual: 0,
            }),
        };
    }

    let mut encoded = Vec::with_capacity(manifest.compressed_len);
    ChunkReader::new(chunks, manifest.chunk_size, manifest.compressed_len)
        .read_to_end(&mut encoded)
        .map_err(|_| DecodeError::InvalidStream)?;
    decompress(&encoded, expected)
}

/// Decompress `encoded` into a buffer of at most `max_len` bytes.
fn decompress(encoded: &[u8], max_len: usize) -> Result<Vec<u8>, DecodeError> {
    let mut state = BrotliState::new(
        StandardAlloc::default(),
        StandardAlloc::default(),
        StandardAlloc::default(),
    );
    let mut sink = vec![0u8; max_len];

    let mut available_in = encoded.len();
    let mut input_offset = 0;
    let mut available_out = sink.len();
    let mut output_offset = 0;
    let mut total_out = 0;

    loop {
        match BrotliDecompressStream(
            &mut available_in,
            &mut input_offset,
            encoded,
            &mut available_out,
            &mut output_offset,
            &mut sink,
            &mut total_out,
            &mut state,
        ) {
            BrotliResult::ResultSuccess => break,
            // all of the input is available up front
            BrotliResult::ResultFailure | BrotliResult::NeedsMoreInput => {
                return Err(DecodeError::InvalidStream);
            }
            BrotliResult::NeedsMoreOutput if available_out == 0 => {
                return Err(DecodeError::MaxSizeExceeded);
            }
            BrotliResult::NeedsMoreOutput => continue,
        }
    }

    if available_in > 0 {
        return Err(DecodeError::ExcessInputData);
    }
    if total_out != max_len {
        return Err(DecodeError::LengthMismatch {
            expected: max_len,
            actual: total_out,
        });
    }
    Ok(sink)
}
