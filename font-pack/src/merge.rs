//! Combining the fonts of a package into one collection.

pub use otc_merge::MergeError;

/// Merges an ordered list of fonts into a sink.
///
/// Implementations must be deterministic: the same fonts in the same order
/// produce the same bytes.
pub trait Merger: Sync {
    fn merge(&self, fonts: &[&[u8]], sink: &mut Vec<u8>) -> Result<(), MergeError>;
}

/// Writes an OpenType collection with one face per input font.
#[derive(Clone, Copy, Debug, Default)]
pub struct CollectionMerger;

impl Merger for CollectionMerger {
    fn merge(&self, fonts: &[&[u8]], sink: &mut Vec<u8>) -> Result<(), MergeError> {
        otc_merge::merge(fonts, sink)
    }
}
