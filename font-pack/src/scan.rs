//! Read and classify the fonts of a zip archive.

use std::{
    fs::File,
    io::{Cursor, Read},
    path::Path,
    sync::mpsc,
    thread,
};

use log::{debug, info};
use memmap2::Mmap;
use rayon::prelude::*;
use zip::{result::ZipError, ZipArchive};

use crate::{
    classify::{Classification, Classifier},
    error::Error,
    library::FontLibrary,
};

// sizes in entry headers are not trusted beyond this
const MAX_PREALLOCATION: u64 = 64 * 1024 * 1024;

/// Load every font in the archive at `path` whose name classifies.
pub fn scan_archive(path: &Path, classifier: &Classifier) -> Result<FontLibrary, Error> {
    let open_error = |source| Error::OpenArchive {
        path: path.to_owned(),
        source,
    };
    let file = File::open(path).map_err(open_error)?;
    // Safety: the archive is only read, and is not expected to change
    // while the run is in progress
    let mmap = unsafe { Mmap::map(&file) }.map_err(open_error)?;
    scan_bytes(&mmap, classifier)
}

/// Load every font in an in-memory zip archive whose name classifies.
///
/// Names are classified before anything is decompressed; entries that do
/// not classify are never read. Matching entries are read in parallel and
/// handed to a single thread that builds the library.
pub fn scan_bytes(data: &[u8], classifier: &Classifier) -> Result<FontLibrary, Error> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;

    let mut accepted = Vec::new();
    for index in 0..archive.len() {
        let name = archive.by_index_raw(index)?.name().to_owned();
        match classifier.classify(&name) {
            Some(classification) => accepted.push((index, name, classification)),
            None => debug!("skipping {name}"),
        }
    }

    let (sender, receiver) = mpsc::channel::<(String, Classification, Vec<u8>)>();
    thread::scope(|scope| {
        let aggregator = scope.spawn(move || {
            let mut library = FontLibrary::new();
            for (name, classification, data) in receiver {
                info!("loading source font {name}");
                library.insert(name, classification, data);
            }
            library
        });

        let read = accepted.into_par_iter().try_for_each_init(
            || (archive.clone(), sender.clone()),
            |(archive, sender), (index, name, classification)| -> Result<(), Error> {
                let data = read_entry(archive, index).map_err(|source| Error::ReadEntry {
                    name: name.clone(),
                    source,
                })?;
                // the receiver lives until every sender is dropped
                let _ = sender.send((name, classification, data));
                Ok(())
            },
        );
        // close the channel so the aggregator finishes
        drop(sender);
        let library = aggregator
            .join()
            .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
        read.map(|()| library)
    })
}

fn read_entry(archive: &mut ZipArchive<Cursor<&[u8]>>, index: usize) -> Result<Vec<u8>, ZipError> {
    let mut entry = archive.by_index(index)?;
    let mut data = Vec::with_capacity(initial_capacity(entry.size()));
    entry.read_to_end(&mut data)?;
    Ok(data)
}

fn initial_capacity(declared_size: u64) -> usize {
    declared_size.min(MAX_PREALLOCATION) as usize
}
