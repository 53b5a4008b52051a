//! Generate crates from a synthetic archive and read them back.

use std::{
    fs::{self, File},
    io::Write,
    path::Path,
};

use font_pack::{chunk::EncodingManifest, Options, Plan};
use pretty_assertions::assert_eq;
use rand::{rngs::StdRng, Rng, SeedableRng};
use read_fonts::{types::Tag, CollectionRef};
use write_fonts::FontBuilder;
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

/// A font whose `name` table holds its file name, so it can be recognised
/// in the merged collection.
fn make_font(file_name: &str) -> Vec<u8> {
    // noise seeded by the name, so the collection does not compress away
    let seed = file_name
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325_u64, |hash, b| {
            (hash ^ b as u64).wrapping_mul(0x0100_0000_01b3)
        });
    let mut glyf = vec![0u8; 512];
    StdRng::seed_from_u64(seed).fill(glyf.as_mut_slice());
    let mut builder = FontBuilder::new();
    builder.add_raw(
        write_fonts::types::Tag::new(b"name"),
        file_name.as_bytes().to_vec(),
    );
    builder.add_raw(write_fonts::types::Tag::new(b"glyf"), glyf);
    builder.build()
}

const FONTS: &[&str] = &[
    "Noto/NotoSans-Regular.ttf",
    "Noto/NotoSans-Bold.ttf",
    "Noto/NotoSans-BoldItalic.ttf",
    "Noto/NotoSansThai-Regular.ttf",
    "Noto/NotoSansThai-SemiBold.ttf",
    "Noto/NotoSansArmenian-Regular.otf",
    "Noto/NotoEmoji-Regular.ttf",
    "Noto/NotoNaskhArabic-Bold.ttf",
    "Noto/NotoSerif-Regular.ttf",
];

fn write_archive(path: &Path) {
    let mut writer = ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for name in FONTS {
        writer.start_file(*name, options).unwrap();
        writer.write_all(&make_font(name)).unwrap();
    }
    writer.start_file("Noto/LICENSE", options).unwrap();
    writer.write_all(b"not a font").unwrap();
    writer.finish().unwrap();
}

const PLAN: &str = r#"
chunk_size = 250
version = "1.2.3"

[[package]]
name = "tinysans"
family = "Sans"
prepend = ["Emoji"]
append = ["NaskhArabic"]
description = "provides a tiny font collection."

[[package]]
name = "tinysansbold"
family = "Sans"
weight = "Bold"
"#;

/// Parse the chunk literals of a generated crate.
fn read_chunks(root: &Path) -> (EncodingManifest, Vec<Vec<u64>>) {
    let chunks_rs = fs::read_to_string(root.join("src/chunks.rs")).unwrap();
    let constant = |name: &str| -> usize {
        let line = chunks_rs
            .lines()
            .find(|line| line.contains(&format!(" {name}: usize = ")))
            .unwrap();
        line.rsplit(' ')
            .next()
            .unwrap()
            .trim_end_matches(';')
            .parse()
            .unwrap()
    };
    let chunk_ids: Vec<String> = chunks_rs
        .lines()
        .filter_map(|line| line.strip_prefix("mod "))
        .map(|rest| rest.trim_end_matches(';').to_uppercase())
        .collect();

    let words = chunk_ids
        .iter()
        .map(|id| {
            let path = root.join(format!("src/chunks/{}.rs", id.to_lowercase()));
            let text = fs::read_to_string(path).unwrap();
            let body = text.split_once("] = [").unwrap().1;
            body.split(',')
                .filter_map(|token| token.trim().strip_prefix("0x"))
                .map(|hex| u64::from_str_radix(hex, 16).unwrap())
                .collect()
        })
        .collect();

    let manifest = EncodingManifest {
        decompressed_len: constant("DECOMPRESSED_SIZE"),
        compressed_len: constant("COMPRESSED_SIZE"),
        chunk_size: constant("CHUNK_SIZE"),
        chunk_ids,
    };
    (manifest, words)
}

/// The file names stored in the `name` tables of a collection.
fn member_names(file: &[u8]) -> Vec<String> {
    let collection = CollectionRef::new(file).unwrap();
    (0..collection.len())
        .map(|index| {
            let font = collection.get(index).unwrap();
            let record = font
                .table_directory
                .table_records()
                .iter()
                .find(|record| record.tag() == Tag::new(b"name"))
                .unwrap();
            let start = record.offset() as usize;
            let end = start + record.length() as usize;
            // offsets in a collection are relative to the start of the file
            String::from_utf8(file[start..end].to_vec()).unwrap()
        })
        .collect()
}

#[test]
fn generates_decodable_crates() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("fonts.zip");
    write_archive(&archive);
    let output = dir.path().join("out");

    let plan = Plan::from_toml(PLAN).unwrap();
    let options = Options {
        jobs: Some(2),
        verify: true,
    };
    let reports = font_pack::run(&archive, &output, &plan, &options).unwrap();
    assert_eq!(reports.len(), 2);

    let regular = &reports[0];
    assert_eq!(regular.name, "tinysans");
    assert_eq!(
        regular.fonts,
        [
            "Noto/NotoSans-Regular.ttf",
            "Noto/NotoEmoji-Regular.ttf",
            "Noto/NotoSansArmenian-Regular.otf",
            "Noto/NotoSansThai-Regular.ttf",
            "Noto/NotoNaskhArabic-Bold.ttf",
        ]
    );
    let bold = &reports[1];
    assert_eq!(
        bold.fonts,
        [
            "Noto/NotoSans-Bold.ttf",
            "Noto/NotoSansArmenian-Regular.otf",
            "Noto/NotoSansThai-SemiBold.ttf",
        ]
    );

    for report in &reports {
        let root = output.join(&report.name);
        for file in [
            "Cargo.toml",
            "LICENSE",
            "README.md",
            "src/lib.rs",
            "src/chunks.rs",
        ] {
            assert!(root.join(file).is_file(), "{}: {file}", report.name);
        }

        let (manifest, words) = read_chunks(&root);
        assert_eq!(manifest, report.manifest);
        assert!(words.len() > 1, "expected several chunks");
        let slices: Vec<&[u64]> = words.iter().map(Vec::as_slice).collect();
        let collection = font_pack::chunk::decode(&slices, &manifest).unwrap();
        assert_eq!(collection.len(), report.merged_len);

        let expected: Vec<Vec<u8>> = report.fonts.iter().map(|name| make_font(name)).collect();
        let expected: Vec<&[u8]> = expected.iter().map(Vec::as_slice).collect();
        let mut merged = Vec::new();
        otc_merge::merge(&expected, &mut merged).unwrap();
        assert_eq!(collection, merged);
        assert_eq!(member_names(&collection), report.fonts);
    }

    let cargo_toml = fs::read_to_string(output.join("tinysans/Cargo.toml")).unwrap();
    assert!(cargo_toml.contains("version = \"1.2.3\""), "{cargo_toml}");
    assert!(cargo_toml.contains("brotli-decompressor"), "{cargo_toml}");
}

#[test]
fn runs_are_repeatable() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("fonts.zip");
    write_archive(&archive);
    let plan = Plan::from_toml(PLAN).unwrap();

    let first = dir.path().join("first");
    let second = dir.path().join("second");
    font_pack::run(&archive, &first, &plan, &Options::default()).unwrap();
    font_pack::run(
        &archive,
        &second,
        &plan,
        &Options {
            jobs: Some(1),
            verify: false,
        },
    )
    .unwrap();

    for file in ["src/chunks.rs", "src/chunks/chunk0.rs", "src/lib.rs"] {
        let a = fs::read(first.join("tinysans").join(file)).unwrap();
        let b = fs::read(second.join("tinysans").join(file)).unwrap();
        assert!(a == b, "{file} differs between runs");
    }
}

#[test]
fn missing_family_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("fonts.zip");
    write_archive(&archive);
    let plan = Plan::from_toml(
        r#"
        [[package]]
        name = "mono"
        family = "SansMono"
        "#,
    )
    .unwrap();
    let output = dir.path().join("out");
    let err = font_pack::run(&archive, &output, &plan, &Options::default()).unwrap_err();
    assert!(
        matches!(err, font_pack::Error::EmptyPackage { ref package } if package == "mono"),
        "{err}"
    );
}
