use std::fs;

use appspack::{build_archive, discover_inputs, open_archive, BuildOptions, DiscoveryOrder, DEFAULT_CAPACITY};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tempfile::TempDir;

/// Writes `n` object files of random length and content, plus some noise
fn populate(dir: &TempDir, n: usize, seed: u64) -> Vec<(String, Vec<u8>)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut files = Vec::new();

    for i in 0..n {
        let mut contents = vec![0u8; rng.gen_range(0..4096)];
        rng.fill(&mut contents[..]);

        let name = format!("app{i:02}.o");
        fs::write(dir.path().join(&name), &contents).unwrap();
        files.push((name, contents));
    }
    fs::write(dir.path().join("Makefile"), b"all:\n").unwrap();
    fs::write(dir.path().join("app.o.d"), b"app.o: app.c\n").unwrap();

    files
}

#[test]
fn every_payload_comes_back() {
    let dir = TempDir::new().unwrap();
    let files = populate(&dir, 17, 0x5eed);
    let out = dir.path().join("apps.bin");

    let inputs = discover_inputs(dir.path(), DiscoveryOrder::Sorted).unwrap();
    let index = build_archive(&inputs, &out, DEFAULT_CAPACITY).unwrap();
    assert_eq!(index.count(), 17);

    let mut reader = open_archive(&out).unwrap();
    assert_eq!(reader.index(), &index);
    assert_eq!(reader.archive_len(), DEFAULT_CAPACITY);

    for (i, (_name, contents)) in files.iter().enumerate() {
        assert_eq!(&reader.read_entry(i).unwrap(), contents);
    }
}

#[test]
fn listing_order_matches_index_order() {
    let dir = TempDir::new().unwrap();
    let files = populate(&dir, 5, 7);
    let out = dir.path().join("apps.bin");

    let inputs = discover_inputs(dir.path(), DiscoveryOrder::Listing).unwrap();
    build_archive(&inputs, &out, DEFAULT_CAPACITY).unwrap();

    let mut reader = open_archive(&out).unwrap();
    for (i, input) in inputs.iter().enumerate() {
        let name = input.file_name().unwrap().to_str().unwrap();
        let (_, contents) = files.iter().find(|(n, _)| n == name).unwrap();
        assert_eq!(&reader.read_entry(i).unwrap(), contents);
    }
}

#[test]
fn rebuilding_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    populate(&dir, 9, 42);
    fs::create_dir(dir.path().join("output")).unwrap();

    let options = BuildOptions {
        source_dir: dir.path().to_owned(),
        output: dir.path().join("output/apps.bin"),
        capacity: 1 << 16,
        order: DiscoveryOrder::Sorted,
    };

    options.run().unwrap();
    let first = fs::read(&options.output).unwrap();
    options.run().unwrap();
    let second = fs::read(&options.output).unwrap();

    assert_eq!(first.len(), 1 << 16);
    assert!(first == second);
}

#[test]
fn no_objects_gives_a_zero_count() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("main.c"), b"int main;").unwrap();
    fs::create_dir(dir.path().join("output")).unwrap();

    let options = BuildOptions {
        source_dir: dir.path().to_owned(),
        output: dir.path().join("output/apps.bin"),
        ..BuildOptions::default()
    };
    let index = options.run().unwrap();
    assert_eq!(index.count(), 0);

    let reader = open_archive(&options.output).unwrap();
    assert!(reader.is_empty());
    assert_eq!(reader.archive_len(), DEFAULT_CAPACITY);
}
