mod common;

use std::fs;
use std::path::PathBuf;

use bincache_core::cache::BinaryCache;
use bincache_core::model::RequiredBinaries;
use bincache_core::services::elf::ElfInspector;
use bincache_core::services::sources::lib_dirs::build_filename_index;
use bincache_core::services::sources::{BinarySource, LibDirSource};
use bincache_core::CacheError;
use common::{fake_elf_bytes, write_fake_elf, FakeInspector};
use tempfile::tempdir;

const LIBFOO: &str = "/data/app/x/lib/libfoo.so";

fn required(entries: &[(&str, &str)]) -> RequiredBinaries {
    entries.iter().map(|(p, b)| (*p, *b)).collect()
}

#[test]
fn copies_by_file_name_and_build_id() {
    let temp = tempdir().unwrap();
    let lib_dir = temp.path().join("symbols");
    write_fake_elf(&lib_dir.join("debug").join("libfoo.so"), "id123", &[".symtab", ".debug_line"]);
    let cache = BinaryCache::new(temp.path().join("binary_cache"));

    let inspector = FakeInspector::new();
    let source = LibDirSource::new(&inspector, &[lib_dir]).unwrap();
    let report = source.collect(&required(&[(LIBFOO, "id123")]), &cache).unwrap();

    assert_eq!(report.collected, vec![LIBFOO.to_string()]);
    let cached = cache.path_in_cache(LIBFOO);
    assert_eq!(fs::read(cached).unwrap(), fake_elf_bytes("id123", &[".symtab", ".debug_line"]));
}

#[test]
fn never_reads_build_ids_of_unrelated_files() {
    let temp = tempdir().unwrap();
    let lib_dir = temp.path().join("symbols");
    write_fake_elf(&lib_dir.join("libbar.so"), "id999", &[]);
    write_fake_elf(&lib_dir.join("nested").join("libbaz.so"), "id998", &[]);
    write_fake_elf(&lib_dir.join("libfoo.so"), "id123", &[]);
    let cache = BinaryCache::new(temp.path().join("binary_cache"));

    let inspector = FakeInspector::new();
    let source = LibDirSource::new(&inspector, &[lib_dir]).unwrap();
    source.collect(&required(&[(LIBFOO, "id123")]), &cache).unwrap();

    assert_eq!(inspector.build_id_calls_for("libbar.so"), 0);
    assert_eq!(inspector.build_id_calls_for("libbaz.so"), 0);
    assert!(inspector.build_id_calls_for("libfoo.so") >= 1);
}

#[test]
fn build_id_mismatch_is_not_copied() {
    let temp = tempdir().unwrap();
    let lib_dir = temp.path().join("symbols");
    write_fake_elf(&lib_dir.join("libfoo.so"), "other", &[".debug_line"]);
    let cache = BinaryCache::new(temp.path().join("binary_cache"));

    let inspector = FakeInspector::new();
    let source = LibDirSource::new(&inspector, &[lib_dir]).unwrap();
    let report = source.collect(&required(&[(LIBFOO, "id123")]), &cache).unwrap();

    assert!(report.collected.is_empty());
    assert!(!cache.path_in_cache(LIBFOO).exists());
}

#[test]
fn shared_file_name_fills_every_matching_entry() {
    let temp = tempdir().unwrap();
    let lib_dir = temp.path().join("symbols");
    write_fake_elf(&lib_dir.join("arm64").join("libfoo.so"), "id64", &[]);
    write_fake_elf(&lib_dir.join("arm").join("libfoo.so"), "id32", &[]);
    let cache = BinaryCache::new(temp.path().join("binary_cache"));
    let binaries = required(&[
        ("/data/app/x/lib/arm64/libfoo.so", "id64"),
        ("/data/app/x/lib/arm/libfoo.so", "id32"),
    ]);

    let index = build_filename_index(&binaries);
    assert_eq!(index["libfoo.so"].len(), 2);

    let inspector = FakeInspector::new();
    let source = LibDirSource::new(&inspector, &[lib_dir]).unwrap();
    let report = source.collect(&binaries, &cache).unwrap();

    assert_eq!(report.collected.len(), 2);
    assert_eq!(inspector.build_id(&cache.path_in_cache("/data/app/x/lib/arm64/libfoo.so")), "id64");
    assert_eq!(inspector.build_id(&cache.path_in_cache("/data/app/x/lib/arm/libfoo.so")), "id32");
}

#[test]
fn less_stripped_copy_replaces_cached_one() {
    let temp = tempdir().unwrap();
    let cache = BinaryCache::new(temp.path().join("binary_cache"));
    let cached = cache.path_in_cache(LIBFOO);
    write_fake_elf(&cached, "id123", &[".symtab"]);
    let candidate = temp.path().join("libfoo.so");
    write_fake_elf(&candidate, "id123", &[".symtab", ".debug_line"]);

    let inspector = FakeInspector::new();
    let source = LibDirSource::new(&inspector, &[temp.path().to_path_buf()]).unwrap();
    assert!(source.need_to_copy(&candidate, &cached, "id123"));
}

#[test]
fn more_stripped_copy_never_replaces_cached_one() {
    let temp = tempdir().unwrap();
    let cache = BinaryCache::new(temp.path().join("binary_cache"));
    let cached = cache.path_in_cache(LIBFOO);
    write_fake_elf(&cached, "id123", &[".symtab", ".debug_line"]);
    let candidate = temp.path().join("libfoo.so");
    write_fake_elf(&candidate, "id123", &[".symtab"]);

    let inspector = FakeInspector::new();
    let source = LibDirSource::new(&inspector, &[temp.path().to_path_buf()]).unwrap();
    assert!(!source.need_to_copy(&candidate, &cached, "id123"));
    // Equal levels do not copy either.
    write_fake_elf(&candidate, "id123", &[".debug_line"]);
    assert!(!source.need_to_copy(&candidate, &cached, "id123"));
}

#[test]
fn wrong_cached_build_id_always_copies() {
    let temp = tempdir().unwrap();
    let cache = BinaryCache::new(temp.path().join("binary_cache"));
    let cached = cache.path_in_cache(LIBFOO);
    write_fake_elf(&cached, "stale", &[".symtab", ".debug_line"]);
    let candidate = temp.path().join("libfoo.so");
    write_fake_elf(&candidate, "id123", &[]);

    let inspector = FakeInspector::new();
    let source = LibDirSource::new(&inspector, &[temp.path().to_path_buf()]).unwrap();
    assert!(source.need_to_copy(&candidate, &cached, "id123"));
    assert!(source.need_to_copy(&candidate, &temp.path().join("absent.so"), "id123"));
}

#[test]
fn later_directory_upgrades_earlier_match() {
    let temp = tempdir().unwrap();
    let stripped_dir = temp.path().join("stripped");
    let debug_dir = temp.path().join("debug");
    write_fake_elf(&stripped_dir.join("libfoo.so"), "id123", &[]);
    write_fake_elf(&debug_dir.join("libfoo.so"), "id123", &[".symtab", ".debug_line"]);
    let cache = BinaryCache::new(temp.path().join("binary_cache"));

    let inspector = FakeInspector::new();
    let source = LibDirSource::new(&inspector, &[stripped_dir, debug_dir]).unwrap();
    let report = source.collect(&required(&[(LIBFOO, "id123")]), &cache).unwrap();

    assert_eq!(report.collected, vec![LIBFOO.to_string()]);
    assert!(report.reused.is_empty());
    assert_eq!(
        fs::read(cache.path_in_cache(LIBFOO)).unwrap(),
        fake_elf_bytes("id123", &[".symtab", ".debug_line"])
    );
}

#[test]
fn missing_directory_is_a_configuration_error() {
    let temp = tempdir().unwrap();
    let present = temp.path().to_path_buf();
    let missing = temp.path().join("does-not-exist");
    let inspector = FakeInspector::new();

    let err = LibDirSource::new(&inspector, &[present, missing.clone()]).err().expect("error");
    match err {
        CacheError::MissingSearchDir(dir) => assert_eq!(dir, missing),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn source_reports_its_directories() {
    let temp = tempdir().unwrap();
    let inspector = FakeInspector::new();
    let dirs: Vec<PathBuf> = vec![temp.path().to_path_buf()];
    let source = LibDirSource::new(&inspector, &dirs).unwrap();
    assert_eq!(source.lib_dirs(), dirs.as_slice());
    assert_eq!(source.name(), "lib-dirs");
}

#[cfg(unix)]
#[test]
fn symlinked_libraries_are_followed() {
    let temp = tempdir().unwrap();
    let out_dir = temp.path().join("build").join("out");
    write_fake_elf(&out_dir.join("libfoo.so.1"), "id123", &[".debug_line"]);
    let lib_dir = temp.path().join("symbols");
    fs::create_dir_all(&lib_dir).unwrap();
    std::os::unix::fs::symlink(out_dir.join("libfoo.so.1"), lib_dir.join("libfoo.so")).unwrap();
    let cache = BinaryCache::new(temp.path().join("binary_cache"));

    let inspector = FakeInspector::new();
    let source = LibDirSource::new(&inspector, &[lib_dir]).unwrap();
    let report = source.collect(&required(&[(LIBFOO, "id123")]), &cache).unwrap();

    assert_eq!(report.collected, vec![LIBFOO.to_string()]);
    let cached = cache.path_in_cache(LIBFOO);
    assert!(cached.is_file());
    assert!(!fs::symlink_metadata(&cached).unwrap().file_type().is_symlink());
    assert_eq!(fs::read(cached).unwrap(), fake_elf_bytes("id123", &[".debug_line"]));
}

#[cfg(unix)]
#[test]
fn dangling_symlinks_are_ignored() {
    let temp = tempdir().unwrap();
    let lib_dir = temp.path().join("symbols");
    fs::create_dir_all(&lib_dir).unwrap();
    std::os::unix::fs::symlink(temp.path().join("gone.so"), lib_dir.join("libfoo.so")).unwrap();
    let cache = BinaryCache::new(temp.path().join("binary_cache"));

    let inspector = FakeInspector::new();
    let source = LibDirSource::new(&inspector, &[lib_dir]).unwrap();
    let report = source.collect(&required(&[(LIBFOO, "")]), &cache).unwrap();

    assert!(report.collected.is_empty());
    assert_eq!(inspector.build_id_calls_for("libfoo.so"), 0);
}
