use card_atlas_core::error::AtlasError;
use card_atlas_core::prelude::*;
use image::{Rgba, RgbaImage};
use std::fs;
use std::path::Path;

fn write_png(path: &Path, w: u32, h: u32) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    RgbaImage::from_pixel(w, h, Rgba([10, 20, 30, 255]))
        .save(path)
        .unwrap();
}

fn summary(records: &[ImageRecord]) -> Vec<(String, bool, MatchPattern)> {
    records
        .iter()
        .map(|r| (r.key(), r.prescaled, r.pattern))
        .collect()
}

#[test]
fn all_four_patterns() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_png(&root.join("Jokers/Joker/Joker.png"), 4, 4);
    write_png(&root.join("Jokers/Wildcard/Wildcard/red.png"), 4, 4);
    write_png(&root.join("Jokers/Wildcard/Wildcard/blue.png"), 4, 4);
    write_png(&root.join("Jokers/Hires/2x/Hires.png"), 8, 8);
    write_png(&root.join("Jokers/Suits/2x/Suits/spade.png"), 8, 8);
    // Not a png: ignored by the variant pattern.
    fs::write(root.join("Jokers/Wildcard/Wildcard/notes.txt"), "x").unwrap();

    let cfg = GeneratorConfig::default();
    let records = discover_images(root, "Jokers", 2, &cfg).expect("discover");
    assert_eq!(
        summary(&records),
        vec![
            ("Hires".to_string(), true, MatchPattern::PrescaledPlain),
            ("Joker".to_string(), false, MatchPattern::Plain),
            ("Suits/spade".to_string(), true, MatchPattern::PrescaledVariants),
            ("Wildcard/blue".to_string(), false, MatchPattern::Variants),
            ("Wildcard/red".to_string(), false, MatchPattern::Variants),
        ]
    );
    assert!(records.iter().all(|r| r.scale == 2 && r.atlas_name == "Jokers"));

    // Prescaled folders for another scale are invisible at 1x.
    let at_1x = discover_images(root, "Jokers", 1, &cfg).expect("discover");
    let keys: Vec<String> = at_1x.iter().map(ImageRecord::key).collect();
    assert_eq!(keys, ["Joker", "Wildcard/blue", "Wildcard/red"]);
}

#[test]
fn unmatched_items_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_png(&root.join("Jokers/Joker/Joker.png"), 4, 4);
    write_png(&root.join("Jokers/Misnamed/Other.png"), 4, 4);
    fs::create_dir_all(root.join("Jokers/Empty")).unwrap();

    let records = discover_images(root, "Jokers", 1, &GeneratorConfig::default()).unwrap();
    let keys: Vec<String> = records.iter().map(ImageRecord::key).collect();
    assert_eq!(keys, ["Joker"]);
}

#[test]
fn prescaled_image_replaces_scaled_source() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_png(&root.join("Jokers/Joker/Joker.png"), 4, 4);
    write_png(&root.join("Jokers/Joker/2x/Joker.png"), 8, 8);
    write_png(&root.join("Jokers/Wild/Wild/red.png"), 4, 4);
    write_png(&root.join("Jokers/Wild/Wild/blue.png"), 4, 4);
    write_png(&root.join("Jokers/Wild/2x/Wild/red.png"), 8, 8);

    // By default both Joker files take a cell at 2x.
    let kept = discover_images(root, "Jokers", 2, &GeneratorConfig::default()).unwrap();
    assert_eq!(kept.len(), 5);

    let prefer = GeneratorConfig::builder()
        .duplicate_policy(DuplicatePolicy::PreferPrescaled)
        .build();
    let at_2x = discover_images(root, "Jokers", 2, &prefer).expect("override is not a duplicate");
    assert_eq!(
        summary(&at_2x),
        vec![
            ("Joker".to_string(), true, MatchPattern::PrescaledPlain),
            ("Wild/blue".to_string(), false, MatchPattern::Variants),
            ("Wild/red".to_string(), true, MatchPattern::PrescaledVariants),
        ]
    );
    assert!(at_2x[0].path.ends_with("2x/Joker.png"));

    let at_1x = discover_images(root, "Jokers", 1, &prefer).unwrap();
    let keys_1x: Vec<String> = at_1x.iter().map(ImageRecord::key).collect();
    let keys_2x: Vec<String> = at_2x.iter().map(ImageRecord::key).collect();
    assert_eq!(keys_1x, keys_2x);
}

#[test]
fn duplicate_matches_are_kept_or_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_png(&root.join("Jokers/Joker/Joker.png"), 4, 4);
    write_png(&root.join("Jokers/Joker/Joker/red.png"), 4, 4);

    let warn = GeneratorConfig::default();
    let records = discover_images(root, "Jokers", 1, &warn).unwrap();
    assert_eq!(
        summary(&records),
        vec![
            ("Joker".to_string(), false, MatchPattern::Plain),
            ("Joker/red".to_string(), false, MatchPattern::Variants),
        ]
    );

    let reject = GeneratorConfig::builder()
        .duplicate_policy(DuplicatePolicy::Reject)
        .build();
    match discover_images(root, "Jokers", 1, &reject) {
        Err(AtlasError::DuplicateMatch { atlas, item }) => {
            assert_eq!(atlas, "Jokers");
            assert_eq!(item, "Joker");
        }
        other => panic!("expected DuplicateMatch, got {:?}", other),
    }
}

#[cfg(unix)]
#[test]
fn symlinked_directories_are_followed() {
    use std::os::unix::fs::symlink;

    let dir = tempfile::tempdir().unwrap();
    let shared = dir.path().join("shared");
    write_png(&shared.join("Joker/Joker.png"), 4, 4);
    write_png(&shared.join("Tarots/Fool/Fool.png"), 4, 4);

    let root = dir.path().join("uncombined");
    fs::create_dir_all(root.join("Jokers")).unwrap();
    symlink(shared.join("Joker"), root.join("Jokers/Joker")).unwrap();
    symlink(shared.join("Tarots"), root.join("Tarots")).unwrap();

    let names = list_atlases(&root, ItemOrder::NameAsc).unwrap();
    assert_eq!(names, ["Jokers", "Tarots"]);
    let cfg = GeneratorConfig::default();
    let jokers = discover_images(&root, "Jokers", 1, &cfg).unwrap();
    assert_eq!(jokers.len(), 1);
    assert_eq!(jokers[0].key(), "Joker");
    let tarots = discover_images(&root, "Tarots", 1, &cfg).unwrap();
    assert_eq!(tarots[0].key(), "Fool");
}

#[test]
fn atlases_are_listed_sorted() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    for name in ["Tarots", "Jokers", "Backs"] {
        fs::create_dir_all(root.join(name)).unwrap();
    }
    fs::write(root.join("README.txt"), "not an atlas").unwrap();
    let names = list_atlases(root, ItemOrder::NameAsc).unwrap();
    assert_eq!(names, ["Backs", "Jokers", "Tarots"]);

    let mut unsorted = list_atlases(root, ItemOrder::Filesystem).unwrap();
    unsorted.sort();
    assert_eq!(unsorted, names);
}

#[test]
fn missing_atlas_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = discover_images(dir.path(), "Nope", 1, &GeneratorConfig::default()).unwrap_err();
    assert!(matches!(err, AtlasError::Io(_)));
}
