use card_atlas_core::error::AtlasError;
use card_atlas_core::prelude::*;

fn invalid(cfg: GeneratorConfig) -> String {
    match cfg.validate() {
        Err(AtlasError::InvalidConfig(msg)) => msg,
        other => panic!("expected InvalidConfig, got {:?}", other),
    }
}

#[test]
fn defaults_are_valid() {
    let cfg = GeneratorConfig::default();
    cfg.validate().expect("defaults");
    assert_eq!(cfg.max_grid_width, 8);
    assert_eq!(cfg.scales, [2, 1]);
    assert_eq!(cfg.base_scale, 1);
    assert_eq!(cfg.item_order, ItemOrder::NameAsc);
    assert_eq!(cfg.cell_size_policy, CellSizePolicy::Strict);
    assert_eq!(cfg.duplicate_policy, DuplicatePolicy::Warn);
    assert_eq!(cfg.resize_filter, ResizeFilter::CatmullRom);
}

#[test]
fn rejects_bad_parameters() {
    assert!(invalid(GeneratorConfig::builder().max_grid_width(0).build()).contains("max_grid_width"));
    assert!(invalid(GeneratorConfig::builder().scales(Vec::<u32>::new()).build()).contains("no scales"));
    assert!(invalid(GeneratorConfig::builder().scales([1, 0]).build()).contains("scale 0"));
    assert!(invalid(GeneratorConfig::builder().scales([1, 2, 1]).build()).contains("more than once"));
    assert!(invalid(GeneratorConfig::builder().scales([3, 2]).build()).contains("base_scale"));
}

#[test]
fn builder_sets_every_field() {
    let cfg = GeneratorConfig::builder()
        .max_grid_width(4)
        .scales([3, 1])
        .base_scale(3)
        .item_order(ItemOrder::Filesystem)
        .cell_size_policy(CellSizePolicy::FirstImage)
        .duplicate_policy(DuplicatePolicy::Reject)
        .resize_filter(ResizeFilter::Nearest)
        .outlines(true)
        .generator_name("make atlases")
        .dry_run(true)
        .build();
    cfg.validate().expect("valid");
    assert_eq!(cfg.max_grid_width, 4);
    assert_eq!(cfg.scales, [3, 1]);
    assert_eq!(cfg.base_scale, 3);
    assert_eq!(cfg.item_order, ItemOrder::Filesystem);
    assert_eq!(cfg.cell_size_policy, CellSizePolicy::FirstImage);
    assert_eq!(cfg.duplicate_policy, DuplicatePolicy::Reject);
    assert_eq!(cfg.resize_filter, ResizeFilter::Nearest);
    assert!(cfg.outlines && cfg.dry_run);
    assert_eq!(cfg.generator_name, "make atlases");
}

#[test]
fn enums_parse_case_insensitively() {
    assert_eq!("Name_Asc".parse::<ItemOrder>(), Ok(ItemOrder::NameAsc));
    assert_eq!("fs".parse::<ItemOrder>(), Ok(ItemOrder::Filesystem));
    assert_eq!("FIRST_IMAGE".parse::<CellSizePolicy>(), Ok(CellSizePolicy::FirstImage));
    assert_eq!("reject".parse::<DuplicatePolicy>(), Ok(DuplicatePolicy::Reject));
    assert_eq!(
        "Prefer_Prescaled".parse::<DuplicatePolicy>(),
        Ok(DuplicatePolicy::PreferPrescaled)
    );
    assert_eq!("bicubic".parse::<ResizeFilter>(), Ok(ResizeFilter::CatmullRom));
    assert_eq!("lanczos".parse::<ResizeFilter>(), Ok(ResizeFilter::Lanczos3));
    assert!("sideways".parse::<ItemOrder>().is_err());
    assert!("maybe".parse::<CellSizePolicy>().is_err());
}

#[test]
fn partial_json_config_uses_defaults() {
    let cfg: GeneratorConfig =
        serde_json::from_str(r#"{"scales": [4, 2, 1], "cell_size_policy": "first_image"}"#)
            .expect("parse");
    assert_eq!(cfg.scales, [4, 2, 1]);
    assert_eq!(cfg.base_scale, 1);
    assert_eq!(cfg.max_grid_width, 8);
    assert_eq!(cfg.cell_size_policy, CellSizePolicy::FirstImage);
    assert_eq!(cfg.generator_name, "card-atlas generate");
}
