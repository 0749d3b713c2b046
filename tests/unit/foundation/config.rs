use super::*;

#[test]
fn defaults_validate() {
    let cfg = CompositorConfig::default();
    cfg.validate().unwrap();
    assert_eq!((cfg.canvas_width, cfg.canvas_height), (1024, 1024));
    assert!(cfg.background.hard_coverage_floor < cfg.background.soft_coverage_floor);
}

#[test]
fn partial_json_keeps_defaults() {
    let cfg = CompositorConfig::from_json_str(
        r#"{ "merge_radius": 4, "background": { "brightness_threshold": 200 } }"#,
    )
    .unwrap();
    assert_eq!(cfg.merge_radius, 4);
    assert_eq!(cfg.background.brightness_threshold, 200);
    assert_eq!(cfg.background.corner_sample_size, 10);
    assert_eq!(cfg.canvas_width, 1024);
}

#[test]
fn unknown_fields_are_rejected() {
    assert!(CompositorConfig::from_json_str(r#"{ "merge_radiuss": 4 }"#).is_err());
}

#[test]
fn validation_rejects_bad_values() {
    let mut cfg = CompositorConfig {
        canvas_width: 0,
        ..CompositorConfig::default()
    };
    assert!(cfg.validate().is_err());

    cfg = CompositorConfig::default();
    cfg.background.hard_coverage_floor = 0.5;
    cfg.background.soft_coverage_floor = 0.1;
    assert!(cfg.validate().is_err());

    cfg = CompositorConfig::default();
    cfg.background.soft_coverage_floor = 1.5;
    assert!(cfg.validate().is_err());
}

#[test]
fn oversized_radii_are_rejected() {
    let err = CompositorConfig::from_json_str(r#"{ "merge_radius": 4294967295 }"#).unwrap_err();
    assert!(matches!(err, CompositorError::Validation(_)));

    let at_limit = CompositorConfig {
        canvas_width: 64,
        canvas_height: 128,
        merge_radius: 128,
        ..CompositorConfig::default()
    };
    at_limit.validate().unwrap();
    let over = CompositorConfig {
        merge_radius: 129,
        ..at_limit.clone()
    };
    assert!(over.validate().is_err());

    let feather = CompositorConfig {
        max_source_dim: 32,
        feather_radius: 33,
        ..CompositorConfig::default()
    };
    assert!(matches!(
        feather.validate().unwrap_err(),
        CompositorError::Validation(_)
    ));
}
