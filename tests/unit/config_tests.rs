// Configuration unit tests

use tilemark::config::*;

#[test]
fn test_watermark_section_defaults() {
    let config: Config = serde_yaml::from_str("watermark:\n  text: \"Hello\"\n").unwrap();
    assert_eq!(config.watermark.text, "Hello");
    assert_eq!(config.watermark.color_hex, "#000000");
    assert!((config.watermark.alpha - 0.1).abs() < f32::EPSILON);
    assert!((config.watermark.angle_degrees + 35.0).abs() < f32::EPSILON);
    assert!((config.watermark.spacing_factor - 4.0).abs() < f32::EPSILON);
    assert!((config.watermark.size_factor - 1.5).abs() < f32::EPSILON);
    assert!(!config.watermark.outline);
}

#[test]
fn test_unknown_log_format_is_rejected() {
    let result = Config::from_yaml_with_env("logging:\n  format: xml\n");
    assert!(result.is_err());
}

#[test]
fn test_alpha_out_of_range_fails_validation() {
    let config = Config::from_yaml_with_env("watermark:\n  alpha: 1.5\n").unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_environment_probe_defaults_to_desktop() {
    let config = Config::default();
    let probe = config.export.probe();
    assert!(probe.has_object_url);
    assert_eq!(probe.location_protocol, "https:");
}

#[test]
fn test_config_serializes_back_to_yaml() {
    let config = Config::default();
    let yaml = serde_yaml::to_string(&config).unwrap();
    let parsed = Config::from_yaml_with_env(&yaml).unwrap();
    assert_eq!(parsed.watermark, config.watermark);
    assert_eq!(parsed.export.output_dir, config.export.output_dir);
}
