// Configuration file round trip through the filesystem

use tempfile::TempDir;
use tilemark::config::{Config, LogFormat};

#[test]
fn test_config_file_with_env_substitution() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tilemark.yaml");
    std::env::set_var("TILEMARK_IT_OUTPUT", "/tmp/tilemark-it");
    std::fs::write(
        &path,
        r#"
watermark:
  text: "Confidential"
  angle: -45
export:
  output_dir: "${TILEMARK_IT_OUTPUT}"
logging:
  format: json
"#,
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();
    config.validate().unwrap();
    assert_eq!(config.watermark.text, "Confidential");
    assert_eq!(config.export.output_dir.to_str(), Some("/tmp/tilemark-it"));
    assert_eq!(config.logging.format, LogFormat::Json);
    std::env::remove_var("TILEMARK_IT_OUTPUT");
}
