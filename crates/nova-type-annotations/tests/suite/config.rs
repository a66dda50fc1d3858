use nova_type_annotations::{
    json_schema, ConfigError, ConfigWarning, JavaLanguageLevel, TypeAnnotationConfig,
};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

#[test]
fn reports_unknown_keys() {
    let text = r#"
release = 17
strict = true

[parallel]
thread = 4
"#;
    let (config, diagnostics) = TypeAnnotationConfig::load_from_str_with_diagnostics(text)
        .expect("config should parse");

    assert_eq!(config.release, 17);
    assert_eq!(config.parallel.threads, None);
    assert_eq!(
        diagnostics.unknown_keys,
        vec!["parallel.thread".to_string(), "strict".to_string()]
    );
    assert!(diagnostics.warnings.is_empty());
}

#[test]
fn source_is_an_alias_for_release() {
    let (config, diagnostics) =
        TypeAnnotationConfig::load_from_str_with_diagnostics("source = 8\n")
            .expect("config should parse");
    assert!(diagnostics.is_empty());
    assert_eq!(config.language_level(), JavaLanguageLevel::JAVA_8);
}

#[test]
fn preview_flag_is_not_a_setting() {
    let (config, diagnostics) =
        TypeAnnotationConfig::load_from_str_with_diagnostics("release = 7\nenable_preview = true\n")
            .expect("config should parse");
    assert_eq!(diagnostics.unknown_keys, vec!["enable_preview".to_string()]);
    assert_eq!(config.language_level(), JavaLanguageLevel::JAVA_7);
    assert!(!config.language_level().supports_type_annotations());
}

#[test]
fn ancient_release_is_a_warning() {
    let (config, diagnostics) =
        TypeAnnotationConfig::load_from_str_with_diagnostics("release = 6\n").expect("parses");
    assert_eq!(config.release, 6);
    assert_eq!(
        diagnostics.warnings,
        vec![ConfigWarning::InvalidValue {
            toml_path: "release".to_string(),
            message: "Java 6 is older than the oldest supported release (7)".to_string(),
        }]
    );
}

#[test]
fn loads_from_disk() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("type-annotations.toml");
    std::fs::write(&path, "release = 11\n[parallel]\nenabled = false\n").expect("write config");

    let config = TypeAnnotationConfig::load_from_path(&path).expect("load config");
    assert_eq!(config.release, 11);
    assert!(!config.parallel.enabled);

    let (_, diagnostics) =
        TypeAnnotationConfig::load_from_path_with_diagnostics(&path).expect("load config");
    assert!(diagnostics.is_empty());
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("missing.toml");

    let err = TypeAnnotationConfig::load_from_path(&path).expect_err("file does not exist");
    match err {
        ConfigError::Io { path: reported, .. } => {
            assert_eq!(reported, path.display().to_string());
        }
        other => panic!("expected an io error, got {other:?}"),
    }
}

#[test]
fn wrong_value_type_is_a_toml_error() {
    let err = TypeAnnotationConfig::load_from_str_with_diagnostics("release = \"x\"\n")
        .expect_err("release must be an integer");
    assert!(matches!(err, ConfigError::Toml(_)), "{err:?}");
    assert!(err.to_string().starts_with("failed to parse toml config"), "{err}");
}

#[test]
fn schema_rejects_unknown_fields() {
    let schema = serde_json::to_value(json_schema()).expect("schema serializes");
    let properties = schema["properties"].as_object().expect("properties");
    for key in ["release", "parallel"] {
        assert!(properties.contains_key(key), "missing {key}");
    }
    assert!(!properties.contains_key("enable_preview"));
    assert_eq!(schema["additionalProperties"], serde_json::Value::Bool(false));
}
