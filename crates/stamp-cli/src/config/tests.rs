#[cfg(test)]
mod tests {
    use crate::cli::{CodeMode, ContextArgs, PresetName};
    use crate::config::loading::camel_case;
    use crate::config::*;
    use crate::error::{CliError, ConfigError};
    use serial_test::serial;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn args(root: &TempDir) -> ContextArgs {
        ContextArgs {
            root: root.path().to_path_buf(),
            ..ContextArgs::default()
        }
    }

    #[test]
    fn camel_case_env_keys() {
        assert_eq!(camel_case("MAX_NODES"), "maxNodes");
        assert_eq!(camel_case("DEPTH"), "depth");
        assert_eq!(camel_case("STRICT_MISSING"), "strictMissing");
        assert_eq!(camel_case("CLI__DIRS"), "cliDirs");
    }

    #[test]
    fn serialization_shape() {
        let json = serde_json::to_value(StampConfig::default()).unwrap();
        assert_eq!(json["maxNodes"], 100);
        assert_eq!(json["includeCode"], "header");
        assert_eq!(json["preset"], "none");
        assert!(json.get("outDir").is_none());
        assert!(json.get("secretsReport").is_none());
        assert!(json.get("max_nodes").is_none());

        let preset = serde_json::to_value(PresetName::SubmitOnly).unwrap();
        assert_eq!(preset, "submit-only");
    }

    #[test]
    fn validation_rejects_zero_budgets() {
        let zero_nodes = StampConfig {
            max_nodes: 0,
            ..StampConfig::default()
        };
        let err = zero_nodes.validate().unwrap_err();
        assert!(matches!(err, CliError::Config(ConfigError::InvalidValue { ref field, .. }) if field == "maxNodes"));

        let zero_concurrency = StampConfig {
            concurrency: 0,
            ..StampConfig::default()
        };
        assert!(zero_concurrency.validate().is_err());

        let dotted = StampConfig {
            extensions: vec![".tsx".into()],
            ..StampConfig::default()
        };
        assert!(dotted.validate().is_err());

        assert!(StampConfig::default().validate().is_ok());
    }

    #[test]
    #[serial]
    fn defaults_without_config_file() {
        let dir = TempDir::new().unwrap();
        let config = StampConfig::load(&args(&dir)).unwrap();
        assert_eq!(config, StampConfig::default());
    }

    #[test]
    #[serial]
    fn flags_override_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{ "depth": 4, "maxNodes": 10, "includeCode": "none", "cliDirs": ["tools"] }"#,
        )
        .unwrap();

        let from_file = StampConfig::load(&args(&dir)).unwrap();
        assert_eq!(from_file.depth, 4);
        assert_eq!(from_file.max_nodes, 10);
        assert_eq!(from_file.include_code, CodeMode::None);
        assert_eq!(from_file.cli_dirs, vec!["tools"]);

        let overridden = StampConfig::load(&ContextArgs {
            depth: Some(1),
            include_code: Some(CodeMode::Full),
            strict_missing: true,
            ..args(&dir)
        })
        .unwrap();
        assert_eq!(overridden.depth, 1);
        assert_eq!(overridden.max_nodes, 10);
        assert_eq!(overridden.include_code, CodeMode::Full);
        assert!(overridden.strict_missing);
    }

    #[test]
    #[serial]
    fn environment_sits_between_file_and_flags() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), r#"{ "maxNodes": 10 }"#).unwrap();
        unsafe { std::env::set_var("STAMP_MAX_NODES", "7") };

        let from_env = StampConfig::load(&args(&dir));
        let from_flag = StampConfig::load(&ContextArgs {
            max_nodes: Some(3),
            ..args(&dir)
        });
        unsafe { std::env::remove_var("STAMP_MAX_NODES") };

        assert_eq!(from_env.unwrap().max_nodes, 7);
        assert_eq!(from_flag.unwrap().max_nodes, 3);
    }

    #[test]
    #[serial]
    fn missing_explicit_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = StampConfig::load(&ContextArgs {
            config: Some(PathBuf::from("does/not/exist.json")),
            ..args(&dir)
        })
        .unwrap_err();
        assert!(matches!(err, CliError::Config(ConfigError::NotFound(_))));
    }

    #[test]
    #[serial]
    fn unknown_fields_are_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), r#"{ "maxNode": 3 }"#).unwrap();
        let err = StampConfig::load(&args(&dir)).unwrap_err();
        assert!(err.to_string().contains("maxNode"), "{err}");
    }

    #[test]
    #[serial]
    fn invalid_values_fail_validation_after_merge() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), r#"{ "concurrency": 0 }"#).unwrap();
        assert!(StampConfig::load(&args(&dir)).is_err());
    }

    #[test]
    fn options_follow_config() {
        let config = StampConfig {
            depth: 3,
            include_code: CodeMode::Full,
            preset: PresetName::DisplayOnly,
            cli_dirs: vec!["tools".into()],
            ..StampConfig::default()
        };
        let options = config.context_options();
        assert_eq!(options.budget.depth, 3);
        assert_eq!(options.budget.include_code, stamp_core::CodeInclusion::Full);
        assert_eq!(options.preset, stamp_core::Preset::DisplayOnly);
        assert_eq!(options.extract.cli_dirs, vec!["tools"]);
    }

    #[test]
    fn schema_lists_fields() {
        let schema = StampConfig::json_schema();
        let properties = &schema["properties"];
        assert!(properties.get("maxNodes").is_some());
        assert!(properties.get("includeCode").is_some());
        assert!(properties.get("secretsReport").is_some());
    }
}
