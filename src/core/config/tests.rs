use super::data::{Config, Persona};
use super::io::ConfigError;
use super::store::ConfigStore;
use tempfile::TempDir;

fn sample_config() -> Config {
    Config {
        default_persona: Some("dev".to_string()),
        personas: vec![
            Persona::new("dev", "http://localhost:11434/api", "llama3", None),
            Persona::new(
                "poet",
                "http://gpu.lan:11434/api",
                "mistral",
                Some("Answer in verse.".to_string()),
            ),
        ],
    }
}

#[test]
fn missing_file_is_distinct_from_malformed() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");

    let err = Config::load_from_path(&config_path).expect_err("missing file should error");
    assert!(err.is_missing());

    std::fs::write(&config_path, "personas = [ this is not toml").unwrap();
    let err = Config::load_from_path(&config_path).expect_err("garbage should error");
    assert!(matches!(err, ConfigError::Parse { .. }), "{err}");
    assert!(!err.is_missing());
}

#[test]
fn save_then_load_preserves_personas_in_order() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nested").join("config.toml");

    let config = sample_config();
    config.save_to_path(&config_path).expect("save failed");

    let loaded = Config::load_from_path(&config_path).expect("load failed");
    assert_eq!(loaded, config);
    assert_eq!(loaded.personas[0].name, "dev");
    assert_eq!(loaded.personas[1].system_prompt(), Some("Answer in verse."));
}

#[test]
fn parses_hand_written_file() {
    let contents = r#"
default_persona = "dev"

[[personas]]
name = "dev"
api_url = "http://localhost:11434/api"
model = "llama3"

[[personas]]
name = "blank"
api_url = "http://localhost:11434/api"
system_prompt = "   "
"#;
    let config: Config = toml::from_str(contents).expect("parse failed");
    assert_eq!(config.personas.len(), 2);
    assert_eq!(config.find_persona("dev").unwrap().model, "llama3");

    let blank = config.find_persona("blank").unwrap();
    assert_eq!(blank.model, "");
    assert_eq!(blank.system_prompt(), None);
}

#[test]
fn unset_default_is_omitted_when_saved() {
    let config = Config {
        default_persona: None,
        personas: vec![Persona::new("a", "http://x/api", "m", None)],
    };
    let text = toml::to_string_pretty(&config).unwrap();
    assert!(!text.contains("default_persona"));
    assert!(!text.contains("system_prompt"));
}

#[test]
fn config_store_detects_external_updates() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    let store = ConfigStore::new(config_path.clone());

    assert!(store.load().expect_err("nothing on disk yet").is_missing());

    store.persist(&sample_config()).expect("persist failed");
    let first = store.load().expect("first load failed");
    assert_eq!(first.default_persona.as_deref(), Some("dev"));

    let external = Config {
        default_persona: Some("poet".to_string()),
        ..sample_config()
    };
    external
        .save_to_path(&config_path)
        .expect("external save failed");

    let reloaded = store.load().expect("reload failed");
    assert_eq!(reloaded.default_persona.as_deref(), Some("poet"));
}

#[test]
fn config_store_reports_deleted_file_as_missing() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    let store = ConfigStore::new(config_path.clone());

    store.persist(&sample_config()).expect("persist failed");
    std::fs::remove_file(&config_path).unwrap();

    assert!(store.load().expect_err("file was removed").is_missing());
}

#[test]
fn config_store_rereads_edits_that_keep_the_mtime() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    let store = ConfigStore::new(config_path.clone());

    store.persist(&sample_config()).expect("persist failed");
    store.load().expect("first load failed");
    let mtime = std::fs::metadata(&config_path).unwrap().modified().unwrap();

    let edited = std::fs::read_to_string(&config_path)
        .unwrap()
        .replace("llama3", "EDITED");
    std::fs::write(&config_path, edited).unwrap();
    std::fs::File::options()
        .write(true)
        .open(&config_path)
        .unwrap()
        .set_modified(mtime)
        .unwrap();

    let reloaded = store.load().expect("reload failed");
    assert_eq!(reloaded.find_persona("dev").unwrap().model, "EDITED");
}
