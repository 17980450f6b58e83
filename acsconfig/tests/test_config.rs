use acsconfig::Config;
use std::fs;
use tempfile::TempDir;

fn load(dir: &TempDir) -> Config {
    Config::load_config_with_overrides(dir.path().to_str().unwrap(), Vec::new()).unwrap()
}

#[test]
fn test_load_writes_defaults() {
    let dir = TempDir::new().unwrap();
    let config = load(&dir);

    assert_eq!(config.get_http_port(), 7547);
    assert_eq!(config.get_config_dir(), Some(dir.path()));

    let saved = fs::read_to_string(dir.path().join("config.yaml")).unwrap();
    assert!(saved.contains("http_port: 7547"));
    assert!(saved.contains("urn:dslforum-org:cwmp-1-0"));
}

#[test]
fn test_file_values_override_defaults() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("config.yaml"),
        "Host:\n  HTTP_Port: 9000\ncwmp:\n  prefixes:\n    urn:Vendor-Ext: vnd\n",
    )
    .unwrap();

    let config = load(&dir);
    assert_eq!(config.get_http_port(), 9000);
    assert_eq!(config.get_bind_address(), "0.0.0.0");

    let prefixes = config.get_cwmp_prefixes();
    assert_eq!(prefixes.get("urn:Vendor-Ext").map(String::as_str), Some("vnd"));
    assert_eq!(
        prefixes.get("urn:dslforum-org:cwmp-1-0").map(String::as_str),
        Some("cwmp")
    );
}

#[test]
fn test_environment_overrides() {
    let dir = TempDir::new().unwrap();
    let config = Config::load_config_with_overrides(
        dir.path().to_str().unwrap(),
        vec![
            ("ACS_CONFIG__HOST__HTTP_PORT".to_string(), "8081".to_string()),
            ("ACS_CONFIG__HOST__LOGGER__ENABLE_CONSOLE".to_string(), "false".to_string()),
        ],
    )
    .unwrap();

    assert_eq!(config.get_http_port(), 8081);
    assert!(!config.get_log_enable_console());
}

#[test]
fn test_setters_persist() {
    let dir = TempDir::new().unwrap();
    let config = load(&dir);
    config.set_http_port(17547).unwrap();
    config.set_log_min_level("debug").unwrap();
    config.set_max_body_size(4096).unwrap();
    config.set_cwmp_prefix("urn:example", "ex").unwrap();

    let reloaded = load(&dir);
    assert_eq!(reloaded.get_http_port(), 17547);
    assert_eq!(reloaded.get_log_min_level(), "debug");
    assert_eq!(reloaded.get_max_body_size(), 4096);
    assert_eq!(
        reloaded.get_cwmp_prefixes().get("urn:example").map(String::as_str),
        Some("ex")
    );
}

#[test]
fn test_invalid_values_fall_back() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("config.yaml"),
        "host:\n  http_port: not-a-port\n  logger:\n    enable_console: maybe\n",
    )
    .unwrap();

    let config = load(&dir);
    assert_eq!(config.get_http_port(), 7547);
    assert!(config.get_log_enable_console());
}

#[test]
fn test_missing_path() {
    let config = Config::embedded();
    assert!(config.get_value(&["host", "nothing"]).is_err());
    assert!(config.get_value(&["HOST", "HTTP_PORT"]).is_ok());
}

#[test]
fn test_config_dir_must_be_a_directory() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("plain");
    fs::write(&file, "x").unwrap();
    assert!(Config::load_config_with_overrides(file.to_str().unwrap(), Vec::new()).is_err());
}
