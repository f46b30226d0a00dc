use serial_test::serial;
use std::env;
use std::fs::write;
use tempfile::NamedTempFile;

use wiki_sync::load_config::{
    load_content, load_credentials, load_sync_config, Credentials, TOKEN_ENV, URL_ENV,
};

fn clear_env() {
    env::remove_var(TOKEN_ENV);
    env::remove_var(URL_ENV);
}

fn credentials_file(json: &str) -> NamedTempFile {
    let file = NamedTempFile::new().expect("temp file");
    write(file.path(), json).unwrap();
    file
}

#[test]
#[serial]
fn credentials_are_read_from_json_file() {
    clear_env();
    let file = credentials_file(r#"{"token": "abc", "url": "https://wiki.example"}"#);

    let credentials = load_credentials(Some(file.path())).expect("credentials should load");
    assert_eq!(
        credentials,
        Credentials {
            token: "abc".into(),
            url: "https://wiki.example".into(),
        }
    );
}

#[test]
#[serial]
fn environment_overrides_file_values() {
    clear_env();
    let file = credentials_file(r#"{"token": "from-file", "url": "https://file.example"}"#);
    env::set_var(TOKEN_ENV, "from-env");

    let credentials = load_credentials(Some(file.path())).unwrap();
    clear_env();

    assert_eq!(credentials.token, "from-env");
    assert_eq!(credentials.url, "https://file.example");
}

#[test]
#[serial]
fn environment_alone_is_enough() {
    clear_env();
    env::set_var(TOKEN_ENV, "t");
    env::set_var(URL_ENV, "https://env.example");

    let dir = tempfile::tempdir().unwrap();
    let credentials = load_credentials(Some(&dir.path().join("absent.secret"))).unwrap();
    clear_env();

    assert_eq!(credentials.url, "https://env.example");
}

#[test]
#[serial]
fn missing_url_is_reported() {
    clear_env();
    let file = credentials_file(r#"{"token": "abc"}"#);

    let err = load_credentials(Some(file.path())).unwrap_err();
    assert!(err.to_string().contains("url"), "unexpected error: {err}");
}

#[test]
#[serial]
fn malformed_credentials_file_is_an_error() {
    clear_env();
    let file = credentials_file("token = abc");
    assert!(load_credentials(Some(file.path())).is_err());
}

#[test]
#[serial]
fn credentials_loading_does_not_read_dotenv_itself() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    write(dir.path().join(".env"), format!("{TOKEN_ENV}=from-dotenv\n")).unwrap();
    let file = credentials_file(r#"{"url": "https://wiki.example"}"#);

    let previous = env::current_dir().unwrap();
    env::set_current_dir(dir.path()).unwrap();
    let result = load_credentials(Some(file.path()));
    env::set_current_dir(previous).unwrap();
    let leaked = env::var(TOKEN_ENV).ok();
    clear_env();

    assert!(result.is_err(), "token must not come from .env here");
    assert_eq!(leaked, None);
}

#[test]
fn no_settings_file_gives_defaults() {
    let config = load_sync_config(None).unwrap();
    assert_eq!(config.root_category_id, 50);
    assert_eq!(config.category_marker, "__categoryInfo");
}

#[test]
fn settings_yaml_overrides_only_given_keys() {
    let file = NamedTempFile::new().unwrap();
    write(file.path(), "root_category_id: 77\ndoc_version: \"2.0.0\"\n").unwrap();

    let config = load_sync_config(Some(file.path())).unwrap();
    assert_eq!(config.root_category_id, 77);
    assert_eq!(config.doc_version, "2.0.0");
    assert_eq!(config.initial_product_version, "6.0.0");
    assert_eq!(config.product.id, 4);
}

#[test]
fn invalid_settings_yaml_is_an_error() {
    let file = NamedTempFile::new().unwrap();
    write(file.path(), "root_category_id: [not, a, number]\n").unwrap();
    assert!(load_sync_config(Some(file.path())).is_err());
}

#[test]
fn content_comes_from_argument_or_file() {
    let inline = load_content(Some(r#"{"a/b": {"metadata": {}, "content": ""}}"#), None).unwrap();
    assert!(inline.get("a/b").is_some());

    let file = NamedTempFile::new().unwrap();
    write(file.path(), r#"{"c/d": {}}"#).unwrap();
    let from_file = load_content(None, Some(file.path())).unwrap();
    assert!(from_file.get("c/d").is_some());

    assert!(load_content(None, None).is_err());
    assert!(load_content(Some("{"), None).is_err());
}
