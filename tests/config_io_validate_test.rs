use juicesync::config::Config;
use std::fs;

#[test]
fn save_and_load_yaml_roundtrip() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("config.yaml");

    let mut cfg = Config::default();
    cfg.juicenet.api_key = "secret".to_string();
    cfg.influx.host = "influx.lan".to_string();
    cfg.history.max_gap_seconds = 600;
    cfg.logging.file = path.with_extension("log").to_string_lossy().to_string();

    cfg.save_to_file(&path).unwrap();
    let loaded = Config::from_file(&path).unwrap();

    assert_eq!(loaded.juicenet.api_key, "secret");
    assert_eq!(loaded.influx.host, "influx.lan");
    assert_eq!(loaded.history.max_gap_seconds, 600);
    assert_eq!(loaded.logging.file, cfg.logging.file);
}

#[test]
fn config_validation_errors() {
    let valid = || {
        let mut cfg = Config::default();
        cfg.juicenet.api_key = "k".to_string();
        cfg
    };
    assert!(valid().validate().is_ok());

    // Missing API key
    assert!(Config::default().validate().is_err());

    let mut cfg = valid();
    cfg.influx.host.clear();
    assert!(cfg.validate().is_err());

    cfg = valid();
    cfg.influx.port = 0;
    assert!(cfg.validate().is_err());

    cfg = valid();
    cfg.history.max_gap_seconds = 0;
    assert!(cfg.validate().is_err());

    cfg = valid();
    cfg.history.timezone = "Mars/Olympus_Mons".to_string();
    assert!(cfg.validate().is_err());
}

#[test]
fn from_file_with_invalid_yaml_fails() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    fs::write(tmp.path(), b"bad: [unclosed").unwrap();
    let err = Config::from_file(tmp.path()).unwrap_err();
    let msg = format!("{}", err);
    assert!(msg.contains("Serialization error"));
}

#[test]
fn legacy_files_fill_credentials_and_location() {
    let dir = tempfile::tempdir().unwrap();
    let juicenet = dir.path().join("juicenet.conf");
    let influx = dir.path().join("influx.conf");
    fs::write(
        &juicenet,
        "api_key = abc-123\nlocation_general = home\nlocation_specific = garage\n",
    )
    .unwrap();
    fs::write(
        &influx,
        "url = influx.lan\nport = 8087\nusername = writer\n\
         password = p=w\npassword = hunter2\ndatabase = evse\n",
    )
    .unwrap();

    let cfg = Config::from_legacy_files(&juicenet, &influx).unwrap();

    assert_eq!(cfg.juicenet.api_key, "abc-123");
    assert_eq!(cfg.location.general, "home");
    assert_eq!(cfg.location.specific, "garage");
    assert_eq!(cfg.influx.host, "influx.lan");
    assert_eq!(cfg.influx.port, 8087);
    assert_eq!(cfg.influx.username, "writer");
    // A value containing '=' is not a valid line
    assert_eq!(cfg.influx.password, "hunter2");
    assert_eq!(cfg.influx.database, "evse");
    assert!(cfg.validate().is_ok());
}

#[test]
fn legacy_file_missing_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::from_legacy_files(dir.path().join("a.conf"), dir.path().join("b.conf"))
        .unwrap_err();
    assert!(format!("{}", err).contains("I/O error"));
}
