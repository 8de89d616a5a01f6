use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_lockbox"))
}

/// Isolated XDG config/data homes for one test.
struct Env {
    _root: TempDir,
    config_home: PathBuf,
    data_home: PathBuf,
}

impl Env {
    fn new() -> Self {
        let root = tempfile::tempdir().expect("temp dir");
        let config_home = root.path().join("c");
        let data_home = root.path().join("d");
        std::fs::create_dir_all(&config_home).expect("create config dir");
        std::fs::create_dir_all(&data_home).expect("create data dir");
        Self {
            _root: root,
            config_home,
            data_home,
        }
    }

    fn config_path(&self) -> PathBuf {
        self.config_home.join("lockbox").join("config.toml")
    }

    fn store_path(&self) -> PathBuf {
        self.data_home.join("lockbox").join("secrets.llk")
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(bin());
        cmd.args(args)
            .env("XDG_CONFIG_HOME", &self.config_home)
            .env("XDG_DATA_HOME", &self.data_home)
            .env_remove("LOCKBOX_STORE")
            .env_remove("LOCKBOX_CONFIG")
            .env_remove("LOCKBOX_VALUE")
            .env_remove("RUST_LOG")
            .stdin(Stdio::null());
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.command(args).output().expect("run lockbox")
    }

    fn run_ok(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "lockbox {:?} failed\nstdout: {}\nstderr: {}",
            args,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    fn status_json(&self) -> serde_json::Value {
        let stdout = self.run_ok(&["status", "--json"]);
        serde_json::from_str(&stdout).expect("status json")
    }
}

fn read_key_section(config_path: &Path) -> toml::Table {
    let contents = std::fs::read_to_string(config_path).expect("read config");
    let mut config: toml::Table = toml::from_str(&contents).expect("parse config");
    match config.remove("key") {
        Some(toml::Value::Table(key)) => key,
        other => panic!("missing [key] section: {:?}", other),
    }
}

fn key_value<'a>(key: &'a toml::Table, name: &str) -> Option<&'a str> {
    key.get(name).and_then(toml::Value::as_str)
}

#[test]
fn test_add_get_list_remove_flow() {
    let env = Env::new();

    env.run_ok(&["add", "mail", "secret1"]);
    env.run_ok(&["add", "bank", "1234"]);

    assert!(env.config_path().exists(), "config created on first key");
    assert!(env.store_path().exists(), "store created on first add");
    let key = read_key_section(&env.config_path());
    assert_eq!(key_value(&key, "keyVersion"), Some("1"));
    assert_eq!(key_value(&key, "keyA").map(str::len), Some(16));

    let revealed = env.run_ok(&["get", "mail", "--reveal"]);
    assert_eq!(revealed.trim(), "secret1");

    let ciphertext = env.run_ok(&["get", "mail"]);
    assert_ne!(ciphertext.trim(), "secret1");
    assert!(!ciphertext.trim().is_empty());

    let names: Vec<String> =
        serde_json::from_str(&env.run_ok(&["list", "--json"])).expect("list json");
    assert_eq!(names, vec!["bank".to_string(), "mail".to_string()]);

    let removed = env.run_ok(&["remove", "mail"]);
    assert!(removed.contains("Removed mail"));

    let output = env.run(&["get", "mail"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Secret not found"));
}

#[test]
fn test_store_file_never_holds_plaintext() {
    let env = Env::new();
    env.run_ok(&["add", "github-token", "ghp_plaintext_marker"]);

    let bytes = std::fs::read(env.store_path()).expect("read store");
    let haystack = String::from_utf8_lossy(&bytes);
    assert!(!haystack.contains("ghp_plaintext_marker"));
    assert!(!haystack.contains("github-token"));
}

#[test]
fn test_add_reads_value_from_stdin() {
    let env = Env::new();
    let mut child = env
        .command(&["add", "piped"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn lockbox");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(b"from-stdin\n")
        .expect("write stdin");
    let output = child.wait_with_output().expect("wait lockbox");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    assert_eq!(env.run_ok(&["get", "piped", "--reveal"]).trim(), "from-stdin");
}

#[test]
fn test_add_reads_value_from_env() {
    let env = Env::new();
    let output = env
        .command(&["add", "envvar"])
        .env("LOCKBOX_VALUE", "from-env")
        .output()
        .expect("run lockbox");
    assert!(output.status.success());

    assert_eq!(env.run_ok(&["get", "envvar", "--reveal"]).trim(), "from-env");
}

#[test]
fn test_import_then_search_reveal() {
    let env = Env::new();
    let csv_path = env.data_home.join("export.csv");
    std::fs::write(
        &csv_path,
        "name,url,username,password,note\n\
         \"svc\",\"https://x\",\"alice\",\"p@ss\",\"note\"\n\
         \"short\",\"row\"\n",
    )
    .expect("write csv");

    let imported = env.run_ok(&["import", csv_path.to_str().expect("utf8 path")]);
    assert!(imported.contains("Imported 1 secrets (1 rows skipped)"));

    let stdout = env.run_ok(&["search", "SVC", "--reveal", "--json"]);
    let hits: serde_json::Value = serde_json::from_str(&stdout).expect("search json");
    assert_eq!(hits[0]["name"], "svc|https://x|note");
    assert_eq!(hits[0]["username"], "alice");
    assert_eq!(hits[0]["password"], "p@ss");

    let stdout = env.run_ok(&["search", "nothing-matches", "--json"]);
    let hits: serde_json::Value = serde_json::from_str(&stdout).expect("search json");
    assert_eq!(hits.as_array().map(Vec::len), Some(0));
}

#[test]
fn test_rotate_bumps_version_and_keeps_values() {
    let env = Env::new();
    env.run_ok(&["add", "mail", "secret1"]);
    let before = read_key_section(&env.config_path());

    let rotated = env.run_ok(&["rotate"]);
    assert!(rotated.contains("v1 -> v2"));

    let after = read_key_section(&env.config_path());
    assert_eq!(key_value(&after, "keyVersion"), Some("2"));
    assert_ne!(key_value(&before, "keyA"), key_value(&after, "keyA"));

    assert_eq!(env.run_ok(&["get", "mail", "--reveal"]).trim(), "secret1");
    let status = env.status_json();
    assert_eq!(status["key_version"], 2);
    assert_eq!(status["entries"], 1);
    assert_eq!(status["healthy"], true);
}

#[test]
fn test_expired_key_blocks_add_until_rotation() {
    let env = Env::new();
    env.run_ok(&["add", "mail", "secret1"]);

    let mut config: toml::Table =
        toml::from_str(&std::fs::read_to_string(env.config_path()).expect("read config"))
            .expect("parse config");
    if let Some(toml::Value::Table(key)) = config.get_mut("key") {
        key.insert(
            "keyTtl".to_string(),
            toml::Value::String("2000-01-01T00:00:00+00:00".to_string()),
        );
    }
    std::fs::write(
        env.config_path(),
        toml::to_string(&config).expect("serialize config"),
    )
    .expect("write config");

    let output = env.run(&["add", "other", "value"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("lockbox rotate"), "stderr: {}", stderr);

    assert_eq!(env.run_ok(&["get", "mail", "--reveal"]).trim(), "secret1");
    assert_eq!(env.status_json()["expired"], true);

    env.run_ok(&["rotate"]);
    env.run_ok(&["add", "other", "value"]);
    assert_eq!(env.status_json()["entries"], 2);
}

#[test]
fn test_unreadable_store_reports_health() {
    let env = Env::new();
    std::fs::create_dir_all(env.store_path().parent().expect("parent")).expect("create dir");
    std::fs::write(env.store_path(), b"definitely not a store").expect("write junk");

    let status = env.status_json();
    assert_eq!(status["healthy"], false);
    assert_eq!(status["entries"], 0);

    env.run_ok(&["add", "fresh", "value"]);
    let quarantined: Vec<_> = std::fs::read_dir(env.store_path().parent().expect("parent"))
        .expect("read dir")
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().contains(".unreadable-"))
        .collect();
    assert_eq!(quarantined.len(), 1);
}

#[test]
fn test_store_flag_overrides_default_path() {
    let env = Env::new();
    let custom = env.data_home.join("custom").join("team.llk");
    let custom_arg = custom.to_str().expect("utf8 path");

    env.run_ok(&["--store", custom_arg, "add", "mail", "secret1"]);
    assert!(custom.exists());
    assert!(!env.store_path().exists());

    let names = env.run_ok(&["--store", custom_arg, "list", "--json"]);
    assert!(names.contains("mail"));

    let stdout = env.run_ok(&["--store", custom_arg, "status", "--json"]);
    let status: serde_json::Value = serde_json::from_str(&stdout).expect("status json");
    assert_eq!(status["path"], custom_arg);
}

#[test]
fn test_backup_copies_encrypted_file() {
    let env = Env::new();
    env.run_ok(&["add", "mail", "secret1"]);

    let dest = env.data_home.join("backups").join("secrets.bak");
    env.run_ok(&["backup", dest.to_str().expect("utf8 path")]);

    let original = std::fs::read(env.store_path()).expect("read store");
    let copy = std::fs::read(&dest).expect("read backup");
    assert_eq!(original, copy);
}

#[test]
fn test_backup_without_store_fails() {
    let env = Env::new();
    let dest = env.data_home.join("secrets.bak");
    let output = env.run(&["backup", dest.to_str().expect("utf8 path")]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No store found"));
}

#[test]
fn test_completions_need_no_config() {
    let env = Env::new();
    let stdout = env.run_ok(&["completions", "bash"]);
    assert!(stdout.contains("lockbox"));
    assert!(!env.config_path().exists());
}
