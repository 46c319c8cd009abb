//! Startup recovery scenarios
//!
//! Each test leaves the user-data area in a state an interrupted or crashed
//! process could produce, then checks what the next startup does with it.

use std::fs;

use pretty_assertions::assert_eq;
use serde_json::json;
use zapps_core::{
    HeadlessHost, LaunchMode, PackageContext, RuntimeConfig, ZappPaths, ZappRuntime, self_repair,
};
use zapps_fs::RobustnessConfig;
use zapps_test_utils::{TestEnv, ZappBuilder};

fn paths(env: &TestEnv) -> ZappPaths {
    ZappPaths::new(env.user_data(), env.temp_root())
}

fn runtime(env: &TestEnv) -> ZappRuntime<HeadlessHost> {
    let config = RuntimeConfig {
        launch_mode: LaunchMode::Install,
        temp_root: Some(env.temp_root()),
        ..Default::default()
    };
    ZappRuntime::new(env.user_data(), config, HeadlessHost::new())
}

#[test]
fn one_corrupt_store_is_reset_and_the_rest_untouched() {
    let env = TestEnv::new();
    let rt = runtime(&env);
    rt.startup();
    let source = env.write_bundle("n.zapp", &ZappBuilder::app("com.acme.notes", "1.0"));
    rt.install(&source).unwrap();
    let notes = PackageContext::new("com.acme.notes").unwrap();
    rt.storage_set(&notes, "theme", json!("dark")).unwrap();

    let data = env.user_data();
    fs::write(data.join("com.acme.todo.json"), "{ truncated").unwrap();
    let library_before = fs::read(data.join("library.json")).unwrap();
    let notes_before = fs::read(data.join("com.acme.notes.json")).unwrap();

    let report = runtime(&env).startup();

    assert_eq!(report.reset_files, vec![data.join("com.acme.todo.json")]);
    assert_eq!(fs::read_to_string(data.join("com.acme.todo.json")).unwrap(), "{}\n");
    assert_eq!(fs::read(data.join("library.json")).unwrap(), library_before);
    assert_eq!(fs::read(data.join("com.acme.notes.json")).unwrap(), notes_before);
}

#[test]
fn stale_transient_state_is_cleared() {
    let env = TestEnv::new();
    let paths = paths(&env);
    fs::create_dir_all(paths.run_dir().join("old")).unwrap();
    fs::write(paths.run_dir().join("old").join("index.html"), "stale").unwrap();
    fs::write(paths.run_marker(), "4242").unwrap();
    fs::create_dir_all(paths.probe_dir()).unwrap();
    fs::create_dir_all(paths.staging_dir()).unwrap();
    fs::write(paths.staging_dir().join("com.acme.notes.1234.zapp"), "half").unwrap();

    let report = self_repair(&paths, RobustnessConfig::default());

    assert!(!paths.run_dir().exists());
    assert!(!paths.run_marker().exists());
    assert!(!paths.probe_dir().exists());
    assert_eq!(report.removed_staging, 1);
    assert!(report.errors.is_empty(), "{:?}", report.errors);
}

#[test]
fn archive_without_record_is_adopted() {
    let env = TestEnv::new();
    let paths = paths(&env);
    self_repair(&paths, RobustnessConfig::default());
    ZappBuilder::app("com.acme.notes", "3.1").write_to(&paths.installed_archive("com.acme.notes"));

    let report = self_repair(&paths, RobustnessConfig::default());

    assert_eq!(report.adopted, vec!["com.acme.notes".to_string()]);
    let library = runtime(&env).library().unwrap();
    assert_eq!(library.len(), 1);
    assert_eq!(library[0].version.as_deref(), Some("3.1"));
    assert!(library[0].checksum.as_deref().unwrap().starts_with("sha256:"));
}

#[test]
fn archive_under_foreign_name_is_not_adopted() {
    let env = TestEnv::new();
    let paths = paths(&env);
    self_repair(&paths, RobustnessConfig::default());
    ZappBuilder::app("com.acme.notes", "1.0").write_to(&paths.installed_archive("com.acme.other"));

    let report = self_repair(&paths, RobustnessConfig::default());

    assert!(report.adopted.is_empty());
    assert_eq!(report.errors.len(), 1);
    assert!(runtime(&env).library().unwrap().is_empty());
}

#[test]
fn record_without_archive_is_dropped() {
    let env = TestEnv::new();
    let rt = runtime(&env);
    rt.startup();
    let source = env.write_bundle("n.zapp", &ZappBuilder::app("com.acme.notes", "1.0"));
    rt.install(&source).unwrap();
    fs::remove_file(paths(&env).installed_archive("com.acme.notes")).unwrap();

    let report = runtime(&env).startup();

    assert_eq!(report.dropped, vec!["com.acme.notes".to_string()]);
    assert!(runtime(&env).library().unwrap().is_empty());
}

#[test]
fn corrupt_library_is_reset_then_orphans_readopted() {
    let env = TestEnv::new();
    let rt = runtime(&env);
    rt.startup();
    let source = env.write_bundle("n.zapp", &ZappBuilder::app("com.acme.notes", "1.0"));
    rt.install(&source).unwrap();
    fs::write(env.user_data().join("library.json"), "[{\"id\": ").unwrap();

    let report = runtime(&env).startup();

    assert_eq!(report.reset_files, vec![env.user_data().join("library.json")]);
    assert_eq!(report.adopted, vec!["com.acme.notes".to_string()]);
    let library = runtime(&env).library().unwrap();
    assert_eq!(library.len(), 1);
    assert_eq!(library[0].id, "com.acme.notes");
}

#[test]
fn second_startup_reports_nothing() {
    let env = TestEnv::new();
    runtime(&env).startup();

    let report = runtime(&env).startup();

    assert!(report.is_clean(), "unexpected report: {report:?}");
}

#[test]
fn launched_app_files_survive_next_startup() {
    let env = TestEnv::new();
    let first = runtime(&env);
    first.startup();
    let source = env.write_bundle("n.zapp", &ZappBuilder::app("com.acme.notes", "1.0"));
    let descriptor = first.open_and_launch(&source).unwrap();
    drop(first);

    let report = runtime(&env).startup();

    assert!(descriptor.entry.is_file());
    assert!(!report.removed_transient.contains(&descriptor.run_dir));
}

#[test]
fn interrupted_launch_is_cleared_on_next_startup() {
    let env = TestEnv::new();
    let rt = runtime(&env);
    rt.startup();
    let broken = env.write_bundle(
        "b.zapp",
        &ZappBuilder::new()
            .manifest(json!({"id": "com.acme.broken", "entry": "missing.html"}))
            .file("asset.js", "x"),
    );
    rt.open_and_launch(&broken).unwrap_err();
    assert!(paths(&env).run_marker().exists());

    let report = runtime(&env).startup();

    assert!(!paths(&env).run_dir().exists());
    assert!(!paths(&env).run_marker().exists());
    assert_eq!(report.removed_transient, vec![paths(&env).run_dir()]);
}
