//! End-to-end package lifecycle through the runtime facade
//!
//! Install, reinstall, launch, storage, shortcuts and uninstall driven the
//! way a UI drives them, against a headless host.

use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use serde_json::json;
use tokio_stream::StreamExt;
use zapps_core::{
    Error, HeadlessHost, HostError, LaunchMode, PackageContext, RuntimeConfig, ShortcutConfig,
    ShortcutSpec, ShortcutWriter, UpdateEvent, UpdateOutcome, ZappRuntime, extract_archive,
};
use zapps_fs::checksum::compute_tree_checksum;
use zapps_test_utils::{TestEnv, ZappBuilder, snapshot_dir};

fn runtime(env: &TestEnv, mode: LaunchMode) -> ZappRuntime<HeadlessHost> {
    let config = RuntimeConfig {
        launch_mode: mode,
        temp_root: Some(env.temp_root()),
        ..Default::default()
    };
    let runtime = ZappRuntime::new(env.user_data(), config, HeadlessHost::new());
    runtime.startup();
    runtime
}

#[test]
fn extraction_is_idempotent() {
    let env = TestEnv::new();
    let bundle = env.write_bundle(
        "notes.zapp",
        &ZappBuilder::app("com.acme.notes", "1.0")
            .file("assets/app.js", "console.log(1)")
            .dir("empty"),
    );
    let target = env.root().join("out");

    extract_archive(&bundle, &target).unwrap();
    let first = snapshot_dir(&target);
    let first_sum = compute_tree_checksum(&target).unwrap();

    extract_archive(&bundle, &target).unwrap();

    assert_eq!(snapshot_dir(&target), first);
    assert_eq!(compute_tree_checksum(&target).unwrap(), first_sum);
}

#[test]
fn repeated_installs_keep_ids_unique() {
    let env = TestEnv::new();
    let runtime = runtime(&env, LaunchMode::Install);
    let ids = ["com.acme.a", "com.acme.b", "com.acme.a", "com.acme.c", "com.acme.b"];

    for (n, id) in ids.iter().enumerate() {
        let source = env.write_bundle(&format!("{n}.zapp"), &ZappBuilder::app(id, &format!("1.{n}")));
        runtime.install(&source).unwrap();
    }

    let library = runtime.library().unwrap();
    let listed: Vec<_> = library.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(listed, vec!["com.acme.a", "com.acme.b", "com.acme.c"]);
    assert_eq!(library[0].version.as_deref(), Some("1.2"));
    assert_eq!(library[1].version.as_deref(), Some("1.4"));
}

#[test]
fn install_then_uninstall_restores_user_data() {
    let env = TestEnv::new();
    let runtime = runtime(&env, LaunchMode::Install);
    let before = snapshot_dir(&env.user_data());

    let source = env.write_bundle("n.zapp", &ZappBuilder::app("com.acme.notes", "1.0"));
    runtime.install(&source).unwrap();
    assert_ne!(snapshot_dir(&env.user_data()), before);

    let report = runtime.uninstall("com.acme.notes").unwrap();

    assert!(report.archive_removed && report.record_removed);
    assert_eq!(snapshot_dir(&env.user_data()), before);
}

#[test]
fn update_replaces_content_in_place() {
    let env = TestEnv::new();
    let runtime = runtime(&env, LaunchMode::Install);
    let a = env.write_bundle("a.zapp", &ZappBuilder::app("com.acme.notes", "1.0"));
    let a2 = env.write_bundle(
        "a2.zapp",
        &ZappBuilder::app("com.acme.notes", "2.0").file("extra.txt", "new"),
    );

    runtime.install(&a).unwrap();
    let installed = runtime.install(&a2).unwrap();

    assert_eq!(
        fs::read(&installed.archive_path).unwrap(),
        fs::read(&a2).unwrap()
    );
    let library = runtime.library().unwrap();
    assert_eq!(library.len(), 1);
    assert_eq!(library[0].version.as_deref(), Some("2.0"));

    let descriptor = runtime.launch_by_id("com.acme.notes").unwrap();
    assert!(descriptor.run_dir.join("extra.txt").is_file());
    assert_eq!(
        fs::read_to_string(&descriptor.entry).unwrap(),
        "<h1>com.acme.notes 2.0</h1>"
    );
}

#[test]
fn open_in_install_mode_launches_installed_copy() {
    let env = TestEnv::new();
    let runtime = runtime(&env, LaunchMode::Install);
    let source = env.write_bundle(
        "n.zapp",
        &ZappBuilder::new()
            .manifest(json!({
                "id": "com.acme.notes",
                "name": "Notes",
                "entry": "index.html",
                "window": { "width": 1024, "height": 0, "resizable": false }
            }))
            .file("index.html", "hi"),
    );

    let descriptor = runtime.open_and_launch(&source).unwrap();

    assert_eq!(descriptor.title, "Notes");
    assert_eq!((descriptor.width, descriptor.height), (1024, 600));
    assert!(!descriptor.resizable);
    let windows = runtime.host().windows();
    assert_eq!(windows, vec![descriptor]);
    assert_eq!(runtime.library().unwrap().len(), 1);
}

#[test]
fn open_in_direct_mode_leaves_library_alone() {
    let env = TestEnv::new();
    let runtime = runtime(&env, LaunchMode::Direct);
    let library_before = fs::read(env.user_data().join("library.json")).unwrap();
    let source = env.write_bundle("n.zapp", &ZappBuilder::app("com.acme.notes", "1.0"));

    runtime.open_and_launch(&source).unwrap();

    assert_eq!(runtime.host().windows().len(), 1);
    assert_eq!(
        fs::read(env.user_data().join("library.json")).unwrap(),
        library_before
    );
    assert!(!runtime.paths().installed_archive("com.acme.notes").exists());
}

#[test]
fn launch_without_entry_creates_no_window() {
    let env = TestEnv::new();
    let runtime = runtime(&env, LaunchMode::Direct);
    let source = env.write_bundle(
        "blank.zapp",
        &ZappBuilder::new().manifest(json!({"id": "com.acme.blank"})),
    );

    let err = runtime.open_and_launch(&source).unwrap_err();

    assert!(matches!(err, Error::LaunchFailed { .. }));
    assert!(runtime.host().windows().is_empty());
}

#[test]
fn launch_absent_id_touches_nothing() {
    let env = TestEnv::new();
    let runtime = runtime(&env, LaunchMode::Install);

    let err = runtime.launch_by_id("com.acme.absent").unwrap_err();

    assert!(matches!(err, Error::NotInstalled { .. }));
    assert!(!runtime.paths().run_dir().exists());
    assert!(runtime.host().windows().is_empty());
}

#[test]
fn uninstall_absent_id_leaves_store_unchanged() {
    let env = TestEnv::new();
    let runtime = runtime(&env, LaunchMode::Install);
    let source = env.write_bundle("n.zapp", &ZappBuilder::app("com.acme.notes", "1.0"));
    runtime.install(&source).unwrap();
    let before = snapshot_dir(&env.user_data());

    let report = runtime.uninstall("com.acme.absent").unwrap();

    assert!(report.was_noop());
    assert_eq!(snapshot_dir(&env.user_data()), before);
}

#[test]
fn storage_is_scoped_per_package() {
    let env = TestEnv::new();
    let runtime = runtime(&env, LaunchMode::Install);
    let notes = PackageContext::new("com.acme.notes").unwrap();
    let todo = PackageContext::new("com.acme.todo").unwrap();

    runtime.storage_set(&notes, "theme", json!("dark")).unwrap();
    runtime.storage_set(&todo, "theme", json!("light")).unwrap();

    assert_eq!(runtime.storage_get(&notes, "theme").unwrap(), Some(json!("dark")));
    assert_eq!(runtime.storage_get(&todo, "theme").unwrap(), Some(json!("light")));
    assert_eq!(runtime.storage_get(&notes, "missing").unwrap(), None);
}

#[test]
fn startup_binds_runtime_identity_and_launch_rebinds() {
    let env = TestEnv::new();
    let runtime = runtime(&env, LaunchMode::Install);
    assert_eq!(
        runtime.host().current_identity().as_deref(),
        Some(zapps_core::RUNTIME_APP_ID)
    );

    let source = env.write_bundle("n.zapp", &ZappBuilder::app("com.acme.notes", "1.0"));
    runtime.open_and_launch(&source).unwrap();

    assert_eq!(
        runtime.host().current_identity().as_deref(),
        Some("com.acme.notes")
    );
}

struct CollectingWriter;

impl ShortcutWriter for CollectingWriter {
    fn write(&self, dest_dir: &Path, spec: &ShortcutSpec) -> Result<PathBuf, HostError> {
        let path = dest_dir.join(format!("{}.lnk", spec.id));
        fs::create_dir_all(dest_dir).map_err(|e| HostError::Other(e.to_string()))?;
        fs::write(&path, format!("{}|{}", spec.display_name, spec.archive.display()))
            .map_err(|e| HostError::Other(e.to_string()))?;
        Ok(path)
    }
}

#[test]
fn shortcuts_point_at_installed_archive() {
    let env = TestEnv::new();
    let config = RuntimeConfig {
        temp_root: Some(env.temp_root()),
        shortcuts: ShortcutConfig {
            desktop_dir: Some(env.root().join("desktop")),
            start_menu_dir: Some(env.root().join("menu")),
        },
        ..Default::default()
    };
    let runtime = ZappRuntime::new(env.user_data(), config, HeadlessHost::new());
    runtime.startup();
    let source = env.write_bundle("n.zapp", &ZappBuilder::app("com.acme.notes", "1.0"));
    runtime.install(&source).unwrap();

    let written = runtime
        .create_shortcut("com.acme.notes", None, Path::new("/opt/zapps"), &CollectingWriter)
        .unwrap();

    assert_eq!(written.len(), 2);
    let expected = format!(
        "Notes|{}",
        runtime.paths().installed_archive("com.acme.notes").display()
    );
    for path in written {
        assert_eq!(fs::read_to_string(path).unwrap(), expected);
    }
}

#[tokio::test]
async fn update_feed_downloads_and_applies() {
    let env = TestEnv::new();
    let feed_dir = env.root().join("feed");
    fs::create_dir_all(&feed_dir).unwrap();
    fs::write(feed_dir.join("zapps-9.0.0.bin"), vec![7u8; 200_000]).unwrap();
    fs::write(
        feed_dir.join("latest.json"),
        r#"{ "version": "v9.0.0", "artifact": "zapps-9.0.0.bin" }"#,
    )
    .unwrap();
    let config = RuntimeConfig {
        temp_root: Some(env.temp_root()),
        update_feed: Some(feed_dir.join("latest.json")),
        ..Default::default()
    };
    let runtime = ZappRuntime::new(env.user_data(), config, HeadlessHost::new());
    let mut events = runtime.subscribe_updates();

    let outcome = runtime.check_for_update().await.unwrap();

    let release = match outcome {
        UpdateOutcome::Downloaded(release) => release,
        other => panic!("expected a download, got {other:?}"),
    };
    assert_eq!(release.version, semver::Version::new(9, 0, 0));
    assert_eq!(fs::read(&release.artifact).unwrap().len(), 200_000);

    assert_eq!(events.next().await, Some(UpdateEvent::Checking));
    assert_eq!(
        events.next().await,
        Some(UpdateEvent::Available {
            version: "9.0.0".into()
        })
    );

    assert!(runtime.restart_to_apply_update());
    assert_eq!(runtime.host().applied_updates(), vec![release.artifact]);
}
