//! End-to-end scenarios: fixture WordPress tree → ingest → resolve

use depvis::ingest::{self, IngestOptions};
use depvis::occurrence::IdentifierType;
use depvis::resolver::DependencyResolver;
use depvis::storage::SqliteStore;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn fixture_site() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    // Core defines its own hooks and functions
    write(
        root,
        "wp-includes/plugin.php",
        r#"<?php
        function add_action( $hook, $cb ) {}
        function add_filter( $hook, $cb ) {}
        do_action( 'init' );
        apply_filters( 'the_title', $title );
        function esc_html( $text ) {}
        "#,
    );
    write(
        root,
        "wp-admin/admin.php",
        r#"<?php
        do_action( 'admin_init' );
        function admin_url( $path ) {}
        "#,
    );

    // Plugin P triggers an event and defines a helper
    write(
        root,
        "wp-content/plugins/p/p.php",
        r#"<?php
        do_action( 'my_event', $payload );
        function p_helper() {}
        "#,
    );

    // Plugin Q registers on P's event and calls P's helper
    write(
        root,
        "wp-content/plugins/q/q.php",
        r#"<?php
        add_action( 'my_event', 'q_handler' );
        function q_handler() {
            p_helper();
        }
        "#,
    );

    // Plugin R defines and uses its own helper, nothing else touches it
    write(
        root,
        "wp-content/plugins/r/r.php",
        r#"<?php
        do_action( 'r_boot' );
        function r_helper() {}
        r_helper();
        "#,
    );

    dir
}

fn ingest_all(root: &Path) -> SqliteStore {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let options = IngestOptions::new(root);
    ingest::run(&mut store, &options, None).unwrap();
    store
}

#[test]
fn hook_dependency_between_plugins() {
    let site = fixture_site();
    let store = ingest_all(site.path());
    let resolver = DependencyResolver::new(&store);

    let graph = resolver
        .dependencies(&[IdentifierType::HookAction])
        .unwrap();

    // Q registers on P's 'my_event'; core's 'init'/'admin_init' are excluded
    assert_eq!(graph["q"]["p"], 1);
    assert_eq!(graph.len(), 1);
}

#[test]
fn function_dependency_between_plugins() {
    let site = fixture_site();
    let store = ingest_all(site.path());
    let resolver = DependencyResolver::new(&store);

    let graph = resolver.dependencies(&[IdentifierType::Function]).unwrap();

    assert_eq!(graph["q"]["p"], 1);
    // R's internal helper produces no edges
    assert!(!graph.contains_key("r"));
}

#[test]
fn internal_only_helper_yields_no_edges() {
    let site = fixture_site();
    let store = ingest_all(site.path());
    let resolver = DependencyResolver::new(&store);

    let usage = resolver.usage(&[IdentifierType::Function]).unwrap();
    let function_usage = usage.get(&IdentifierType::Function);
    assert!(
        function_usage
            .map(|names| !names.contains_key("r_helper"))
            .unwrap_or(true)
    );
}

#[test]
fn core_shadowed_function_is_excluded() {
    let site = fixture_site();
    let root = site.path();

    // Plugin S redefines core's esc_html and plugin T calls it
    write(
        root,
        "wp-content/plugins/s/s.php",
        r#"<?php
        add_action( 's_boot', 's_init' );
        function esc_html( $text ) {}
        "#,
    );
    write(
        root,
        "wp-content/plugins/t/t.php",
        r#"<?php
        add_action( 't_boot', 't_init' );
        esc_html( $value );
        "#,
    );

    let store = ingest_all(root);
    let resolver = DependencyResolver::new(&store);

    let definitions = resolver.definitions(&[IdentifierType::Function]).unwrap();
    assert!(
        definitions
            .get(&IdentifierType::Function)
            .map(|names| !names.contains_key("esc_html"))
            .unwrap_or(true)
    );

    let graph = resolver.dependencies(&[IdentifierType::Function]).unwrap();
    assert!(!graph.contains_key("t"));
}

#[test]
fn ingestion_is_idempotent() {
    let site = fixture_site();
    let root = site.path();

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("depvis.db");
    let options = IngestOptions::new(root);

    let mut store = SqliteStore::open(&db_path).unwrap();
    ingest::run(&mut store, &options, None).unwrap();
    let first_count = store.count_occurrences().unwrap();
    let first_files = store.count_files().unwrap();
    assert!(first_count > 0);

    ingest::run(&mut store, &options, None).unwrap();
    assert_eq!(store.count_occurrences().unwrap(), first_count);
    assert_eq!(store.count_files().unwrap(), first_files);
}

#[test]
fn single_steps_accumulate_like_a_full_run() {
    let site = fixture_site();
    let root = site.path();
    let options = IngestOptions::new(root);

    let mut full = SqliteStore::open_in_memory().unwrap();
    ingest::run(&mut full, &options, None).unwrap();

    let mut stepped = SqliteStore::open_in_memory().unwrap();
    for step in 1..=4 {
        ingest::run(&mut stepped, &options, Some(step)).unwrap();
    }

    assert_eq!(
        stepped.count_occurrences().unwrap(),
        full.count_occurrences().unwrap()
    );

    let full_graph = DependencyResolver::new(&full)
        .dependencies(&[IdentifierType::HookAction])
        .unwrap();
    let stepped_graph = DependencyResolver::new(&stepped)
        .dependencies(&[IdentifierType::HookAction])
        .unwrap();
    assert_eq!(full_graph, stepped_graph);
}

#[test]
fn core_usage_is_never_recorded() {
    let site = fixture_site();
    let store = ingest_all(site.path());

    // Core trees are scanned definitions-only; plugin Q could otherwise
    // appear to depend on whatever core calls internally.
    let resolver = DependencyResolver::new(&store);
    let usage = resolver
        .usage(&[
            IdentifierType::HookAction,
            IdentifierType::HookFilter,
            IdentifierType::Function,
            IdentifierType::Class,
        ])
        .unwrap();

    for names in usage.values() {
        for packages in names.values() {
            for files in packages.values() {
                for file in files {
                    assert!(!file.starts_with("wp-includes"));
                    assert!(!file.starts_with("wp-admin"));
                }
            }
        }
    }
}

#[test]
fn missing_trees_are_not_errors() {
    let dir = tempfile::tempdir().unwrap();
    // Only a plugins tree exists; wp-includes, wp-admin and themes are absent
    write(
        dir.path(),
        "wp-content/plugins/solo/solo.php",
        r#"<?php do_action( 'solo_event' ); "#,
    );

    let mut store = SqliteStore::open_in_memory().unwrap();
    let options = IngestOptions::new(dir.path());
    let summary = ingest::run(&mut store, &options, None).unwrap();

    assert_eq!(summary.files_scanned, 1);
    assert!(store.count_occurrences().unwrap() > 0);
}

#[test]
fn hookless_files_contribute_nothing() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "wp-content/plugins/quiet/quiet.php",
        r#"<?php
        function quiet_helper() {}
        class QuietWidget {}
        "#,
    );

    let mut store = SqliteStore::open_in_memory().unwrap();
    let options = IngestOptions::new(dir.path());
    let summary = ingest::run(&mut store, &options, None).unwrap();

    assert_eq!(summary.files_scanned, 0);
    assert_eq!(store.count_occurrences().unwrap(), 0);
}
