//! Tests for dependency-ordered resolution

use std::{fs, path::Path};

use anyhow::Result;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use super::*;
use crate::reporter::RecordingReporter;

fn module(path: &str) -> ModulePath {
    ModulePath::parse(path).expect("valid module path")
}

fn write_file(root: &Path, relative: &str, content: &str) -> Result<()> {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

/// Resolve `entry` into a fresh session and return the text and emission order
fn bundle(
    root: &Path,
    overrides: &OverrideStore,
    reporter: &dyn Reporter,
    entry: &str,
) -> Result<(String, Vec<String>), BundleError> {
    let resolver = ScriptResolver::new(root, overrides, reporter);
    let mut session = BundleSession::new();
    resolver.resolve(&module(entry), &mut session)?;
    let order = session.emitted().iter().map(ToString::to_string).collect();
    Ok((String::from_utf8_lossy(session.output()).into_owned(), order))
}

#[test]
fn test_dependencies_precede_dependents() -> Result<()> {
    let temp = TempDir::new()?;
    write_file(temp.path(), "app.js", "//= require lib/a\napp();\n")?;
    write_file(temp.path(), "lib/a.js", "//= require ./b\na();\n")?;
    write_file(temp.path(), "lib/b.js", "b();\n")?;

    let reporter = RecordingReporter::new();
    let (output, order) = bundle(temp.path(), &OverrideStore::empty(), &reporter, "app.js")?;

    assert_eq!(order, vec!["lib/b.js", "lib/a.js", "app.js"]);
    assert_eq!(
        output,
        "b();\n//= require ./b\na();\n//= require lib/a\napp();\n"
    );
    Ok(())
}

#[test]
fn test_shared_dependency_is_emitted_once() -> Result<()> {
    let temp = TempDir::new()?;
    write_file(temp.path(), "app.js", "//= require lib/a\n//= require lib/b\napp();\n")?;
    write_file(temp.path(), "lib/a.js", "//= require ./shared\na();\n")?;
    write_file(temp.path(), "lib/b.js", "//= require ./shared\n//= require ./a\nb();\n")?;
    write_file(temp.path(), "lib/shared.js", "shared();\n")?;

    let reporter = RecordingReporter::new();
    let (output, order) = bundle(temp.path(), &OverrideStore::empty(), &reporter, "app.js")?;

    assert_eq!(order, vec!["lib/shared.js", "lib/a.js", "lib/b.js", "app.js"]);
    assert_eq!(output.matches("shared();").count(), 1);
    assert_eq!(output.matches("a();").count(), 1);
    Ok(())
}

#[test]
fn test_cycle_terminates_and_emits_each_member_once() -> Result<()> {
    let temp = TempDir::new()?;
    write_file(temp.path(), "a.js", "//= require b\na();\n")?;
    write_file(temp.path(), "b.js", "//= require a\nb();\n")?;

    let reporter = RecordingReporter::new();
    let (output, order) = bundle(temp.path(), &OverrideStore::empty(), &reporter, "a.js")?;

    assert_eq!(order.len(), 2);
    assert_eq!(output.matches("a();").count(), 1);
    assert_eq!(output.matches("b();").count(), 1);
    assert!(reporter.events().contains(&BundleEvent::CycleBroken {
        path: module("a.js"),
        required_by: module("b.js"),
    }));
    Ok(())
}

#[test]
fn test_self_require_is_ignored() -> Result<()> {
    let temp = TempDir::new()?;
    write_file(temp.path(), "app.js", "//= require app\napp();\n")?;

    let reporter = RecordingReporter::new();
    let (output, order) = bundle(temp.path(), &OverrideStore::empty(), &reporter, "app.js")?;

    assert_eq!(order, vec!["app.js"]);
    assert_eq!(output, "//= require app\napp();\n");
    Ok(())
}

#[test]
fn test_override_replaces_content_and_drives_requires() -> Result<()> {
    let temp = TempDir::new()?;
    write_file(temp.path(), "app.js", "//= require lib/a\napp();\n")?;
    write_file(temp.path(), "lib/a.js", "//= require ./b\nsource_a();\n")?;
    write_file(temp.path(), "lib/b.js", "b();\n")?;
    write_file(temp.path(), "lib/c.js", "c();\n")?;

    let overrides: OverrideStore =
        [(module("lib/a.js"), b"//= require ./c\noverride_a();\n".to_vec())]
            .into_iter()
            .collect();

    let reporter = RecordingReporter::new();
    let (output, order) = bundle(temp.path(), &overrides, &reporter, "app.js")?;

    assert_eq!(order, vec!["lib/c.js", "lib/a.js", "app.js"]);
    assert_eq!(
        output,
        "c();\n//= require ./c\noverride_a();\n//= require lib/a\napp();\n"
    );
    assert_eq!(
        reporter.emitted(),
        vec![
            ("lib/c.js".to_owned(), ContentOrigin::Source),
            ("lib/a.js".to_owned(), ContentOrigin::Override),
            ("app.js".to_owned(), ContentOrigin::Source),
        ]
    );
    Ok(())
}

#[test]
fn test_override_may_add_module_missing_from_source() -> Result<()> {
    let temp = TempDir::new()?;
    write_file(temp.path(), "app.js", "//= require extra/custom\napp();\n")?;

    let overrides: OverrideStore = [(module("extra/custom.js"), b"custom();\n".to_vec())]
        .into_iter()
        .collect();

    let reporter = RecordingReporter::new();
    let (output, _) = bundle(temp.path(), &overrides, &reporter, "app.js")?;

    assert_eq!(output, "custom();\n//= require extra/custom\napp();\n");
    Ok(())
}

#[test]
fn test_nested_override_only_substitutes_its_own_bytes() -> Result<()> {
    let temp = TempDir::new()?;
    write_file(temp.path(), "app.js", "//= require lib/a\napp();\n")?;
    write_file(temp.path(), "lib/a.js", "//= require ./deep/b\na();\n")?;
    write_file(temp.path(), "lib/deep/b.js", "deep();\n")?;

    let reporter = RecordingReporter::new();
    let (plain, plain_order) =
        bundle(temp.path(), &OverrideStore::empty(), &reporter, "app.js")?;

    let overrides: OverrideStore = [(module("lib/deep/b.js"), b"DEEP();\n".to_vec())]
        .into_iter()
        .collect();
    let (overridden, overridden_order) = bundle(temp.path(), &overrides, &reporter, "app.js")?;

    assert_eq!(plain_order, overridden_order);
    assert_eq!(overridden, plain.replace("deep();", "DEEP();"));
    Ok(())
}

#[test]
fn test_names_resolve_against_requiring_directory() -> Result<()> {
    let temp = TempDir::new()?;
    write_file(temp.path(), "all.js", "//= require ./app/main\n//= require ./lib/main\n")?;
    write_file(temp.path(), "app/main.js", "//= require util\napp_main();\n")?;
    write_file(temp.path(), "app/util.js", "app_util();\n")?;
    write_file(temp.path(), "lib/main.js", "//= require util\n//= require ../app/util\nlib_main();\n")?;
    write_file(temp.path(), "lib/util.js", "lib_util();\n")?;

    let reporter = RecordingReporter::new();
    let (_, order) = bundle(temp.path(), &OverrideStore::empty(), &reporter, "all.js")?;

    assert_eq!(
        order,
        vec!["app/util.js", "app/main.js", "lib/util.js", "lib/main.js", "all.js"]
    );
    Ok(())
}

#[test]
fn test_missing_dependency_names_path_and_requirer() -> Result<()> {
    let temp = TempDir::new()?;
    write_file(temp.path(), "app.js", "//= require lib/missing\napp();\n")?;

    let reporter = RecordingReporter::new();
    let err = bundle(temp.path(), &OverrideStore::empty(), &reporter, "app.js")
        .expect_err("missing dependency must fail");

    match &err {
        BundleError::NotFound { path, required_by } => {
            assert_eq!(path, &module("lib/missing.js"));
            assert_eq!(required_by, &RequiredBy::Module(module("app.js")));
        }
        other => panic!("unexpected error: {other}"),
    }
    let message = err.to_string();
    assert!(message.contains("lib/missing.js"), "{message}");
    assert!(message.contains("app.js"), "{message}");
    Ok(())
}

#[test]
fn test_missing_entry_point_is_not_found() {
    let temp = TempDir::new().expect("temp dir");
    let reporter = RecordingReporter::new();
    let result = bundle(temp.path(), &OverrideStore::empty(), &reporter, "nope.js");

    assert!(matches!(
        result,
        Err(BundleError::NotFound {
            required_by: RequiredBy::EntryPoint,
            ..
        })
    ));
}

#[test]
fn test_require_escaping_source_root_fails() -> Result<()> {
    let temp = TempDir::new()?;
    write_file(temp.path(), "app.js", "//= require ../../etc/secrets\n")?;

    let reporter = RecordingReporter::new();
    let result = bundle(temp.path(), &OverrideStore::empty(), &reporter, "app.js");

    assert!(matches!(result, Err(BundleError::OutsideRoot { ref name, .. }) if name == "../../etc/secrets"));
    Ok(())
}

#[test]
fn test_seen_modules_are_not_appended_again_in_same_session() -> Result<()> {
    let temp = TempDir::new()?;
    write_file(temp.path(), "app.js", "app();\n")?;

    let overrides = OverrideStore::empty();
    let reporter = RecordingReporter::new();
    let resolver = ScriptResolver::new(temp.path(), &overrides, &reporter);

    let mut session = BundleSession::new();
    resolver.resolve(&module("app.js"), &mut session)?;
    resolver.resolve(&module("app.js"), &mut session)?;
    assert!(session.is_seen(&module("app.js")));
    assert_eq!(session.into_output(), b"app();\n");

    let mut fresh = BundleSession::new();
    resolver.resolve(&module("app.js"), &mut fresh)?;
    assert_eq!(fresh.into_output(), b"app();\n");
    Ok(())
}

#[test]
fn test_every_module_follows_its_transitive_dependencies() -> Result<()> {
    let temp = TempDir::new()?;
    let count = 9;
    let deps = |i: usize| -> Vec<usize> { (0..i).filter(|j| (i + j) % 3 != 0).collect() };

    let mut entry = String::new();
    for i in 0..count {
        let mut content = String::new();
        for j in deps(i) {
            content.push_str(&format!("//= require m{j}\n"));
        }
        content.push_str(&format!("/*m{i}*/\n"));
        write_file(temp.path(), &format!("m{i}.js"), &content)?;
        entry.push_str(&format!("//= require m{}\n", count - 1 - i));
    }
    write_file(temp.path(), "entry.js", &entry)?;

    let reporter = RecordingReporter::new();
    let (output, order) = bundle(temp.path(), &OverrideStore::empty(), &reporter, "entry.js")?;
    assert_eq!(order.len(), count + 1);

    let position = |i: usize| {
        let marker = format!("/*m{i}*/");
        assert_eq!(output.matches(&marker).count(), 1, "{marker} emitted once");
        output.find(&marker).expect("marker present")
    };
    for i in 0..count {
        for j in deps(i) {
            assert!(position(j) < position(i), "m{j} must precede m{i}");
        }
    }
    Ok(())
}
