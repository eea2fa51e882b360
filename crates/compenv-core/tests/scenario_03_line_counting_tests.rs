/// Scenario 3: Line counting
///
/// Totals over all source units, with every line-break convention counted
/// once and the cached total refreshed after each addition.
mod common;

use compenv_core::SourceUnit;

#[test]
fn test_scenario_03_happy_mixed_line_endings() {
    // GIVEN a project
    let env = common::new_environment();
    let scope = env.new_scope("lines");
    let handle = env.create_shared(&common::empty_config(), scope).unwrap();

    // WHEN units with every line-ending style are added
    handle
        .add_source_units([
            SourceUnit::new("unix.kt", "a\nb\n"),
            SourceUnit::new("open.kt", "a\nb"),
            SourceUnit::new("dos.kt", "a\r\nb\r\nc\r\n"),
            SourceUnit::new("mac.kt", "a\rb"),
        ])
        .unwrap();

    // THEN each style counts one line per break
    assert_eq!(handle.line_count().unwrap(), 2 + 2 + 3 + 2);

    env.dispose_scope(scope);
}

#[test]
fn test_scenario_03_edge_empty_and_blank_units() {
    // GIVEN a project with an empty unit and a lone newline
    let env = common::new_environment();
    let scope = env.new_scope("blank");
    let handle = env.create_shared(&common::empty_config(), scope).unwrap();

    // WHEN they are added
    handle
        .add_source_units([SourceUnit::new("empty.kt", ""), SourceUnit::new("nl.kt", "\n")])
        .unwrap();

    // THEN the empty unit adds nothing and the newline adds one
    assert_eq!(handle.line_count().unwrap(), 1);

    env.dispose_scope(scope);
}

#[test]
fn test_scenario_03_happy_total_refreshes_after_adding() {
    // GIVEN a project whose total was already computed
    let env = common::new_environment();
    let scope = env.new_scope("cache");
    let handle = env.create_shared(&common::empty_config(), scope).unwrap();
    handle.add_source_units([common::unit_with_lines("A.kt", 4)]).unwrap();
    assert_eq!(handle.line_count().unwrap(), 4);

    // WHEN more units arrive
    handle.add_source_units([common::unit_with_lines("B.kt", 6)]).unwrap();

    // THEN the next count includes them
    assert_eq!(handle.line_count().unwrap(), 10);

    env.dispose_scope(scope);
}

#[test]
fn test_scenario_03_edge_no_units_is_zero() {
    // GIVEN a project with no sources
    let env = common::new_environment();
    let scope = env.new_scope("none");
    let handle = env.create_shared(&common::empty_config(), scope).unwrap();

    // WHEN counting
    // THEN the total is zero
    assert_eq!(handle.line_count().unwrap(), 0);

    env.dispose_scope(scope);
}

#[test]
fn test_scenario_03_happy_units_from_files() {
    // GIVEN two files on disk
    let dir = tempfile::tempdir().unwrap();
    let a = common::write_file(&dir, "A.kt", "one\ntwo\n");
    let b = common::write_file(&dir, "B.kts", "three");

    // WHEN they are loaded into a project
    let env = common::new_environment();
    let scope = env.new_scope("files");
    let handle = env.create_shared(&common::empty_config(), scope).unwrap();
    let units = vec![
        SourceUnit::from_file(&a).unwrap(),
        SourceUnit::from_file(&b).unwrap(),
    ];
    handle.add_source_units(units).unwrap();

    // THEN lines and file types come out right
    assert_eq!(handle.line_count().unwrap(), 3);
    let types: Vec<_> = handle
        .project()
        .source_units()
        .iter()
        .map(|u| {
            handle
                .project()
                .file_type_of(u)
                .map(|b| b.file_type.clone())
        })
        .collect();
    assert_eq!(types, vec![Some("source".to_string()), Some("script".to_string())]);

    env.dispose_scope(scope);
}
