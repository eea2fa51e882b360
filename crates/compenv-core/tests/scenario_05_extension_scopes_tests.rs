/// Scenario 5: Extension scopes
///
/// Application and project registries are separate: points declared in one
/// scope are invisible in the other unless the caller chains lookups.
mod common;

use std::sync::Arc;

use compenv_core::builtins::{CLASS_FILE_DECOMPILERS, ELEMENT_FINDERS};
use compenv_core::{EnvError, ExtensionDescriptor, ExtensionPointId, ExtensionScope};

trait Highlighter: Send + Sync {
    fn language(&self) -> &'static str;
}

struct KotlinHighlighter;

impl Highlighter for KotlinHighlighter {
    fn language(&self) -> &'static str {
        "kotlin"
    }
}

const HIGHLIGHTERS: ExtensionPointId<dyn Highlighter> = ExtensionPointId::new("highlighters");

#[test]
fn test_scenario_05_happy_default_points_per_scope() {
    // GIVEN a shared project
    let env = common::new_environment();
    let scope = env.new_scope("points");
    let handle = env.create_shared(&common::empty_config(), scope).unwrap();
    let app_area = handle.application().extensions();
    let project_area = handle.project().extensions();

    // WHEN inspecting both registries
    // THEN each holds only the points of its own scope
    assert_eq!(app_area.scope(), ExtensionScope::Application);
    assert_eq!(project_area.scope(), ExtensionScope::Project);
    assert!(app_area.contains_point(CLASS_FILE_DECOMPILERS.name()));
    assert!(!project_area.contains_point(CLASS_FILE_DECOMPILERS.name()));
    assert!(project_area.contains_point(ELEMENT_FINDERS.name()));
    assert!(!app_area.contains_point(ELEMENT_FINDERS.name()));

    env.dispose_scope(scope);
}

#[test]
fn test_scenario_05_happy_typed_point_round_trip() {
    // GIVEN a custom trait-object point declared in the project scope
    let env = common::new_environment();
    let scope = env.new_scope("typed");
    let handle = env.create_shared(&common::empty_config(), scope).unwrap();
    let area = handle.project().extensions();
    area.register_point(&HIGHLIGHTERS).unwrap();

    // WHEN an implementation is registered
    area.register_extension(&HIGHLIGHTERS, Arc::new(KotlinHighlighter) as Arc<dyn Highlighter>)
        .unwrap();

    // THEN lookup returns it through the trait
    let found = area.lookup(&HIGHLIGHTERS);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].language(), "kotlin");

    env.dispose_scope(scope);
}

#[test]
fn test_scenario_05_error_project_point_not_inherited_from_application() {
    // GIVEN a point declared only at application scope
    let env = common::new_environment();
    let scope = env.new_scope("inherit");
    let handle = env.create_shared(&common::empty_config(), scope).unwrap();
    handle
        .application()
        .extensions()
        .register_point(&HIGHLIGHTERS)
        .unwrap();

    // WHEN registering an extension for it in the project scope
    let result = handle
        .project()
        .extensions()
        .register_extension(&HIGHLIGHTERS, Arc::new(KotlinHighlighter) as Arc<dyn Highlighter>);

    // THEN the project area reports it unknown
    assert!(matches!(
        result,
        Err(EnvError::UnknownExtensionPoint {
            scope: ExtensionScope::Project,
            ..
        })
    ));

    env.dispose_scope(scope);
}

#[test]
fn test_scenario_05_happy_chained_lookup_project_then_application() {
    // GIVEN the same point name declared in both scopes
    let env = common::new_environment();
    let scope = env.new_scope("chain");
    let handle = env.create_shared(&common::empty_config(), scope).unwrap();
    let app_area = handle.application().extensions();
    let project_area = handle.project().extensions();
    app_area.register_point(&ELEMENT_FINDERS).unwrap();
    app_area
        .register_extension(&ELEMENT_FINDERS, Arc::new(ExtensionDescriptor::new("global", "g.Finder")))
        .unwrap();
    project_area
        .register_extension(&ELEMENT_FINDERS, Arc::new(ExtensionDescriptor::new("local", "l.Finder")))
        .unwrap();

    // WHEN looking up through the project
    let ids: Vec<_> = handle
        .project()
        .lookup_chained(&ELEMENT_FINDERS)
        .iter()
        .map(|d| d.id.clone())
        .collect();

    // THEN project extensions come first
    assert_eq!(ids, vec!["local", "global"]);

    env.dispose_scope(scope);
}

#[test]
fn test_scenario_05_edge_sibling_project_registrations_are_private() {
    // GIVEN two sibling projects
    let env = common::new_environment();
    let scope = env.new_scope("siblings");
    let a = env.create_shared(&common::empty_config(), scope).unwrap();
    let b = env.create_shared(&common::empty_config(), scope).unwrap();

    // WHEN one registers a project extension
    a.project()
        .extensions()
        .register_extension(&ELEMENT_FINDERS, Arc::new(ExtensionDescriptor::new("only-a", "a.Finder")))
        .unwrap();

    // THEN the other does not see it
    assert_eq!(a.project().extensions().lookup(&ELEMENT_FINDERS).len(), 1);
    assert!(b.project().extensions().lookup(&ELEMENT_FINDERS).is_empty());

    env.dispose_scope(scope);
}

#[test]
fn test_scenario_05_edge_registries_cleared_on_dispose() {
    // GIVEN a project with a registered extension
    let env = common::new_environment();
    let scope = env.new_scope("cleared");
    let handle = env.create_shared(&common::empty_config(), scope).unwrap();
    let project_area = handle.project().extensions().clone();
    let app_area = handle.application().extensions().clone();

    // WHEN the scope is disposed
    env.dispose_scope(scope);

    // THEN both registries are empty and closed
    assert!(project_area.points().is_empty());
    assert!(app_area.points().is_empty());
    assert!(matches!(
        project_area.register_point(&HIGHLIGHTERS),
        Err(EnvError::AlreadyDisposed { .. })
    ));
}
