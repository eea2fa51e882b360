use compenv_core::errors::{EnvError, ExError, ExErrorKind};
use compenv_core::ExtensionScope;
use compenv_core_types::NodeId;

#[test]
fn test_already_disposed_verifiable_by_kind() {
    let err = EnvError::AlreadyDisposed {
        entity: "project 1".to_string(),
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.kind(), ExErrorKind::AlreadyDisposed);
    assert_eq!(ex_err.code(), "ERR_ALREADY_DISPOSED");
    assert_eq!(ex_err.entity_id(), Some("project 1"));
}

#[test]
fn test_invalid_registration_names_child() {
    let err = EnvError::InvalidRegistration {
        child: NodeId::new(3),
        parent: NodeId::new(9),
        reason: "cycle".to_string(),
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.kind(), ExErrorKind::InvalidRegistration);
    assert_eq!(ex_err.op(), Some("register"));
    assert_eq!(ex_err.entity_id(), Some("node#3"));
    assert!(ex_err.message().contains("node#9"));
}

#[test]
fn test_extension_errors_carry_scope() {
    let duplicate: ExError = EnvError::DuplicateExtensionPoint {
        scope: ExtensionScope::Application,
        name: "meta_languages".to_string(),
    }
    .into();
    let unknown: ExError = EnvError::UnknownExtensionPoint {
        scope: ExtensionScope::Project,
        name: "lint_rules".to_string(),
    }
    .into();

    assert_eq!(duplicate.code(), "ERR_DUPLICATE_EXTENSION_POINT");
    assert_eq!(duplicate.scope(), Some(ExtensionScope::Application));
    assert_eq!(duplicate.entity_id(), Some("meta_languages"));
    assert_eq!(unknown.code(), "ERR_UNKNOWN_EXTENSION_POINT");
    assert_eq!(unknown.scope(), Some(ExtensionScope::Project));
}

#[test]
fn test_not_active_and_release_without_acquire_are_distinct() {
    let not_active: ExError = EnvError::ApplicationNotActive.into();
    let unbalanced: ExError = EnvError::ReleaseWithoutAcquire {
        application_id: "app-1".to_string(),
    }
    .into();

    assert_eq!(not_active.kind(), ExErrorKind::NotActive);
    assert_eq!(unbalanced.kind(), ExErrorKind::ReleaseWithoutAcquire);
    assert_eq!(unbalanced.code(), "ERR_RELEASE_WITHOUT_ACQUIRE");
    assert_eq!(unbalanced.entity_id(), Some("app-1"));
}

#[test]
fn test_manifest_and_io_errors_name_their_file() {
    let manifest: ExError = EnvError::InvalidManifest {
        origin: "lint.toml".to_string(),
        reason: "empty id".to_string(),
    }
    .into();
    let io: ExError = EnvError::Io {
        path: "/tmp/x.kt".to_string(),
        message: "not found".to_string(),
    }
    .into();

    assert_eq!(manifest.op(), Some("load_manifest"));
    assert_eq!(manifest.entity_id(), Some("lint.toml"));
    assert_eq!(io.kind(), ExErrorKind::Io);
    assert_eq!(io.entity_id(), Some("/tmp/x.kt"));
}

#[test]
fn test_display_carries_code() {
    let ex_err: ExError = EnvError::DuplicateService {
        service: "Resolver".to_string(),
    }
    .into();

    let rendered = ex_err.to_string();
    assert!(rendered.starts_with("[ERR_DUPLICATE_SERVICE]"));
    assert!(rendered.contains("register_service"));
    assert!(rendered.contains("Resolver"));
}
