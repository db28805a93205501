//! Integration tests for the runtime registry.

#![allow(missing_docs)]

mod common;

use std::sync::Arc;
use std::thread;

use common::{AuditEvent, OrderLine, User, registry};
use strata_orm::{
    Capitalization, ColumnRule, Conventions, Error, MySql, NamingPolicy, NamingStrategy, Registry,
    RegistryConfig, Routing, SqlServer,
};

fn conventions() -> Conventions {
    Conventions::new()
        .id_is_auto_key()
        .property(
            |_, property| property.name == "occurred_at",
            ColumnRule::auto_generated().column("created"),
        )
        .entity(|name| name.starts_with("Audit"), Routing::single("reports"))
}

#[test]
fn conventions_apply_without_explicit_metadata() {
    let config = RegistryConfig::new("main", Arc::new(MySql))
        .with_connection("reports", Arc::new(SqlServer))
        .with_conventions(conventions());
    let registry = Registry::new(config);

    let metadata = registry.metadata::<AuditEvent>().unwrap();
    assert_eq!(metadata.table_name(), "audit_event");
    assert!(metadata.field("id").is_some_and(|id| id.is_key && id.auto_generation));
    assert_eq!(metadata.field("occurred_at").map(|f| f.name.as_str()), Some("created"));

    let source = registry.data_source::<AuditEvent>().unwrap();
    assert_eq!(source.reading_connection(), "reports");
    assert_eq!(source.dialect().name(), "sqlserver");

    let templates = registry.templates::<AuditEvent>().unwrap();
    assert_eq!(templates.insert(), "INSERT INTO [audit_event] ([message]) VALUES (@message)");
    assert_eq!(templates.delete().unwrap(), "DELETE FROM [audit_event] WHERE [id] = @id");
}

#[test]
fn explicit_metadata_bypasses_conventions() {
    let config = RegistryConfig::new("main", Arc::new(MySql)).with_conventions(conventions());
    let registry = Registry::new(config);
    registry.configure::<AuditEvent>(|event| event.key("id").table("events")).unwrap();

    let metadata = registry.metadata::<AuditEvent>().unwrap();
    assert_eq!(metadata.table_name(), "events");
    assert!(!metadata.field("id").unwrap().auto_generation);
    assert_eq!(metadata.field("occurred_at").unwrap().name, "occurred_at");
}

#[test]
fn naming_policy_applies_to_reflection() {
    let config = RegistryConfig::new("main", Arc::new(MySql))
        .with_naming(NamingPolicy::new(NamingStrategy::Underline, Capitalization::UpperCase));
    let registry = Registry::new(config);

    let metadata = registry.metadata::<OrderLine>().unwrap();
    assert_eq!(metadata.table_name(), "ORDER_LINE");
    assert_eq!(metadata.field("line_no").unwrap().name, "LINE_NO");
}

#[test]
fn keyless_metadata_serves_reads_only() {
    let registry = Registry::new(RegistryConfig::new("main", Arc::new(MySql)));
    let templates = registry.templates::<OrderLine>().unwrap();
    assert!(templates.select().starts_with("SELECT"));
    assert!(matches!(templates.update(), Err(Error::MissingKey("OrderLine"))));

    let generator = registry.generator::<OrderLine>().unwrap();
    let line = OrderLine {
        order_id: 1,
        line_no: 1,
        sku: "x".to_string(),
        quantity: 1,
    };
    assert!(matches!(generator.delete(&line), Err(Error::MissingKey(_))));
}

#[test]
fn builder_errors_surface_from_configure() {
    let registry = Registry::new(RegistryConfig::new("main", Arc::new(MySql)));
    let err = registry.configure::<User>(|user| user.table("users")).unwrap_err();
    assert!(matches!(err, Error::MissingKey("User")));

    let err = registry.configure::<User>(|user| user.key("id").ignore("id")).unwrap_err();
    assert!(matches!(err, Error::IgnoredKey { .. }));
}

#[test]
fn configured_registry_rejects_republication() {
    let registry = registry("mysql");
    let err = registry.configure::<User>(|user| user.key("id")).unwrap_err();
    assert!(matches!(err, Error::AlreadyRegistered("User")));
}

#[test]
fn reflection_then_publication_fails() {
    let registry = Registry::new(RegistryConfig::new("main", Arc::new(MySql)));
    registry.metadata::<User>().unwrap();
    let err = registry.configure::<User>(|user| user.key("id")).unwrap_err();
    assert!(matches!(err, Error::AlreadyRegistered(_)));
}

#[test]
fn concurrent_resolution_has_one_winner() {
    let config = RegistryConfig::new("main", Arc::new(MySql))
        .with_conventions(Conventions::new().id_is_auto_key());
    let registry = Registry::new(config);

    let resolved: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    let metadata = registry.metadata::<User>().unwrap();
                    let templates = registry.templates::<User>().unwrap();
                    (metadata, templates)
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    let (first_metadata, first_templates) = &resolved[0];
    for (metadata, templates) in &resolved[1..] {
        assert!(Arc::ptr_eq(first_metadata, metadata));
        assert!(Arc::ptr_eq(first_templates, templates));
    }
}

#[test]
fn publication_racing_resolution_keeps_one_data_source() {
    let config =
        RegistryConfig::new("main", Arc::new(MySql)).with_connection("audit", Arc::new(MySql));
    let registry = Registry::new(config);

    let observed: Vec<_> = thread::scope(|scope| {
        let publisher = scope.spawn(|| {
            registry.configure::<AuditEvent>(|event| event.key("id").connection("audit"))
        });
        let readers: Vec<_> =
            (0..4).map(|_| scope.spawn(|| registry.data_source::<AuditEvent>().unwrap())).collect();

        match publisher.join().unwrap() {
            Ok(_) | Err(Error::AlreadyRegistered(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
        readers.into_iter().map(|reader| reader.join().unwrap()).collect()
    });

    let settled = registry.data_source::<AuditEvent>().unwrap();
    let metadata = registry.metadata::<AuditEvent>().unwrap();
    assert_eq!(settled.reading_connection(), metadata.reading_connection());
    for source in observed {
        assert_eq!(source, settled);
    }
}

#[test]
fn options_from_environment_defaults() {
    let registry = Registry::from_env().unwrap();
    let config = registry.config();
    assert_eq!(config.default_connection(), "default");
    assert_eq!(config.dialect("default").unwrap().name(), "mysql");
    assert_eq!(config.naming().resolve("UserName"), "user_name");
}
