//! Integration tests for the ``entity!`` macro.
//!
//! Tests the public API as users would interact with it.

#![allow(missing_docs, clippy::float_cmp)]

mod common;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use common::{AuditEvent, User};
use strata_orm::{Entity, Error, ScalarKind, Value, entity};
use uuid::Uuid;

entity! {
    #[derive(Debug, Clone, Default)]
    pub struct Measurement {
        pub sensor: Uuid,
        pub taken_on: NaiveDate,
        pub taken_at: Option<NaiveTime>,
        pub recorded: Option<NaiveDateTime>,
        pub reading: f64,
        pub grade: char,
        pub flags: u8,
    }
}

#[test]
fn entity_basic() {
    assert_eq!(User::NAME, "User");
    let names: Vec<_> = User::properties().iter().map(|p| p.name).collect();
    assert_eq!(names, ["id", "name", "active", "email"]);
}

#[test]
fn property_kinds_and_nullability() {
    let properties = Measurement::properties();
    assert_eq!(properties[0].kind, ScalarKind::Uuid);
    assert_eq!(properties[1].kind, ScalarKind::Date);
    assert!(properties[2].nullable);
    assert_eq!(properties[2].kind, ScalarKind::Time);
    assert_eq!(properties[3].kind, ScalarKind::DateTime);
    assert!(!properties[4].nullable);
    assert_eq!(properties[5].kind, ScalarKind::Char);
    assert_eq!(properties[6].kind, ScalarKind::U8);

    let events = AuditEvent::properties();
    assert_eq!(events[1].kind, ScalarKind::DateTimeUtc);
}

#[test]
fn values_follow_declaration_order() {
    let mut user = common::user("bob");
    user.email = Some("b@example.com".to_string());
    let values = user.values();

    assert_eq!(values[0], ("id", Value::BigInt(Some(0))));
    assert_eq!(values[1], ("name", Value::from("bob")));
    assert_eq!(values[2], ("active", Value::Bool(Some(true))));
    assert_eq!(values[3], ("email", Value::from("b@example.com")));
}

#[test]
fn set_value_converts() {
    let mut measurement = Measurement::default();
    measurement.set_value("reading", Value::Double(Some(1.5))).unwrap();
    assert_eq!(measurement.reading, 1.5);

    measurement.set_value("taken_at", Value::ChronoTime(None)).unwrap();
    assert!(measurement.taken_at.is_none());

    let err = measurement.set_value("reading", Value::from("x")).unwrap_err();
    assert!(matches!(err, Error::Assign { property, .. } if property == "reading"));

    let err = measurement.set_value("missing", Value::Int(Some(1))).unwrap_err();
    assert!(matches!(err, Error::Assign { .. }));
}
