//! Integration tests for statement generation.
//!
//! Tests the public API as users would interact with it.

#![allow(missing_docs)]

mod common;

use common::{OrderLine, User, assert_sql_contains, registry, user};
use strata_orm::{
    Argument, BatchInsert, Error, QueryFilter, SingleQueryFilter, SortOptions, Value, field,
};

// SELECT tests

#[test]
fn select_basic() {
    let generator = registry("mysql").generator::<User>().unwrap();
    let statement = generator.select(&QueryFilter::all(), &SortOptions::new()).unwrap();
    assert_eq!(statement.sql, "SELECT `active`, `email`, `id`, `name` FROM `users`");
    assert!(statement.params.is_empty());
}

#[test]
fn select_with_filter_and_sort() {
    let generator = registry("mysql").generator::<User>().unwrap();
    let filter = SingleQueryFilter::and().eq("active", true).gt("id", 100_i64).into();
    let sort = SortOptions::new().asc("name").desc("id");
    let statement = generator.select(&filter, &sort).unwrap();

    assert_sql_contains(
        &statement.sql,
        &[
            "SELECT active, email, id, name",
            "FROM users",
            "WHERE active = @p0 AND id > @p1",
            "ORDER BY name asc, id desc",
        ],
    );
    assert_eq!(statement.params.len(), 2);
}

#[test]
fn page_mysql() {
    let generator = registry("mysql").generator::<User>().unwrap();
    let filter = SingleQueryFilter::and().eq("active", true).into();

    let first = generator.page(&filter, &SortOptions::new().asc("id"), 0, 10).unwrap();
    assert!(first.sql.ends_with("WHERE `active` = @p0 ORDER BY `id` asc LIMIT 10"));

    let third = generator.page(&filter, &SortOptions::new().asc("id"), 2, 10).unwrap();
    assert!(third.sql.ends_with("LIMIT 20, 10"));
}

#[test]
fn page_sqlserver() {
    let generator = registry("sqlserver").generator::<User>().unwrap();
    let filter = SingleQueryFilter::and().eq("active", true).into();
    let statement = generator.page(&filter, &SortOptions::new().desc("id"), 1, 5).unwrap();

    assert_sql_contains(
        &statement.sql,
        &[
            "SELECT * FROM (SELECT active, email, id, name,",
            "ROW_NUMBER() OVER(ORDER BY id desc) AS ROWNUMBER",
            "FROM users WHERE active = @p0) AS PAGED",
            "WHERE ROWNUMBER BETWEEN 6 AND 10",
        ],
    );
    assert_eq!(statement.params.len(), 1);
}

#[test]
fn paginate_rejects_ambiguous_from() {
    let generator = registry("sqlserver").generator::<User>().unwrap();
    let err = generator.paginate(0, 5, "SELECT 1", "", None).unwrap_err();
    assert!(matches!(err, Error::MalformedSelect(_)));

    let err = generator
        .paginate(0, 5, "SELECT a FROM t JOIN u ON t.id IN (SELECT id FROM v)", "", None)
        .unwrap_err();
    assert!(matches!(err, Error::MalformedSelect(_)));
}

#[test]
fn count_with_filter() {
    let generator = registry("sqlserver").generator::<User>().unwrap();
    let filter = field("name").eq("bob").or(field("name").eq("alice"));
    let statement = generator.count(&strata_orm::compile(&filter).unwrap()).unwrap();
    assert_eq!(
        statement.sql,
        "SELECT COUNT(*) FROM [users] WHERE ([name] = @p0) OR ([name] = @p1)"
    );
}

// INSERT tests

#[test]
fn insert_skips_generated_key() {
    let generator = registry("mysql").generator::<User>().unwrap();
    let mut entity = user("bob");
    entity.email = Some("bob@example.com".to_string());
    let statement = generator.insert(&entity);

    assert_eq!(
        statement.sql,
        "INSERT INTO `users` (`active`, `email`, `name`) VALUES (@active, @email, @name)"
    );
    assert_eq!(statement.params.names().collect::<Vec<_>>(), ["active", "email", "name"]);
    assert_eq!(statement.params.scalar("name"), Some(&Value::from("bob")));
    assert!(statement.params.get("id").is_none());
}

#[test]
fn batch_insert_mysql_is_multi_row() {
    let generator = registry("mysql").generator::<User>().unwrap();
    let batch = generator.batch_insert(&[user("a"), user("b")]);

    let BatchInsert::MultiRow { statement, rows } = batch else {
        panic!("expected a multi-row insert");
    };
    assert_eq!(rows, 2);
    assert_eq!(
        statement.sql,
        "INSERT INTO `users` (`active`, `email`, `name`) VALUES \
         (@active_0, @email_0, @name_0), (@active_1, @email_1, @name_1)"
    );
    assert_eq!(statement.params.scalar("name_1"), Some(&Value::from("b")));
}

#[test]
fn batch_insert_sqlserver_is_per_row() {
    let generator = registry("sqlserver").generator::<User>().unwrap();
    let batch = generator.batch_insert(&[user("a"), user("b"), user("c")]);

    let BatchInsert::PerRow { sql, rows } = batch else {
        panic!("expected per-row inserts");
    };
    assert_eq!(sql, generator.templates().insert());
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2].scalar("name"), Some(&Value::from("c")));
}

// UPDATE tests

#[test]
fn update_by_composite_key() {
    let generator = registry("mysql").generator::<OrderLine>().unwrap();
    let line = OrderLine {
        order_id: 9,
        line_no: 2,
        sku: "A-1".to_string(),
        quantity: 4,
    };
    let statement = generator.update(&line).unwrap();

    assert_eq!(
        statement.sql,
        "UPDATE `order_lines` SET `quantity` = @quantity, `sku` = @sku \
         WHERE `order_id` = @order_id AND `line_no` = @line_no"
    );
    assert_eq!(statement.params.len(), 4);
    assert_eq!(statement.params.scalar("line_no"), Some(&Value::Int(Some(2))));
}

#[test]
fn update_fields_only_sets_named_columns() {
    let generator = registry("mysql").generator::<User>().unwrap();
    let mut entity = user("bob");
    entity.id = 5;
    let statement = generator.update_fields(&entity, &["name", "id"]).unwrap();
    assert_eq!(statement.sql, "UPDATE `users` SET `name` = @name WHERE `id` = @id");

    let err = generator.update_fields(&entity, &[]).unwrap_err();
    assert!(matches!(err, Error::EmptyUpdate(_)));

    let err = generator.update_fields(&entity, &["nope"]).unwrap_err();
    assert!(matches!(err, Error::UnknownField { .. }));
}

#[test]
fn update_where_requires_filter() {
    let generator = registry("sqlserver").generator::<User>().unwrap();
    let filter = SingleQueryFilter::and().eq("active", false).into();
    let statement = generator.update_where(&[("email", Value::String(None))], &filter).unwrap();
    assert_eq!(statement.sql, "UPDATE [users] SET [email] = @p0 WHERE [active] = @p1");

    let err = generator
        .update_where(&[("email", Value::String(None))], &QueryFilter::all())
        .unwrap_err();
    assert!(matches!(err, Error::EmptyFilter("update", _)));
}

// DELETE tests

#[test]
fn delete_by_key_and_filter() {
    let generator = registry("mysql").generator::<User>().unwrap();
    let statement = generator.delete(&user("x")).unwrap();
    assert_eq!(statement.sql, "DELETE FROM `users` WHERE `id` = @id");
    assert_eq!(statement.params.scalar("id"), Some(&Value::BigInt(Some(0))));

    let filter = SingleQueryFilter::and().r#in("id", [1_i64, 2]).into();
    let statement = generator.delete_where(&filter).unwrap();
    assert_eq!(statement.sql, "DELETE FROM `users` WHERE `id` IN @p0");
    assert!(matches!(statement.params.get("p0"), Some(Argument::List(ids)) if ids.len() == 2));

    let err = generator.delete_where(&QueryFilter::all()).unwrap_err();
    assert!(matches!(err, Error::EmptyFilter("delete", _)));
}
