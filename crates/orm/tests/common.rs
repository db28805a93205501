//! Common test helpers shared across integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use strata_orm::{
    Executor, FutureResult, MySql, Params, Registry, RegistryConfig, SqlServer, Statement, Value,
    entity,
};

// Common test entities used across multiple test files

entity! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct User {
        pub id: i64,
        pub name: String,
        pub active: bool,
        pub email: Option<String>,
    }
}

entity! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct OrderLine {
        pub order_id: i64,
        pub line_no: i32,
        pub sku: String,
        pub quantity: u32,
    }
}

entity! {
    #[derive(Debug, Clone)]
    pub struct AuditEvent {
        pub id: i32,
        pub occurred_at: DateTime<Utc>,
        pub message: String,
    }
}

/// Route generated-SQL debug events to the test writer. Set `RUST_LOG` to
/// see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn user(name: &str) -> User {
    User {
        id: 0,
        name: name.to_string(),
        active: true,
        email: None,
    }
}

/// Registry with one `MySQL` connection (`main`) and one SQL Server
/// connection (`reports`). `User` gets an auto-incremented `id`, `OrderLine`
/// a composite key.
pub fn registry(dialect: &str) -> Registry {
    let config = match dialect {
        "sqlserver" => RegistryConfig::new("main", Arc::new(SqlServer)),
        _ => RegistryConfig::new("main", Arc::new(MySql)),
    }
    .with_connection("reports", Arc::new(SqlServer));

    let registry = Registry::new(config);
    registry.configure::<User>(|user| user.table("users").auto_key("id")).unwrap();
    registry
        .configure::<OrderLine>(|line| line.table("order_lines").keys(&["order_id", "line_no"]))
        .unwrap();
    registry
}

/// Executor recording every call; `exec_scalar` answers with `scalar`.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    pub calls: Mutex<Vec<Call>>,
    pub scalar: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Exec { connection: String, statement: Statement },
    Each { connection: String, sql: String, rows: Vec<Params> },
    Scalar { connection: String, statements: Vec<Statement> },
}

impl RecordingExecutor {
    pub fn returning(scalar: Value) -> Self {
        Self {
            calls: Mutex::default(),
            scalar: Some(scalar),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl Executor for RecordingExecutor {
    fn exec(&self, connection: &str, statement: Statement) -> FutureResult<u64> {
        self.calls.lock().unwrap().push(Call::Exec {
            connection: connection.to_string(),
            statement,
        });
        Box::pin(async { Ok(1) })
    }

    fn exec_each(&self, connection: &str, sql: String, rows: Vec<Params>) -> FutureResult<u64> {
        let affected = rows.len() as u64;
        self.calls.lock().unwrap().push(Call::Each {
            connection: connection.to_string(),
            sql,
            rows,
        });
        Box::pin(async move { Ok(affected) })
    }

    fn exec_scalar(&self, connection: &str, statements: Vec<Statement>) -> FutureResult<Value> {
        self.calls.lock().unwrap().push(Call::Scalar {
            connection: connection.to_string(),
            statements,
        });
        let scalar = self.scalar.clone();
        Box::pin(async move { scalar.ok_or_else(|| anyhow::anyhow!("no scalar configured")) })
    }
}

/// Normalize SQL by collapsing whitespace.
fn normalize_sql(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonicalize SQL for comparison by removing identifier delimiters and
/// normalizing whitespace. Preserves delimiters inside string literals.
fn canonicalize_sql(sql: &str) -> String {
    let mut cleaned = String::with_capacity(sql.len());
    let mut in_single_quote = false;

    for ch in sql.chars() {
        match ch {
            '\'' => {
                in_single_quote = !in_single_quote;
                cleaned.push(ch);
            }
            '`' | '[' | ']' if !in_single_quote => {}
            _ => cleaned.push(ch),
        }
    }

    normalize_sql(&cleaned)
}

/// Assert that SQL contains all expected fragments in order.
///
/// Strips identifier delimiters, normalizes whitespace, and checks that
/// fragments appear sequentially in the generated SQL.
#[allow(clippy::missing_panics_doc)]
pub fn assert_sql_contains(actual: &str, fragments: &[&str]) {
    let actual_canonical = canonicalize_sql(actual);
    let mut search_start = 0usize;

    for fragment in fragments {
        let fragment_canonical = canonicalize_sql(fragment);
        if fragment_canonical.is_empty() {
            continue;
        }

        if let Some(pos) = actual_canonical[search_start..].find(&fragment_canonical) {
            search_start += pos + fragment_canonical.len();
        } else {
            panic!(
                "expected SQL fragment `{fragment_canonical}` not found in `{actual_canonical}`"
            );
        }
    }
}
