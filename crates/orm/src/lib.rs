//! Typed filter compiler and dialect-aware SQL generation.
//!
//! Compiles predicate expressions over entity properties into a filter AST
//! and renders parameterized SQL for `MySQL` and SQL Server from cached
//! per-entity metadata. Statement execution and row mapping are left to an
//! external [`Executor`].
//!
//! # Quick Start
//!
//! ## Define an Entity
//!
//! ```
//! strata_orm::entity! {
//!     #[derive(Debug, Clone)]
//!     pub struct BlogPost {
//!         pub id: i64,
//!         pub title: String,
//!         pub views: i32,
//!         pub archived_at: Option<chrono::NaiveDateTime>,
//!     }
//! }
//! ```
//!
//! ## Configure a Registry
//!
//! ```
//! # strata_orm::entity! {
//! #     pub struct BlogPost { pub id: i64, pub title: String, pub views: i32 }
//! # }
//! use std::sync::Arc;
//!
//! use strata_orm::{MySql, Registry, RegistryConfig};
//!
//! let registry = Registry::new(RegistryConfig::new("blog", Arc::new(MySql)));
//! registry.configure::<BlogPost>(|post| post.table("posts").auto_key("id")).unwrap();
//!
//! let templates = registry.templates::<BlogPost>().unwrap();
//! assert_eq!(templates.select(), "SELECT `id`, `title`, `views` FROM `posts`");
//! ```
//!
//! ## Filter, Sort and Paginate
//!
//! ```
//! # strata_orm::entity! {
//! #     pub struct BlogPost { pub id: i64, pub title: String, pub views: i32 }
//! # }
//! # use std::sync::Arc;
//! # use strata_orm::{MySql, Registry, RegistryConfig};
//! # let registry = Registry::new(RegistryConfig::new("blog", Arc::new(MySql)));
//! # registry.configure::<BlogPost>(|post| post.table("posts").auto_key("id")).unwrap();
//! use strata_orm::{Predicate, SortOptions, field};
//!
//! let popular =
//!     Predicate::<BlogPost>::new(field("views").gt(1000).and(field("title").ne("draft")));
//! let filter = popular.compile().unwrap();
//!
//! let generator = registry.generator::<BlogPost>().unwrap();
//! let page = generator.page(&filter, &SortOptions::new().desc("views"), 2, 20).unwrap();
//! assert_eq!(
//!     page.sql,
//!     "SELECT `id`, `title`, `views` FROM `posts` WHERE (`views` > @p0) AND (`title` <> @p1) \
//!      ORDER BY `views` desc LIMIT 40, 20"
//! );
//! ```

mod convention;
mod delete;
mod dialect;
mod entity;
mod error;
mod filter;
mod generator;
mod insert;
mod metadata;
mod naming;
mod predicate;
mod query;
mod registry;
mod repository;
mod select;
mod templates;
mod update;
mod value;

pub use convention::{ColumnRule, Conventions, Routing};
pub use dialect::{BatchColumn, Dialect, DialectKind, MySql, SqlServer, row_parameter};
pub use entity::{Entity, Property, Scalar, ScalarKind};
pub use error::{Error, Result};
pub use filter::{
    BooleanClause, CombinedQueryFilter, FieldPredicate, Operation, QueryFilter, SingleQueryFilter,
};
pub use generator::{Generator, SortOptions};
pub use insert::BatchInsert;
pub use metadata::{EntityMetadata, FieldMetadata, MetadataBuilder};
pub use naming::{Capitalization, NamingPolicy, NamingStrategy};
pub use predicate::{
    BinaryOp, Callable, Captured, Constant, Expr, IntoExpr, Predicate, compile, field,
};
pub use query::{Params, Statement};
pub use registry::{DataSource, Registry, RegistryConfig, RegistryOptions};
pub use repository::{Executor, FutureResult, Repository};
// Re-export the value carrier and sort direction used in public signatures.
pub use sea_query::{Order, Value};
pub use templates::CrudTemplates;
pub use value::{Argument, check_scalar, coerce_integer, is_null};

// Re-exports for ``entity`` macro use only.
#[doc(hidden)]
pub mod __private {
    pub use sea_query::{Value, ValueType};
}
