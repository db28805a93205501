//! Single-row and batch INSERT statements.

use crate::dialect::{BatchColumn, row_parameter};
use crate::entity::Entity;
use crate::generator::Generator;
use crate::query::{Params, Statement};
use crate::templates::insert_fields;

/// How a set of entities is inserted.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchInsert {
    /// One multi-row `INSERT ... VALUES (...), (...)` statement.
    MultiRow {
        /// Multi-row insert; row `n` binds `{property}_{n}`.
        statement: Statement,
        /// Number of rows in the statement.
        rows: usize,
    },
    /// The single-row insert template run once per parameter set.
    PerRow {
        /// Single-row insert.
        sql: String,
        /// One parameter set per entity.
        rows: Vec<Params>,
    },
}

impl BatchInsert {
    /// Number of entities covered.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::MultiRow { rows, .. } => *rows,
            Self::PerRow { rows, .. } => rows.len(),
        }
    }

    /// Returns `true` when no entity is covered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E: Entity> Generator<E> {
    /// Builds the single-row insert for `entity`, binding every inserted
    /// column under its property name.
    #[must_use]
    pub fn insert(&self, entity: &E) -> Statement {
        let mut params = Params::new();
        Self::bind(&mut params, &entity.values(), insert_fields(self.metadata()));
        let sql = self.templates().insert().to_string();

        tracing::debug!(
            table = self.metadata().table_name(),
            sql = %sql,
            param_count = params.len(),
            "insert generated SQL"
        );

        Statement::new(sql, params)
    }

    /// Builds an insert for many entities: one multi-row statement where
    /// the dialect supports it, otherwise the single-row template with one
    /// parameter set per entity.
    #[must_use]
    pub fn batch_insert(&self, entities: &[E]) -> BatchInsert {
        let fields = insert_fields(self.metadata());
        let columns: Vec<BatchColumn<'_>> = fields
            .iter()
            .map(|field| BatchColumn {
                column: &field.name,
                param: field.property,
            })
            .collect();

        let multi_row =
            self.dialect().batch_insert(self.metadata().table_name(), &columns, entities.len());
        let Some(sql) = multi_row else {
            let rows = entities
                .iter()
                .map(|entity| {
                    let mut params = Params::new();
                    Self::bind(&mut params, &entity.values(), fields.iter().copied());
                    params
                })
                .collect::<Vec<_>>();
            let sql = self.templates().insert().to_string();

            tracing::debug!(
                table = self.metadata().table_name(),
                sql = %sql,
                rows = rows.len(),
                "batch insert generated per-row SQL"
            );
            return BatchInsert::PerRow { sql, rows };
        };

        let mut params = Params::new();
        for (row, entity) in entities.iter().enumerate() {
            let values = entity.values();
            for field in &fields {
                if let Some((_, value)) =
                    values.iter().find(|(property, _)| *property == field.property)
                {
                    params.bind(row_parameter(field.property, row), value.clone());
                }
            }
        }

        tracing::debug!(
            table = self.metadata().table_name(),
            sql = %sql,
            param_count = params.len(),
            rows = entities.len(),
            "batch insert generated SQL"
        );

        BatchInsert::MultiRow {
            statement: Statement::new(sql, params),
            rows: entities.len(),
        }
    }
}
