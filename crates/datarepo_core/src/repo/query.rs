//! Query values accepted by repositories: filters, ordering and paging.
//!
//! # Responsibility
//! - Express record predicates as data that renders to parameterized SQL.
//! - Validate every column name against the target entity before rendering.
//!
//! # Invariants
//! - Filter values are always bound as parameters, never spliced into SQL.
//! - Rendering fails with `RepoError::UnknownColumn` for unmapped columns.

use crate::model::entity::Entity;
use crate::repo::error::{RepoError, RepoResult};
use rusqlite::types::Value;

/// Comparison operator used by `Filter::Compare`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// Predicate over one entity's columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Compare {
        column: String,
        op: CompareOp,
        value: Value,
    },
    /// SQL `LIKE` with `%`/`_` wildcards.
    Like { column: String, pattern: String },
    IsNull(String),
    And(Box<Filter>, Box<Filter>),
    Or(Box<Filter>, Box<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    pub fn compare(column: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Self::Compare {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Eq, value)
    }

    pub fn ne(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Ne, value)
    }

    pub fn lt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Lt, value)
    }

    pub fn le(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Le, value)
    }

    pub fn gt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Gt, value)
    }

    pub fn ge(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Ge, value)
    }

    pub fn like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::Like {
            column: column.into(),
            pattern: pattern.into(),
        }
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Self::IsNull(column.into())
    }

    pub fn and(self, other: Filter) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Filter) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Appends this predicate to `sql`, pushing bound values onto `binds`.
    pub(crate) fn render<T: Entity>(&self, sql: &mut String, binds: &mut Vec<Value>) -> RepoResult<()> {
        match self {
            Self::Compare { column, op, value } => {
                sql.push_str(&checked_column::<T>(column)?);
                sql.push(' ');
                sql.push_str(op.as_sql());
                sql.push_str(" ?");
                binds.push(value.clone());
            }
            Self::Like { column, pattern } => {
                sql.push_str(&checked_column::<T>(column)?);
                sql.push_str(" LIKE ?");
                binds.push(Value::Text(pattern.clone()));
            }
            Self::IsNull(column) => {
                sql.push_str(&checked_column::<T>(column)?);
                sql.push_str(" IS NULL");
            }
            Self::And(left, right) => render_pair::<T>(left, "AND", right, sql, binds)?,
            Self::Or(left, right) => render_pair::<T>(left, "OR", right, sql, binds)?,
            Self::Not(inner) => {
                sql.push_str("NOT (");
                inner.render::<T>(sql, binds)?;
                sql.push(')');
            }
        }
        Ok(())
    }
}

fn render_pair<T: Entity>(
    left: &Filter,
    joiner: &str,
    right: &Filter,
    sql: &mut String,
    binds: &mut Vec<Value>,
) -> RepoResult<()> {
    sql.push('(');
    left.render::<T>(sql, binds)?;
    sql.push_str(") ");
    sql.push_str(joiner);
    sql.push_str(" (");
    right.render::<T>(sql, binds)?;
    sql.push(')');
    Ok(())
}

/// Sort direction for `OrderBy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Ordering column for paged reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Descending,
        }
    }

    /// Renders `ORDER BY`, with the key column appended as tie-breaker.
    pub(crate) fn render<T: Entity>(&self) -> RepoResult<String> {
        let direction = match self.direction {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        };
        let column = checked_column::<T>(&self.column)?;
        if self.column == T::KEY_COLUMN {
            return Ok(format!(" ORDER BY {column} {direction}"));
        }
        Ok(format!(
            " ORDER BY {column} {direction}, {} ASC",
            quote_ident(T::KEY_COLUMN)
        ))
    }
}

/// One-based page selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page_number: u32,
    page_size: u32,
}

impl PageRequest {
    /// # Errors
    /// - `RepoError::InvalidPage` when either value is zero.
    pub fn new(page_number: u32, page_size: u32) -> RepoResult<Self> {
        if page_number == 0 || page_size == 0 {
            return Err(RepoError::InvalidPage {
                page_number,
                page_size,
            });
        }
        Ok(Self {
            page_number,
            page_size,
        })
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Rows skipped before this page: `(page_number - 1) * page_size`.
    pub fn offset(&self) -> u64 {
        u64::from(self.page_number - 1) * u64::from(self.page_size)
    }
}

pub(crate) fn checked_column<T: Entity>(column: &str) -> RepoResult<String> {
    if !T::has_column(column) {
        return Err(RepoError::UnknownColumn {
            table: T::TABLE,
            column: column.to_string(),
        });
    }
    Ok(quote_ident(column))
}

pub(crate) fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
