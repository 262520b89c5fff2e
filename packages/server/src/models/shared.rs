use std::collections::HashMap;

use sea_orm::Order;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{ExprTrait, Func, LikeExpr, SimpleExpr};
use serde::Serialize;

use crate::error::AppError;

pub const DEFAULT_PAGE_LENGTH: u64 = 10;
pub const MAX_PAGE_LENGTH: u64 = 100;

/// Query parameters shared by all list endpoints.
///
/// `start`/`length` page through rows; `search` matches all display columns;
/// `order_column` indexes into the entity's fixed sortable-column list.
/// Every other parameter is collected as a per-column filter and later
/// checked against the entity's allow-list, so unknown parameters are
/// ignored rather than interpolated anywhere near SQL.
pub struct ListQuery {
    pub start: u64,
    pub length: u64,
    pub search: Option<String>,
    pub order_column: Option<usize>,
    pub order: Order,
    pub filters: HashMap<String, String>,
}

impl ListQuery {
    /// Parse from raw query parameters.
    ///
    /// `start`/`length` must be numeric when present. A non-numeric
    /// `order_column` is treated like an out-of-range index (default sort)
    /// rather than an error.
    pub fn from_params(mut params: HashMap<String, String>) -> Result<Self, AppError> {
        let start = match params.remove("start") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| AppError::Validation("start must be a non-negative integer".into()))?,
            None => 0,
        };

        let length = match params.remove("length") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| AppError::Validation("length must be a positive integer".into()))?,
            None => DEFAULT_PAGE_LENGTH,
        };
        if length == 0 || length > MAX_PAGE_LENGTH {
            return Err(AppError::Validation(format!(
                "length must be 1-{MAX_PAGE_LENGTH}"
            )));
        }

        let search = params
            .remove("search")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let order_column = params
            .remove("order_column")
            .and_then(|raw| raw.parse::<usize>().ok());

        let order = match params.remove("order_dir") {
            Some(dir) if dir.eq_ignore_ascii_case("desc") => Order::Desc,
            _ => Order::Asc,
        };

        Ok(Self {
            start,
            length,
            search,
            order_column,
            order,
            filters: params,
        })
    }

    /// Trimmed filter value for a recognized column, if non-empty.
    pub fn filter_value(&self, column: &str) -> Option<&str> {
        self.filters
            .get(column)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }
}

/// DataTables-style list envelope: page of rows plus unfiltered and filtered
/// row counts. `warnings` carries non-fatal notes (e.g. a foreign-key filter
/// pointing at a nonexistent id).
#[derive(Serialize, utoipa::ToSchema)]
pub struct PageResponse<T> {
    pub data: Vec<T>,
    #[serde(rename = "recordsTotal")]
    pub records_total: u64,
    #[serde(rename = "recordsFiltered")]
    pub records_filtered: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Resolve a caller-supplied sort index against a fixed allow-list.
///
/// Out-of-range (or absent) indexes fall back to the first entry, the
/// entity's default sort column. The allow-list is the SQL-injection
/// boundary: caller input never names a column directly.
pub fn resolve_order_column<T: Copy>(columns: &[T], index: Option<usize>) -> T {
    index
        .and_then(|i| columns.get(i))
        .copied()
        .unwrap_or(columns[0])
}

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Case-insensitive substring condition on a column expression.
pub fn contains_ci(column: Expr, term: &str) -> SimpleExpr {
    let pattern = format!("%{}%", escape_like(term).to_lowercase());
    Expr::expr(Func::lower(column)).like(LikeExpr::new(pattern).escape('\\'))
}

/// Validate a trimmed entity code (1-32 characters).
pub fn validate_code(code: &str) -> Result<(), AppError> {
    let code = code.trim();
    if code.is_empty() || code.chars().count() > 32 {
        return Err(AppError::Validation("Code must be 1-32 characters".into()));
    }
    Ok(())
}

/// Validate a trimmed display name (1-256 characters).
pub fn validate_name(name: &str, field: &str) -> Result<(), AppError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > 256 {
        return Err(AppError::Validation(format!(
            "{field} must be 1-256 characters"
        )));
    }
    Ok(())
}
