//! Query building: pagination DTOs, allow-listed sort/filter resolution,
//! relation EXISTS filters and structured filter objects.

pub mod builder;
pub mod dto;
pub mod filters;

pub use builder::{BaseQueryBuilder, QueryBuilderDeps};
pub use dto::{PaginationQuery, SortOrder};
pub use filters::filters_to_condition;

use sea_orm::sea_query::{Expr, Func, LikeExpr, SimpleExpr};

/// Case-insensitive substring match of `expr` against `needle`.
///
/// LIKE wildcards in `needle` are escaped so user input matches literally.
pub(crate) fn contains_ci(expr: impl Into<SimpleExpr>, needle: &str) -> SimpleExpr {
    like_ci(expr, &format!("%{}%", escape_like(needle)))
}

pub(crate) fn starts_with_ci(expr: impl Into<SimpleExpr>, needle: &str) -> SimpleExpr {
    like_ci(expr, &format!("{}%", escape_like(needle)))
}

pub(crate) fn ends_with_ci(expr: impl Into<SimpleExpr>, needle: &str) -> SimpleExpr {
    like_ci(expr, &format!("%{}", escape_like(needle)))
}

fn like_ci(expr: impl Into<SimpleExpr>, pattern: &str) -> SimpleExpr {
    Expr::expr(Func::lower(expr.into())).like(LikeExpr::new(pattern.to_lowercase()).escape('\\'))
}

pub(crate) fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
