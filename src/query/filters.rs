//! Structured filter objects.
//!
//! A filter is a JSON object whose keys are column names or the `AND`, `OR`
//! and `NOT` combinators:
//!
//! ```json
//! {
//!   "OR": [{ "email": { "equals": "a@example.com" } }, { "email": { "endsWith": "@example.org" } }],
//!   "id": { "not": 1337 },
//!   "name": "Johnny"
//! }
//! ```
//!
//! A scalar value means equality (`null` means IS NULL). Operator objects
//! accept `equals`, `not`, `in`, `notIn`, `lt`, `lte`, `gt`, `gte`, `contains`,
//! `startsWith` and `endsWith`; the three string operators are
//! case-insensitive.

use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{ColumnTrait, Condition, Value};
use serde_json::{Map, Value as JsonValue};

use super::{contains_ci, ends_with_ci, starts_with_ci};
use crate::error::CrudError;
use crate::schema::CrudTable;

/// Convert a filter object into a SeaORM condition.
///
/// When `allowed` is non-empty only the listed columns may be filtered on;
/// other keys are ignored, as are keys that name no column of `E`.
pub fn filters_to_condition<E: CrudTable>(filters: &JsonValue, allowed: &[String]) -> crate::Result<Condition> {
    match filters {
        JsonValue::Null => Ok(Condition::all()),
        JsonValue::Object(map) => object_condition::<E>(map, allowed),
        other => Err(CrudError::Validation(format!("filters must be an object, got {}", other))),
    }
}

fn object_condition<E: CrudTable>(map: &Map<String, JsonValue>, allowed: &[String]) -> crate::Result<Condition> {
    let mut condition = Condition::all();

    for (key, value) in map {
        match key.as_str() {
            "AND" => condition = condition.add(combine::<E>(Condition::all(), value, allowed)?),
            "OR" => condition = condition.add(combine::<E>(Condition::any(), value, allowed)?),
            "NOT" => condition = condition.add(filters_to_condition::<E>(value, allowed)?.not()),
            field => {
                if !allowed.is_empty() && !allowed.iter().any(|a| a == field) {
                    log::debug!("Ignoring filter on non-allowed field '{}'", field);
                    continue;
                }
                let Some(column) = E::column(field) else {
                    log::warn!("Ignoring filter on unknown column '{}' of {}", field, E::sql_table_name());
                    continue;
                };
                condition = condition.add(field_condition::<E>(column, field, value)?);
            }
        }
    }

    Ok(condition)
}

fn combine<E: CrudTable>(mut combined: Condition, value: &JsonValue, allowed: &[String]) -> crate::Result<Condition> {
    match value {
        JsonValue::Array(items) => {
            for item in items {
                combined = combined.add(filters_to_condition::<E>(item, allowed)?);
            }
            Ok(combined)
        }
        JsonValue::Object(_) => Ok(combined.add(filters_to_condition::<E>(value, allowed)?)),
        other => Err(CrudError::Validation(format!(
            "AND/OR expect an array of filter objects, got {}",
            other
        ))),
    }
}

fn field_condition<E: CrudTable>(column: E::Column, field: &str, value: &JsonValue) -> crate::Result<Condition> {
    let JsonValue::Object(operators) = value else {
        return Ok(Condition::all().add(equals(column, value, field)?));
    };

    let mut condition = Condition::all();
    for (operator, operand) in operators {
        let expr = match operator.as_str() {
            "equals" => equals(column, operand, field)?,
            "not" => match operand {
                JsonValue::Null => column.is_not_null(),
                _ => column.ne(scalar(operand, field)?),
            },
            "in" => column.is_in(list(operand, field)?),
            "notIn" => column.is_not_in(list(operand, field)?),
            "lt" => column.lt(scalar(operand, field)?),
            "lte" => column.lte(scalar(operand, field)?),
            "gt" => column.gt(scalar(operand, field)?),
            "gte" => column.gte(scalar(operand, field)?),
            "contains" => contains_ci(Expr::col((E::default(), column)), text(operand, field)?),
            "startsWith" => starts_with_ci(Expr::col((E::default(), column)), text(operand, field)?),
            "endsWith" => ends_with_ci(Expr::col((E::default(), column)), text(operand, field)?),
            unknown => {
                return Err(CrudError::Validation(format!(
                    "Unknown filter operator '{}' on field '{}'",
                    unknown, field
                )))
            }
        };
        condition = condition.add(expr);
    }
    Ok(condition)
}

fn equals<C: ColumnTrait>(column: C, value: &JsonValue, field: &str) -> crate::Result<SimpleExpr> {
    Ok(match value {
        JsonValue::Null => column.is_null(),
        _ => column.eq(scalar(value, field)?),
    })
}

fn scalar(value: &JsonValue, field: &str) -> crate::Result<Value> {
    match value {
        JsonValue::String(s) => Ok(s.clone().into()),
        JsonValue::Bool(b) => Ok((*b).into()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i.into())
            } else if let Some(u) = n.as_u64() {
                Ok(u.into())
            } else {
                Ok(n.as_f64().into())
            }
        }
        other => Err(CrudError::Validation(format!(
            "Filter value for '{}' must be a scalar, got {}",
            field, other
        ))),
    }
}

fn list(value: &JsonValue, field: &str) -> crate::Result<Vec<Value>> {
    match value {
        JsonValue::Array(items) => items.iter().map(|item| scalar(item, field)).collect(),
        other => Err(CrudError::Validation(format!(
            "'in'/'notIn' on '{}' expect an array, got {}",
            field, other
        ))),
    }
}

fn text<'v>(value: &'v JsonValue, field: &str) -> crate::Result<&'v str> {
    value.as_str().ok_or_else(|| {
        CrudError::Validation(format!("String operators on '{}' expect a string, got {}", field, value))
    })
}
