use sea_orm::{ColumnTrait, EntityTrait, Order, QueryFilter, QueryOrder, QuerySelect, Select};
use sea_orm::sea_query::SimpleExpr;
use serde::Deserialize;

use crate::config::PaginationConfig;
use crate::error::AppError;

/// Query parameters accepted by every list endpoint.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct ListQuery {
    /// JSON object of field -> equality value, e.g. `{"crop_type":"Maize"}`.
    /// Fields are restricted to a per-resource whitelist.
    pub filter: Option<String>,
    /// JSON object of field -> direction, e.g. `{"created_at":-1}`.
    pub sort: Option<String>,
    /// Page size; clamped to the configured maximum.
    pub limit: Option<u64>,
    /// Number of records to skip.
    pub skip: Option<u64>,
}

/// Parsed and clamped list parameters.
pub struct ListParams {
    pub filter: Vec<(String, serde_json::Value)>,
    pub sort: Vec<(String, Order)>,
    pub limit: u64,
    pub skip: u64,
}

/// Parse the serialized `filter`/`sort` parameters and apply the configured
/// pagination caps. Field names are validated later, against each resource's
/// column whitelist.
pub fn parse_list_query(
    query: &ListQuery,
    pagination: &PaginationConfig,
) -> Result<ListParams, AppError> {
    let filter = match query.filter.as_deref() {
        None | Some("") => Vec::new(),
        Some(raw) => {
            let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(raw)
                .map_err(|_| AppError::Validation("filter must be a JSON object".into()))?;
            map.into_iter().collect()
        }
    };

    let sort = match query.sort.as_deref() {
        None | Some("") => Vec::new(),
        Some(raw) => {
            let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(raw)
                .map_err(|_| AppError::Validation("sort must be a JSON object".into()))?;
            map.into_iter()
                .map(|(field, dir)| match dir.as_i64() {
                    Some(1) => Ok((field, Order::Asc)),
                    Some(-1) => Ok((field, Order::Desc)),
                    _ => Err(AppError::Validation(
                        "sort directions must be 1 or -1".into(),
                    )),
                })
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    let limit = query
        .limit
        .unwrap_or(pagination.default_limit)
        .clamp(1, pagination.max_limit);

    Ok(ListParams {
        filter,
        sort,
        limit,
        skip: query.skip.unwrap_or(0),
    })
}

/// Apply parsed list parameters to a select, resolving field names through
/// the resource's column whitelist. Unknown fields are a validation error
/// rather than a silent no-op.
pub fn apply_list_params<E, F>(
    mut select: Select<E>,
    params: &ListParams,
    column_for: F,
) -> Result<Select<E>, AppError>
where
    E: EntityTrait,
    F: Fn(&str) -> Option<E::Column>,
{
    for (field, value) in &params.filter {
        let col = column_for(field)
            .ok_or_else(|| AppError::Validation(format!("Unknown filter field: {field}")))?;
        select = select.filter(scalar_eq(col, value)?);
    }
    for (field, order) in &params.sort {
        let col = column_for(field)
            .ok_or_else(|| AppError::Validation(format!("Unknown sort field: {field}")))?;
        select = select.order_by(col, order.clone());
    }
    Ok(select.limit(Some(params.limit)).offset(Some(params.skip)))
}

fn scalar_eq<C: ColumnTrait>(col: C, value: &serde_json::Value) -> Result<SimpleExpr, AppError> {
    use serde_json::Value;
    let expr = match value {
        Value::String(s) => col.eq(s.clone()),
        Value::Bool(b) => col.eq(*b),
        Value::Number(n) if n.is_i64() => col.eq(n.as_i64().unwrap_or_default()),
        Value::Number(n) => col.eq(n.as_f64().unwrap_or_default()),
        Value::Null => col.is_null(),
        _ => {
            return Err(AppError::Validation(
                "Filter values must be scalars".into(),
            ));
        }
    };
    Ok(expr)
}

/// Validate a required, non-empty trimmed string.
pub fn validate_required(value: &str, name: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} is required")));
    }
    Ok(())
}

/// Validate a quantity/weight-style number (must be at least 1).
pub fn validate_min_one(value: f64, name: &str) -> Result<(), AppError> {
    if !value.is_finite() || value < 1.0 {
        return Err(AppError::Validation(format!("{name} must be at least 1")));
    }
    Ok(())
}

/// Minimal shape check for email addresses; real validation happens at the
/// mail transport.
pub fn validate_email(value: &str) -> Result<(), AppError> {
    let trimmed = value.trim();
    if trimmed.len() < 3 || !trimmed.contains('@') {
        return Err(AppError::Validation("A valid email is required".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pagination() -> PaginationConfig {
        PaginationConfig {
            default_limit: 10,
            max_limit: 10000,
        }
    }

    fn query(filter: Option<&str>, sort: Option<&str>, limit: Option<u64>) -> ListQuery {
        ListQuery {
            filter: filter.map(String::from),
            sort: sort.map(String::from),
            limit,
            skip: None,
        }
    }

    #[test]
    fn defaults_come_from_config() {
        let params = parse_list_query(&query(None, None, None), &pagination()).unwrap();
        assert_eq!(params.limit, 10);
        assert_eq!(params.skip, 0);
        assert!(params.filter.is_empty());
        assert!(params.sort.is_empty());
    }

    #[test]
    fn limit_is_clamped_to_max() {
        let params = parse_list_query(&query(None, None, Some(999_999)), &pagination()).unwrap();
        assert_eq!(params.limit, 10000);
    }

    #[test]
    fn filter_and_sort_parse_json_objects() {
        let params = parse_list_query(
            &query(
                Some(r#"{"crop_type":"Maize"}"#),
                Some(r#"{"created_at":-1}"#),
                None,
            ),
            &pagination(),
        )
        .unwrap();
        assert_eq!(params.filter.len(), 1);
        assert_eq!(params.sort[0].1, Order::Desc);
    }

    #[test]
    fn malformed_filter_is_a_validation_error() {
        let err = parse_list_query(&query(Some("not json"), None, None), &pagination());
        assert!(matches!(err, Err(AppError::Validation(_))));
    }

    #[test]
    fn sort_direction_must_be_one_or_minus_one() {
        let err = parse_list_query(&query(None, Some(r#"{"created_at":2}"#), None), &pagination());
        assert!(matches!(err, Err(AppError::Validation(_))));
    }

    #[test]
    fn validate_min_one_rejects_zero_and_nan() {
        assert!(validate_min_one(0.5, "quantity").is_err());
        assert!(validate_min_one(f64::NAN, "quantity").is_err());
        assert!(validate_min_one(1.0, "quantity").is_ok());
    }
}
