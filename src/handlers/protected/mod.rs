pub mod attendance;
pub mod audit;
pub mod auth;
pub mod cash_vouchers;
pub mod holidays;
pub mod leads;
pub mod projects;
pub mod proposals;
pub mod purchase_orders;
pub mod roles;
pub mod tickets;
pub mod users;

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::config;
use crate::error::ApiError;

/// Clamp list pagination to configured bounds
pub(crate) fn page_params(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    let api = &config::config().api;
    let limit = limit.unwrap_or(api.default_page_size).clamp(1, api.max_page_size);
    let offset = offset.unwrap_or(0).max(0);
    (limit, offset)
}

/// Validate a free-text status/kind field against its allowed values
pub(crate) fn validate_choice(field: &str, value: &str, allowed: &[&str]) -> Result<(), ApiError> {
    if allowed.contains(&value) {
        return Ok(());
    }
    let mut field_errors = HashMap::new();
    field_errors.insert(
        field.to_string(),
        format!("must be one of: {}", allowed.join(", ")),
    );
    Err(ApiError::validation_error(
        format!("Invalid {}", field),
        Some(field_errors),
    ))
}

/// Row snapshot for the audit trail; serialization failures degrade to None
pub(crate) fn snapshot<T: Serialize>(value: &T) -> Option<Value> {
    serde_json::to_value(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_params_clamp_to_bounds() {
        let (limit, offset) = page_params(None, None);
        assert!(limit > 0);
        assert_eq!(offset, 0);

        let (limit, _) = page_params(Some(1_000_000), Some(-5));
        assert!(limit <= config::config().api.max_page_size);
    }

    #[test]
    fn validate_choice_rejects_unknown_values() {
        assert!(validate_choice("status", "new", &["new", "contacted"]).is_ok());
        assert!(validate_choice("status", "bogus", &["new", "contacted"]).is_err());
    }
}
