//! Extractors whose rejections render as [`AppError`] JSON.

use axum::extract::{FromRequest, FromRequestParts};

use crate::db::RepositoryError;
use crate::error::AppError;

/// JSON body; malformed input is a 400 with `{"detail": ...}`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// Query string; unparsable parameters are a 400.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct QueryParams<T>(pub T);

/// Path parameters; a non-numeric id is a 400.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct PathParam<T>(pub T);

/// Trimmed value, or the error message when it is blank.
///
/// # Errors
///
/// Returns `AppError::BadRequest` naming `field`.
pub fn required<'a>(value: &'a str, field: &str) -> Result<&'a str, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(trimmed)
}

/// Map a repository not-found to a 404 naming the missing resource.
pub fn not_found(message: &'static str) -> impl Fn(RepositoryError) -> AppError {
    move |e| match e {
        RepositoryError::NotFound => AppError::NotFound(message.to_owned()),
        other => AppError::Database(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required() {
        assert_eq!(required("  Benfica ", "name").ok(), Some("Benfica"));
        let err = required("   ", "name").err().map(|e| e.to_string());
        assert_eq!(err.as_deref(), Some("Bad request: name is required"));
    }

    #[test]
    fn test_not_found_names_resource() {
        let err = not_found("Jersey not found")(RepositoryError::NotFound);
        assert!(matches!(err, AppError::NotFound(ref m) if m == "Jersey not found"));
        let err = not_found("Jersey not found")(RepositoryError::CartEmpty);
        assert!(matches!(err, AppError::Database(RepositoryError::CartEmpty)));
    }
}
