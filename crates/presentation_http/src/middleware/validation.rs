//! Request validation
//!
//! `ValidatedJson`, `ValidatedQuery` and `ValidatedPath` deserialize the
//! declared input and run `validator` on it before the handler sees it.
//! Constraint violations become a 422 envelope listing one [`FieldError`]
//! per violated constraint, sorted by field path.

use std::borrow::Cow;

use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts, Path, Query, Request,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::request::Parts,
};
use serde::{Serialize, de::DeserializeOwned};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::error::ApiError;

/// Where the offending value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ValidationTarget {
    Body,
    Query,
    Param,
}

/// One violated constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    /// Dot-joined field path (`""` for the input as a whole)
    pub path: String,
    pub message: String,
    /// Constraint code (`required`, `email`, `length`, ...)
    pub code: String,
    pub target: ValidationTarget,
}

/// Flatten `validator` errors into a list sorted by path
pub fn field_errors(errors: &ValidationErrors, target: ValidationTarget) -> Vec<FieldError> {
    let mut out = Vec::new();
    collect(errors, "", target, &mut out);
    out
}

fn collect(errors: &ValidationErrors, prefix: &str, target: ValidationTarget, out: &mut Vec<FieldError>) {
    let mut fields: Vec<(String, &ValidationErrorsKind)> = errors
        .errors()
        .iter()
        .map(|(field, kind)| (field.to_string(), kind))
        .collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    for (field, kind) in fields {
        let path = join_path(prefix, &field);
        match kind {
            ValidationErrorsKind::Field(violations) => {
                out.extend(violations.iter().map(|violation| FieldError {
                    path: path.clone(),
                    message: violation
                        .message
                        .as_ref()
                        .map_or_else(|| default_message(&violation.code), Cow::to_string),
                    code: violation.code.to_string(),
                    target,
                }));
            },
            ValidationErrorsKind::Struct(nested) => collect(nested, &path, target, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect(nested, &join_path(&path, &index.to_string()), target, out);
                }
            },
        }
    }
}

/// Struct-level errors are reported under `__all__`; they belong to the parent path
fn join_path(prefix: &str, segment: &str) -> String {
    match (prefix.is_empty(), segment) {
        (_, "__all__") => prefix.to_string(),
        (true, _) => segment.to_string(),
        (false, _) => format!("{prefix}.{segment}"),
    }
}

fn default_message(code: &str) -> String {
    match code {
        "required" => "Required".to_string(),
        "email" => "Invalid email".to_string(),
        "length" => "Invalid length".to_string(),
        "range" => "Out of range".to_string(),
        "uuid" => "Invalid uuid".to_string(),
        other => format!("Invalid value ({other})"),
    }
}

fn shape_error(message: String, target: ValidationTarget) -> ApiError {
    ApiError::Validation(vec![FieldError {
        path: String::new(),
        message,
        code: "invalid_type".to_string(),
        target,
    }])
}

fn validate<T: Validate>(value: T, target: ValidationTarget) -> Result<T, ApiError> {
    value
        .validate()
        .map_err(|e| ApiError::Validation(field_errors(&e, target)))?;
    Ok(value)
}

/// A JSON extractor that also validates the request body
///
/// ```ignore
/// #[derive(Deserialize, Validate)]
/// struct MyRequest {
///     #[validate(length(min = 1, max = 1000))]
///     message: String,
/// }
///
/// async fn handler(ValidatedJson(req): ValidatedJson<MyRequest>) {}
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| match rejection {
                JsonRejection::JsonDataError(e) => shape_error(e.body_text(), ValidationTarget::Body),
                other => ApiError::BadRequest(other.body_text()),
            })?;

        validate(value, ValidationTarget::Body).map(Self)
    }
}

/// Query-string extractor with validation
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection: QueryRejection| {
                shape_error(rejection.body_text(), ValidationTarget::Query)
            })?;

        validate(value, ValidationTarget::Query).map(Self)
    }
}

/// Path-parameter extractor with validation
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedPath<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| match rejection {
                PathRejection::FailedToDeserializePathParams(e) => {
                    shape_error(e.body_text(), ValidationTarget::Param)
                },
                other => ApiError::Internal(other.body_text()),
            })?;

        validate(value, ValidationTarget::Param).map(Self)
    }
}

/// `validator` custom check: a decimal integer greater than zero
pub fn validate_positive_integer(value: &str) -> Result<(), validator::ValidationError> {
    match value.parse::<u32>() {
        Ok(n) if n > 0 && value.bytes().all(|b| b.is_ascii_digit()) => Ok(()),
        _ => Err(validator::ValidationError::new("positive_integer")
            .with_message(Cow::Borrowed("Must be a positive integer"))),
    }
}

/// `validator` custom check: a UUID in any of the standard textual forms
pub fn validate_uuid(value: &str) -> Result<(), validator::ValidationError> {
    uuid::Uuid::parse_str(value)
        .map(|_| ())
        .map_err(|_| validator::ValidationError::new("uuid").with_message(Cow::Borrowed("Invalid uuid")))
}
