//! Request extractors that validate what they deserialize
//!
//! Both reject with the same `ApiResponse` envelope the handlers use:
//! `400` and code `ValidationError`, with a message naming each failing
//! field (nested fields as `location.latitude`).

use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use super::{bad_request, ApiError};

/// JSON body that has passed `Validate`.
pub struct ValidatedJson<T>(pub T);

/// Query string that has passed `Validate`.
pub struct ValidatedQuery<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| bad_request(format!("invalid JSON body: {}", rejection.body_text())))?;
        body.validate().map_err(|errors| bad_request(describe(&errors)))?;
        Ok(Self(body))
    }
}

impl<S, T> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                bad_request(format!("invalid query string: {}", rejection.body_text()))
            })?;
        params.validate().map_err(|errors| bad_request(describe(&errors)))?;
        Ok(Self(params))
    }
}

/// `field: reason` pairs, sorted so the message is stable.
fn describe(errors: &ValidationErrors) -> String {
    let mut reasons = Vec::new();
    collect(errors, "", &mut reasons);
    if reasons.is_empty() {
        return "validation failed".to_string();
    }
    reasons.sort();
    reasons.join("; ")
}

fn collect(errors: &ValidationErrors, prefix: &str, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(failures) => {
                for failure in failures {
                    let reason = failure
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| failure.code.to_string());
                    out.push(format!("{}: {}", path, reason));
                }
            }
            ValidationErrorsKind::Struct(inner) => collect(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect(inner, &format!("{}[{}]", path, index), out);
                }
            }
        }
    }
}
