//! JSON body extractor that runs `validator` rules after deserialization.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::errors::AppError;

/// Rejects malformed bodies with `BadRequest` and rule violations with `Validation`.
///
/// ```rust,ignore
/// async fn create_author(ValidatedJson(payload): ValidatedJson<CreateAuthorRequest>) {
///     // payload.name already satisfies its length rule
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::bad_request(e.body_text()))?;

        value
            .validate()
            .map_err(|e| AppError::validation(describe_violations(&e)))?;

        Ok(ValidatedJson(value))
    }
}

fn describe_violations(errors: &validator::ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(m) => m.to_string(),
                None => format!("{} is invalid", field),
            })
        })
        .collect();
    messages.sort();
    messages.join(", ")
}
