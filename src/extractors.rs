//! Custom Axum extractors
//!
//! Each one turns framework rejections into `AppError` so malformed input
//! gets the same JSON envelope as every other failure.

use axum::async_trait;
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use uuid::Uuid;
use validator::Validate;

use crate::utils::error::AppError;

/// JSON body that has been deserialized and validated.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::ValidationError(rejection.body_text()))?;

        value.validate()?;
        Ok(Self(value))
    }
}

/// Query string that has been deserialized and validated.
pub struct ValidatedQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::ValidationError(rejection.body_text()))?;

        value.validate()?;
        Ok(Self(value))
    }
}

/// Event id taken from the `:id` path segment.
pub struct EventId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for EventId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::ValidationError("Missing event id".to_string()))?;

        let id = Uuid::parse_str(&raw).map_err(|_| {
            AppError::ValidationError(format!("'{}' is not a valid event id", raw))
        })?;

        Ok(Self(id))
    }
}
