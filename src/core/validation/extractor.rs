//! Axum extractor for validated payloads
//!
//! `Validated<T>` reads the request body as untyped JSON, runs `T::validate`
//! on it, and rejects the request with the full field error list when the
//! payload does not pass.

use crate::core::error::{OrderDeskError, RequestError, ValidationFailure};
use axum::{
    Json,
    extract::{FromRequest, Request},
    response::{IntoResponse, Response},
};
use serde_json::Value;

/// Types that can be built from an untrusted JSON value
pub trait Validate: Sized {
    fn validate(raw: &Value) -> Result<Self, ValidationFailure>;
}

/// Axum extractor that validates the JSON body into `T`
///
/// # Usage
///
/// ```rust,ignore
/// pub async fn clean_order(
///     Validated(order): Validated<Order>,
/// ) -> Result<Json<Order>, OrderDeskError> {
///     // order is already canonical
/// }
/// ```
pub struct Validated<T>(pub T);

impl<T> Validated<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for Validated<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S, T> FromRequest<S> for Validated<T>
where
    S: Send + Sync,
    T: Validate + Send,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload): Json<Value> =
            Json::from_request(req, state).await.map_err(|rejection| {
                OrderDeskError::from(RequestError::from(rejection)).into_response()
            })?;

        T::validate(&payload)
            .map(Validated)
            .map_err(|failure| OrderDeskError::from(failure).into_response())
    }
}
