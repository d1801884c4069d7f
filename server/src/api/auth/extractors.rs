//! Authenticated-caller extractor for Axum handlers

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::api::types::ApiError;
use crate::domain::Caller;

/// Authenticated caller extractor.
///
/// Pulls the `Caller` injected by `require_auth` out of request extensions.
/// Handlers take this as an argument and pass `caller` explicitly into the
/// authorization predicates.
pub struct Auth {
    pub caller: Caller,
}

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let caller = parts
            .extensions
            .get::<Caller>()
            .cloned()
            .ok_or_else(|| ApiError::internal("Auth context not available"))?;

        Ok(Self { caller })
    }
}
