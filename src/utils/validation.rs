use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::services::ServiceError;

/// Json extractor that also runs `validator` rules; both parse and
/// validation failures surface as `BadRequest`.
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ServiceError::BadRequest(format!("Json parse error: {}", e)))?;

        value
            .validate()
            .map_err(|e| ServiceError::BadRequest(format!("Validation error: {}", e)))?;

        Ok(ValidatedJson(value))
    }
}
