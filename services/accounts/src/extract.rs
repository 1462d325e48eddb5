//! Request extractors

use axum::{
    Json, async_trait,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use tracing::debug;

use crate::error::AccountError;

/// `Json` whose rejections are reported as a 400 `{error}` body.
///
/// Covers a missing content type, unparsable JSON and fields of the wrong
/// type alike.
pub struct AccountJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for AccountJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AccountError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                debug!("Rejected request body: {}", rejection.body_text());
                Err(AccountError::Validation(rejection.body_text()))
            }
        }
    }
}
