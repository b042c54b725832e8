/// JSON body extraction with enveloped rejections
///
/// Axum's stock `Json` extractor answers malformed bodies with plain-text
/// rejections. This wrapper funnels those through [`ApiError`] instead, so
/// a body that fails to parse gets the same `{ "status": false, "message" }`
/// envelope as every other error path.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;

/// Drop-in replacement for `axum::Json` in handler signatures
#[derive(Debug, Clone)]
pub struct Json<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for Json<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = axum::Json::<T>::from_request(req, state).await?;
        Ok(Json(value))
    }
}

impl<T> IntoResponse for Json<T>
where
    axum::Json<T>: IntoResponse,
{
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}
