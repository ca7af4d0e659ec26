use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;

/// Header naming the user a request acts for.
pub const USER_HEADER: &str = "x-laneboard-user";

/// The authenticated caller, taken from [`USER_HEADER`].
///
/// Identity is asserted by whatever sits in front of the server; this crate
/// only authorizes it. A missing or empty header is a 401.
#[derive(Debug, Clone)]
pub struct Caller(pub String);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::unauthenticated(format!("missing {USER_HEADER} header")))?;
        Ok(Caller(user.to_string()))
    }
}
