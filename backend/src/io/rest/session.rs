//! The signed-in account, as forwarded by the auth gateway.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use std::ops::Deref;
use tracing::warn;

pub const OWNER_HEADER: &str = "x-owner-id";

/// Owner id of the request; every row a handler touches is scoped to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner(pub String);

impl Deref for Owner {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Owner
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let owner = parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty());

        match owner {
            Some(owner) => Ok(Owner(owner.to_string())),
            None => {
                warn!("{} {} - missing {} header", parts.method, parts.uri.path(), OWNER_HEADER);
                Err((StatusCode::UNAUTHORIZED, "Not signed in"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<Owner, (StatusCode, &'static str)> {
        let (mut parts, _) = request.into_parts();
        Owner::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_owner_from_header() {
        let request = Request::builder().header(OWNER_HEADER, " user-1 ").body(()).unwrap();
        let owner = extract(request).await.unwrap();
        assert_eq!(&*owner, "user-1");
    }

    #[tokio::test]
    async fn test_missing_or_blank_owner_is_unauthorized() {
        let missing = extract(Request::builder().body(()).unwrap()).await.unwrap_err();
        assert_eq!(missing.0, StatusCode::UNAUTHORIZED);

        let blank = extract(Request::builder().header(OWNER_HEADER, "  ").body(()).unwrap()).await.unwrap_err();
        assert_eq!(blank.0, StatusCode::UNAUTHORIZED);
    }
}
