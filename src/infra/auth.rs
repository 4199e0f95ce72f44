//! Token authentication.
//!
//! Tokens are issued by the identity service and stored in the `tokens`
//! collection; this service only resolves them.

use super::error::ApiError;
use super::mongo::{MongoRep, User};
use log::{error, warn};
use rocket::{
    http::Status,
    request::{FromRequest, Outcome},
    tokio::task,
    Request,
};

/// Extracts the key from `Token <key>` or `Bearer <key>`.
pub fn parse_authorization(header: &str) -> Option<&str> {
    let (scheme, key) = header.trim().split_once(' ')?;
    let key = key.trim();
    let known = scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer");
    (known && !key.is_empty()).then_some(key)
}

/// The requesting user, `None` when no credentials were sent.
pub struct Viewer(pub Option<User>);

impl Viewer {
    pub fn id(&self) -> Option<i64> {
        self.0.as_ref().map(|user| user.id)
    }
}

/// A viewer that must be authenticated.
pub struct AuthUser(pub User);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Viewer {
    type Error = ApiError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let header = match req.headers().get_one("Authorization") {
            Some(header) => header,
            None => return Outcome::Success(Viewer(None)),
        };
        let key = match parse_authorization(header) {
            Some(key) => key,
            None => {
                warn!("malformed Authorization header");
                return Outcome::Error((Status::Unauthorized, ApiError::Unauthorized));
            }
        };
        let db = match req.rocket().state::<MongoRep>() {
            Some(db) => db,
            None => {
                error!("MongoDB repository is not managed");
                return Outcome::Error((Status::InternalServerError, ApiError::Internal));
            }
        };
        // the driver is synchronous, keep it off the async workers
        let lookup = db.token_lookup();
        let key = key.to_string();
        match task::spawn_blocking(move || lookup.user_by_token(&key)).await {
            Ok(Ok(Some(user))) => Outcome::Success(Viewer(Some(user))),
            Ok(Ok(None)) => Outcome::Error((Status::Unauthorized, ApiError::Unauthorized)),
            Ok(Err(e)) => {
                error!("token lookup failed: {e:?}");
                Outcome::Error((Status::InternalServerError, ApiError::Internal))
            }
            Err(e) => {
                error!("token lookup task failed: {e}");
                Outcome::Error((Status::InternalServerError, ApiError::Internal))
            }
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthUser {
    type Error = ApiError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match Viewer::from_request(req).await {
            Outcome::Success(Viewer(Some(user))) => Outcome::Success(AuthUser(user)),
            Outcome::Success(Viewer(None)) => {
                Outcome::Error((Status::Unauthorized, ApiError::Unauthorized))
            }
            Outcome::Error(e) => Outcome::Error(e),
            Outcome::Forward(status) => Outcome::Forward(status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_authorization() {
        assert_eq!(parse_authorization("Token abc123"), Some("abc123"));
        assert_eq!(parse_authorization("Bearer abc123"), Some("abc123"));
        assert_eq!(parse_authorization("bearer  abc123 "), Some("abc123"));
        assert_eq!(parse_authorization("Basic abc123"), None);
        assert_eq!(parse_authorization("Token"), None);
        assert_eq!(parse_authorization("Token "), None);
    }
}
