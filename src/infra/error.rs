use super::images::ImageError;
use super::mongo::MongoRepError;
use super::validation::ValidationError;
use log::{error, warn};
use rocket::{
    http::Status,
    response::{self, status::Custom, Responder},
    serde::json::{json, Json, Value},
    Request,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("authentication credentials were not provided or are invalid")]
    Unauthorized,
    #[error("you do not have permission to perform this action")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            ApiError::BadRequest(_) => Status::BadRequest,
            ApiError::Unauthorized => Status::Unauthorized,
            ApiError::Forbidden => Status::Forbidden,
            ApiError::NotFound(_) => Status::NotFound,
            ApiError::Internal => Status::InternalServerError,
        }
    }
}

/// Body shared by handler errors and catchers.
pub fn error_body(message: impl Into<String>) -> Json<Value> {
    Json(json!({ "errors": message.into() }))
}

impl From<MongoRepError> for ApiError {
    fn from(err: MongoRepError) -> Self {
        match err {
            MongoRepError::NotFound(what) => ApiError::NotFound(what),
            MongoRepError::Duplicate(message) | MongoRepError::Invalid(message) => {
                ApiError::BadRequest(message)
            }
            other => {
                error!("storage failure: {other:?}");
                ApiError::Internal
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<ImageError> for ApiError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::Storage(e) => {
                error!("failed to store image: {e}");
                ApiError::Internal
            }
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        if status.code < 500 {
            warn!("{} {} rejected: {self}", req.method(), req.uri());
        }
        Custom(status, error_body(self.to_string())).respond_to(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_errors_map_to_statuses() {
        let not_found: ApiError = MongoRepError::NotFound("recipe").into();
        assert_eq!(not_found.status(), Status::NotFound);
        assert_eq!(not_found.to_string(), "recipe not found");

        let duplicate: ApiError = MongoRepError::Duplicate("recipe is already in favorites".into()).into();
        assert_eq!(duplicate.status(), Status::BadRequest);
        assert_eq!(duplicate.to_string(), "recipe is already in favorites");

        let sequence: ApiError = MongoRepError::SequenceUnavailable("recipes".into()).into();
        assert_eq!(sequence.status(), Status::InternalServerError);
    }

    #[test]
    fn test_validation_errors_are_bad_requests() {
        let err: ApiError = ValidationError::NoTags.into();
        assert_eq!(err.status(), Status::BadRequest);
        assert_eq!(err.to_string(), "a recipe needs at least one tag");
    }

    #[test]
    fn test_image_errors() {
        let bad: ApiError = ImageError::NotDataUri.into();
        assert_eq!(bad.status(), Status::BadRequest);
        let io: ApiError = ImageError::Storage(std::io::Error::new(std::io::ErrorKind::Other, "disk")).into();
        assert_eq!(io.status(), Status::InternalServerError);
    }
}
