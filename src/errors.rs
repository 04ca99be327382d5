use rocket::Request;
use rocket::http::Status;
use rocket::response::{self, Responder, Response};
use serde_json::json;
use thiserror::Error;

/// Every failure the service reports, store-level and boundary-level alike.
///
/// `NotFound` and `DuplicateId` are routine outcomes of normal API usage and
/// are never logged; `NotConnected` and `Store` are real faults.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("database connection is not available")]
    NotConnected,
    #[error("item with ID {0} not found")]
    NotFound(i64),
    #[error("item with ID {0} already exists")]
    DuplicateId(i64),
    #[error("{0}")]
    Validation(String),
    #[error("unexpected database failure: {0}")]
    Store(String),
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            ApiError::NotConnected => Status::ServiceUnavailable,
            ApiError::NotFound(_) => Status::NotFound,
            ApiError::DuplicateId(_) => Status::Conflict,
            ApiError::Validation(_) => Status::UnprocessableEntity,
            ApiError::Store(_) => Status::InternalServerError,
        }
    }
}

impl From<mongodb::error::Error> for ApiError {
    fn from(err: mongodb::error::Error) -> Self {
        ApiError::Store(err.to_string())
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();

        match &self {
            ApiError::NotConnected => log::warn!("rejecting request: {}", self),
            ApiError::Store(message) => log::error!("store failure: {}", message),
            _ => {}
        }

        let body = json!({
            "error": self.to_string(),
            "status": status.code
        })
        .to_string();

        Response::build()
            .status(status)
            .header(rocket::http::ContentType::JSON)
            .sized_body(body.len(), std::io::Cursor::new(body))
            .ok()
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid MONGO_PORT value {0:?}")]
    InvalidPort(String),
}
