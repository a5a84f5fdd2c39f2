use crate::api::v1::handler::ApiResponse;
use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::error;
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let rejection = if let Some(rejection) = err.find::<ApiRejection>() {
        rejection.clone()
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        ApiRejection::new(ApiErrorCode::InvalidRequest, format!("Malformed request body: {e}"))
    } else if err.find::<reject::MissingHeader>().is_some() {
        ApiErrorCode::InvalidToken.into()
    } else if err.is_not_found() || err.find::<reject::MethodNotAllowed>().is_some() {
        ApiErrorCode::NotFound.into()
    } else {
        error!("Unhandled rejection: {:?}", err);
        ApiErrorCode::InternalError.into()
    };

    let status = rejection.code.status();
    let json = warp::reply::json(&ApiResponse::<()>::err(rejection.code, rejection.message));
    Ok(warp::reply::with_status(json, status))
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
pub enum ApiErrorCode {
    #[error("Invalid request")]
    InvalidRequest,
    #[error("Username already taken")]
    UsernameTaken,
    #[error("Email already registered")]
    EmailTaken,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Token is not valid")]
    InvalidToken,
    #[error("Not found")]
    NotFound,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
            ApiErrorCode::UsernameTaken | ApiErrorCode::EmailTaken => StatusCode::CONFLICT,
            ApiErrorCode::InvalidCredentials | ApiErrorCode::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// What handlers reject with: a public code plus the message shown to clients.
#[derive(Debug, Clone)]
pub struct ApiRejection {
    pub code: ApiErrorCode,
    pub message: String,
}

impl ApiRejection {
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn internal<E: std::fmt::Display>(error: E) -> ApiRejection {
        error!("Internal error: {}", error);
        ApiErrorCode::InternalError.into()
    }
}

impl reject::Reject for ApiRejection {}

impl From<ApiErrorCode> for ApiRejection {
    fn from(code: ApiErrorCode) -> Self {
        ApiRejection::new(code, code.to_string())
    }
}

impl From<AuthError> for ApiRejection {
    fn from(error: AuthError) -> Self {
        match error.kind() {
            AuthErrorKind::Validation => {
                ApiRejection::new(ApiErrorCode::InvalidRequest, error.to_string())
            }
            AuthErrorKind::Conflict => match error {
                AuthError::EmailTaken => ApiErrorCode::EmailTaken.into(),
                _ => ApiErrorCode::UsernameTaken.into(),
            },
            AuthErrorKind::InvalidCredentials => ApiErrorCode::InvalidCredentials.into(),
            AuthErrorKind::TokenInvalid => ApiErrorCode::InvalidToken.into(),
            AuthErrorKind::NotFound => ApiErrorCode::NotFound.into(),
            AuthErrorKind::Internal => ApiRejection::internal(error),
        }
    }
}
