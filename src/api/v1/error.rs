use crate::api::v1::handler::ApiResponse;
use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::{info, warn};
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let code = if let Some(code) = err.find::<ApiErrorCode>() {
        code.clone()
    } else if err.is_not_found() {
        return Ok(reply_with(
            StatusCode::NOT_FOUND,
            ApiError {
                code: "not_found",
                message: "Not found".to_string(),
            },
        ));
    } else if err.find::<warp::filters::body::BodyDeserializeError>().is_some()
        || err.find::<warp::reject::UnsupportedMediaType>().is_some()
    {
        ApiErrorCode::InvalidRequest("Invalid request body".to_string())
    } else if err.find::<warp::reject::MissingHeader>().is_some() {
        ApiErrorCode::Unauthorized
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        return Ok(reply_with(
            StatusCode::METHOD_NOT_ALLOWED,
            ApiError {
                code: "method_not_allowed",
                message: "Method not allowed".to_string(),
            },
        ));
    } else {
        warn!("Unhandled rejection: {:?}", err);
        ApiErrorCode::InternalError
    };

    Ok(reply_with(code.status(), code.to_api_error()))
}

fn reply_with(status: StatusCode, error: ApiError) -> warp::reply::WithStatus<warp::reply::Json> {
    let json = warp::reply::json(&ApiResponse::<()>::err(error));
    warp::reply::with_status(json, status)
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    /// `unauthorized`, `bad_request` or `internal_error`.
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Error)]
pub enum ApiErrorCode {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Email already registered")]
    EmailTaken,
    #[error("{0}")]
    InvalidRequest(String),
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        warn!("Internal error: {}", error);
        ApiErrorCode::InternalError
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::InvalidCredentials
            | ApiErrorCode::InvalidToken
            | ApiErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiErrorCode::EmailTaken | ApiErrorCode::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self.status() {
            StatusCode::UNAUTHORIZED => "unauthorized",
            StatusCode::BAD_REQUEST => "bad_request",
            _ => "internal_error",
        }
    }

    pub fn to_api_error(&self) -> ApiError {
        ApiError {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

impl reject::Reject for ApiErrorCode {}

impl From<AuthError> for ApiErrorCode {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::InvalidCredentials => ApiErrorCode::InvalidCredentials,
            AuthError::EmailTaken => ApiErrorCode::EmailTaken,
            AuthError::InvalidInput(message) => ApiErrorCode::InvalidRequest(message),
            AuthError::InvalidToken | AuthError::UserNotFound => ApiErrorCode::InvalidToken,
            AuthError::Cancelled => {
                info!("request cancelled before completion");
                ApiErrorCode::InternalError
            }
            AuthError::Unavailable(e) => ApiErrorCode::internal(e),
            AuthError::InternalError(e) => ApiErrorCode::internal(e),
        }
    }
}
