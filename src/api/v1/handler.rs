use super::error::*;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::RequestContext;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::StatusCode;
use warp::{self, reject};

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_EMAIL_HEADER: &str = "X-User-Email";

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: ApiError) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

pub async fn register(
    body: RegisterRequest,
    ctx: RequestContext,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let input = RegisterInput {
        email: body.email,
        password: body.password,
        name: body.name,
    };
    let session = auth_service
        .register(&ctx, input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::with_status(
        warp::reply::json(&ApiResponse::ok(session)),
        StatusCode::CREATED,
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    body: LoginRequest,
    ctx: RequestContext,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let input = LoginInput {
        email: body.email,
        password: body.password,
    };
    let session = auth_service
        .login(&ctx, input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(session)))
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

pub async fn refresh(
    body: RefreshRequest,
    ctx: RequestContext,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let session = auth_service
        .refresh(&ctx, &body.refresh_token)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(session)))
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

pub async fn logout(
    user: UserProfile,
    ctx: RequestContext,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    auth_service
        .logout(&ctx, &user.id)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(MessageResponse {
        message: "Successfully logged out",
    })))
}

/// Gateway contract: 200 plus identity headers, or the same 401 for every token failure.
pub async fn validate(
    authorization: Option<String>,
    ctx: RequestContext,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let token = authorization
        .as_deref()
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| reject::custom(ApiErrorCode::Unauthorized))?;

    let user = auth_service
        .validate(&ctx, token)
        .await
        .map_err(|e| match ApiErrorCode::from(e) {
            ApiErrorCode::InternalError => ApiErrorCode::InternalError,
            _ => ApiErrorCode::Unauthorized,
        })
        .map_err(reject::custom)?;

    let id = user.id.to_string();
    let email = user.email.clone();
    let reply = warp::reply::json(&ApiResponse::ok(user));
    let reply = warp::reply::with_header(reply, USER_ID_HEADER, id);
    Ok(warp::reply::with_header(reply, USER_EMAIL_HEADER, email))
}

#[derive(Debug, Deserialize)]
pub struct InvalidateRequest {
    pub token: String,
    pub kind: TokenKind,
}

pub async fn invalidate(
    caller: Option<String>,
    body: InvalidateRequest,
    expected_caller: String,
    ctx: RequestContext,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    if caller.as_deref() != Some(expected_caller.as_str()) {
        return Err(reject::custom(ApiErrorCode::Unauthorized));
    }

    auth_service
        .invalidate(&ctx, &body.token, body.kind)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(MessageResponse {
        message: "Token invalidated",
    })))
}
