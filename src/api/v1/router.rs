use super::error::*;
use super::handler;
use crate::application_port::AuthService;
use crate::domain_model::UserProfile;
use crate::domain_port::RequestContext;
use crate::server::*;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, http, reject};

pub const INTERNAL_SERVICE_HEADER: &str = "X-Internal-Service";

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let register = warp::post()
        .and(warp::path("register"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with_context(server.clone()))
        .and(with(server.auth_service.clone()))
        .and_then(handler::register);

    let login = warp::post()
        .and(warp::path("login"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with_context(server.clone()))
        .and(with(server.auth_service.clone()))
        .and_then(handler::login);

    let refresh = warp::post()
        .and(warp::path("refresh"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with_context(server.clone()))
        .and(with(server.auth_service.clone()))
        .and_then(handler::refresh);

    let logout = warp::post()
        .and(warp::path("logout"))
        .and(warp::path::end())
        .and(with_verification(server.clone()))
        .and(with_context(server.clone()))
        .and(with(server.auth_service.clone()))
        .and_then(handler::logout);

    let validate = warp::get()
        .and(warp::path("validate"))
        .and(warp::path::end())
        .and(warp::header::optional::<String>(
            http::header::AUTHORIZATION.as_str(),
        ))
        .and(with_context(server.clone()))
        .and(with(server.auth_service.clone()))
        .and_then(handler::validate);

    let expected_caller = server.internal_service.clone();
    let invalidate = warp::post()
        .and(warp::path("internal"))
        .and(warp::path("invalidate"))
        .and(warp::path::end())
        .and(warp::header::optional::<String>(INTERNAL_SERVICE_HEADER))
        .and(warp::body::json())
        .and(warp::any().map(move || expected_caller.clone()))
        .and(with_context(server.clone()))
        .and(with(server.auth_service.clone()))
        .and_then(handler::invalidate);

    register
        .or(login)
        .or(refresh)
        .or(logout)
        .or(validate)
        .or(invalidate)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn with_context(
    server: Arc<Server>,
) -> impl Filter<Extract = (RequestContext,), Error = Infallible> + Clone {
    warp::any().map(move || server.request_context())
}

fn with_verification(
    server: Arc<Server>,
) -> impl Filter<Extract = (UserProfile,), Error = warp::Rejection> + Clone {
    warp::header::<String>(http::header::AUTHORIZATION.as_str()).and_then(move |token: String| {
        let server = server.clone();
        async move {
            let auth_service: Arc<dyn AuthService> = server.auth_service.clone();
            if let Some(token) = token.strip_prefix("Bearer ") {
                let user = auth_service
                    .validate(&server.request_context(), token)
                    .await
                    .map_err(ApiErrorCode::from)
                    .map_err(reject::custom)?;
                Ok(user)
            } else {
                Err(reject::custom(ApiErrorCode::InvalidToken))
            }
        }
    })
}
