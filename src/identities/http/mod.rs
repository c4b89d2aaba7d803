use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use axum_extra::extract::PrivateCookieJar;
use tracing::error;

use crate::{
    authentication::domain::session::Session,
    client_ip::ClientIp,
    http_err::{ApiError, ApiResponse},
    server::AppState,
};

use super::services::{CreateUserError, UserService};

pub mod reps;

pub fn routes() -> Router<AppState> {
    Router::new().route("/signup", post(signup))
}

async fn signup(
    State(user_service): State<UserService>,
    ClientIp(client_ip): ClientIp,
    cookies: PrivateCookieJar,
    payload: Result<Json<reps::NewUserRequest>, JsonRejection>,
) -> ApiResponse<(StatusCode, PrivateCookieJar, Json<reps::SignupResponse>)> {
    let Json(new_user) = payload?;

    let user = match user_service
        .create_user(&client_ip.to_string(), new_user.into())
        .await
    {
        Ok(user) => user,
        Err(CreateUserError::InvalidUser(context)) => {
            return Err(ApiError::bad_request(reps::describe_invalid_user(context)))
        }
        Err(CreateUserError::DuplicateEmail) => {
            return Err(ApiError::bad_request(
                "An account with this email already exists.",
            ))
        }
        Err(CreateUserError::RateLimited(result)) => return Err(result.into()),
        Err(CreateUserError::Other(error)) => {
            error!(?error, "Failed to create user.");

            return Err(ApiError::InternalServerError);
        }
    };

    let session_cookie = Session::new_for_user(user.id).cookie()?;

    Ok((
        StatusCode::CREATED,
        cookies.add(session_cookie),
        Json(reps::SignupResponse {
            message: "User Added successfully",
            data: user.into(),
        }),
    ))
}
