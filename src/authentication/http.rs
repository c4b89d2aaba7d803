use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::PrivateCookieJar;
use serde::Serialize;
use tracing::{debug, error};

use crate::{
    client_ip::ClientIp,
    http_err::{ApiError, ApiResponse},
    identities::{
        http::reps::{Credentials, CurrentUser, UserRep},
        services::{AuthenticationError, UserService},
    },
    server::AppState,
};

use super::domain::session::Session;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(get_user_info))
}

async fn login(
    State(user_service): State<UserService>,
    ClientIp(client_ip): ClientIp,
    cookies: PrivateCookieJar,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> ApiResponse<(PrivateCookieJar, Json<UserRep>)> {
    let Json(credentials) = payload?;

    let user = match user_service
        .authenticate(
            &client_ip.to_string(),
            &credentials.email_id,
            &credentials.password,
        )
        .await
    {
        Ok(user) => user,
        Err(AuthenticationError::InvalidCredentials) => {
            return Err(ApiError::bad_request("Invalid credentials."))
        }
        Err(AuthenticationError::RateLimited(result)) => return Err(result.into()),
        Err(AuthenticationError::Other(error)) => {
            error!(?error, "Failed to authenticate user.");

            return Err(ApiError::InternalServerError);
        }
    };

    let session = Session::new_for_user(user.id);
    debug!(user_id = %user.id, session_id = %session.id(), "Created session.");

    Ok((cookies.add(session.cookie()?), Json(user.into())))
}

#[derive(Serialize)]
struct LogoutResponse {
    message: &'static str,
}

async fn logout(cookies: PrivateCookieJar) -> (PrivateCookieJar, Json<LogoutResponse>) {
    (
        cookies.remove(Session::removal_cookie()),
        Json(LogoutResponse {
            message: "Logout successfully",
        }),
    )
}

async fn get_user_info(
    session: Session,
    State(user_service): State<UserService>,
) -> ApiResponse<Json<CurrentUser>> {
    match user_service.get_user(session.user_id()).await {
        Ok(Some(user)) => Ok(Json(CurrentUser { user: user.into() })),
        Ok(None) => Err(ApiError::not_found("User not found.")),
        Err(error) => {
            error!(?error, user_id = %session.user_id(), "Failed to fetch user.");

            Err(ApiError::InternalServerError)
        }
    }
}
