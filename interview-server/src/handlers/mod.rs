pub mod dashboard;
pub mod interviews;
pub mod users;

use std::sync::Arc;

use warp::http::StatusCode;

use crate::auth::AuthService;
use interview_persistence::repositories::UserRepository;
use interview_types::{ErrorMessage, User};

pub(crate) type JsonReply = warp::reply::WithStatus<warp::reply::Json>;

pub(crate) fn message_reply(message: &str, status: StatusCode) -> JsonReply {
    warp::reply::with_status(warp::reply::json(&ErrorMessage::new(message)), status)
}

/// Resolve the bearer token to its user. Errors come back as ready-to-send
/// replies so handlers can bail with `?`-style early returns.
pub(crate) async fn authenticate(
    auth_header: Option<String>,
    auth_service: &Arc<AuthService>,
    user_repository: &Arc<UserRepository>,
) -> Result<User, JsonReply> {
    let Some(auth_header) = auth_header else {
        return Err(message_reply(
            "Not authorized, missing token",
            StatusCode::UNAUTHORIZED,
        ));
    };

    let token = auth_header.strip_prefix("Bearer ").unwrap_or(&auth_header);

    let user_id = auth_service.verify_token(token).map_err(|_| {
        message_reply("Not authorized, token failed", StatusCode::UNAUTHORIZED)
    })?;

    match user_repository.find_by_id(user_id).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(message_reply("User not found", StatusCode::NOT_FOUND)),
        Err(e) => {
            tracing::error!("Failed to load authenticated user: {}", e);
            Err(message_reply(
                "Server error",
                StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}
