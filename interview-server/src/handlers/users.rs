use std::sync::Arc;
use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;
use warp::http::StatusCode;

use crate::auth::{AuthError, AuthService};
use crate::email::Mailer;
use crate::handlers::{authenticate, message_reply};
use interview_core::build_test_email;
use interview_persistence::repositories::{NewUser, UserRepository};
use interview_types::{
    AuthResponse, GoogleLoginRequest, IndustryMode, LoginRequest, RegisterRequest,
    TestEmailRequest, UpdateProfileRequest, User, UserSettings,
};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex")
});

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn auth_response(
    auth_service: &Arc<AuthService>,
    user: User,
    status: StatusCode,
) -> Result<super::JsonReply, warp::Rejection> {
    let token = match auth_service.issue_token(user.id) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!("Token issuance failed: {}", e);
            return Ok(message_reply(
                "Server error",
                StatusCode::INTERNAL_SERVER_ERROR,
            ));
        }
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&AuthResponse { user, token }),
        status,
    ))
}

pub async fn handle_register(
    body: RegisterRequest,
    auth_service: Arc<AuthService>,
    user_repository: Arc<UserRepository>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let (Some(name), Some(email), Some(password), Some(role), Some(experience_level)) = (
        non_empty(body.name),
        non_empty(body.email),
        non_empty(body.password),
        non_empty(body.role),
        non_empty(body.experience_level),
    ) else {
        return Ok(message_reply(
            "Missing required fields",
            StatusCode::BAD_REQUEST,
        ));
    };

    match user_repository.find_by_email(&email).await {
        Ok(Some(_)) => {
            return Ok(message_reply(
                "User already exists",
                StatusCode::BAD_REQUEST,
            ));
        }
        Ok(None) => {}
        Err(e) => {
            tracing::error!("Registration lookup failed: {}", e);
            return Ok(message_reply(
                "Server error",
                StatusCode::INTERNAL_SERVER_ERROR,
            ));
        }
    }

    let password_hash = match auth_service.hash_password(&password) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("Registration error: {}", e);
            return Ok(message_reply(
                "Server error",
                StatusCode::INTERNAL_SERVER_ERROR,
            ));
        }
    };

    let created = user_repository
        .create_user(NewUser {
            name,
            email,
            password_hash,
            role,
            experience_level,
            industry_mode: body.industry_mode.unwrap_or_default(),
        })
        .await;

    match created {
        Ok(user) => auth_response(&auth_service, user, StatusCode::CREATED),
        Err(e) => {
            tracing::error!("Registration error: {}", e);
            Ok(message_reply(
                "Server error",
                StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}

pub async fn handle_login(
    body: LoginRequest,
    auth_service: Arc<AuthService>,
    user_repository: Arc<UserRepository>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let (Some(email), Some(password)) = (non_empty(body.email), non_empty(body.password)) else {
        return Ok(message_reply(
            "Email and password are required",
            StatusCode::BAD_REQUEST,
        ));
    };

    let credentials = match user_repository.find_credentials(&email).await {
        Ok(credentials) => credentials,
        Err(e) => {
            tracing::error!("Login error: {}", e);
            return Ok(message_reply(
                "Server error",
                StatusCode::INTERNAL_SERVER_ERROR,
            ));
        }
    };

    match credentials {
        Some((user, stored_hash)) if auth_service.verify_password(&password, &stored_hash) => {
            auth_response(&auth_service, user, StatusCode::OK)
        }
        _ => Ok(message_reply(
            "Invalid email or password",
            StatusCode::UNAUTHORIZED,
        )),
    }
}

pub async fn handle_google_login(
    body: GoogleLoginRequest,
    auth_service: Arc<AuthService>,
    user_repository: Arc<UserRepository>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let Some(id_token) = non_empty(body.id_token) else {
        return Ok(message_reply(
            "Google token is required",
            StatusCode::BAD_REQUEST,
        ));
    };

    let token_info = match auth_service.verify_google_token(&id_token).await {
        Ok(info) => info,
        Err(AuthError::GoogleNotConfigured) => {
            return Ok(message_reply(
                "Google auth is not configured",
                StatusCode::INTERNAL_SERVER_ERROR,
            ));
        }
        Err(e @ (AuthError::GoogleTokenInvalid
        | AuthError::GoogleAudienceMismatch
        | AuthError::GoogleEmailUnverified)) => {
            return Ok(message_reply(&e.to_string(), StatusCode::UNAUTHORIZED));
        }
        Err(e) => {
            tracing::error!("Google login error: {}", e);
            return Ok(message_reply(
                "Server error",
                StatusCode::INTERNAL_SERVER_ERROR,
            ));
        }
    };

    let email = token_info.email.unwrap_or_default();

    let existing = match user_repository.find_by_email(&email).await {
        Ok(existing) => existing,
        Err(e) => {
            tracing::error!("Google login error: {}", e);
            return Ok(message_reply(
                "Server error",
                StatusCode::INTERNAL_SERVER_ERROR,
            ));
        }
    };

    let user = match existing {
        Some(user) => user,
        None => {
            // First Google sign-in provisions an account with an unguessable
            // local credential.
            let name = token_info
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| email.split('@').next().unwrap_or(&email).to_string());
            let random_password = format!("{}-{}", Uuid::new_v4(), Uuid::new_v4());
            let password_hash = match auth_service.hash_password(&random_password) {
                Ok(hash) => hash,
                Err(e) => {
                    tracing::error!("Google login error: {}", e);
                    return Ok(message_reply(
                        "Server error",
                        StatusCode::INTERNAL_SERVER_ERROR,
                    ));
                }
            };

            match user_repository
                .create_user(NewUser {
                    name,
                    email,
                    password_hash,
                    role: "Frontend".to_string(),
                    experience_level: "Fresher".to_string(),
                    industry_mode: IndustryMode::ProductCompany,
                })
                .await
            {
                Ok(user) => user,
                Err(e) => {
                    tracing::error!("Google login error: {}", e);
                    return Ok(message_reply(
                        "Server error",
                        StatusCode::INTERNAL_SERVER_ERROR,
                    ));
                }
            }
        }
    };

    auth_response(&auth_service, user, StatusCode::OK)
}

pub async fn handle_get_profile(
    auth_header: Option<String>,
    auth_service: Arc<AuthService>,
    user_repository: Arc<UserRepository>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let user = match authenticate(auth_header, &auth_service, &user_repository).await {
        Ok(user) => user,
        Err(reply) => return Ok(reply),
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&user),
        StatusCode::OK,
    ))
}

pub async fn handle_update_profile(
    auth_header: Option<String>,
    body: UpdateProfileRequest,
    auth_service: Arc<AuthService>,
    user_repository: Arc<UserRepository>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let user = match authenticate(auth_header, &auth_service, &user_repository).await {
        Ok(user) => user,
        Err(reply) => return Ok(reply),
    };

    let settings = body.settings.map(|patch| {
        let mut merged = user.settings.clone();
        if let Some(notifications) = patch.notifications {
            merged.notifications = notifications;
        }
        if let Some(dark_mode) = patch.dark_mode {
            merged.dark_mode = dark_mode;
        }
        if let Some(count) = patch.preferred_question_count {
            merged.preferred_question_count =
                count.clamp(UserSettings::MIN_QUESTION_COUNT, UserSettings::MAX_QUESTION_COUNT);
        }
        if let Some(email) = patch.notification_email {
            let trimmed = email.trim().to_string();
            merged.notification_email = if trimmed.is_empty() { None } else { Some(trimmed) };
        }
        merged
    });

    let updated = user_repository
        .update_profile(
            user.id,
            non_empty(body.role),
            non_empty(body.experience_level),
            body.industry_mode,
            settings,
        )
        .await;

    match updated {
        Ok(user) => Ok(warp::reply::with_status(
            warp::reply::json(&user),
            StatusCode::OK,
        )),
        Err(e) => {
            tracing::error!("Profile update failed: {}", e);
            Ok(message_reply(
                "Server error",
                StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}

pub async fn handle_test_email(
    auth_header: Option<String>,
    body: TestEmailRequest,
    auth_service: Arc<AuthService>,
    user_repository: Arc<UserRepository>,
    mailer: Arc<dyn Mailer>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let user = match authenticate(auth_header, &auth_service, &user_repository).await {
        Ok(user) => user,
        Err(reply) => return Ok(reply),
    };

    let requested = body
        .email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty());
    let to = requested
        .unwrap_or_else(|| user.settings.resolve_notification_email(&user.email).to_string());

    if !EMAIL_RE.is_match(&to) {
        return Ok(message_reply(
            "Please provide a valid email address.",
            StatusCode::BAD_REQUEST,
        ));
    }

    let email = build_test_email(chrono::Utc::now());
    match mailer.send(&to, &email.subject, &email.text).await {
        Ok(()) => Ok(message_reply(
            &format!("Test email sent to {to}."),
            StatusCode::OK,
        )),
        Err(e) => {
            tracing::error!("Test email failed: {}", e);
            Ok(message_reply(
                &e.to_string(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}
