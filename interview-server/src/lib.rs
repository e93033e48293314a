use std::sync::Arc;

use warp::Filter;

use crate::auth::AuthService;
use crate::email::Mailer;
use crate::oracle::QuestionOracle;
use crate::session::SessionService;
use interview_persistence::repositories::{InterviewRepository, UserRepository};

pub mod auth;
pub mod config;
pub mod email;
pub mod handlers;
pub mod oracle;
pub mod session;

use handlers::interviews::{FinishQuery, ListQuery};

pub fn create_routes(
    auth_service: Arc<AuthService>,
    user_repository: Arc<UserRepository>,
    interview_repository: Arc<InterviewRepository>,
    oracle: Arc<dyn QuestionOracle>,
    mailer: Arc<dyn Mailer>,
    session_service: Arc<SessionService>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    // Clone for filters
    let auth_filter = warp::any().map({
        let auth_service = auth_service.clone();
        move || auth_service.clone()
    });

    let user_repository_filter = warp::any().map({
        let user_repository = user_repository.clone();
        move || user_repository.clone()
    });

    let interview_repository_filter = warp::any().map({
        let interview_repository = interview_repository.clone();
        move || interview_repository.clone()
    });

    let oracle_filter = warp::any().map({
        let oracle = oracle.clone();
        move || oracle.clone()
    });

    let mailer_filter = warp::any().map({
        let mailer = mailer.clone();
        move || mailer.clone()
    });

    let session_filter = warp::any().map({
        let session_service = session_service.clone();
        move || session_service.clone()
    });

    let bearer = warp::header::optional::<String>("authorization");

    // Health check endpoint
    let health = warp::path!("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", warp::http::StatusCode::OK));

    // Registration and sign-in
    let register = warp::post()
        .and(warp::path!("users"))
        .and(warp::body::json())
        .and(auth_filter.clone())
        .and(user_repository_filter.clone())
        .and_then(handlers::users::handle_register);

    let login = warp::post()
        .and(warp::path!("users" / "login"))
        .and(warp::body::json())
        .and(auth_filter.clone())
        .and(user_repository_filter.clone())
        .and_then(handlers::users::handle_login);

    let google_login = warp::post()
        .and(warp::path!("users" / "google"))
        .and(warp::body::json())
        .and(auth_filter.clone())
        .and(user_repository_filter.clone())
        .and_then(handlers::users::handle_google_login);

    // Profile and settings
    let profile_get = warp::get()
        .and(bearer)
        .and(warp::path!("users" / "profile"))
        .and(auth_filter.clone())
        .and(user_repository_filter.clone())
        .and_then(handlers::users::handle_get_profile);

    let profile_patch = warp::patch()
        .and(bearer)
        .and(warp::path!("users" / "profile"))
        .and(warp::body::json())
        .and(auth_filter.clone())
        .and(user_repository_filter.clone())
        .and_then(handlers::users::handle_update_profile);

    let test_email = warp::post()
        .and(bearer)
        .and(warp::path!("users" / "settings" / "test-email"))
        .and(warp::body::json())
        .and(auth_filter.clone())
        .and(user_repository_filter.clone())
        .and(mailer_filter.clone())
        .and_then(handlers::users::handle_test_email);

    // Dashboard
    let dashboard_summary = warp::get()
        .and(bearer)
        .and(warp::path!("dashboard" / "summary"))
        .and(auth_filter.clone())
        .and(user_repository_filter.clone())
        .and(interview_repository_filter.clone())
        .and_then(handlers::dashboard::handle_summary);

    // Interview lifecycle
    let start_interview = warp::post()
        .and(bearer)
        .and(warp::path!("interviews" / "start"))
        .and(warp::body::json())
        .and(auth_filter.clone())
        .and(user_repository_filter.clone())
        .and(session_filter.clone())
        .and_then(handlers::interviews::handle_start);

    let list_interviews = warp::get()
        .and(bearer)
        .and(warp::path!("interviews"))
        .and(warp::query::<ListQuery>())
        .and(auth_filter.clone())
        .and(user_repository_filter.clone())
        .and(session_filter.clone())
        .and_then(handlers::interviews::handle_list);

    let get_interview = warp::get()
        .and(bearer)
        .and(warp::path!("interviews" / String))
        .and(auth_filter.clone())
        .and(user_repository_filter.clone())
        .and(session_filter.clone())
        .and_then(handlers::interviews::handle_get);

    let submit_answer = warp::post()
        .and(bearer)
        .and(warp::path!("interviews" / String / "answer"))
        .and(warp::body::json())
        .and(auth_filter.clone())
        .and(user_repository_filter.clone())
        .and(session_filter.clone())
        .and_then(handlers::interviews::handle_answer);

    let finish_interview = warp::post()
        .and(bearer)
        .and(warp::path!("interviews" / String / "finish"))
        .and(warp::query::<FinishQuery>())
        .and(warp::body::bytes())
        .and(auth_filter.clone())
        .and(user_repository_filter.clone())
        .and(session_filter.clone())
        .and_then(handlers::interviews::handle_finish);

    let speech_to_text = warp::post()
        .and(bearer)
        .and(warp::path!("interviews" / String / "speech-to-text"))
        .and(warp::multipart::form().max_length(25 * 1024 * 1024))
        .and(auth_filter.clone())
        .and(user_repository_filter.clone())
        .and(session_filter.clone())
        .and(oracle_filter.clone())
        .and_then(handlers::interviews::handle_speech_to_text);

    // CORS configuration
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type", "authorization"])
        .allow_methods(vec!["GET", "POST", "PATCH"]);

    health
        .or(register)
        .or(login)
        .or(google_login)
        .or(profile_get)
        .or(profile_patch)
        .or(test_email)
        .or(dashboard_summary)
        .or(start_interview)
        .or(list_interviews)
        .or(get_interview)
        .or(submit_answer)
        .or(finish_interview)
        .or(speech_to_text)
        .with(cors)
        .with(warp::log("interview_pilot"))
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::email::MailError;
    use crate::oracle::{Evaluation, OracleError};
    use interview_persistence::connection::connect_to_memory_database;
    use migration::{Migrator, MigratorTrait};

    struct StubOracle;

    #[async_trait::async_trait]
    impl QuestionOracle for StubOracle {
        async fn generate_questions(
            &self,
            role: &str,
            _experience_level: &str,
            count: u32,
        ) -> Result<Vec<String>, OracleError> {
            Ok((1..=count)
                .map(|i| format!("Question {i} for {role}"))
                .collect())
        }

        async fn evaluate_answer(
            &self,
            _question_text: &str,
            user_answer: &str,
        ) -> Result<Evaluation, OracleError> {
            let score = if user_answer.contains("six") { 6.0 } else { 8.0 };
            Ok(Evaluation {
                score,
                feedback: "Stub feedback".to_string(),
                strengths: vec!["clarity".to_string()],
                weaknesses: vec!["depth".to_string()],
                improvement: "Add examples".to_string(),
            })
        }

        async fn transcribe_audio(
            &self,
            _file_name: &str,
            _audio: Vec<u8>,
        ) -> Result<String, OracleError> {
            Ok("transcribed speech".to_string())
        }
    }

    struct DiscardMailer;

    #[async_trait::async_trait]
    impl Mailer for DiscardMailer {
        async fn send(&self, _to: &str, _subject: &str, _text: &str) -> Result<(), MailError> {
            Ok(())
        }
    }

    async fn create_test_app()
    -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let auth_service = Arc::new(AuthService::new("test-secret", None));
        let user_repository = Arc::new(UserRepository::new(db.clone()));
        let interview_repository = Arc::new(InterviewRepository::new(db));
        let oracle: Arc<dyn QuestionOracle> = Arc::new(StubOracle);
        let mailer: Arc<dyn Mailer> = Arc::new(DiscardMailer);
        let session_service = Arc::new(SessionService::new(
            interview_repository.clone(),
            user_repository.clone(),
            oracle.clone(),
            mailer.clone(),
        ));

        create_routes(
            auth_service,
            user_repository,
            interview_repository,
            oracle,
            mailer,
            session_service,
        )
    }

    fn register_body(email: &str) -> serde_json::Value {
        serde_json::json!({
            "name": "Test User",
            "email": email,
            "password": "secret-pass-1",
            "role": "Backend",
            "experienceLevel": "Fresher",
        })
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app().await;

        let response = warp::test::request()
            .method("GET")
            .path("/health")
            .reply(&app)
            .await;

        assert_eq!(response.status(), 200);
        assert_eq!(response.body(), "OK");
    }

    #[tokio::test]
    async fn test_register_returns_user_and_token() {
        let app = create_test_app().await;

        let response = warp::test::request()
            .method("POST")
            .path("/users")
            .json(&register_body("alice@example.com"))
            .reply(&app)
            .await;

        assert_eq!(response.status(), 201);
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["email"], "alice@example.com");
        assert_eq!(body["level"], 1);
        assert_eq!(body["xp"], 0);
        assert_eq!(body["settings"]["preferredQuestionCount"], 3);
        assert!(body["token"].as_str().is_some());
        // The credential hash never leaves the server
        assert!(body.get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn test_register_rejects_missing_fields_and_duplicates() {
        let app = create_test_app().await;

        let response = warp::test::request()
            .method("POST")
            .path("/users")
            .json(&serde_json::json!({"email": "x@example.com"}))
            .reply(&app)
            .await;
        assert_eq!(response.status(), 400);

        let first = warp::test::request()
            .method("POST")
            .path("/users")
            .json(&register_body("dup@example.com"))
            .reply(&app)
            .await;
        assert_eq!(first.status(), 201);

        let second = warp::test::request()
            .method("POST")
            .path("/users")
            .json(&register_body("dup@example.com"))
            .reply(&app)
            .await;
        assert_eq!(second.status(), 400);
        let body: serde_json::Value = serde_json::from_slice(second.body()).unwrap();
        assert_eq!(body["message"], "User already exists");
    }

    #[tokio::test]
    async fn test_login_round_trip() {
        let app = create_test_app().await;

        warp::test::request()
            .method("POST")
            .path("/users")
            .json(&register_body("bob@example.com"))
            .reply(&app)
            .await;

        let ok = warp::test::request()
            .method("POST")
            .path("/users/login")
            .json(&serde_json::json!({"email": "bob@example.com", "password": "secret-pass-1"}))
            .reply(&app)
            .await;
        assert_eq!(ok.status(), 200);
        let body: serde_json::Value = serde_json::from_slice(ok.body()).unwrap();
        assert!(body["token"].as_str().is_some());

        let bad = warp::test::request()
            .method("POST")
            .path("/users/login")
            .json(&serde_json::json!({"email": "bob@example.com", "password": "wrong"}))
            .reply(&app)
            .await;
        assert_eq!(bad.status(), 401);

        let unknown = warp::test::request()
            .method("POST")
            .path("/users/login")
            .json(&serde_json::json!({"email": "ghost@example.com", "password": "secret-pass-1"}))
            .reply(&app)
            .await;
        assert_eq!(unknown.status(), 401);
    }

    #[tokio::test]
    async fn test_google_login_unconfigured_and_missing_token() {
        let app = create_test_app().await;

        let missing = warp::test::request()
            .method("POST")
            .path("/users/google")
            .json(&serde_json::json!({}))
            .reply(&app)
            .await;
        assert_eq!(missing.status(), 400);

        // Test app has no GOOGLE_CLIENT_ID
        let unconfigured = warp::test::request()
            .method("POST")
            .path("/users/google")
            .json(&serde_json::json!({"idToken": "some-token"}))
            .reply(&app)
            .await;
        assert_eq!(unconfigured.status(), 500);
        let body: serde_json::Value = serde_json::from_slice(unconfigured.body()).unwrap();
        assert_eq!(body["message"], "Google auth is not configured");
    }

    #[tokio::test]
    async fn test_profile_requires_valid_token() {
        let app = create_test_app().await;

        let missing = warp::test::request()
            .method("GET")
            .path("/users/profile")
            .reply(&app)
            .await;
        assert_eq!(missing.status(), 401);
        let body: serde_json::Value = serde_json::from_slice(missing.body()).unwrap();
        assert_eq!(body["message"], "Not authorized, missing token");

        let invalid = warp::test::request()
            .method("GET")
            .path("/users/profile")
            .header("authorization", "Bearer not-a-real-token")
            .reply(&app)
            .await;
        assert_eq!(invalid.status(), 401);
    }

    #[tokio::test]
    async fn test_profile_get_and_patch_clamps_question_count() {
        let app = create_test_app().await;

        let registered = warp::test::request()
            .method("POST")
            .path("/users")
            .json(&register_body("carol@example.com"))
            .reply(&app)
            .await;
        let body: serde_json::Value = serde_json::from_slice(registered.body()).unwrap();
        let token = body["token"].as_str().unwrap().to_string();

        let profile = warp::test::request()
            .method("GET")
            .path("/users/profile")
            .header("authorization", format!("Bearer {token}"))
            .reply(&app)
            .await;
        assert_eq!(profile.status(), 200);

        let patched = warp::test::request()
            .method("PATCH")
            .path("/users/profile")
            .header("authorization", format!("Bearer {token}"))
            .json(&serde_json::json!({
                "role": "Fullstack",
                "settings": {"preferredQuestionCount": 9, "notificationEmail": "me@example.com"}
            }))
            .reply(&app)
            .await;
        assert_eq!(patched.status(), 200);
        let body: serde_json::Value = serde_json::from_slice(patched.body()).unwrap();
        assert_eq!(body["role"], "Fullstack");
        assert_eq!(body["settings"]["preferredQuestionCount"], 7);
        assert_eq!(body["settings"]["notificationEmail"], "me@example.com");

        let patched_low = warp::test::request()
            .method("PATCH")
            .path("/users/profile")
            .header("authorization", format!("Bearer {token}"))
            .json(&serde_json::json!({"settings": {"preferredQuestionCount": 1}}))
            .reply(&app)
            .await;
        let body: serde_json::Value = serde_json::from_slice(patched_low.body()).unwrap();
        assert_eq!(body["settings"]["preferredQuestionCount"], 3);
    }

    #[tokio::test]
    async fn test_start_requires_role_and_experience() {
        let app = create_test_app().await;

        let registered = warp::test::request()
            .method("POST")
            .path("/users")
            .json(&register_body("dave@example.com"))
            .reply(&app)
            .await;
        let body: serde_json::Value = serde_json::from_slice(registered.body()).unwrap();
        let token = body["token"].as_str().unwrap().to_string();

        let response = warp::test::request()
            .method("POST")
            .path("/interviews/start")
            .header("authorization", format!("Bearer {token}"))
            .json(&serde_json::json!({"role": "Backend"}))
            .reply(&app)
            .await;
        assert_eq!(response.status(), 400);
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["message"], "Role and experience level are required");
    }

    #[tokio::test]
    async fn test_invalid_routes() {
        let app = create_test_app().await;

        let response = warp::test::request()
            .method("GET")
            .path("/invalid")
            .reply(&app)
            .await;

        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_http_endpoints_cors() {
        let app = create_test_app().await;

        let response = warp::test::request()
            .method("OPTIONS")
            .path("/health")
            .header("origin", "http://localhost:3000")
            .header("access-control-request-method", "GET")
            .reply(&app)
            .await;

        assert_eq!(response.status(), 200);
        assert!(response
            .headers()
            .contains_key("access-control-allow-origin"));
    }
}
