use std::sync::Arc;

use tokio::signal;
use tracing::info;

use interview_persistence::{
    connection::connect_and_migrate,
    repositories::{InterviewRepository, UserRepository},
};
use interview_server::{
    auth::AuthService,
    config::Config,
    create_routes,
    email::{Mailer, ResendMailer},
    oracle::{NimOracle, QuestionOracle},
    session::SessionService,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting InterviewPilot server...");

    let config = Config::new();

    // Initialize database connection and run migrations
    let db = match connect_and_migrate().await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Failed to connect to database and run migrations: {}", e);
            std::process::exit(1);
        }
    };
    let user_repository = Arc::new(UserRepository::new(db.clone()));
    let interview_repository = Arc::new(InterviewRepository::new(db));

    let auth_service = Arc::new(AuthService::new(
        &config.jwt_secret,
        config.google_client_id.clone(),
    ));
    if config.google_client_id.is_none() {
        info!("GOOGLE_CLIENT_ID not set - Google sign-in is disabled");
    }

    let oracle: Arc<dyn QuestionOracle> = Arc::new(NimOracle::new(
        config.nim_api_key.clone(),
        config.nim_base_url.clone(),
        config.nim_model.clone(),
        config.nim_stt_model.clone(),
        config.nim_stt_language.clone(),
    ));

    let mailer: Arc<dyn Mailer> = Arc::new(ResendMailer::new(
        config.resend_api_key.clone(),
        config.resend_from_email.clone(),
    ));
    if config.resend_api_key.is_none() || config.resend_from_email.is_none() {
        info!("Email provider not configured - summary emails will fail and be logged");
    }

    let session_service = Arc::new(SessionService::new(
        interview_repository.clone(),
        user_repository.clone(),
        oracle.clone(),
        mailer.clone(),
    ));

    let routes = create_routes(
        auth_service,
        user_repository,
        interview_repository,
        oracle,
        mailer,
        session_service,
    );

    info!("Server starting on {}:{}", config.host, config.port);

    let addr = (
        config.host.parse::<std::net::IpAddr>().expect("Invalid HOST"),
        config.port,
    );

    let (addr, server) = warp::serve(routes).bind_with_graceful_shutdown(addr, async {
        // Wait for SIGINT (Ctrl+C) or SIGTERM
        #[cfg(unix)]
        {
            let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt()).unwrap();
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate()).unwrap();

            tokio::select! {
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully...");
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            signal::ctrl_c().await.expect("Failed to listen for ctrl+c");
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    });

    info!(
        "Server started successfully on {}. Press Ctrl+C to stop.",
        addr
    );
    server.await;
    info!("Server shutdown complete.");
}
