use std::cmp::Ordering;
use std::sync::Arc;

use warp::http::StatusCode;

use crate::auth::AuthService;
use crate::handlers::{authenticate, message_reply};
use interview_core::GamificationEngine;
use interview_persistence::repositories::{InterviewRepository, UserRepository};
use interview_types::{DashboardStats, DashboardSummaryResponse, InterviewStatus};

pub async fn handle_summary(
    auth_header: Option<String>,
    auth_service: Arc<AuthService>,
    user_repository: Arc<UserRepository>,
    interview_repository: Arc<InterviewRepository>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let user = match authenticate(auth_header, &auth_service, &user_repository).await {
        Ok(user) => user,
        Err(reply) => return Ok(reply),
    };

    let completed = match interview_repository
        .list_for_user(user.id, Some(InterviewStatus::Completed), None)
        .await
    {
        Ok(completed) => completed,
        Err(e) => {
            tracing::error!("Dashboard summary failed: {}", e);
            return Ok(message_reply(
                "Server error",
                StatusCode::INTERNAL_SERVER_ERROR,
            ));
        }
    };

    let total_interviews = completed.len();
    let average_score = if total_interviews > 0 {
        let sum: f64 = completed.iter().map(|i| i.score).sum();
        (sum / total_interviews as f64 * 100.0).round() / 100.0
    } else {
        0.0
    };

    let by_score = |a: &f64, b: &f64| a.partial_cmp(b).unwrap_or(Ordering::Equal);
    let strongest_role = completed
        .iter()
        .max_by(|a, b| by_score(&a.score, &b.score))
        .map(|i| i.role.clone())
        .unwrap_or_else(|| "N/A".to_string());
    let weakest_role = completed
        .iter()
        .min_by(|a, b| by_score(&a.score, &b.score))
        .map(|i| i.role.clone())
        .unwrap_or_else(|| "N/A".to_string());

    let recent_interviews = completed.iter().take(5).cloned().collect();
    let level_progress = GamificationEngine::level_progress(user.xp, user.level);

    Ok(warp::reply::with_status(
        warp::reply::json(&DashboardSummaryResponse {
            user,
            level_progress,
            stats: DashboardStats {
                total_interviews,
                average_score,
                strongest_role,
                weakest_role,
            },
            recent_interviews,
        }),
        StatusCode::OK,
    ))
}
