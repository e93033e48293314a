use std::sync::Arc;

use bytes::{Buf, Bytes};
use futures_util::TryStreamExt;
use serde::Deserialize;
use uuid::Uuid;
use warp::http::StatusCode;
use warp::multipart::FormData;

use crate::auth::AuthService;
use crate::handlers::{JsonReply, authenticate, message_reply};
use crate::oracle::QuestionOracle;
use crate::session::{FinishOutcome, SessionError, SessionService, StartParams};
use interview_persistence::repositories::UserRepository;
use interview_types::{
    AnswerRequest, EndedReason, FinishRequest, FinishResponse, InterviewStatus,
    StartInterviewRequest, TranscriptionResponse,
};

const MAX_AUDIO_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct FinishQuery {
    #[serde(rename = "endedReason")]
    pub ended_reason: Option<String>,
}

fn session_error_reply(error: SessionError) -> JsonReply {
    match error {
        SessionError::InterviewNotFound => {
            message_reply("Interview not found", StatusCode::NOT_FOUND)
        }
        SessionError::QuestionNotFound => {
            message_reply("Question not found", StatusCode::NOT_FOUND)
        }
        SessionError::NotOwner => message_reply("Not authorized", StatusCode::UNAUTHORIZED),
        SessionError::AlreadyCompleted => {
            message_reply("Interview already completed", StatusCode::BAD_REQUEST)
        }
        SessionError::Generation => {
            message_reply("Failed to start interview", StatusCode::INTERNAL_SERVER_ERROR)
        }
        SessionError::Evaluation => {
            message_reply("Failed to evaluate answer", StatusCode::INTERNAL_SERVER_ERROR)
        }
        SessionError::Conflict => message_reply(
            "Interview was updated concurrently, retry",
            StatusCode::CONFLICT,
        ),
        SessionError::Storage(e) => {
            tracing::error!("Interview storage error: {}", e);
            message_reply("Server error", StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub async fn handle_list(
    auth_header: Option<String>,
    query: ListQuery,
    auth_service: Arc<AuthService>,
    user_repository: Arc<UserRepository>,
    session_service: Arc<SessionService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let user = match authenticate(auth_header, &auth_service, &user_repository).await {
        Ok(user) => user,
        Err(reply) => return Ok(reply),
    };

    let status = match query.status.as_deref() {
        None => None,
        Some(raw) => match InterviewStatus::parse(raw) {
            Some(status) => Some(status),
            // An unknown status filter can never match anything, but the
            // sweep still runs before the (empty) listing is returned.
            None => {
                if let Err(e) = session_service.sweep_abandoned(&user).await {
                    return Ok(session_error_reply(e));
                }
                return Ok(warp::reply::with_status(
                    warp::reply::json(&Vec::<interview_types::Interview>::new()),
                    StatusCode::OK,
                ));
            }
        },
    };
    let limit = query.limit.unwrap_or(50).clamp(1, 100);

    match session_service.list_interviews(&user, status, limit).await {
        Ok(interviews) => Ok(warp::reply::with_status(
            warp::reply::json(&interviews),
            StatusCode::OK,
        )),
        Err(e) => Ok(session_error_reply(e)),
    }
}

pub async fn handle_start(
    auth_header: Option<String>,
    body: StartInterviewRequest,
    auth_service: Arc<AuthService>,
    user_repository: Arc<UserRepository>,
    session_service: Arc<SessionService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let user = match authenticate(auth_header, &auth_service, &user_repository).await {
        Ok(user) => user,
        Err(reply) => return Ok(reply),
    };

    let (Some(role), Some(experience_level)) = (
        body.role.filter(|r| !r.trim().is_empty()),
        body.experience_level.filter(|e| !e.trim().is_empty()),
    ) else {
        return Ok(message_reply(
            "Role and experience level are required",
            StatusCode::BAD_REQUEST,
        ));
    };

    let params = StartParams {
        role,
        experience_level,
        industry_mode: body.industry_mode,
        question_count: body.question_count,
        interview_mode: body.interview_mode,
    };

    match session_service.start(&user, params).await {
        Ok(interview) => Ok(warp::reply::with_status(
            warp::reply::json(&interview),
            StatusCode::CREATED,
        )),
        Err(e) => Ok(session_error_reply(e)),
    }
}

pub async fn handle_get(
    auth_header: Option<String>,
    id: String,
    auth_service: Arc<AuthService>,
    user_repository: Arc<UserRepository>,
    session_service: Arc<SessionService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let user = match authenticate(auth_header, &auth_service, &user_repository).await {
        Ok(user) => user,
        Err(reply) => return Ok(reply),
    };

    let Ok(interview_id) = Uuid::parse_str(&id) else {
        return Ok(message_reply("Interview not found", StatusCode::NOT_FOUND));
    };

    match session_service.fetch(&user, interview_id).await {
        Ok(interview) => Ok(warp::reply::with_status(
            warp::reply::json(&interview),
            StatusCode::OK,
        )),
        Err(e) => Ok(session_error_reply(e)),
    }
}

pub async fn handle_answer(
    auth_header: Option<String>,
    id: String,
    body: AnswerRequest,
    auth_service: Arc<AuthService>,
    user_repository: Arc<UserRepository>,
    session_service: Arc<SessionService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let user = match authenticate(auth_header, &auth_service, &user_repository).await {
        Ok(user) => user,
        Err(reply) => return Ok(reply),
    };

    let (Some(question_id), Some(answer_text)) = (
        body.question_id,
        body.answer_text.filter(|a| !a.is_empty()),
    ) else {
        return Ok(message_reply(
            "Question ID and answer text are required",
            StatusCode::BAD_REQUEST,
        ));
    };

    let Ok(interview_id) = Uuid::parse_str(&id) else {
        return Ok(message_reply("Interview not found", StatusCode::NOT_FOUND));
    };

    match session_service
        .submit_answer(&user, interview_id, question_id, answer_text)
        .await
    {
        Ok(question) => Ok(warp::reply::with_status(
            warp::reply::json(&question),
            StatusCode::OK,
        )),
        Err(e) => Ok(session_error_reply(e)),
    }
}

pub async fn handle_finish(
    auth_header: Option<String>,
    id: String,
    query: FinishQuery,
    body: Bytes,
    auth_service: Arc<AuthService>,
    user_repository: Arc<UserRepository>,
    session_service: Arc<SessionService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let user = match authenticate(auth_header, &auth_service, &user_repository).await {
        Ok(user) => user,
        Err(reply) => return Ok(reply),
    };

    let Ok(interview_id) = Uuid::parse_str(&id) else {
        return Ok(message_reply("Interview not found", StatusCode::NOT_FOUND));
    };

    // Reason comes from the query string first, then the JSON body. The body
    // is often empty here (sendBeacon/keepalive), so it is parsed leniently.
    let reason_from_body = || {
        serde_json::from_slice::<FinishRequest>(&body)
            .ok()
            .and_then(|r| r.ended_reason)
    };
    let ended_reason = match query.ended_reason.as_deref().and_then(EndedReason::parse) {
        Some(reason) => reason,
        None => EndedReason::parse_or_manual(reason_from_body().as_deref()),
    };

    match session_service.finish(&user, interview_id, ended_reason).await {
        Ok(FinishOutcome::AlreadyCompleted(interview)) => Ok(warp::reply::with_status(
            warp::reply::json(&FinishResponse {
                interview,
                gamification: None,
                message: Some("Interview already completed".to_string()),
            }),
            StatusCode::OK,
        )),
        Ok(FinishOutcome::Completed {
            interview,
            gamification,
        }) => Ok(warp::reply::with_status(
            warp::reply::json(&FinishResponse {
                interview,
                gamification: Some(gamification),
                message: None,
            }),
            StatusCode::OK,
        )),
        Err(e) => Ok(session_error_reply(e)),
    }
}

pub async fn handle_speech_to_text(
    auth_header: Option<String>,
    id: String,
    mut form: FormData,
    auth_service: Arc<AuthService>,
    user_repository: Arc<UserRepository>,
    session_service: Arc<SessionService>,
    oracle: Arc<dyn QuestionOracle>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let user = match authenticate(auth_header, &auth_service, &user_repository).await {
        Ok(user) => user,
        Err(reply) => return Ok(reply),
    };

    let Ok(interview_id) = Uuid::parse_str(&id) else {
        return Ok(message_reply("Interview not found", StatusCode::NOT_FOUND));
    };

    // Ownership gate before touching the upload
    if let Err(e) = session_service.fetch(&user, interview_id).await {
        return Ok(session_error_reply(e));
    }

    let mut audio: Option<(String, Vec<u8>)> = None;
    loop {
        let part = match form.try_next().await {
            Ok(Some(part)) => part,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Malformed multipart upload: {}", e);
                return Ok(message_reply(
                    "Valid audio file is required",
                    StatusCode::BAD_REQUEST,
                ));
            }
        };

        if part.name() != "audio" || part.filename().is_none() {
            continue;
        }

        let file_name = part
            .filename()
            .map(str::to_string)
            .unwrap_or_else(|| "audio".to_string());

        let mut data = Vec::new();
        let mut stream = part.stream();
        loop {
            match stream.try_next().await {
                Ok(Some(mut buf)) => {
                    while buf.remaining() > 0 {
                        let chunk = buf.chunk();
                        data.extend_from_slice(chunk);
                        let len = chunk.len();
                        buf.advance(len);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("Failed to read audio upload: {}", e);
                    return Ok(message_reply(
                        "Valid audio file is required",
                        StatusCode::BAD_REQUEST,
                    ));
                }
            }
        }

        audio = Some((file_name, data));
        break;
    }

    let Some((file_name, data)) = audio else {
        return Ok(message_reply(
            "Valid audio file is required",
            StatusCode::BAD_REQUEST,
        ));
    };

    if data.len() > MAX_AUDIO_BYTES {
        return Ok(message_reply(
            "Audio file is too large. Please upload a file under 20MB.",
            StatusCode::BAD_REQUEST,
        ));
    }

    match oracle.transcribe_audio(&file_name, data).await {
        Ok(text) => Ok(warp::reply::with_status(
            warp::reply::json(&TranscriptionResponse { text }),
            StatusCode::OK,
        )),
        Err(e) => {
            tracing::error!("Transcription error: {}", e);
            Ok(message_reply(
                "Failed to transcribe audio",
                StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}
