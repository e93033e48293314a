
use std::sync::Arc;

use test_helpers::{
    RecordingMailer, create_test_app, create_test_app_with, finish_interview, register_user,
    start_interview, submit_answer,
};

fn timed_request(count: u32) -> serde_json::Value {
    serde_json::json!({
        "role": "Backend",
        "experienceLevel": "Fresher",
        "questionCount": count,
    })
}

fn untimed_request() -> serde_json::Value {
    serde_json::json!({
        "role": "Backend",
        "experienceLevel": "Fresher",
        "questionCount": 3,
        "interviewMode": "untimed",
    })
}

#[tokio::test]
async fn test_start_clamps_count_and_computes_budget() {
    let app = create_test_app().await;
    let (token, _) = register_user(&app, "start@example.com").await;

    // A request for 8 questions is clamped to 7
    let interview = start_interview(&app, &token, timed_request(8)).await;
    assert_eq!(interview["questions"].as_array().unwrap().len(), 7);
    assert_eq!(interview["status"], "in-progress");
    assert_eq!(interview["interviewMode"], "timed");
    // Fresher base 150, 7 questions -> -20
    assert_eq!(interview["perQuestionTimeSeconds"], 130);
    assert_eq!(interview["score"], 0.0);

    // Every question starts unanswered with zeroed evaluation fields
    for question in interview["questions"].as_array().unwrap() {
        assert_eq!(question["userAnswer"], "");
        assert_eq!(question["score"], 0.0);
        assert_eq!(question["feedback"], "");
    }

    // A request for 1 question is clamped to 3, short sessions gain 15s
    let small = start_interview(&app, &token, timed_request(1)).await;
    assert_eq!(small["questions"].as_array().unwrap().len(), 3);
    assert_eq!(small["perQuestionTimeSeconds"], 165);

    // Untimed sessions carry no countdown budget
    let untimed = start_interview(&app, &token, untimed_request()).await;
    assert_eq!(untimed["perQuestionTimeSeconds"], 0);
}

#[tokio::test]
async fn test_untimed_answer_is_scored_immediately() {
    let app = create_test_app().await;
    let (token, _) = register_user(&app, "untimed@example.com").await;

    let interview = start_interview(&app, &token, untimed_request()).await;
    let interview_id = interview["id"].as_str().unwrap();
    let question_id = interview["questions"][0]["id"].as_str().unwrap();

    let (status, question) =
        submit_answer(&app, &token, interview_id, question_id, "A fine answer").await;
    assert_eq!(status, 200);
    assert_eq!(question["score"], 8.0);
    assert_eq!(question["feedback"], "Stub feedback");
    assert_eq!(question["userAnswer"], "A fine answer");
}

#[tokio::test]
async fn test_timed_answer_defers_scoring_until_finish() {
    let app = create_test_app().await;
    let (token, _) = register_user(&app, "timed@example.com").await;

    let interview = start_interview(&app, &token, timed_request(3)).await;
    let interview_id = interview["id"].as_str().unwrap();
    let question_id = interview["questions"][0]["id"].as_str().unwrap();

    let (status, question) =
        submit_answer(&app, &token, interview_id, question_id, "A fine answer").await;
    assert_eq!(status, 200);
    // The answer is stored but evaluation fields stay at their defaults
    assert_eq!(question["userAnswer"], "A fine answer");
    assert_eq!(question["score"], 0.0);
    assert_eq!(question["feedback"], "");
    assert_eq!(question["strengths"].as_array().unwrap().len(), 0);

    // Still unscored on a fresh read
    let response = warp::test::request()
        .method("GET")
        .path(&format!("/interviews/{interview_id}"))
        .header("authorization", format!("Bearer {token}"))
        .reply(&app)
        .await;
    let stored: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(stored["questions"][0]["score"], 0.0);

    // Finish runs the deferred evaluation
    let (status, body) = finish_interview(&app, &token, interview_id, "", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["interview"]["questions"][0]["score"], 8.0);
    assert_eq!(body["interview"]["status"], "completed");
}

#[tokio::test]
async fn test_finish_aggregates_score_and_applies_gamification() {
    let app = create_test_app().await;
    let (token, registered) = register_user(&app, "finish@example.com").await;
    assert_eq!(registered["xp"], 0);

    let interview = start_interview(&app, &token, timed_request(3)).await;
    let interview_id = interview["id"].as_str().unwrap();
    let q0 = interview["questions"][0]["id"].as_str().unwrap();
    let q1 = interview["questions"][1]["id"].as_str().unwrap();

    // Stub scores: 8.0 and 6.0 -> average 7.0 over two answered questions
    submit_answer(&app, &token, interview_id, q0, "A fine answer").await;
    submit_answer(&app, &token, interview_id, q1, "about six things").await;

    let (status, body) = finish_interview(&app, &token, interview_id, "", None).await;
    assert_eq!(status, 200);

    let finished = &body["interview"];
    assert_eq!(finished["status"], "completed");
    assert_eq!(finished["endedReason"], "manual");
    assert!((finished["score"].as_f64().unwrap() - 7.0).abs() < 1e-9);
    assert!(finished["completedAt"].as_str().is_some());
    // The third, unanswered question stays at zero
    assert_eq!(finished["questions"][2]["score"], 0.0);

    // xp gain = round(7.0 * 10) + 2 * 5 = 80
    let gamification = &body["gamification"];
    assert_eq!(gamification["xpGain"], 80);
    assert_eq!(gamification["xp"], 80);
    assert_eq!(gamification["level"], 1);
    assert_eq!(gamification["streakCount"], 1);
    assert_eq!(gamification["longestStreak"], 1);
    assert!(gamification["badges"]
        .as_array()
        .unwrap()
        .iter()
        .any(|b| b == "First Steps"));

    // Level invariant holds on the stored profile
    let profile = warp::test::request()
        .method("GET")
        .path("/users/profile")
        .header("authorization", format!("Bearer {token}"))
        .reply(&app)
        .await;
    let user: serde_json::Value = serde_json::from_slice(profile.body()).unwrap();
    let xp = user["xp"].as_i64().unwrap();
    let level = user["level"].as_i64().unwrap();
    assert_eq!(level, xp / 100 + 1);
    assert!(user["longestStreak"].as_i64().unwrap() >= user["streakCount"].as_i64().unwrap());
}

#[tokio::test]
async fn test_finish_with_no_answers_scores_zero() {
    let app = create_test_app().await;
    let (token, _) = register_user(&app, "empty@example.com").await;

    let interview = start_interview(&app, &token, timed_request(3)).await;
    let interview_id = interview["id"].as_str().unwrap();

    let (status, body) = finish_interview(&app, &token, interview_id, "", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["interview"]["score"], 0.0);
    // The XP floor still applies to an empty session
    assert_eq!(body["gamification"]["xpGain"], 10);
}

#[tokio::test]
async fn test_finish_is_idempotent_and_emails_once() {
    let mailer = Arc::new(RecordingMailer::default());
    let app = create_test_app_with(mailer.clone()).await;
    let (token, _) = register_user(&app, "idem@example.com").await;

    let interview = start_interview(&app, &token, timed_request(3)).await;
    let interview_id = interview["id"].as_str().unwrap();
    let q0 = interview["questions"][0]["id"].as_str().unwrap();
    submit_answer(&app, &token, interview_id, q0, "A fine answer").await;

    let (status, first) = finish_interview(&app, &token, interview_id, "", None).await;
    assert_eq!(status, 200);
    assert!(first["gamification"].is_object());
    let first_xp = first["gamification"]["xp"].as_i64().unwrap();

    // Repeat finish: same stored record, no second round of side effects
    let (status, second) = finish_interview(&app, &token, interview_id, "", None).await;
    assert_eq!(status, 200);
    assert_eq!(second["message"], "Interview already completed");
    assert!(second["gamification"].is_null());
    assert_eq!(second["interview"]["status"], "completed");
    assert_eq!(
        second["interview"]["score"].as_f64().unwrap(),
        first["interview"]["score"].as_f64().unwrap()
    );

    assert_eq!(mailer.sent_count(), 1);

    // XP untouched by the repeat call
    let profile = warp::test::request()
        .method("GET")
        .path("/users/profile")
        .header("authorization", format!("Bearer {token}"))
        .reply(&app)
        .await;
    let user: serde_json::Value = serde_json::from_slice(profile.body()).unwrap();
    assert_eq!(user["xp"].as_i64().unwrap(), first_xp);
}

#[tokio::test]
async fn test_answer_rejected_after_completion() {
    let app = create_test_app().await;
    let (token, _) = register_user(&app, "late@example.com").await;

    let interview = start_interview(&app, &token, timed_request(3)).await;
    let interview_id = interview["id"].as_str().unwrap();
    let q0 = interview["questions"][0]["id"].as_str().unwrap();

    finish_interview(&app, &token, interview_id, "", None).await;

    let (status, body) =
        submit_answer(&app, &token, interview_id, q0, "too late to count").await;
    assert_eq!(status, 400);
    assert_eq!(body["message"], "Interview already completed");

    // Stored record is unchanged
    let response = warp::test::request()
        .method("GET")
        .path(&format!("/interviews/{interview_id}"))
        .header("authorization", format!("Bearer {token}"))
        .reply(&app)
        .await;
    let stored: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(stored["questions"][0]["userAnswer"], "");
}

#[tokio::test]
async fn test_listing_sweeps_abandoned_sessions() {
    let app = create_test_app().await;
    let (token, _) = register_user(&app, "sweep@example.com").await;

    let interview = start_interview(&app, &token, timed_request(3)).await;
    let interview_id = interview["id"].as_str().unwrap();
    assert_eq!(interview["status"], "in-progress");

    // The list request force-completes the stale session before responding
    let response = warp::test::request()
        .method("GET")
        .path("/interviews")
        .header("authorization", format!("Bearer {token}"))
        .reply(&app)
        .await;
    assert_eq!(response.status(), 200);
    let listed: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"].as_str().unwrap(), interview_id);
    assert_eq!(listed[0]["status"], "completed");
    assert_eq!(listed[0]["endedReason"], "abandoned");
    assert!(listed[0]["completedAt"].as_str().is_some());
}

#[tokio::test]
async fn test_list_filters_and_clamps_limit() {
    let app = create_test_app().await;
    let (token, _) = register_user(&app, "filter@example.com").await;

    let interview = start_interview(&app, &token, timed_request(3)).await;
    let interview_id = interview["id"].as_str().unwrap();

    // Unknown status values match nothing
    let response = warp::test::request()
        .method("GET")
        .path("/interviews?status=bogus")
        .header("authorization", format!("Bearer {token}"))
        .reply(&app)
        .await;
    assert_eq!(response.status(), 200);
    let listed: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 0);

    // The sweep ran regardless of the unmatchable filter
    let response = warp::test::request()
        .method("GET")
        .path(&format!("/interviews/{interview_id}"))
        .header("authorization", format!("Bearer {token}"))
        .reply(&app)
        .await;
    let stored: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(stored["status"], "completed");
    assert_eq!(stored["endedReason"], "abandoned");

    // An out-of-range limit is tolerated
    let response = warp::test::request()
        .method("GET")
        .path("/interviews?limit=1000")
        .header("authorization", format!("Bearer {token}"))
        .reply(&app)
        .await;
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_interviews_are_owner_scoped() {
    let app = create_test_app().await;
    let (owner_token, _) = register_user(&app, "owner@example.com").await;
    let (intruder_token, _) = register_user(&app, "intruder@example.com").await;

    let interview = start_interview(&app, &owner_token, timed_request(3)).await;
    let interview_id = interview["id"].as_str().unwrap();
    let q0 = interview["questions"][0]["id"].as_str().unwrap();

    let response = warp::test::request()
        .method("GET")
        .path(&format!("/interviews/{interview_id}"))
        .header("authorization", format!("Bearer {intruder_token}"))
        .reply(&app)
        .await;
    assert_eq!(response.status(), 401);

    let (status, _) =
        submit_answer(&app, &intruder_token, interview_id, q0, "not my interview").await;
    assert_eq!(status, 401);

    let (status, _) = finish_interview(&app, &intruder_token, interview_id, "", None).await;
    assert_eq!(status, 401);

    // Unknown ids are distinct from ownership failures
    let response = warp::test::request()
        .method("GET")
        .path("/interviews/00000000-0000-0000-0000-000000000000")
        .header("authorization", format!("Bearer {owner_token}"))
        .reply(&app)
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_finish_reason_sources_and_fallback() {
    let app = create_test_app().await;
    let (token, _) = register_user(&app, "reasons@example.com").await;

    // Query-string reason wins
    let interview = start_interview(&app, &token, timed_request(3)).await;
    let id = interview["id"].as_str().unwrap();
    let (_, body) = finish_interview(&app, &token, id, "endedReason=timeout", None).await;
    assert_eq!(body["interview"]["endedReason"], "timeout");

    // Body reason is honored when the query is absent
    let interview = start_interview(&app, &token, timed_request(3)).await;
    let id = interview["id"].as_str().unwrap();
    let (_, body) = finish_interview(
        &app,
        &token,
        id,
        "",
        Some(serde_json::json!({"endedReason": "abandoned"})),
    )
    .await;
    assert_eq!(body["interview"]["endedReason"], "abandoned");

    // Unrecognized reasons fall back to manual
    let interview = start_interview(&app, &token, timed_request(3)).await;
    let id = interview["id"].as_str().unwrap();
    let (_, body) = finish_interview(
        &app,
        &token,
        id,
        "",
        Some(serde_json::json!({"endedReason": "rage-quit"})),
    )
    .await;
    assert_eq!(body["interview"]["endedReason"], "manual");
}

#[tokio::test]
async fn test_speech_to_text_round_trip() {
    let app = create_test_app().await;
    let (token, _) = register_user(&app, "speech@example.com").await;

    let interview = start_interview(&app, &token, timed_request(3)).await;
    let interview_id = interview["id"].as_str().unwrap();

    let boundary = "----interview-pilot-test";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"audio\"; filename=\"clip.webm\"\r\n\
         Content-Type: audio/webm\r\n\r\n\
         fake-audio-bytes\r\n\
         --{boundary}--\r\n"
    );

    let response = warp::test::request()
        .method("POST")
        .path(&format!("/interviews/{interview_id}/speech-to-text"))
        .header("authorization", format!("Bearer {token}"))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(body)
        .reply(&app)
        .await;

    assert_eq!(response.status(), 200);
    let parsed: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(parsed["text"], "transcribed speech");

    // A multipart body without an audio file part is rejected
    let empty_body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"notes\"\r\n\r\n\
         just text\r\n\
         --{boundary}--\r\n"
    );
    let response = warp::test::request()
        .method("POST")
        .path(&format!("/interviews/{interview_id}/speech-to-text"))
        .header("authorization", format!("Bearer {token}"))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(empty_body)
        .reply(&app)
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_dashboard_summary_reflects_completions() {
    let app = create_test_app().await;
    let (token, _) = register_user(&app, "dash@example.com").await;

    let interview = start_interview(&app, &token, timed_request(3)).await;
    let interview_id = interview["id"].as_str().unwrap();
    let q0 = interview["questions"][0]["id"].as_str().unwrap();
    submit_answer(&app, &token, interview_id, q0, "A fine answer").await;
    finish_interview(&app, &token, interview_id, "", None).await;

    let response = warp::test::request()
        .method("GET")
        .path("/dashboard/summary")
        .header("authorization", format!("Bearer {token}"))
        .reply(&app)
        .await;
    assert_eq!(response.status(), 200);

    let summary: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(summary["stats"]["totalInterviews"], 1);
    assert_eq!(summary["stats"]["averageScore"], 8.0);
    assert_eq!(summary["stats"]["strongestRole"], "Backend");
    assert_eq!(summary["recentInterviews"].as_array().unwrap().len(), 1);
    assert_eq!(summary["levelProgress"]["xpForNext"], 100);
    // avg 8.0 with one answer -> 80 + 5 = 85 xp at level 1
    assert_eq!(summary["user"]["xp"], 85);
    assert_eq!(summary["levelProgress"]["currentLevelXp"], 85);
    assert_eq!(summary["levelProgress"]["progressPercent"], 85);
}
