use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Outcome of scoring one answer. `fallback()` is the neutral payload used
/// when the model responds with something unparseable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub score: f64,
    pub feedback: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub improvement: String,
}

impl Evaluation {
    pub fn fallback() -> Self {
        Self {
            score: 5.0,
            feedback: "Your answer was recorded, but AI evaluation is temporarily unavailable. \
                       Retry in a moment for detailed feedback."
                .to_string(),
            strengths: vec!["Response submitted".to_string()],
            weaknesses: vec!["Could not run automated analysis".to_string()],
            improvement: "Review your answer structure and retry for AI-generated feedback."
                .to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("oracle request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("oracle returned status {0}: {1}")]
    Api(u16, String),
    #[error("oracle returned unparseable output")]
    BadPayload,
    #[error("empty transcription received")]
    EmptyTranscription,
}

/// The external language-model service: question generation, answer
/// scoring, and speech transcription.
#[async_trait]
pub trait QuestionOracle: Send + Sync {
    async fn generate_questions(
        &self,
        role: &str,
        experience_level: &str,
        count: u32,
    ) -> Result<Vec<String>, OracleError>;

    async fn evaluate_answer(
        &self,
        question_text: &str,
        user_answer: &str,
    ) -> Result<Evaluation, OracleError>;

    async fn transcribe_audio(
        &self,
        file_name: &str,
        audio: Vec<u8>,
    ) -> Result<String, OracleError>;
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    temperature: f64,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct TranscriptionPayload {
    text: Option<String>,
}

/// OpenAI-compatible client for NVIDIA NIM endpoints.
pub struct NimOracle {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    stt_model: String,
    stt_language: Option<String>,
}

impl NimOracle {
    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        stt_model: String,
        stt_language: Option<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
            model,
            stt_model,
            stt_language,
        }
    }

    async fn chat_completion(
        &self,
        system: &str,
        prompt: &str,
        temperature: f64,
    ) -> Result<String, OracleError> {
        let request = ChatRequest {
            model: self.model.clone(),
            temperature,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let detail = response.text().await.unwrap_or_default();
            return Err(OracleError::Api(status, detail));
        }

        let payload: ChatResponse = response.json().await?;
        let content = payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .map(|message| message.content)
            .unwrap_or_default();

        Ok(strip_code_fences(&content))
    }
}

/// Models habitually wrap JSON in markdown fences despite instructions.
fn strip_code_fences(content: &str) -> String {
    content.replace("```json", "").replace("```", "").trim().to_string()
}

fn parse_question_texts(completion: &str) -> Option<Vec<String>> {
    let parsed: serde_json::Value = serde_json::from_str(completion).ok()?;
    let items = match parsed {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut map) => match map.remove("questions") {
            Some(serde_json::Value::Array(items)) => items,
            _ => return None,
        },
        _ => return None,
    };

    let texts: Vec<String> = items
        .into_iter()
        .filter_map(|item| {
            item.get("questionText")
                .and_then(|text| text.as_str())
                .map(str::to_string)
        })
        .collect();

    if texts.is_empty() { None } else { Some(texts) }
}

fn parse_evaluation(completion: &str) -> Evaluation {
    let fallback = Evaluation::fallback();
    let Ok(parsed) = serde_json::from_str::<serde_json::Value>(completion) else {
        tracing::error!("Failed to parse evaluation output: {}", completion);
        return fallback;
    };

    let score = parsed
        .get("score")
        .and_then(|v| v.as_f64())
        .map(|s| s.clamp(0.0, 10.0))
        .unwrap_or(fallback.score);
    let feedback = parsed
        .get("feedback")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .unwrap_or(fallback.feedback);
    let strengths = parsed
        .get("strengths")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or(fallback.strengths);
    let weaknesses = parsed
        .get("weaknesses")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or(fallback.weaknesses);
    let improvement = parsed
        .get("improvement")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .unwrap_or(fallback.improvement);

    Evaluation {
        score,
        feedback,
        strengths,
        weaknesses,
        improvement,
    }
}

#[async_trait]
impl QuestionOracle for NimOracle {
    async fn generate_questions(
        &self,
        role: &str,
        experience_level: &str,
        count: u32,
    ) -> Result<Vec<String>, OracleError> {
        let prompt = format!(
            "Generate {count} backend/frontend/fullstack interview questions for a {role} role \
             with {experience_level} of experience. \
             Include a mix of technical, scenario-based, and behavioral questions. \
             Return ONLY a valid JSON array of objects. Each object should have 'questionText' \
             (string) and 'difficulty' (string: Easy, Medium, Hard). Do not wrap in markdown or \
             anything else."
        );

        let completion = self
            .chat_completion("You are an expert technical interviewer.", &prompt, 0.7)
            .await?;

        parse_question_texts(&completion).ok_or_else(|| {
            tracing::error!("Failed to parse question output: {}", completion);
            OracleError::BadPayload
        })
    }

    async fn evaluate_answer(
        &self,
        question_text: &str,
        user_answer: &str,
    ) -> Result<Evaluation, OracleError> {
        let prompt = format!(
            "You are an expert technical interviewer. Evaluate the candidate's answer to the \
             following question.\n\
             Question: \"{question_text}\"\n\
             Answer: \"{user_answer}\"\n\n\
             Provide a detailed evaluation in the following strict JSON format without any \
             markdown wrapper:\n\
             {{\n\
               \"score\": <number from 0 to 10>,\n\
               \"feedback\": \"<general feedback string>\",\n\
               \"strengths\": [\"<strength 1>\", \"<strength 2>\"],\n\
               \"weaknesses\": [\"<weakness 1>\", \"<weakness 2>\"],\n\
               \"improvement\": \"<specific action to improve>\"\n\
             }}"
        );

        let completion = self
            .chat_completion(
                "You are an expert technical interviewer providing feedback.",
                &prompt,
                0.2,
            )
            .await?;

        // Unparseable output degrades to the neutral payload; transport and
        // API failures stay errors for the caller to surface.
        Ok(parse_evaluation(&completion))
    }

    async fn transcribe_audio(
        &self,
        file_name: &str,
        audio: Vec<u8>,
    ) -> Result<String, OracleError> {
        let file_part = reqwest::multipart::Part::bytes(audio).file_name(file_name.to_string());
        let mut form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("model", self.stt_model.clone());
        if let Some(language) = &self.stt_language {
            form = form.text("language", language.clone());
        }

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let detail = response.text().await.unwrap_or_default();
            return Err(OracleError::Api(status, detail));
        }

        let payload: TranscriptionPayload = response.json().await?;
        let text = payload.text.map(|t| t.trim().to_string()).unwrap_or_default();
        if text.is_empty() {
            return Err(OracleError::EmptyTranscription);
        }

        Ok(text)
    }
}
