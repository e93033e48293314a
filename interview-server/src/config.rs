use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub nim_api_key: String,
    pub nim_base_url: String,
    pub nim_model: String,
    pub nim_stt_model: String,
    pub nim_stt_language: Option<String>,
    pub resend_api_key: Option<String>,
    pub resend_from_email: Option<String>,
    /// Absent means Google sign-in is disabled.
    pub google_client_id: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("Invalid PORT"),
            jwt_secret: env::var("JWT_SECRET")
                .expect("JWT_SECRET environment variable is required"),
            nim_api_key: env::var("NIM_API_KEY")
                .or_else(|_| env::var("NVIDIA_NIM_API_KEY"))
                .expect("NIM_API_KEY environment variable is required"),
            nim_base_url: env::var("NIM_BASE_URL")
                .unwrap_or_else(|_| "https://integrate.api.nvidia.com/v1".to_string()),
            nim_model: env::var("NIM_MODEL")
                .unwrap_or_else(|_| "meta/llama-3.1-70b-instruct".to_string()),
            nim_stt_model: env::var("NIM_STT_MODEL")
                .unwrap_or_else(|_| "openai/whisper-large-v3".to_string()),
            nim_stt_language: env::var("NIM_STT_LANGUAGE").ok(),
            resend_api_key: env::var("RESEND_API_KEY").ok(),
            resend_from_email: env::var("RESEND_FROM_EMAIL").ok(),
            google_client_id: env::var("GOOGLE_CLIENT_ID").ok(),
        }
    }
}
