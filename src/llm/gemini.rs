// src/llm/gemini.rs

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::deadline::Deadline;
use crate::llm::{Candidate, TextGenerator};

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize, Default)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, base_url: Option<String>) -> Result<Self, String> {
        let client = Client::builder()
            .user_agent("autotestgen")
            .build()
            .map_err(|e| e.to_string())?;

        Ok(Self {
            client,
            api_key,
            model,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.into())
                .trim_end_matches('/')
                .to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

impl TextGenerator for GeminiClient {
    fn generate(
        &self,
        prompt: &str,
        temperature: f32,
        deadline: &Deadline,
    ) -> Result<Vec<Candidate>, String> {
        let timeout = deadline
            .remaining()
            .ok_or("deadline exceeded before generation request")?;

        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig { temperature },
        };

        let url = self.endpoint();
        debug!(%url, temperature, prompt_bytes = prompt.len(), "calling Gemini");

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .timeout(timeout)
            .json(&body)
            .send()
            .map_err(|e| e.to_string())?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            return Err(format!("Gemini error {}: {}", status, text.trim()));
        }

        let parsed: GenerateResponse = resp.json().map_err(|e| e.to_string())?;
        Ok(into_candidates(parsed))
    }
}

fn into_candidates(resp: GenerateResponse) -> Vec<Candidate> {
    resp.candidates
        .into_iter()
        .map(|c| {
            c.content
                .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
                .unwrap_or_default()
        })
        .collect()
}
