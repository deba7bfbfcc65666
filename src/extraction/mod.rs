pub mod dto;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::ExtractorConfig;
use crate::error::AppError;
use crate::models::ExtractedSchedule;

const VALIDATION_PROMPT: &str = "Determine whether this image contains a valid schedule for a student. \
The image is still acceptable even if it's not cropped exactly to the schedule. Images may contain extraneous \
information, but as long as the schedule is visible, it's acceptable. The schedule should look like a table with \
rows and two columns. If it is not present, mark the image as invalid. Otherwise, mark the image as valid. \
Respond with a JSON object {\"isValid\": boolean, \"confidence\": number between 0 and 1, \"issues\": [string]}.";

const EXTRACTION_PROMPT: &str = "This image contains a schedule for a student. Extract the schedule into a JSON \
object with keys firstPeriod, secondPeriod, thirdPeriod, fourthPeriod and advisory. Each period is \
{\"redDay\": course or null, \"blueDay\": course or null} where a course is {\"courseCode\": string, \
\"courseName\": string, \"teacherName\": string, \"roomNumber\": string (optional)}. Advisory is \
{\"teacherName\": string, \"roomNumber\": string (optional)}. If a period has no class scheduled (free period), \
set that day to null. For example, if red day period 1 has no class, set redDay to null for that period.";

/// An uploaded schedule photo.
#[derive(Debug, Clone)]
pub struct ImageInput {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageInput {
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub issues: Vec<String>,
}

/// The vision model that reads schedule photos.
#[async_trait]
pub trait ScheduleExtractor: Send + Sync {
    async fn validate(&self, image: &ImageInput) -> Result<ValidationReport, AppError>;
    async fn extract(&self, image: &ImageInput) -> Result<ExtractedSchedule, AppError>;
}

/// Talks to an OpenAI-compatible chat completions endpoint.
pub struct OpenAiExtractor {
    client: Client,
    config: ExtractorConfig,
}

impl OpenAiExtractor {
    pub fn new(config: ExtractorConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client, config })
    }

    async fn complete_json<T: DeserializeOwned>(
        &self,
        model: &str,
        prompt: &str,
        image: &ImageInput,
    ) -> Result<T, AppError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Extraction("OPENAI_API_KEY is not set".to_string()))?;

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let request_body = dto::ChatCompletionRequest {
            model,
            messages: vec![dto::ChatMessage {
                role: "user",
                content: vec![
                    dto::ContentPart::Text { text: prompt },
                    dto::ContentPart::ImageUrl {
                        image_url: dto::ImageUrl { url: image.data_url() },
                    },
                ],
            }],
            response_format: dto::ResponseFormat::json_object(),
        };

        debug!("requesting completion from {} ({} byte image)", model, image.bytes.len());
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| AppError::Extraction(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Extraction(format!("failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(AppError::Extraction(format!("model API error {}: {}", status, body)));
        }

        parse_completion(&body)
    }
}

/// Decodes the first choice's message content of a chat completion as `T`.
pub fn parse_completion<T: DeserializeOwned>(body: &str) -> Result<T, AppError> {
    let response: dto::ChatCompletionResponse = serde_json::from_str(body).map_err(|e| {
        error!("Failed to parse completion: {}", e);
        AppError::Extraction(format!("Failed to parse completion: {}", e))
    })?;

    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| AppError::Extraction("completion has no content".to_string()))?;

    serde_json::from_str(&content)
        .map_err(|e| AppError::Extraction(format!("model returned malformed JSON: {}", e)))
}

#[async_trait]
impl ScheduleExtractor for OpenAiExtractor {
    async fn validate(&self, image: &ImageInput) -> Result<ValidationReport, AppError> {
        self.complete_json(&self.config.validation_model, VALIDATION_PROMPT, image)
            .await
    }

    async fn extract(&self, image: &ImageInput) -> Result<ExtractedSchedule, AppError> {
        self.complete_json(&self.config.extraction_model, EXTRACTION_PROMPT, image)
            .await
    }
}
