use std::sync::Arc;

use futures::Stream;
use serde::Serialize;
use tracing::{info, warn};

use crate::extraction::{ImageInput, ScheduleExtractor, ValidationReport};
use crate::models::ExtractedSchedule;
use crate::services::schedule_service::ScheduleService;

pub const INVALID_IMAGE_MESSAGE: &str = "Image does not contain a valid schedule";

/// One line of the upload progress stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ProgressEvent {
    #[serde(rename = "initial-validation")]
    InitialValidation {
        data: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<ValidationReport>,
    },
    #[serde(rename = "data-extraction")]
    DataExtraction {
        data: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<ExtractedSchedule>,
    },
    #[serde(rename = "database")]
    Database {
        data: &'static str,
        #[serde(rename = "scheduleId", skip_serializing_if = "Option::is_none")]
        schedule_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    #[serde(rename = "error")]
    Error { data: String },
}

impl ProgressEvent {
    fn database(data: &'static str) -> Self {
        ProgressEvent::Database {
            data,
            schedule_id: None,
            error: None,
        }
    }

    /// Serialized as one newline-terminated JSON line.
    pub fn to_ndjson(&self) -> String {
        match serde_json::to_string(self) {
            Ok(line) => line + "\n",
            Err(e) => {
                warn!("failed to serialize progress event: {}", e);
                "{\"type\":\"error\",\"data\":\"Unknown error\"}\n".to_string()
            }
        }
    }
}

/// Validation, extraction and persistence of one uploaded photo.
#[derive(Clone)]
pub struct UploadPipeline {
    extractor: Arc<dyn ScheduleExtractor>,
    schedules: Arc<ScheduleService>,
    skip_database: bool,
}

impl UploadPipeline {
    pub fn new(extractor: Arc<dyn ScheduleExtractor>, schedules: Arc<ScheduleService>, skip_database: bool) -> Self {
        Self {
            extractor,
            schedules,
            skip_database,
        }
    }

    /// Every failure ends the stream with an error event; nothing is retried.
    pub fn run(self, user_id: String, image: ImageInput) -> impl Stream<Item = ProgressEvent> + Send + 'static {
        async_stream::stream! {
            yield ProgressEvent::InitialValidation { data: "started", result: None };

            let report = match self.extractor.validate(&image).await {
                Ok(report) => report,
                Err(e) => {
                    warn!("validation failed for user {}: {}", user_id, e);
                    yield ProgressEvent::Error { data: e.to_string() };
                    return;
                }
            };
            let is_valid = report.is_valid;
            yield ProgressEvent::InitialValidation { data: "complete", result: Some(report) };

            if !is_valid {
                info!("rejected upload from user {}: not a schedule", user_id);
                yield ProgressEvent::Error { data: INVALID_IMAGE_MESSAGE.to_string() };
                return;
            }

            yield ProgressEvent::DataExtraction { data: "started", result: None };
            let extracted = match self.extractor.extract(&image).await {
                Ok(extracted) => extracted,
                Err(e) => {
                    warn!("extraction failed for user {}: {}", user_id, e);
                    yield ProgressEvent::Error { data: e.to_string() };
                    return;
                }
            };
            yield ProgressEvent::DataExtraction { data: "complete", result: Some(extracted.clone()) };

            if self.skip_database {
                yield ProgressEvent::database("skipped");
                return;
            }

            yield ProgressEvent::database("saving");
            match self.schedules.save_schedule(&user_id, &extracted).await {
                Ok(schedule) => {
                    yield ProgressEvent::Database { data: "complete", schedule_id: Some(schedule.id), error: None };
                }
                Err(e) => {
                    warn!("saving schedule for user {} failed: {}", user_id, e);
                    yield ProgressEvent::Database { data: "error", schedule_id: None, error: Some(e.to_string()) };
                }
            }
        }
    }
}
