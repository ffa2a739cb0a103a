//! Review pipeline: a PDF resume goes in, a scored `Feedback` record comes out.
//!
//! Every step goes through the platform facades, so a missing gateway or a failed
//! call is recorded in the shared store before it surfaces here as `ReviewError::Gateway`.

pub mod feedback;
pub mod handlers;
pub mod prompts;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::facades::Platform;
use crate::gateway::{Blob, ImageSource, KvListing};
use crate::store::StoreError;

pub use feedback::Feedback;
pub use prompts::prepare_instructions;

/// Largest resume accepted, in bytes.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

const RECORD_PREFIX: &str = "resume:";

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("{0}")]
    InvalidUpload(String),

    #[error("No text could be extracted from the resume")]
    EmptyResumeText,

    #[error("Malformed feedback: {0}")]
    MalformedFeedback(String),

    #[error(transparent)]
    Gateway(#[from] StoreError),

    #[error("Stored record {key} could not be decoded")]
    CorruptRecord {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// One analyzed (or in-progress) resume, persisted as JSON under `resume:{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRecord {
    pub id: Uuid,
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
    pub resume_path: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub feedback: Option<Feedback>,
}

#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
    pub file: Blob,
}

pub fn record_key(id: Uuid) -> String {
    format!("{RECORD_PREFIX}{id}")
}

pub fn validate_upload(file: &Blob) -> Result<(), ReviewError> {
    if file.is_empty() {
        return Err(ReviewError::InvalidUpload("Resume file is empty".to_string()));
    }
    if !file.has_pdf_magic() {
        return Err(ReviewError::InvalidUpload(
            "Resume must be a PDF document".to_string(),
        ));
    }
    if file.len() > MAX_UPLOAD_BYTES {
        return Err(ReviewError::InvalidUpload(format!(
            "Resume exceeds the {} MB limit",
            MAX_UPLOAD_BYTES / (1024 * 1024)
        )));
    }
    Ok(())
}

fn decode(key: &str, value: &str) -> Result<ResumeRecord, ReviewError> {
    serde_json::from_str(value).map_err(|source| ReviewError::CorruptRecord {
        key: key.to_string(),
        source,
    })
}

fn encode(record: &ResumeRecord) -> Result<String, ReviewError> {
    serde_json::to_string(record).map_err(|source| ReviewError::CorruptRecord {
        key: record_key(record.id),
        source,
    })
}

#[derive(Clone)]
pub struct ReviewPipeline {
    platform: Platform,
}

impl ReviewPipeline {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    /// Stores the resume, extracts its text and asks for feedback against the role.
    /// The record is persisted before the feedback call so a failed review still
    /// leaves the upload discoverable.
    pub async fn analyze(&self, upload: ResumeUpload) -> Result<ResumeRecord, ReviewError> {
        validate_upload(&upload.file)?;

        let id = Uuid::new_v4();
        let file = if upload.file.name.is_some() {
            upload.file
        } else {
            upload.file.with_name(format!("{id}.pdf"))
        };

        let stored = self.platform.fs.upload(vec![file.clone()]).await?;
        info!("Resume {id} stored at {}", stored.path);

        let text = match self.platform.ai.img2txt(ImageSource::Blob(file), false).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                self.discard(&stored.path).await;
                return Err(ReviewError::EmptyResumeText);
            }
            Err(e) => {
                self.discard(&stored.path).await;
                return Err(e.into());
            }
        };

        let mut record = ResumeRecord {
            id,
            company_name: upload.company_name,
            job_title: upload.job_title,
            job_description: upload.job_description,
            resume_path: stored.path,
            created_at: Utc::now(),
            feedback: None,
        };
        let key = record_key(id);
        self.platform.kv.set(&key, &encode(&record)?).await?;

        let instructions = prepare_instructions(&record.job_title, &record.job_description);
        let reply = self.platform.ai.feedback(&text, &instructions).await?;
        let feedback = Feedback::parse(reply.content()).map_err(ReviewError::MalformedFeedback)?;

        info!(
            "Resume {id} reviewed: overall score {}",
            feedback.overall_score
        );
        record.feedback = Some(feedback);
        self.platform.kv.set(&key, &encode(&record)?).await?;
        Ok(record)
    }

    /// Removes an upload that never got a record pointing at it.
    async fn discard(&self, path: &str) {
        if let Err(e) = self.platform.fs.delete(path).await {
            warn!("Failed to remove orphaned upload {path}: {e}");
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<ResumeRecord>, ReviewError> {
        let key = record_key(id);
        match self.platform.kv.get(&key).await? {
            Some(value) => decode(&key, &value).map(Some),
            None => Ok(None),
        }
    }

    /// All stored records, newest first. Records that fail to decode are skipped.
    pub async fn list(&self) -> Result<Vec<ResumeRecord>, ReviewError> {
        let pattern = format!("{RECORD_PREFIX}*");
        let items = match self.platform.kv.list(&pattern, Some(true)).await? {
            KvListing::Items(items) => items
                .into_iter()
                .map(|item| (item.key, item.value))
                .collect::<Vec<_>>(),
            KvListing::Keys(keys) => {
                let mut items = Vec::with_capacity(keys.len());
                for key in keys {
                    if let Some(value) = self.platform.kv.get(&key).await? {
                        items.push((key, value));
                    }
                }
                items
            }
        };

        let mut records: Vec<ResumeRecord> = items
            .iter()
            .filter_map(|(key, value)| match decode(key, value) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Skipping {key}: {e}");
                    None
                }
            })
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    /// Removes the record and its stored file. Returns false when no record exists.
    pub async fn delete(&self, id: Uuid) -> Result<bool, ReviewError> {
        let Some(record) = self.get(id).await? else {
            return Ok(false);
        };
        self.platform.fs.delete(&record.resume_path).await?;
        let removed = self.platform.kv.delete(&record_key(id)).await?;
        info!("Resume {id} deleted");
        Ok(removed)
    }
}
