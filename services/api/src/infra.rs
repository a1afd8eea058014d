use chrono::Utc;
use deal_intake::config::IntakeConfig;
use deal_intake::error::AppError;
use deal_intake::workflows::intake::{
    AnswerMap, DocumentStore, FileReference, IntakeSchema, PersistenceError, ProfileStore,
    RespondentId, StoredDocument, UploadError, UploadRequest,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) documents: Arc<InMemoryDocumentStore>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryProfileStore {
    records: Arc<Mutex<HashMap<RespondentId, AnswerMap>>>,
}

impl ProfileStore for InMemoryProfileStore {
    fn load_answers(&self, respondent: &RespondentId) -> Result<AnswerMap, PersistenceError> {
        let guard = self
            .records
            .lock()
            .map_err(|_| PersistenceError::Unavailable("profile mutex poisoned".to_string()))?;
        Ok(guard.get(respondent).cloned().unwrap_or_default())
    }

    fn save_answers(
        &self,
        respondent: &RespondentId,
        answers: &AnswerMap,
    ) -> Result<(), PersistenceError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|_| PersistenceError::Unavailable("profile mutex poisoned".to_string()))?;
        guard.insert(respondent.clone(), answers.clone());
        Ok(())
    }

    fn respondents(&self) -> Result<Vec<RespondentId>, PersistenceError> {
        let guard = self
            .records
            .lock()
            .map_err(|_| PersistenceError::Unavailable("profile mutex poisoned".to_string()))?;
        Ok(guard.keys().cloned().collect())
    }
}

/// Uploaded bytes plus the metadata served back to admins.
#[derive(Debug, Clone)]
pub(crate) struct DocumentBlob {
    pub(crate) metadata: StoredDocument,
    pub(crate) bytes: Vec<u8>,
}

#[derive(Default)]
pub(crate) struct InMemoryDocumentStore {
    documents: Mutex<HashMap<String, DocumentBlob>>,
    next_id: AtomicU64,
}

impl InMemoryDocumentStore {
    pub(crate) fn fetch(&self, id: &str) -> Option<DocumentBlob> {
        self.documents.lock().ok()?.get(id).cloned()
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn upload(&self, request: UploadRequest) -> Result<FileReference, UploadError> {
        let UploadRequest {
            respondent,
            question_id,
            filename,
            content_type,
            bytes,
        } = request;

        let content_type = if content_type == mime::APPLICATION_OCTET_STREAM {
            mime_guess::from_path(&filename).first_or_octet_stream()
        } else {
            content_type
        };

        let id = format!("doc-{:06}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let reference = FileReference {
            id: id.clone(),
            filename,
        };
        let metadata = StoredDocument {
            reference: reference.clone(),
            respondent,
            content_type: content_type.essence_str().to_string(),
            size: bytes.len(),
            uploaded_at: Utc::now(),
        };

        let mut guard = self
            .documents
            .lock()
            .map_err(|_| UploadError::Transport("document mutex poisoned".to_string()))?;
        guard.insert(id, DocumentBlob { metadata, bytes });
        info!(question = %question_id, document = %reference.id, "document stored");
        Ok(reference)
    }
}

/// Schema from `INTAKE_SCHEMA_PATH` (or an explicit override), else the bundled questionnaire.
pub(crate) fn load_schema(
    config: &IntakeConfig,
    override_path: Option<&Path>,
) -> Result<IntakeSchema, AppError> {
    let schema = match override_path.or(config.schema_path.as_deref()) {
        Some(path) => IntakeSchema::from_path(path)?,
        None => IntakeSchema::standard()?,
    };
    Ok(schema)
}

/// Read a stored answer map (flat JSON object keyed by question id).
pub(crate) fn load_answers_file(path: &Path) -> Result<AnswerMap, AppError> {
    let file = File::open(path)?;
    let answers = serde_json::from_reader(BufReader::new(file))?;
    Ok(answers)
}
