use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::workflows::intake::domain::{
    AnswerMap, AnswerValue, Conditional, FileReference, InputKind, LogicRule, Phase, PhaseId,
    Question, QuestionId, QuestionOption, RespondentId, RuleAction,
};
use crate::workflows::intake::schema::IntakeSchema;
use crate::workflows::intake::store::{
    DocumentStore, PersistenceError, ProfileStore, UploadError, UploadRequest,
};
use crate::workflows::intake::{intake_router, IntakeService};

pub(super) const PARTNER_REVIEW: &str = "Attorney Flag: Partner dispute";
pub(super) const LIENS_FLAG: &str = "Attorney Flag: Outstanding Liens";
pub(super) const LITIGATION_FLAG: &str = "Attorney Flag: Litigation";

pub(super) fn question(id: &str, kind: InputKind) -> Question {
    Question {
        id: QuestionId::new(id),
        label: id.replace('_', " "),
        kind,
        options: Vec::new(),
        required: false,
        placeholder: None,
        conditional: None,
        logic: Vec::new(),
    }
}

pub(super) fn required(mut question: Question) -> Question {
    question.required = true;
    question
}

pub(super) fn shown_when(mut question: Question, depends_on: &str, value: AnswerValue) -> Question {
    question.conditional = Some(Conditional {
        depends_on: QuestionId::new(depends_on),
        value,
    });
    question
}

pub(super) fn with_options(mut question: Question, options: &[&str]) -> Question {
    question.options = options
        .iter()
        .map(|option| QuestionOption::Bare(option.to_string()))
        .collect();
    question
}

pub(super) fn flag_when(mut question: Question, trigger: AnswerValue, message: &str) -> Question {
    question.logic.push(LogicRule {
        trigger,
        action: RuleAction::FlagEscalation,
        target_questions: Vec::new(),
        target_phase: None,
        message: Some(message.to_string()),
    });
    question
}

pub(super) fn jump_when(mut question: Question, trigger: AnswerValue, target: &str) -> Question {
    question.logic.push(LogicRule {
        trigger,
        action: RuleAction::JumpToPhase,
        target_questions: Vec::new(),
        target_phase: Some(PhaseId::new(target)),
        message: None,
    });
    question
}

pub(super) fn phase(id: &str, title: &str, questions: Vec<Question>) -> Phase {
    Phase {
        id: PhaseId::new(id),
        title: title.to_string(),
        description: format!("{title} details"),
        questions,
    }
}

/// Four phases: basics (conditional + escalation), assets (jump + two escalations),
/// financials (optional number), property (select + file upload).
pub(super) fn sample_phases() -> Vec<Phase> {
    vec![
        phase(
            "basics",
            "Seller Basics",
            vec![
                required(question("owner_name", InputKind::ShortText)),
                required(flag_when(
                    question("owners_agree", InputKind::YesNo),
                    AnswerValue::Bool(false),
                    PARTNER_REVIEW,
                )),
                required(question("has_partner", InputKind::YesNo)),
                required(shown_when(
                    question("partner_name", InputKind::ShortText),
                    "has_partner",
                    AnswerValue::Bool(true),
                )),
            ],
        ),
        phase(
            "assets",
            "Assets",
            vec![
                jump_when(
                    with_options(
                        question("asset_types", InputKind::MultiSelect),
                        &["Equipment", "Inventory", "Real Estate"],
                    ),
                    AnswerValue::text("Real Estate"),
                    "property",
                ),
                flag_when(
                    question("liens", InputKind::YesNo),
                    AnswerValue::Bool(true),
                    LIENS_FLAG,
                ),
                flag_when(
                    question("disputes", InputKind::YesNo),
                    AnswerValue::Bool(true),
                    LITIGATION_FLAG,
                ),
            ],
        ),
        phase(
            "financials",
            "Financials",
            vec![
                question("annual_revenue", InputKind::Number),
                question("notes", InputKind::LongText),
            ],
        ),
        phase(
            "property",
            "Property",
            vec![
                with_options(
                    question("lease_or_own", InputKind::SingleSelect),
                    &["Lease", "Own"],
                ),
                question("title_deed", InputKind::File),
            ],
        ),
    ]
}

pub(super) fn sample_schema() -> Arc<IntakeSchema> {
    Arc::new(IntakeSchema::new(sample_phases()).expect("sample schema is valid"))
}

pub(super) fn respondent() -> RespondentId {
    RespondentId::new("seller-42")
}

/// Answers that satisfy every required question of the basics phase.
pub(super) fn basics_answers() -> AnswerMap {
    AnswerMap::from([
        ("owner_name", AnswerValue::text("Dana Reyes")),
        ("owners_agree", AnswerValue::Bool(true)),
        ("has_partner", AnswerValue::Bool(false)),
    ])
}

pub(super) fn file_reference(id: &str, filename: &str) -> FileReference {
    FileReference {
        id: id.to_string(),
        filename: filename.to_string(),
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryProfiles {
    pub(super) records: Arc<Mutex<HashMap<RespondentId, AnswerMap>>>,
    saves: Arc<Mutex<usize>>,
}

impl MemoryProfiles {
    pub(super) fn seeded(respondent: &RespondentId, answers: AnswerMap) -> Self {
        let profiles = Self::default();
        profiles
            .records
            .lock()
            .expect("profile mutex poisoned")
            .insert(respondent.clone(), answers);
        profiles
    }

    pub(super) fn stored(&self, respondent: &RespondentId) -> Option<AnswerMap> {
        self.records
            .lock()
            .expect("profile mutex poisoned")
            .get(respondent)
            .cloned()
    }

    pub(super) fn save_count(&self) -> usize {
        *self.saves.lock().expect("profile mutex poisoned")
    }
}

impl ProfileStore for MemoryProfiles {
    fn load_answers(&self, respondent: &RespondentId) -> Result<AnswerMap, PersistenceError> {
        Ok(self.stored(respondent).unwrap_or_default())
    }

    fn save_answers(
        &self,
        respondent: &RespondentId,
        answers: &AnswerMap,
    ) -> Result<(), PersistenceError> {
        self.records
            .lock()
            .expect("profile mutex poisoned")
            .insert(respondent.clone(), answers.clone());
        *self.saves.lock().expect("profile mutex poisoned") += 1;
        Ok(())
    }

    fn respondents(&self) -> Result<Vec<RespondentId>, PersistenceError> {
        Ok(self
            .records
            .lock()
            .expect("profile mutex poisoned")
            .keys()
            .cloned()
            .collect())
    }
}

/// Stored answers whose first `failing_loads` reads fail.
pub(super) struct FlakyProfiles {
    pub(super) inner: MemoryProfiles,
    failing_loads: Mutex<usize>,
}

impl FlakyProfiles {
    pub(super) fn new(inner: MemoryProfiles, failing_loads: usize) -> Self {
        Self {
            inner,
            failing_loads: Mutex::new(failing_loads),
        }
    }
}

impl ProfileStore for FlakyProfiles {
    fn load_answers(&self, respondent: &RespondentId) -> Result<AnswerMap, PersistenceError> {
        let mut remaining = self.failing_loads.lock().expect("profile mutex poisoned");
        if *remaining > 0 {
            *remaining -= 1;
            return Err(PersistenceError::Unavailable("read timed out".to_string()));
        }
        drop(remaining);
        self.inner.load_answers(respondent)
    }

    fn save_answers(
        &self,
        respondent: &RespondentId,
        answers: &AnswerMap,
    ) -> Result<(), PersistenceError> {
        self.inner.save_answers(respondent, answers)
    }

    fn respondents(&self) -> Result<Vec<RespondentId>, PersistenceError> {
        self.inner.respondents()
    }
}

/// Reads succeed with no stored answers; every write fails.
pub(super) struct ReadOnlyProfiles;

impl ProfileStore for ReadOnlyProfiles {
    fn load_answers(&self, _respondent: &RespondentId) -> Result<AnswerMap, PersistenceError> {
        Ok(AnswerMap::new())
    }

    fn save_answers(
        &self,
        _respondent: &RespondentId,
        _answers: &AnswerMap,
    ) -> Result<(), PersistenceError> {
        Err(PersistenceError::Unavailable("profile backend read-only".to_string()))
    }

    fn respondents(&self) -> Result<Vec<RespondentId>, PersistenceError> {
        Ok(Vec::new())
    }
}

pub(super) struct UnavailableProfiles;

impl ProfileStore for UnavailableProfiles {
    fn load_answers(&self, _respondent: &RespondentId) -> Result<AnswerMap, PersistenceError> {
        Err(PersistenceError::Unavailable("profile backend offline".to_string()))
    }

    fn save_answers(
        &self,
        _respondent: &RespondentId,
        _answers: &AnswerMap,
    ) -> Result<(), PersistenceError> {
        Err(PersistenceError::Unavailable("profile backend offline".to_string()))
    }

    fn respondents(&self) -> Result<Vec<RespondentId>, PersistenceError> {
        Err(PersistenceError::Unavailable("profile backend offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryDocuments {
    uploads: Arc<Mutex<Vec<UploadRequest>>>,
}

impl MemoryDocuments {
    pub(super) fn uploads(&self) -> Vec<UploadRequest> {
        self.uploads.lock().expect("document mutex poisoned").clone()
    }
}

impl DocumentStore for MemoryDocuments {
    fn upload(&self, request: UploadRequest) -> Result<FileReference, UploadError> {
        let mut guard = self.uploads.lock().expect("document mutex poisoned");
        let reference = file_reference(&format!("doc-{}", guard.len() + 1), &request.filename);
        guard.push(request);
        Ok(reference)
    }
}

pub(super) struct UnavailableDocuments;

impl DocumentStore for UnavailableDocuments {
    fn upload(&self, _request: UploadRequest) -> Result<FileReference, UploadError> {
        Err(UploadError::Transport("storage bucket unreachable".to_string()))
    }
}

pub(super) fn build_service() -> (
    IntakeService<MemoryProfiles, MemoryDocuments>,
    Arc<MemoryProfiles>,
    Arc<MemoryDocuments>,
) {
    let profiles = Arc::new(MemoryProfiles::default());
    let documents = Arc::new(MemoryDocuments::default());
    let service = IntakeService::new(sample_schema(), profiles.clone(), documents.clone());
    (service, profiles, documents)
}

pub(super) fn intake_router_with_service<P, D>(service: IntakeService<P, D>) -> axum::Router
where
    P: ProfileStore + 'static,
    D: DocumentStore + 'static,
{
    intake_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
