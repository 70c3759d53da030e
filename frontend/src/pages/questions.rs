//! Test questions with their answer options.

use std::sync::Arc;

use eduflow_shared::{EntityId, Section, TestQuestion};
use serde::{Deserialize, Serialize};

use crate::{
    api::{ApiClient, CollectionApi, RestCollection, TESTS_PATH},
    context::AppContext,
    controller::{ControllerOptions, ResourceListController},
    error::ApiError,
};

/// Location of the page.
pub const TESTS_ROUTE: &str = "/tests";

const MIN_ANSWERS: usize = 2;
const MAX_ANSWERS: usize = 4;

/// One answer option as sent to the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerInput {
    /// Answer text.
    pub content: String,
    /// Whether this is the correct option.
    #[serde(rename = "isCorrect")]
    pub is_correct: bool,
}

/// Body of a question create or update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionInput {
    /// Question text.
    pub question: String,
    /// Exam category to file the question under.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<EntityId>,
    /// Two to four options, exactly one correct.
    pub answers: Vec<AnswerInput>,
}

impl QuestionInput {
    /// Trims every text and checks the shape: a question, 2 to 4 answers
    /// with text, exactly one of them correct.
    pub fn validated(mut self) -> Result<Self, ApiError> {
        self.question = self.question.trim().to_string();
        if self.question.is_empty() {
            return Err(ApiError::Validation("question text is required".to_string()));
        }
        if !(MIN_ANSWERS..=MAX_ANSWERS).contains(&self.answers.len()) {
            return Err(ApiError::Validation(format!(
                "a question needs {MIN_ANSWERS} to {MAX_ANSWERS} answers, got {}",
                self.answers.len()
            )));
        }
        for answer in &mut self.answers {
            answer.content = answer.content.trim().to_string();
            if answer.content.is_empty() {
                return Err(ApiError::Validation("answer text is required".to_string()));
            }
        }
        let correct = self.answers.iter().filter(|answer| answer.is_correct).count();
        if correct != 1 {
            return Err(ApiError::Validation(format!(
                "exactly one answer must be correct, got {correct}"
            )));
        }
        Ok(self)
    }
}

/// REST collection behind the page.
pub type QuestionsApi = RestCollection<TestQuestion, QuestionInput, QuestionInput>;

/// Authenticated tests collection.
pub fn questions_api(client: ApiClient) -> QuestionsApi {
    RestCollection::new(client, TESTS_PATH)
}

/// Test question bank, searched on the server.
pub struct QuestionsPage<A>
where
    A: CollectionApi<Item = TestQuestion, Create = QuestionInput, Update = QuestionInput>,
{
    list: ResourceListController<A>,
}

impl<A> QuestionsPage<A>
where
    A: CollectionApi<Item = TestQuestion, Create = QuestionInput, Update = QuestionInput>,
{
    /// Page over `api`.
    pub fn new(ctx: AppContext, api: Arc<A>) -> Self {
        let options = ControllerOptions::new(TESTS_PATH, TESTS_ROUTE, &ctx).section(Section::Tests);
        Self {
            list: ResourceListController::new(ctx, api, options),
        }
    }

    /// The underlying list controller.
    pub fn list(&self) -> &ResourceListController<A> {
        &self.list
    }

    /// Gates on admin or teacher and loads the first page.
    pub async fn mount(&self) -> Result<(), ApiError> {
        self.list.mount().await
    }

    /// Validates and creates a question.
    pub async fn create(&self, input: QuestionInput) -> Result<TestQuestion, ApiError> {
        self.list.submit_create(input.validated()?).await
    }

    /// Validates and replaces question `id`.
    pub async fn update(&self, id: EntityId, input: QuestionInput) -> Result<TestQuestion, ApiError> {
        let input = input.validated()?;
        self.list.open_edit(id);
        self.list.submit_update(input).await
    }
}
