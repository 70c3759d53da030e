//! Exam categories: a short, unpaginated collection filtered in memory.

use std::sync::Arc;

use eduflow_shared::{EntityId, ExamCategory, Section};

use super::NameInput;
use crate::{
    api::{ApiClient, CollectionApi, RestCollection, EXAM_CATEGORIES_PATH},
    context::AppContext,
    controller::{ControllerOptions, ResourceListController},
    error::ApiError,
};

/// Location of the page.
pub const EXAM_CATEGORIES_ROUTE: &str = "/exams/categories";

/// REST collection behind the page.
pub type ExamCategoriesApi = RestCollection<ExamCategory, NameInput, NameInput>;

/// Listing is public; writes carry the bearer token.
pub fn exam_categories_api(client: ApiClient) -> ExamCategoriesApi {
    RestCollection::new(client, EXAM_CATEGORIES_PATH).with_public_reads()
}

/// Exam categories, filtered and paged in memory; admins only.
pub struct ExamCategoriesPage<A>
where
    A: CollectionApi<Item = ExamCategory, Create = NameInput, Update = NameInput>,
{
    list: ResourceListController<A>,
}

impl<A> ExamCategoriesPage<A>
where
    A: CollectionApi<Item = ExamCategory, Create = NameInput, Update = NameInput>,
{
    /// Page over `api`.
    pub fn new(ctx: AppContext, api: Arc<A>) -> Self {
        let options = ControllerOptions::new(EXAM_CATEGORIES_PATH, EXAM_CATEGORIES_ROUTE, &ctx)
            .section(Section::ExamCategories)
            .local_filter();
        Self {
            list: ResourceListController::new(ctx, api, options),
        }
    }

    /// The underlying list controller.
    pub fn list(&self) -> &ResourceListController<A> {
        &self.list
    }

    /// Gates on the admin role and loads the collection.
    pub async fn mount(&self) -> Result<(), ApiError> {
        self.list.mount().await
    }

    /// Creates a category from a trimmed, non-blank name.
    pub async fn create(&self, name: &str) -> Result<ExamCategory, ApiError> {
        self.list.submit_create(NameInput::new(name)?).await
    }

    /// Renames category `id`.
    pub async fn rename(&self, id: EntityId, name: &str) -> Result<ExamCategory, ApiError> {
        let input = NameInput::new(name)?;
        self.list.open_edit(id);
        self.list.submit_update(input).await
    }
}
