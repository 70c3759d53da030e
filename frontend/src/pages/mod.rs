//! One module per list-backed admin page. Each wraps a
//! [`ResourceListController`](crate::controller::ResourceListController) and
//! adds the page's form validation.

use serde::Serialize;

use crate::error::ApiError;

pub mod exam_categories;
pub mod groups;
pub mod questions;
pub mod students;

pub use exam_categories::ExamCategoriesPage;
pub use groups::GroupsPage;
pub use questions::QuestionsPage;
pub use students::{StudentForm, StudentRequest, StudentsPage};

/// `{ "name": ... }` body shared by the simple named collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameInput {
    /// Trimmed, never blank.
    pub name: String,
}

impl NameInput {
    /// Trims `name`, rejecting a blank one.
    pub fn new(name: &str) -> Result<Self, ApiError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::Validation("name is required".to_string()));
        }
        Ok(Self {
            name: name.to_string(),
        })
    }
}
