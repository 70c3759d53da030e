//! Wire models shared by the eduflow front-end core and CLI.

use serde::{Deserialize, Serialize};

pub mod access;
pub mod phone;

pub use access::{check_access, current_role, AccessDecision, Role, Section};

/// Server-assigned numeric identifier of any entity.
pub type EntityId = i64;

/// 学生 / 教师 共用的用户模型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Server id.
    pub id: EntityId,
    /// Given name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Family name.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Normalized `+998XXXXXXXXX` number.
    #[serde(default)]
    pub phone_number: Option<String>,
    /// Study group the student belongs to.
    #[serde(default)]
    pub group_id: Option<EntityId>,
    /// URL of the profile image.
    #[serde(default)]
    pub image: Option<String>,
}

impl User {
    /// "First Last", skipping whichever part is missing.
    pub fn full_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A study group students are assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Server id.
    pub id: EntityId,
    /// Display name, e.g. `N-12`.
    pub name: String,
}

/// Category exams and tests are filed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamCategory {
    /// Server id.
    pub id: EntityId,
    /// Display name.
    pub name: String,
}

/// One answer option of a [`TestQuestion`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// Server id.
    pub id: EntityId,
    /// Answer text.
    pub content: String,
    /// Whether this is the correct option.
    #[serde(rename = "isCorrect", default)]
    pub is_correct: bool,
}

/// One multiple-choice question of the tests bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestQuestion {
    /// Server id.
    pub id: EntityId,
    /// Question text.
    pub question: String,
    /// Exam category, when filed under one.
    #[serde(default)]
    pub category_id: Option<EntityId>,
    /// Two to four answer options.
    #[serde(default)]
    pub answers: Vec<Answer>,
}

/// Paging metadata returned next to a list page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    /// Number of pages at the requested page size.
    pub page_count: u64,
    /// Number of items matching the request across all pages.
    pub item_count: u64,
}

/// `{ data: [...], meta: { pageCount, itemCount } }`. Unpaginated collections
/// omit `meta`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResponse<T> {
    /// Entities on this page.
    pub data: Vec<T>,
    /// Paging metadata; absent for unpaginated collections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
}

impl<T> ListResponse<T> {
    /// Total item count from the metadata; `None` when the server sent none.
    pub fn total_items(&self) -> Option<u64> {
        self.meta.map(|meta| meta.item_count)
    }

    /// Total item count, falling back to the page length when the server
    /// sent no metadata.
    pub fn item_count(&self) -> u64 {
        self.total_items().unwrap_or(self.data.len() as u64)
    }
}

impl<T> Default for ListResponse<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            meta: None,
        }
    }
}

/// Error body the API sends with non-2xx responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error code or human-readable message.
    pub error: String,
}

/// Error code the API uses for an expired bearer credential.
pub const JWT_EXPIRED: &str = "JWT_EXPIRED";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_response_reads_camel_case_meta() {
        let raw = r#"{"data":[{"id":1,"name":"Ona tili"}],"meta":{"pageCount":1,"itemCount":1}}"#;
        let parsed: ListResponse<ExamCategory> = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.data[0].name, "Ona tili");
        assert_eq!(parsed.item_count(), 1);
    }

    #[test]
    fn list_response_without_meta_counts_page() {
        let raw = r#"{"data":[{"id":1,"name":"A"},{"id":2,"name":"B"}]}"#;
        let parsed: ListResponse<Group> = serde_json::from_str(raw).unwrap();
        assert!(parsed.meta.is_none());
        assert_eq!(parsed.total_items(), None);
        assert_eq!(parsed.item_count(), 2);
    }

    #[test]
    fn full_name_skips_missing_parts() {
        let user = User {
            id: 7,
            first_name: Some("Ali".to_string()),
            last_name: None,
            phone_number: None,
            group_id: None,
            image: None,
        };
        assert_eq!(user.full_name(), "Ali");
    }

    #[test]
    fn answer_uses_is_correct_wire_name() {
        let raw = r#"{"id":3,"content":"4","isCorrect":true}"#;
        let answer: Answer = serde_json::from_str(raw).unwrap();
        assert!(answer.is_correct);
    }
}
