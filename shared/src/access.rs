//! Role model and the per-section access policy.

use serde::{Deserialize, Serialize};

/// Role of a signed-in user. Variants are ordered from most to least privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access.
    Admin,
    /// Manages students and tests.
    Teacher,
    /// Takes exams and practice.
    Student,
}

impl Role {
    /// Lowercase wire name, also used as the `role` field of user payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }
}

/// Most privileged role in `roles` (admin > teacher > student).
pub fn current_role(roles: &[Role]) -> Option<Role> {
    roles.iter().copied().min()
}

/// Areas of the application gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// Student management.
    Students,
    /// Teacher management.
    Teachers,
    /// Study groups.
    Groups,
    /// Exams.
    Exams,
    /// Exam categories.
    ExamCategories,
    /// Test question bank.
    Tests,
    /// Study materials.
    Materials,
    /// Practice tests.
    Practice,
}

impl Section {
    /// Roles allowed to open the section.
    pub fn viewers(self) -> &'static [Role] {
        match self {
            Section::Students | Section::Teachers | Section::Groups | Section::ExamCategories => {
                &[Role::Admin]
            },
            Section::Exams => &[Role::Admin, Role::Teacher, Role::Student],
            Section::Tests => &[Role::Admin, Role::Teacher],
            Section::Materials | Section::Practice => &[Role::Student],
        }
    }

    /// Roles that see the create/edit/delete affordances.
    pub fn managers(self) -> &'static [Role] {
        match self {
            Section::Students => &[Role::Admin, Role::Teacher],
            Section::Materials | Section::Practice => &[],
            _ => &[Role::Admin],
        }
    }

    /// Whether `role` may open the section.
    pub fn can_view(self, role: Role) -> bool {
        self.viewers().contains(&role)
    }

    /// Whether `role` may create, edit and delete here.
    pub fn can_manage(self, role: Role) -> bool {
        self.managers().contains(&role)
    }
}

/// Outcome of [`check_access`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// The role may view the section.
    Granted(Role),
    /// No role at all: the caller must sign in first.
    SignInRequired,
    /// The role is signed in but may not view the section.
    Forbidden(Role),
}

/// Decides whether a user holding `roles` may view `section`.
pub fn check_access(roles: &[Role], section: Section) -> AccessDecision {
    match current_role(roles) {
        None => AccessDecision::SignInRequired,
        Some(role) if section.can_view(role) => AccessDecision::Granted(role),
        Some(role) => AccessDecision::Forbidden(role),
    }
}
