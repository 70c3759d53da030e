//! Command-line surface.

use std::{path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand, ValueEnum};
use eduflow_frontend::{ClientConfig, Session};
use eduflow_runtime::LoggingOptions;
use eduflow_shared::{EntityId, Role};

/// Top-level arguments.
#[derive(Parser, Debug)]
#[command(name = "eduflow-cli", version, about = "eduflow admin API client")]
pub struct Cli {
    /// REST API base URL.
    #[arg(long, env = "EDUFLOW_API_BASE")]
    pub api_base: Option<String>,
    /// Media service base URL.
    #[arg(long, env = "EDUFLOW_MEDIA_BASE")]
    pub media_base: Option<String>,
    /// Bearer access token of a signed-in user.
    #[arg(long, env = "EDUFLOW_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
    /// Role the token was issued for.
    #[arg(long, value_enum, default_value_t = RoleArg::Admin)]
    pub role: RoleArg,
    /// Request timeout in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,
    /// Also write logs to a daily file in this directory.
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
    /// What to do.
    #[command(subcommand)]
    pub command: Commands,
}

/// `--role` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    /// Full access.
    Admin,
    /// Question bank only.
    Teacher,
    /// No admin pages.
    Student,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Admin => Role::Admin,
            RoleArg::Teacher => Role::Teacher,
            RoleArg::Student => Role::Student,
        }
    }
}

impl Cli {
    /// Environment defaults with the command-line overrides applied.
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::from_env();
        if let Some(api_base) = &self.api_base {
            config.api_base = api_base.clone();
        }
        if let Some(media_base) = &self.media_base {
            config.media_base = media_base.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }
        config
    }

    /// Signed-in session for `--token`, anonymous otherwise.
    pub fn session(&self) -> Session {
        match self.token.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            Some(token) => Session {
                id: -1,
                roles: vec![self.role.into()],
                is_authenticated: true,
                access_token: token.to_string(),
                refresh_token: String::new(),
                name: None,
                phone_number: None,
            },
            None => Session::anonymous(),
        }
    }

    /// Console logging, plus a daily file under `--log-dir` when given.
    pub fn logging_options(&self) -> LoggingOptions {
        LoggingOptions {
            filter: None,
            log_dir: self.log_dir.clone(),
            file_prefix: Some("eduflow-cli.log".to_string()),
        }
    }
}

/// Resource to act on.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage students.
    Students {
        /// Action to run.
        #[command(subcommand)]
        action: StudentCommands,
    },
    /// Manage study groups.
    Groups {
        /// Action to run.
        #[command(subcommand)]
        action: NamedCommands,
    },
    /// Manage exam categories.
    ExamCategories {
        /// Action to run.
        #[command(subcommand)]
        action: NamedCommands,
    },
    /// Manage test questions.
    Tests {
        /// Action to run.
        #[command(subcommand)]
        action: QuestionCommands,
    },
    /// Upload or delete profile images.
    Media {
        /// Action to run.
        #[command(subcommand)]
        action: MediaCommands,
    },
}

/// Paging and search shared by every `list`.
#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// 1-based page; omit to fetch the whole collection.
    #[arg(long)]
    pub page: Option<u64>,
    /// Page size (defaults to the configured page size).
    #[arg(long)]
    pub limit: Option<u64>,
    /// Search text; whitespace is removed before sending.
    #[arg(long)]
    pub search: Option<String>,
}

/// Actions on groups and exam categories.
#[derive(Subcommand, Debug)]
pub enum NamedCommands {
    /// List entries.
    List(ListArgs),
    /// Create an entry.
    Create {
        /// Entry name.
        #[arg(long)]
        name: String,
    },
    /// Rename an entry.
    Update {
        /// Entry id.
        id: EntityId,
        /// New name.
        #[arg(long)]
        name: String,
    },
    /// Delete an entry.
    Delete {
        /// Id to delete.
        id: EntityId,
    },
}

/// Student fields; omitted ones are left unchanged on update.
#[derive(Args, Debug, Clone, Default)]
pub struct StudentArgs {
    /// Given name.
    #[arg(long)]
    pub first_name: Option<String>,
    /// Family name.
    #[arg(long)]
    pub last_name: Option<String>,
    /// Masked (`+(998) 90 123-45-67`) or plain digits.
    #[arg(long)]
    pub phone: Option<String>,
    /// New password.
    #[arg(long)]
    pub password: Option<String>,
    /// Study group.
    #[arg(long)]
    pub group_id: Option<EntityId>,
    /// Local image uploaded and attached as the profile picture.
    #[arg(long)]
    pub image: Option<PathBuf>,
}

/// Actions on students.
#[derive(Subcommand, Debug)]
pub enum StudentCommands {
    /// List students.
    List(ListArgs),
    /// Create a student; the phone number is required.
    Create(StudentArgs),
    /// Change the given fields of a student.
    Update {
        /// Student id.
        id: EntityId,
        /// Fields to change.
        #[command(flatten)]
        fields: StudentArgs,
    },
    /// Delete a student.
    Delete {
        /// Id to delete.
        id: EntityId,
    },
}

/// Actions on test questions.
#[derive(Subcommand, Debug)]
pub enum QuestionCommands {
    /// List test questions.
    List(ListArgs),
    /// Create a question from a JSON file
    /// (`{"question", "category_id", "answers": [{"content", "isCorrect"}]}`).
    Create {
        /// JSON file with the question.
        #[arg(long)]
        file: PathBuf,
    },
    /// Replace a question from a JSON file.
    Update {
        /// Question id.
        id: EntityId,
        /// JSON file with the question.
        #[arg(long)]
        file: PathBuf,
    },
    /// Delete a question.
    Delete {
        /// Id to delete.
        id: EntityId,
    },
}

/// Actions on the media service.
#[derive(Subcommand, Debug)]
pub enum MediaCommands {
    /// Upload an image file.
    Upload {
        /// Image to upload.
        file: PathBuf,
    },
    /// Delete an uploaded object by its storage key.
    Delete {
        /// Storage key returned by the upload.
        key: String,
    },
}
