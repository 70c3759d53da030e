//! Test question commands.

use std::path::Path;

use anyhow::{Context, Result};
use eduflow_frontend::{pages::questions::QuestionInput, CollectionApi};
use eduflow_shared::TestQuestion;
use serde_json::json;

use super::{explain, list_query, print_json};
use crate::cli::QuestionCommands;

/// Reads and validates a question from a JSON file.
pub fn load_question(path: &Path) -> Result<QuestionInput> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let input: QuestionInput = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a question document", path.display()))?;
    input.validated().map_err(explain)
}

/// Runs a question action against `api`.
pub async fn run<A>(api: &A, page_size: u64, action: QuestionCommands) -> Result<()>
where
    A: CollectionApi<Item = TestQuestion, Create = QuestionInput, Update = QuestionInput>,
{
    match action {
        QuestionCommands::List(args) => {
            let list = api.list(list_query(&args, page_size)).await.map_err(explain)?;
            print_json(&list)
        },
        QuestionCommands::Create {
            file,
        } => {
            let created = api.create(load_question(&file)?).await.map_err(explain)?;
            print_json(&created)
        },
        QuestionCommands::Update {
            id,
            file,
        } => {
            let updated = api.update(id, load_question(&file)?).await.map_err(explain)?;
            print_json(&updated)
        },
        QuestionCommands::Delete {
            id,
        } => {
            api.remove(id).await.map_err(explain)?;
            print_json(&json!({ "deleted": id }))
        },
    }
}
