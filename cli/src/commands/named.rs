//! Collections whose entities are just a name: groups and exam categories.

use anyhow::Result;
use eduflow_frontend::{pages::NameInput, CollectionApi};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use super::{explain, list_query, print_json};
use crate::cli::NamedCommands;

/// Runs a groups or exam categories action.
pub async fn run<A>(api: &A, page_size: u64, action: NamedCommands) -> Result<()>
where
    A: CollectionApi<Create = NameInput, Update = NameInput>,
    A::Item: Serialize,
{
    match action {
        NamedCommands::List(args) => {
            let list = api.list(list_query(&args, page_size)).await.map_err(explain)?;
            print_json(&list)
        },
        NamedCommands::Create {
            name,
        } => {
            let created = api
                .create(NameInput::new(&name).map_err(explain)?)
                .await
                .map_err(explain)?;
            info!(resource = api.resource(), "created");
            print_json(&created)
        },
        NamedCommands::Update {
            id,
            name,
        } => {
            let updated = api
                .update(id, NameInput::new(&name).map_err(explain)?)
                .await
                .map_err(explain)?;
            print_json(&updated)
        },
        NamedCommands::Delete {
            id,
        } => {
            api.remove(id).await.map_err(explain)?;
            info!(resource = api.resource(), id, "deleted");
            print_json(&json!({ "deleted": id }))
        },
    }
}
