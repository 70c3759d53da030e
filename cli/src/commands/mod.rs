//! Subcommand handlers.

pub mod media;
pub mod named;
pub mod questions;
pub mod students;

use anyhow::{anyhow, Context, Result};
use eduflow_frontend::{
    pages::{exam_categories::exam_categories_api, groups::groups_api, questions::questions_api},
    ApiClient, ApiError, ListQuery, MediaClient, SessionStore,
};
use serde::Serialize;
use tracing::debug;

use crate::cli::{Cli, Commands, ListArgs};

/// Builds the client from `cli` and dispatches its command.
pub async fn run(cli: Cli) -> Result<()> {
    let config = cli.client_config();
    let page_size = config.page_size;
    debug!(api_base = %config.api_base, media_base = %config.media_base, "client configured");
    let session = SessionStore::with_session(cli.session());
    let client = ApiClient::new(config, session).context("failed to build HTTP client")?;

    match cli.command {
        Commands::Students {
            action,
        } => students::run(&client, page_size, action).await,
        Commands::Groups {
            action,
        } => named::run(&groups_api(client), page_size, action).await,
        Commands::ExamCategories {
            action,
        } => named::run(&exam_categories_api(client), page_size, action).await,
        Commands::Tests {
            action,
        } => questions::run(&questions_api(client), page_size, action).await,
        Commands::Media {
            action,
        } => media::run(&MediaClient::new(client), action).await,
    }
}

/// A page request when `--page` is given, the whole collection otherwise.
pub fn list_query(args: &ListArgs, page_size: u64) -> ListQuery {
    let query = match args.page {
        Some(page) => ListQuery::page(page.max(1), args.limit.unwrap_or(page_size).max(1)),
        None => ListQuery {
            limit: args.limit,
            ..ListQuery::default()
        },
    };
    query.with_search(args.search.as_deref().unwrap_or_default())
}

/// Adds a hint for the errors a fresh token fixes.
pub fn explain(err: ApiError) -> anyhow::Error {
    if err.requires_sign_in() {
        anyhow!("{err} (pass a valid --token or set EDUFLOW_TOKEN)")
    } else {
        anyhow::Error::new(err)
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
