//! Headless core of the eduflow admin front-end.
//!
//! Every list-backed page is a [`ResourceListController`] over a
//! [`CollectionApi`]: a keyed query cache with request de-duplication, write
//! runners, a debounced search box and pagination, plus the forced sign-out
//! that follows an expired credential. Rendering lives elsewhere; the pages
//! in [`pages`] expose the state a view needs and the actions it can take.

pub mod api;
pub mod config;
pub mod context;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod mutation;
pub mod navigation;
pub mod pages;
pub mod pagination;
pub mod query;
pub mod session;

#[cfg(test)]
mod testing;

pub use api::{ApiClient, CollectionApi, ListQuery, MediaApi, MediaClient, RestCollection};
pub use config::ClientConfig;
pub use context::AppContext;
pub use controller::{
    ControllerOptions, EditSurface, FilterMode, ListStatus, ListView, Notice, ResourceListController,
};
pub use error::ApiError;
pub use navigation::{HistoryNavigator, Navigator};
pub use query::{CacheEntry, QueryClient, QueryKey};
pub use session::{Session, SessionStore};
