//! Study groups, also the source of the student form's group picker.

use std::sync::Arc;

use eduflow_shared::{EntityId, Group, Section};

use super::NameInput;
use crate::{
    api::{ApiClient, CollectionApi, RestCollection, GROUPS_PATH},
    context::AppContext,
    controller::{ControllerOptions, ResourceListController},
    error::ApiError,
};

/// Location of the page.
pub const GROUPS_ROUTE: &str = "/groups";

/// REST collection behind the page.
pub type GroupsApi = RestCollection<Group, NameInput, NameInput>;

/// Authenticated groups collection.
pub fn groups_api(client: ApiClient) -> GroupsApi {
    RestCollection::new(client, GROUPS_PATH)
}

/// Study groups, filtered and paged in memory.
pub struct GroupsPage<A>
where
    A: CollectionApi<Item = Group, Create = NameInput, Update = NameInput>,
{
    list: ResourceListController<A>,
}

impl<A> GroupsPage<A>
where
    A: CollectionApi<Item = Group, Create = NameInput, Update = NameInput>,
{
    /// Uses the `groups` key, so the list shares its cache entry with the
    /// students page's picker.
    pub fn new(ctx: AppContext, api: Arc<A>) -> Self {
        let options = ControllerOptions::new(GROUPS_PATH, GROUPS_ROUTE, &ctx)
            .section(Section::Groups)
            .local_filter();
        Self {
            list: ResourceListController::new(ctx, api, options),
        }
    }

    /// The underlying list controller.
    pub fn list(&self) -> &ResourceListController<A> {
        &self.list
    }

    /// Gates and loads the collection.
    pub async fn mount(&self) -> Result<(), ApiError> {
        self.list.mount().await
    }

    /// Creates a group from a trimmed, non-blank name.
    pub async fn create(&self, name: &str) -> Result<Group, ApiError> {
        self.list.submit_create(NameInput::new(name)?).await
    }

    /// Renames group `id`.
    pub async fn rename(&self, id: EntityId, name: &str) -> Result<Group, ApiError> {
        let input = NameInput::new(name)?;
        self.list.open_edit(id);
        self.list.submit_update(input).await
    }
}

#[cfg(test)]
mod tests {
    use eduflow_shared::Role;

    use super::*;
    use crate::{
        navigation::UNAUTHORIZED_PATH,
        testing::{context_for, signed_in, FakeCollection},
    };

    type Groups = FakeCollection<Group, NameInput, NameInput>;

    fn fake(names: &[&str]) -> Arc<Groups> {
        let items: Vec<Group> = names
            .iter()
            .zip(1..)
            .map(|(name, id)| Group {
                id,
                name: name.to_string(),
            })
            .collect();
        Arc::new(FakeCollection::new(
            items,
            |id, input: NameInput| Group {
                id,
                name: input.name,
            },
            |item: &mut Group, input: NameInput| item.name = input.name,
        ))
    }

    #[tokio::test]
    async fn two_pages_mounting_together_share_one_request() {
        let api = fake(&["N-12", "N-13"]);
        let (ctx, _) = context_for(signed_in(Role::Admin));
        let first = GroupsPage::new(ctx.clone(), Arc::clone(&api));
        let second = GroupsPage::new(ctx, Arc::clone(&api));

        let (a, b) = tokio::join!(first.mount(), second.mount());
        a.unwrap();
        b.unwrap();

        assert_eq!(api.list_calls(), 1);
        assert_eq!(second.list().items().len(), 2);
    }

    #[tokio::test]
    async fn student_cannot_open_groups() {
        let api = fake(&["N-12"]);
        let (ctx, nav) = context_for(signed_in(Role::Student));
        let page = GroupsPage::new(ctx, Arc::clone(&api));

        assert_eq!(page.mount().await, Err(ApiError::Forbidden));
        assert_eq!(nav.last_path().as_deref(), Some(UNAUTHORIZED_PATH));
    }

    #[tokio::test]
    async fn delete_failure_still_clears_pending_selection() {
        let api = fake(&["N-12"]);
        let (ctx, _) = context_for(signed_in(Role::Admin));
        let page = GroupsPage::new(ctx, Arc::clone(&api));
        page.mount().await.unwrap();

        api.fail_writes(ApiError::Server {
            status: 409,
            message: "group has students".to_string(),
        });
        page.list().request_delete(1);
        let err = page.list().confirm_delete().await.unwrap_err();

        assert_eq!(err.to_string(), "group has students");
        assert_eq!(page.list().pending_delete(), None);
        assert_eq!(api.list_calls(), 1);
    }
}
