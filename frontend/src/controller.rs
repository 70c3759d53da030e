//! Page-level list controller: query cache + mutations + debounced filter +
//! pagination composed into one state machine.
//!
//! ```text
//! Idle -> Loading -> Ready
//!            \-----> Error
//! Ready / Error -> Loading   (refetch, page change, filter commit)
//! ```

use std::{sync::Arc, time::Duration};

use eduflow_shared::{
    check_access, AccessDecision, EntityId, ExamCategory, Group, ListResponse, Section,
    TestQuestion, User,
};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    api::{CollectionApi, ListQuery},
    context::AppContext,
    debounce::{DebouncedFilter, FilterState},
    error::ApiError,
    mutation::MutationRunner,
    navigation::{LOGIN_PATH, UNAUTHORIZED_PATH},
    pagination::{PageSlot, PageState},
    query::{CacheEntry, QueryKey},
};

/// Where the page is in its load cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListStatus {
    /// Not mounted yet.
    Idle,
    /// A list request is in flight.
    Loading,
    /// The latest list request succeeded.
    Ready,
    /// The latest list request failed.
    Error(ApiError),
}

/// Where the committed filter is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Sent to the server as `search`; page and filter changes refetch.
    Server,
    /// Whole collection fetched once, filtered and paged in memory.
    Local,
}

/// The create/edit drawer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditSurface {
    /// Nothing open.
    Closed,
    /// Creating a new entity.
    Create,
    /// Editing the entity with this id.
    Edit(EntityId),
}

impl EditSurface {
    /// Whether a form is showing.
    pub fn is_open(self) -> bool {
        self != EditSurface::Closed
    }

    /// Id being edited, if any.
    pub fn editing(self) -> Option<EntityId> {
        match self {
            EditSurface::Edit(id) => Some(id),
            _ => None,
        }
    }
}

/// Transient user notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A create succeeded.
    Created,
    /// An update succeeded.
    Updated,
    /// A delete succeeded.
    Deleted,
    /// A write failed with this message.
    Failed(String),
}

/// Text a [`FilterMode::Local`] filter matches against.
pub trait Searchable {
    /// Text matched case-insensitively by the search box.
    fn search_text(&self) -> String;

    /// Whether `needle` occurs in [`Searchable::search_text`]; a blank needle matches all.
    fn matches(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        needle.is_empty() || self.search_text().to_lowercase().contains(&needle)
    }
}

/// Entities addressable by their server id.
pub trait HasId {
    /// Server id.
    fn id(&self) -> EntityId;
}

impl HasId for User {
    fn id(&self) -> EntityId {
        self.id
    }
}

impl HasId for Group {
    fn id(&self) -> EntityId {
        self.id
    }
}

impl HasId for ExamCategory {
    fn id(&self) -> EntityId {
        self.id
    }
}

impl HasId for TestQuestion {
    fn id(&self) -> EntityId {
        self.id
    }
}

impl Searchable for User {
    fn search_text(&self) -> String {
        format!("{} {}", self.full_name(), self.phone_number.as_deref().unwrap_or_default())
    }
}

impl Searchable for Group {
    fn search_text(&self) -> String {
        self.name.clone()
    }
}

impl Searchable for ExamCategory {
    fn search_text(&self) -> String {
        self.name.clone()
    }
}

impl Searchable for TestQuestion {
    fn search_text(&self) -> String {
        self.question.clone()
    }
}

/// Per-page settings of a [`ResourceListController`].
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Cache key of the list.
    pub key: QueryKey,
    /// Location reported as `from` when redirecting to sign-in.
    pub route: String,
    /// Section gating the page; `None` skips the role check.
    pub section: Option<Section>,
    /// Where the search box is applied.
    pub filter_mode: FilterMode,
    /// Rows per page.
    pub page_size: u64,
    /// Quiet interval of the search box.
    pub debounce: Duration,
}

impl ControllerOptions {
    /// Server-filtered page with the context's page size and debounce.
    pub fn new(key: impl Into<String>, route: impl Into<String>, ctx: &AppContext) -> Self {
        Self {
            key: QueryKey::new(key),
            route: route.into(),
            section: None,
            filter_mode: FilterMode::Server,
            page_size: ctx.config.page_size,
            debounce: ctx.config.search_debounce,
        }
    }

    /// Gates the page on `section`.
    pub fn section(mut self, section: Section) -> Self {
        self.section = Some(section);
        self
    }

    /// Filters and pages in memory.
    pub fn local_filter(mut self) -> Self {
        self.filter_mode = FilterMode::Local;
        self
    }
}

/// Everything a view needs to render the page.
#[derive(Debug, Clone)]
pub struct ListView<T> {
    /// Load state.
    pub status: ListStatus,
    /// Rows of the current page.
    pub items: Vec<T>,
    /// 1-based current page.
    pub current_page: u64,
    /// Page count, once the total is known.
    pub total_pages: Option<u64>,
    /// Item count, once known.
    pub total_items: Option<u64>,
    /// Pager buttons.
    pub slots: Vec<PageSlot>,
    /// Search box values.
    pub filter: FilterState,
    /// Open form, if any.
    pub editor: EditSurface,
    /// Entity awaiting delete confirmation.
    pub pending_delete: Option<EntityId>,
    /// Error of the latest failed write.
    pub last_error: Option<ApiError>,
    /// A create or update is running.
    pub is_submitting: bool,
    /// A delete is running.
    pub is_deleting: bool,
}

struct ListState<T> {
    status: ListStatus,
    response: Option<Arc<ListResponse<T>>>,
    items: Vec<T>,
    page: PageState,
    filter: String,
    editor: EditSurface,
    pending_delete: Option<EntityId>,
    last_error: Option<ApiError>,
    notices: Vec<Notice>,
    mounted: bool,
    disposed: bool,
    /// Sequence of the newest load; older completions are ignored.
    load_seq: u64,
}

struct Inner<A: CollectionApi> {
    api: Arc<A>,
    ctx: AppContext,
    options: ControllerOptions,
    filter: DebouncedFilter,
    state: Mutex<ListState<A::Item>>,
    create: MutationRunner<A::Create, A::Item>,
    update: MutationRunner<(EntityId, A::Update), A::Item>,
    remove: MutationRunner<EntityId, ()>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl<A: CollectionApi> Drop for Inner<A> {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.get_mut().take() {
            listener.abort();
        }
    }
}

/// Handle to one list page. Clones drive the same page.
pub struct ResourceListController<A: CollectionApi> {
    inner: Arc<Inner<A>>,
}

impl<A: CollectionApi> Clone for ResourceListController<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A> ResourceListController<A>
where
    A: CollectionApi,
    A::Item: Searchable,
{
    /// Unmounted controller over `api`.
    pub fn new(ctx: AppContext, api: Arc<A>, options: ControllerOptions) -> Self {
        let create = {
            let api = Arc::clone(&api);
            MutationRunner::new("create", move |body| {
                let api = Arc::clone(&api);
                async move { api.create(body).await }
            })
        };
        let update = {
            let api = Arc::clone(&api);
            MutationRunner::new("update", move |(id, body)| {
                let api = Arc::clone(&api);
                async move { api.update(id, body).await }
            })
        };
        let remove = {
            let api = Arc::clone(&api);
            MutationRunner::new("delete", move |id| {
                let api = Arc::clone(&api);
                async move { api.remove(id).await }
            })
        };

        Self {
            inner: Arc::new(Inner {
                filter: DebouncedFilter::new(options.debounce),
                state: Mutex::new(ListState {
                    status: ListStatus::Idle,
                    response: None,
                    items: Vec::new(),
                    page: PageState::new(options.page_size),
                    filter: String::new(),
                    editor: EditSurface::Closed,
                    pending_delete: None,
                    last_error: None,
                    notices: Vec::new(),
                    mounted: false,
                    disposed: false,
                    load_seq: 0,
                }),
                api,
                ctx,
                options,
                create,
                update,
                remove,
                listener: Mutex::new(None),
            }),
        }
    }

    /// Cache key of the list.
    pub fn key(&self) -> &QueryKey {
        &self.inner.options.key
    }

    /// Collection the page reads and writes.
    pub fn api(&self) -> &Arc<A> {
        &self.inner.api
    }

    /// Shared context the page was built with.
    pub fn context(&self) -> &AppContext {
        &self.inner.ctx
    }

    /// Gates on the page's section, then issues the first fetch (page 1, no
    /// filter). Fetch failures land in [`ListStatus::Error`]; only a failed
    /// gate is returned.
    pub async fn mount(&self) -> Result<(), ApiError> {
        self.check_gate()?;
        {
            let mut st = self.inner.state.lock();
            if st.disposed || st.mounted {
                return Ok(());
            }
            st.mounted = true;
        }
        info!(key = %self.inner.options.key, "list page mounted");
        self.spawn_filter_listener();
        self.load(false).await;
        Ok(())
    }

    fn check_gate(&self) -> Result<(), ApiError> {
        let Some(section) = self.inner.options.section else {
            return Ok(());
        };
        let ctx = &self.inner.ctx;
        match check_access(&ctx.session.roles(), section) {
            AccessDecision::Granted(_) => Ok(()),
            AccessDecision::SignInRequired => {
                ctx.navigator
                    .replace(LOGIN_PATH, Some(self.inner.options.route.as_str()));
                Err(ApiError::Unauthenticated)
            },
            AccessDecision::Forbidden(role) => {
                warn!(?role, ?section, "role cannot view section");
                ctx.navigator.replace(UNAUTHORIZED_PATH, None);
                Err(ApiError::Forbidden)
            },
        }
    }

    /// Whether the signed-in role may create, edit and delete here.
    pub fn can_manage(&self) -> bool {
        match (self.inner.options.section, self.inner.ctx.session.current_role()) {
            (Some(section), Some(role)) => section.can_manage(role),
            (None, Some(_)) => true,
            (_, None) => false,
        }
    }

    /// Cancels the pending filter commit and detaches from in-flight
    /// requests: their results still reach the cache but no longer this page.
    pub fn dispose(&self) {
        {
            let mut st = self.inner.state.lock();
            if st.disposed {
                return;
            }
            st.disposed = true;
        }
        self.inner.filter.cancel_pending();
        if let Some(listener) = self.inner.listener.lock().take() {
            listener.abort();
        }
        debug!(key = %self.inner.options.key, "list page disposed");
    }

    /// Whether [`ResourceListController::dispose`] ran.
    pub fn is_disposed(&self) -> bool {
        self.inner.state.lock().disposed
    }

    fn spawn_filter_listener(&self) {
        let mut committed = self.inner.filter.subscribe();
        let weak = Arc::downgrade(&self.inner);
        let handle = tokio::spawn(async move {
            while committed.changed().await.is_ok() {
                let value = committed.borrow_and_update().clone();
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                ResourceListController {
                    inner,
                }
                .apply_filter(value)
                .await;
            }
        });
        *self.inner.listener.lock() = Some(handle);
    }

    /// Feeds one keystroke value into the debounced search box.
    pub fn on_search_input(&self, raw: impl Into<String>) {
        if self.is_disposed() {
            return;
        }
        self.inner.filter.on_input(raw);
    }

    /// Commits the search box immediately (e.g. on Enter).
    pub fn flush_search(&self) {
        if !self.is_disposed() {
            self.inner.filter.flush();
        }
    }

    async fn apply_filter(&self, value: String) {
        let mode = {
            let mut st = self.inner.state.lock();
            if st.disposed {
                return;
            }
            debug!(key = %self.inner.options.key, filter = %value, "filter committed, back to page 1");
            st.filter = value;
            st.page.reset();
            self.inner.options.filter_mode
        };
        match mode {
            FilterMode::Server => self.load(true).await,
            FilterMode::Local => self.reslice(),
        }
    }

    /// Moves to `page`, clamped, and fetches it when the page changed.
    pub async fn go_to(&self, page: u64) {
        let changed = {
            let mut st = self.inner.state.lock();
            if st.disposed {
                return;
            }
            st.page.go_to(page)
        };
        if !changed {
            return;
        }
        match self.inner.options.filter_mode {
            FilterMode::Server => self.load(true).await,
            FilterMode::Local => self.reslice(),
        }
    }

    /// Changes the page size and fetches the re-clamped page.
    pub async fn set_page_size(&self, page_size: u64) {
        {
            let mut st = self.inner.state.lock();
            if st.disposed {
                return;
            }
            st.page.set_page_size(page_size);
        }
        match self.inner.options.filter_mode {
            FilterMode::Server => self.load(true).await,
            FilterMode::Local => self.reslice(),
        }
    }

    /// Invalidates the list and fetches the current page again.
    pub async fn refetch(&self) {
        self.load(true).await;
    }

    async fn load(&self, invalidate: bool) {
        loop {
            let Some((seq, query)) = self.begin_load() else {
                return;
            };
            let key = self.inner.options.key.clone();
            let api = Arc::clone(&self.inner.api);
            let fetch_fn = move || async move { api.list(query).await };
            let entry = if invalidate || self.inner.options.filter_mode == FilterMode::Server {
                self.inner.ctx.queries.refetch(&key, fetch_fn).await
            } else {
                self.inner.ctx.queries.fetch(&key, fetch_fn).await
            };
            if !self.finish_load(seq, entry) {
                return;
            }
            debug!(key = %self.inner.options.key, "page clamped after load, fetching again");
        }
    }

    fn begin_load(&self) -> Option<(u64, ListQuery)> {
        let mut st = self.inner.state.lock();
        if st.disposed {
            return None;
        }
        st.load_seq += 1;
        st.status = ListStatus::Loading;
        let query = match self.inner.options.filter_mode {
            FilterMode::Server => {
                ListQuery::page(st.page.current_page(), st.page.page_size()).with_search(&st.filter)
            },
            FilterMode::Local => ListQuery::default(),
        };
        debug!(key = %self.inner.options.key, seq = st.load_seq, ?query, "list fetch issued");
        Some((st.load_seq, query))
    }

    /// Applies a finished load. Returns true when the server total moved the
    /// current page and the new page must be fetched.
    fn finish_load(&self, seq: u64, entry: CacheEntry<ListResponse<A::Item>>) -> bool {
        let expired = {
            let mut st = self.inner.state.lock();
            if st.disposed || seq != st.load_seq {
                debug!(key = %self.inner.options.key, seq, "dropping superseded list result");
                return false;
            }
            if let Some(err) = entry.error {
                warn!(key = %self.inner.options.key, error = %err, "list fetch failed");
                st.status = ListStatus::Error(err.clone());
                err.requires_sign_in()
            } else {
                let response = entry.value.unwrap_or_default();
                st.response = Some(response);
                st.status = ListStatus::Ready;
                let clamped = match self.inner.options.filter_mode {
                    FilterMode::Server => {
                        let total = st.response.as_ref().and_then(|r| r.total_items());
                        let clamped = match total {
                            Some(total) => st.page.set_total_items(total),
                            None => {
                                st.page.clear_total_items();
                                false
                            },
                        };
                        st.items = st
                            .response
                            .as_ref()
                            .map(|r| r.data.clone())
                            .unwrap_or_default();
                        clamped
                    },
                    FilterMode::Local => {
                        Self::slice_local(&mut st);
                        false
                    },
                };
                info!(
                    key = %self.inner.options.key,
                    items = st.items.len(),
                    total = ?st.page.total_items(),
                    "list ready"
                );
                return clamped;
            }
        };
        if expired {
            self.force_sign_in();
        }
        false
    }

    fn force_sign_in(&self) {
        let ctx = &self.inner.ctx;
        warn!(route = %self.inner.options.route, "credential expired, signing out");
        ctx.session.expire();
        ctx.navigator
            .replace(LOGIN_PATH, Some(self.inner.options.route.as_str()));
    }

    fn reslice(&self) {
        let mut st = self.inner.state.lock();
        if !st.disposed {
            Self::slice_local(&mut st);
        }
    }

    fn slice_local(st: &mut ListState<A::Item>) {
        let Some(response) = st.response.clone() else {
            return;
        };
        let filtered: Vec<A::Item> = response
            .data
            .iter()
            .filter(|item| item.matches(&st.filter))
            .cloned()
            .collect();
        st.page.set_total_items(filtered.len() as u64);
        st.items = st.page.slice(&filtered).to_vec();
    }

    /// Opens an empty create form.
    pub fn open_create(&self) {
        let mut st = self.inner.state.lock();
        st.editor = EditSurface::Create;
        st.last_error = None;
    }

    /// Opens the edit surface for `id`, returning the cached entity to
    /// prefill the form with.
    pub fn open_edit(&self, id: EntityId) -> Option<A::Item>
    where
        A::Item: HasId,
    {
        let mut st = self.inner.state.lock();
        st.editor = EditSurface::Edit(id);
        st.last_error = None;
        Self::find_cached(&st, id)
    }

    /// Cached entity `id` from the latest list response.
    pub fn find(&self, id: EntityId) -> Option<A::Item>
    where
        A::Item: HasId,
    {
        Self::find_cached(&self.inner.state.lock(), id)
    }

    fn find_cached(st: &ListState<A::Item>, id: EntityId) -> Option<A::Item>
    where
        A::Item: HasId,
    {
        st.response
            .as_ref()
            .and_then(|response| response.data.iter().find(|item| item.id() == id).cloned())
    }

    /// Closes the edit surface unless a write is running. Returns the surface
    /// that was closed.
    pub fn cancel_edit(&self) -> Option<EditSurface> {
        if self.is_submitting() {
            return None;
        }
        let mut st = self.inner.state.lock();
        let previous = st.editor;
        st.editor = EditSurface::Closed;
        st.last_error = None;
        Some(previous)
    }

    /// Whether a create or update is running.
    pub fn is_submitting(&self) -> bool {
        self.inner.create.is_loading() || self.inner.update.is_loading()
    }

    /// Whether a delete is running.
    pub fn is_deleting(&self) -> bool {
        self.inner.remove.is_loading()
    }

    /// Creates an entity. On success the form closes and the list is
    /// invalidated and fetched once; on failure the form stays open with
    /// the error recorded.
    pub async fn submit_create(&self, body: A::Create) -> Result<A::Item, ApiError> {
        let outcome = Mutex::new(None);
        self.inner
            .create
            .run(
                body,
                |item| {
                    self.edit_succeeded(Notice::Created);
                    *outcome.lock() = Some(Ok(item));
                },
                |err| {
                    self.edit_failed(&err);
                    *outcome.lock() = Some(Err(err));
                },
            )
            .await;
        self.after_write(outcome.into_inner()).await
    }

    /// Sends `body` for the entity on the edit surface.
    pub async fn submit_update(&self, body: A::Update) -> Result<A::Item, ApiError> {
        let Some(id) = self.editor().editing() else {
            return Err(ApiError::Validation("no entity selected for editing".to_string()));
        };
        let outcome = Mutex::new(None);
        self.inner
            .update
            .run(
                (id, body),
                |item| {
                    self.edit_succeeded(Notice::Updated);
                    *outcome.lock() = Some(Ok(item));
                },
                |err| {
                    self.edit_failed(&err);
                    *outcome.lock() = Some(Err(err));
                },
            )
            .await;
        self.after_write(outcome.into_inner()).await
    }

    async fn after_write<T>(&self, outcome: Option<Result<T, ApiError>>) -> Result<T, ApiError> {
        let result = outcome
            .unwrap_or_else(|| Err(ApiError::Internal("mutation finished without outcome".into())));
        if result.is_ok() {
            self.load(true).await;
        }
        result
    }

    fn edit_succeeded(&self, notice: Notice) {
        {
            let mut st = self.inner.state.lock();
            st.editor = EditSurface::Closed;
            st.last_error = None;
            st.notices.push(notice);
        }
        self.inner.ctx.queries.invalidate(&self.inner.options.key);
    }

    fn edit_failed(&self, err: &ApiError) {
        let mut st = self.inner.state.lock();
        st.last_error = Some(err.clone());
        st.notices.push(Notice::Failed(err.to_string()));
    }

    /// Asks for confirmation before deleting `id`.
    pub fn request_delete(&self, id: EntityId) {
        self.inner.state.lock().pending_delete = Some(id);
    }

    /// Drops the pending delete, returning its id.
    pub fn cancel_delete(&self) -> Option<EntityId> {
        self.inner.state.lock().pending_delete.take()
    }

    /// Deletes the pending entity. The pending id is cleared whatever the
    /// outcome; the list is refetched only on success. Returns `Ok(None)`
    /// when nothing was pending.
    pub async fn confirm_delete(&self) -> Result<Option<EntityId>, ApiError> {
        let Some(id) = self.cancel_delete() else {
            return Ok(None);
        };
        let outcome = Mutex::new(None);
        self.inner
            .remove
            .run(
                id,
                |()| {
                    self.inner.state.lock().notices.push(Notice::Deleted);
                    self.inner.ctx.queries.invalidate(&self.inner.options.key);
                    *outcome.lock() = Some(Ok(Some(id)));
                },
                |err| {
                    self.edit_failed(&err);
                    *outcome.lock() = Some(Err(err));
                },
            )
            .await;
        self.after_write(outcome.into_inner()).await
    }

    /// Form currently open.
    pub fn editor(&self) -> EditSurface {
        self.inner.state.lock().editor
    }

    /// Entity awaiting delete confirmation.
    pub fn pending_delete(&self) -> Option<EntityId> {
        self.inner.state.lock().pending_delete
    }

    /// Load state.
    pub fn status(&self) -> ListStatus {
        self.inner.state.lock().status.clone()
    }

    /// Rows of the current page.
    pub fn items(&self) -> Vec<A::Item> {
        self.inner.state.lock().items.clone()
    }

    /// 1-based current page.
    pub fn current_page(&self) -> u64 {
        self.inner.state.lock().page.current_page()
    }

    /// Search box values.
    pub fn filter_state(&self) -> FilterState {
        self.inner.filter.state()
    }

    /// Notifications since the last call, oldest first.
    pub fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut self.inner.state.lock().notices)
    }

    /// Snapshot of everything a view renders.
    pub fn view(&self) -> ListView<A::Item> {
        let filter = self.inner.filter.state();
        let is_submitting = self.is_submitting();
        let is_deleting = self.is_deleting();
        let st = self.inner.state.lock();
        ListView {
            status: st.status.clone(),
            items: st.items.clone(),
            current_page: st.page.current_page(),
            total_pages: st.page.total_pages(),
            total_items: st.page.total_items(),
            slots: st.page.slots(),
            filter,
            editor: st.editor,
            pending_delete: st.pending_delete,
            last_error: st.last_error.clone(),
            is_submitting,
            is_deleting,
        }
    }
}
