//! In-memory collaborators for unit tests.

use std::{
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use eduflow_media_types::{DeletionResponse, UploadedImage};
use eduflow_shared::{EntityId, ListResponse, PageMeta, Role};
use parking_lot::Mutex;

use crate::{
    api::{CollectionApi, ListQuery, MediaApi},
    config::ClientConfig,
    context::AppContext,
    controller::HasId,
    error::ApiError,
    navigation::HistoryNavigator,
    session::{Session, SessionStore},
};

pub fn signed_in(role: Role) -> Session {
    Session {
        id: 7,
        roles: vec![role],
        is_authenticated: true,
        access_token: "access".to_string(),
        refresh_token: "refresh".to_string(),
        name: Some("Test".to_string()),
        phone_number: None,
    }
}

pub fn context_for(session: Session) -> (AppContext, HistoryNavigator) {
    let navigator = HistoryNavigator::new();
    let ctx = AppContext::new(
        ClientConfig::default(),
        SessionStore::with_session(session),
        Arc::new(navigator.clone()),
    );
    (ctx, navigator)
}

type Build<T, C> = Box<dyn Fn(EntityId, C) -> T + Send + Sync>;
type Apply<T, U> = Box<dyn Fn(&mut T, U) + Send + Sync>;

/// Collection backed by a `Vec`, paging like the real API.
pub struct FakeCollection<T, C, U> {
    pub items: Mutex<Vec<T>>,
    pub lists: Mutex<Vec<ListQuery>>,
    pub creates: Mutex<Vec<EntityId>>,
    pub updates: Mutex<Vec<EntityId>>,
    pub removes: Mutex<Vec<EntityId>>,
    pub list_error: Mutex<Option<ApiError>>,
    pub write_error: Mutex<Option<ApiError>>,
    pub list_delay: Mutex<Duration>,
    /// Overrides `list_delay` for requests of a given page.
    pub page_delays: Mutex<Vec<(u64, Duration)>>,
    /// Answer lists without paging metadata.
    pub omit_meta: Mutex<bool>,
    next_id: AtomicI64,
    build: Build<T, C>,
    apply: Apply<T, U>,
}

impl<T, C, U> FakeCollection<T, C, U> {
    pub fn new(
        items: Vec<T>,
        build: impl Fn(EntityId, C) -> T + Send + Sync + 'static,
        apply: impl Fn(&mut T, U) + Send + Sync + 'static,
    ) -> Self {
        Self {
            next_id: AtomicI64::new(items.len() as i64 + 100),
            items: Mutex::new(items),
            lists: Mutex::new(Vec::new()),
            creates: Mutex::new(Vec::new()),
            updates: Mutex::new(Vec::new()),
            removes: Mutex::new(Vec::new()),
            list_error: Mutex::new(None),
            write_error: Mutex::new(None),
            list_delay: Mutex::new(Duration::ZERO),
            page_delays: Mutex::new(Vec::new()),
            omit_meta: Mutex::new(false),
            build: Box::new(build),
            apply: Box::new(apply),
        }
    }

    pub fn list_calls(&self) -> usize {
        self.lists.lock().len()
    }

    pub fn last_list(&self) -> Option<ListQuery> {
        self.lists.lock().last().cloned()
    }

    pub fn fail_lists(&self, err: ApiError) {
        *self.list_error.lock() = Some(err);
    }

    pub fn fail_writes(&self, err: ApiError) {
        *self.write_error.lock() = Some(err);
    }

    fn write_error(&self) -> Result<(), ApiError> {
        match self.write_error.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl<T, C, U> CollectionApi for FakeCollection<T, C, U>
where
    T: HasId + Clone + Send + Sync + 'static,
    C: Send + 'static,
    U: Send + 'static,
{
    type Create = C;
    type Item = T;
    type Update = U;

    fn resource(&self) -> &str {
        "fake"
    }

    async fn list(&self, query: ListQuery) -> Result<ListResponse<T>, ApiError> {
        self.lists.lock().push(query.clone());
        let delay = self
            .page_delays
            .lock()
            .iter()
            .find(|(page, _)| Some(*page) == query.page)
            .map_or(*self.list_delay.lock(), |(_, delay)| *delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.list_error.lock().clone() {
            return Err(err);
        }
        let items = self.items.lock().clone();
        let total = items.len() as u64;
        let data = match (query.page, query.limit) {
            (Some(page), Some(limit)) => items
                .into_iter()
                .skip(((page.max(1) - 1) * limit) as usize)
                .take(limit as usize)
                .collect(),
            _ => items,
        };
        let page_count = query.limit.map_or(1, |limit| total.div_ceil(limit).max(1));
        let meta = PageMeta {
            page_count,
            item_count: total,
        };
        Ok(ListResponse {
            data,
            meta: (!*self.omit_meta.lock()).then_some(meta),
        })
    }

    async fn create(&self, body: C) -> Result<T, ApiError> {
        self.write_error()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let item = (self.build)(id, body);
        self.items.lock().push(item.clone());
        self.creates.lock().push(id);
        Ok(item)
    }

    async fn update(&self, id: EntityId, body: U) -> Result<T, ApiError> {
        self.write_error()?;
        self.updates.lock().push(id);
        let mut items = self.items.lock();
        let item = items
            .iter_mut()
            .find(|item| item.id() == id)
            .ok_or_else(|| ApiError::Server {
                status: 404,
                message: "not found".to_string(),
            })?;
        (self.apply)(item, body);
        Ok(item.clone())
    }

    async fn remove(&self, id: EntityId) -> Result<(), ApiError> {
        self.removes.lock().push(id);
        self.write_error()?;
        self.items.lock().retain(|item| item.id() != id);
        Ok(())
    }
}

/// Media store that hands out sequential keys and remembers deletions.
#[derive(Default)]
pub struct FakeMedia {
    pub uploads: Mutex<Vec<String>>,
    pub deleted: Mutex<Vec<String>>,
}

#[async_trait]
impl MediaApi for FakeMedia {
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadedImage, ApiError> {
        let key = format!("students/{}-{file_name}", self.uploads.lock().len() + 1);
        self.uploads.lock().push(key.clone());
        Ok(UploadedImage {
            url: format!("https://cdn.test/{key}"),
            key,
            mime_type: None,
            size: Some(bytes.len() as u64),
        })
    }

    async fn delete(&self, key: &str) -> Result<DeletionResponse, ApiError> {
        self.deleted.lock().push(key.to_string());
        Ok(DeletionResponse {
            success: true,
            message: None,
        })
    }
}
