//! REST and media clients.

use std::{marker::PhantomData, sync::Arc};

use async_trait::async_trait;
use eduflow_media_types::{
    guess_image_mime, DeletionRequest, DeletionResponse, UploadedImage, UPLOAD_FIELD,
};
use eduflow_shared::{EntityId, ListResponse};
use reqwest::{Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{config::ClientConfig, error::ApiError, session::SessionStore};

/// Students collection.
pub const STUDENTS_PATH: &str = "students";
/// Study groups collection.
pub const GROUPS_PATH: &str = "groups";
/// Exam categories collection; readable without a credential.
pub const EXAM_CATEGORIES_PATH: &str = "exam-categories";
/// Test question bank.
pub const TESTS_PATH: &str = "tests";
/// Media upload endpoint.
pub const UPLOAD_PATH: &str = "upload";
/// Media deletion endpoint.
pub const UPLOAD_DELETE_PATH: &str = "upload/delete";

/// Parameters of one list request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListQuery {
    /// 1-based page; omitted for the whole collection.
    pub page: Option<u64>,
    /// Page size.
    pub limit: Option<u64>,
    /// Search text with whitespace removed.
    pub search: Option<String>,
}

impl ListQuery {
    /// Request for one page.
    pub fn page(page: u64, limit: u64) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
            search: None,
        }
    }

    /// Sets `search` with all whitespace removed; blank input clears it.
    pub fn with_search(mut self, search: &str) -> Self {
        let compact: String = search.chars().filter(|c| !c.is_whitespace()).collect();
        self.search = (!compact.is_empty()).then_some(compact);
        self
    }

    fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        pairs
    }
}

/// Some endpoints wrap their payload once more in `{ "data": ... }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Payload<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Payload<T> {
    fn into_inner(self) -> T {
        match self {
            Payload::Wrapped {
                data,
            } => data,
            Payload::Bare(value) => value,
        }
    }
}

/// Authenticated JSON client for the REST API.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
    session: SessionStore,
}

impl ApiClient {
    /// Client over `config`, authenticating with whatever `session` holds.
    pub fn new(config: ClientConfig, session: SessionStore) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Internal(format!("http client: {e}")))?;
        Ok(Self {
            http,
            config: Arc::new(config),
            session,
        })
    }

    /// Endpoints and timeouts in use.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Session the bearer token is read from.
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        let token = self.session.access_token().ok_or(ApiError::Unauthenticated)?;
        Ok(request.bearer_auth(token))
    }

    fn request(
        &self,
        method: Method,
        url: &str,
        authenticated: bool,
    ) -> Result<RequestBuilder, ApiError> {
        debug!(%method, url, "api request");
        let request = self
            .http
            .request(method, url)
            .header("Cache-Control", "no-cache, no-store, max-age=0");
        if authenticated {
            self.authorize(request)
        } else {
            Ok(request)
        }
    }

    /// `GET` on an API path. Authenticated reads fail with
    /// [`ApiError::Unauthenticated`] before sending when no token is held.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        authenticated: bool,
    ) -> Result<T, ApiError> {
        let url = self.config.api_url(path);
        let response = self
            .request(Method::GET, &url, authenticated)?
            .query(query)
            .send()
            .await?;
        decode(response).await
    }

    /// Authenticated `method` with a JSON body, decoding the JSON reply.
    pub async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.config.api_url(path);
        let response = self
            .request(method, &url, true)?
            .json(body)
            .send()
            .await?;
        decode(response).await
    }

    /// Authenticated `DELETE`; the reply body is ignored.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let url = self.config.api_url(path);
        let response = self.request(Method::DELETE, &url, true)?.send().await?;
        check_status(response).await.map(|_| ())
    }
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let err = ApiError::from_response(status.as_u16(), &body);
    warn!(status = status.as_u16(), error = %err, "api request failed");
    Err(err)
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let response = check_status(response).await?;
    let bytes = response.bytes().await?;
    serde_json::from_slice::<Payload<T>>(&bytes)
        .map(Payload::into_inner)
        .map_err(|e| ApiError::Decode(e.to_string()))
}

/// CRUD surface of one REST collection.
#[async_trait]
pub trait CollectionApi: Send + Sync + 'static {
    /// Entity the collection holds.
    type Item: Clone + Send + Sync + 'static;
    /// Body of a create.
    type Create: Send + 'static;
    /// Body of an update.
    type Update: Send + 'static;

    /// Collection path, also used as its query key.
    fn resource(&self) -> &str;

    /// One page, or the whole collection when `query` has no page.
    async fn list(&self, query: ListQuery) -> Result<ListResponse<Self::Item>, ApiError>;
    /// Creates an entity and returns it.
    async fn create(&self, body: Self::Create) -> Result<Self::Item, ApiError>;
    /// Changes entity `id` and returns it.
    async fn update(&self, id: EntityId, body: Self::Update) -> Result<Self::Item, ApiError>;
    /// Deletes entity `id`.
    async fn remove(&self, id: EntityId) -> Result<(), ApiError>;
}

/// [`CollectionApi`] over `GET/POST /{resource}` and `PATCH/DELETE
/// /{resource}/{id}`.
pub struct RestCollection<T, C, U> {
    client: ApiClient,
    resource: &'static str,
    public_reads: bool,
    _types: PhantomData<fn() -> (T, C, U)>,
}

impl<T, C, U> RestCollection<T, C, U> {
    /// Collection at `resource`, authenticating every call.
    pub fn new(client: ApiClient, resource: &'static str) -> Self {
        Self {
            client,
            resource,
            public_reads: false,
            _types: PhantomData,
        }
    }

    /// Lists without a bearer token; writes still authenticate.
    pub fn with_public_reads(mut self) -> Self {
        self.public_reads = true;
        self
    }

    fn item_path(&self, id: EntityId) -> String {
        format!("{}/{}", self.resource, id)
    }
}

#[async_trait]
impl<T, C, U> CollectionApi for RestCollection<T, C, U>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
    C: Serialize + Send + Sync + 'static,
    U: Serialize + Send + Sync + 'static,
{
    type Create = C;
    type Item = T;
    type Update = U;

    fn resource(&self) -> &str {
        self.resource
    }

    async fn list(&self, query: ListQuery) -> Result<ListResponse<T>, ApiError> {
        self.client
            .get_json(self.resource, &query.to_pairs(), !self.public_reads)
            .await
    }

    async fn create(&self, body: C) -> Result<T, ApiError> {
        self.client.send_json(Method::POST, self.resource, &body).await
    }

    async fn update(&self, id: EntityId, body: U) -> Result<T, ApiError> {
        self.client
            .send_json(Method::PATCH, &self.item_path(id), &body)
            .await
    }

    async fn remove(&self, id: EntityId) -> Result<(), ApiError> {
        self.client.delete(&self.item_path(id)).await
    }
}

/// Profile-image storage.
#[async_trait]
pub trait MediaApi: Send + Sync + 'static {
    /// Stores `bytes` under `file_name`.
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadedImage, ApiError>;
    /// Removes the object stored under `key`.
    async fn delete(&self, key: &str) -> Result<DeletionResponse, ApiError>;
}

/// [`MediaApi`] over the media service.
#[derive(Clone)]
pub struct MediaClient {
    client: ApiClient,
}

impl MediaClient {
    /// Media client sharing `client`'s session and settings.
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
        }
    }
}

#[async_trait]
impl MediaApi for MediaClient {
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadedImage, ApiError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(guess_image_mime(file_name))
            .map_err(|e| ApiError::Validation(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part(UPLOAD_FIELD, part);
        let url = self.client.config().media_url(UPLOAD_PATH);
        let response = self
            .client
            .request(Method::POST, &url, true)?
            .multipart(form)
            .send()
            .await?;
        decode(response).await
    }

    async fn delete(&self, key: &str) -> Result<DeletionResponse, ApiError> {
        let url = self.client.config().media_url(UPLOAD_DELETE_PATH);
        let response = self
            .client
            .request(Method::POST, &url, true)?
            .json(&DeletionRequest {
                key: key.to_string(),
            })
            .send()
            .await?;
        let response = check_status(response).await?;
        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(DeletionResponse {
                success: true,
                message: None,
            });
        }
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }
}
