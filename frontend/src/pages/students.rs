//! Students page: server-side search, paging, the student form and the
//! profile image attached to it.

use std::sync::Arc;

use eduflow_media_types::UploadedImage;
use eduflow_shared::{
    phone::{self, PhoneError, DEFAULT_PHONE_PREFIX},
    EntityId, Group, ListResponse, Role, Section, User,
};
use futures::{future::BoxFuture, FutureExt};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    api::{ApiClient, CollectionApi, ListQuery, MediaApi, RestCollection, GROUPS_PATH, STUDENTS_PATH},
    context::AppContext,
    controller::{ControllerOptions, EditSurface, ResourceListController},
    error::ApiError,
    query::{CacheEntry, QueryKey},
};

/// Location of the page.
pub const STUDENTS_ROUTE: &str = "/students";

/// REST collection behind the page.
pub type StudentsApi = RestCollection<User, StudentRequest, StudentRequest>;

/// Authenticated students collection.
pub fn students_api(client: ApiClient) -> StudentsApi {
    RestCollection::new(client, STUDENTS_PATH)
}

/// Body of `POST /students` and `PATCH /students/{id}`. Absent fields are
/// left out of the JSON entirely.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct StudentRequest {
    /// Given name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Family name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Normalized `+998XXXXXXXXX` number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    /// New password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Study group.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<EntityId>,
    /// Profile image URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Always `student`.
    pub role: String,
}

/// What the student drawer holds while the user types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentForm {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Masked, e.g. `+(998) 90 123-45-67`.
    pub phone_number: String,
    /// New password; empty keeps the current one on edit.
    pub password: String,
    /// Must equal `password`.
    pub confirm_password: String,
    /// Selected study group.
    pub group_id: Option<EntityId>,
}

impl Default for StudentForm {
    fn default() -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            phone_number: DEFAULT_PHONE_PREFIX.to_string(),
            password: String::new(),
            confirm_password: String::new(),
            group_id: None,
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// `Some(new)` when it differs from `old`.
fn changed<T: PartialEq>(new: Option<T>, old: &Option<T>) -> Option<T> {
    if new.as_ref() == old.as_ref() {
        None
    } else {
        new
    }
}

impl StudentForm {
    /// Form prefilled from the cached entity.
    pub fn prefill(user: &User) -> Self {
        let phone_number = user
            .phone_number
            .as_deref()
            .map(|raw| phone::to_masked(raw).unwrap_or_else(|| raw.to_string()))
            .unwrap_or_else(|| DEFAULT_PHONE_PREFIX.to_string());
        Self {
            first_name: user.first_name.clone().unwrap_or_default(),
            last_name: user.last_name.clone().unwrap_or_default(),
            phone_number,
            password: String::new(),
            confirm_password: String::new(),
            group_id: user.group_id,
        }
    }

    fn password(&self) -> Result<Option<String>, ApiError> {
        if self.password.is_empty() && self.confirm_password.is_empty() {
            return Ok(None);
        }
        if self.password != self.confirm_password {
            return Err(ApiError::Validation("passwords do not match".to_string()));
        }
        Ok(Some(self.password.clone()))
    }

    fn phone_untouched(&self) -> bool {
        let typed = self.phone_number.trim();
        typed.is_empty() || typed == DEFAULT_PHONE_PREFIX
    }

    /// Validates a new student. Fails before any request is made when the
    /// phone number does not fill the mask.
    pub fn to_create(&self, image: Option<&UploadedImage>) -> Result<StudentRequest, ApiError> {
        if !phone::is_complete(&self.phone_number) {
            return Err(PhoneError::Incomplete.into());
        }
        Ok(StudentRequest {
            first_name: non_empty(&self.first_name),
            last_name: non_empty(&self.last_name),
            phone_number: Some(phone::normalize(&self.phone_number)?),
            password: self.password()?,
            group_id: self.group_id,
            image: image.map(|image| image.url.clone()),
            role: Role::Student.as_str().to_string(),
        })
    }

    /// Only the fields that differ from `original`.
    ///
    /// A blank first or last name is sent as absent, which the server reads
    /// as "unchanged": an edit can replace a name but never clear it. The
    /// same holds for an unselected group.
    pub fn to_update(
        &self,
        original: &User,
        image: Option<&UploadedImage>,
    ) -> Result<StudentRequest, ApiError> {
        let phone_number = if self.phone_untouched() {
            None
        } else {
            let unchanged = original
                .phone_number
                .as_deref()
                .is_some_and(|old| phone::same_number(old, &self.phone_number));
            if unchanged {
                None
            } else {
                Some(phone::normalize(&self.phone_number)?)
            }
        };
        Ok(StudentRequest {
            first_name: changed(non_empty(&self.first_name), &original.first_name),
            last_name: changed(non_empty(&self.last_name), &original.last_name),
            phone_number,
            password: self.password()?,
            group_id: changed(self.group_id, &original.group_id),
            image: image.map(|image| image.url.clone()),
            role: Role::Student.as_str().to_string(),
        })
    }
}

type GroupsFetch = Arc<dyn Fn() -> BoxFuture<'static, Result<ListResponse<Group>, ApiError>> + Send + Sync>;

/// Students list with server-side search, the student form and its profile image.
pub struct StudentsPage<A, M>
where
    A: CollectionApi<Item = User, Create = StudentRequest, Update = StudentRequest>,
    M: MediaApi,
{
    list: ResourceListController<A>,
    media: Arc<M>,
    groups: GroupsFetch,
    uploaded: Mutex<Option<UploadedImage>>,
}

impl<A, M> StudentsPage<A, M>
where
    A: CollectionApi<Item = User, Create = StudentRequest, Update = StudentRequest>,
    M: MediaApi,
{
    /// Page over `api`; `groups_api` feeds the group picker.
    pub fn new<G>(ctx: AppContext, api: Arc<A>, groups_api: Arc<G>, media: Arc<M>) -> Self
    where
        G: CollectionApi<Item = Group>,
    {
        let options =
            ControllerOptions::new(STUDENTS_PATH, STUDENTS_ROUTE, &ctx).section(Section::Students);
        let groups: GroupsFetch = Arc::new(move || {
            let api = Arc::clone(&groups_api);
            async move { api.list(ListQuery::default()).await }.boxed()
        });
        Self {
            list: ResourceListController::new(ctx, api, options),
            media,
            groups,
            uploaded: Mutex::new(None),
        }
    }

    /// The underlying list controller.
    pub fn list(&self) -> &ResourceListController<A> {
        &self.list
    }

    /// Gates, loads the first page and warms the group picker.
    pub async fn mount(&self) -> Result<(), ApiError> {
        self.list.mount().await?;
        if self.list.context().session.is_authenticated() {
            self.groups().await;
        }
        Ok(())
    }

    /// Group picker options, shared with every page reading `groups`.
    pub async fn groups(&self) -> CacheEntry<ListResponse<Group>> {
        let fetch = Arc::clone(&self.groups);
        self.list
            .context()
            .queries
            .fetch(&QueryKey::new(GROUPS_PATH), move || fetch())
            .await
    }

    /// Opens the create form, returning its initial values.
    pub fn open_create(&self) -> StudentForm {
        self.list.open_create();
        StudentForm::default()
    }

    /// `None` when `id` is not on the loaded page.
    pub fn open_edit(&self, id: EntityId) -> Option<StudentForm> {
        self.list.open_edit(id).map(|user| StudentForm::prefill(&user))
    }

    /// Image uploaded for the open form, if any.
    pub fn uploaded_image(&self) -> Option<UploadedImage> {
        self.uploaded.lock().clone()
    }

    /// Uploads a profile image for the open form. A previous upload from the
    /// same form is removed from storage.
    pub async fn attach_image(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadedImage, ApiError> {
        let image = self.media.upload(file_name, bytes).await?;
        let previous = self.uploaded.lock().replace(image.clone());
        if let Some(previous) = previous {
            self.discard_image(previous).await;
        }
        Ok(image)
    }

    async fn discard_image(&self, image: UploadedImage) {
        match self.media.delete(&image.key).await {
            Ok(response) if response.success => info!(key = %image.key, "uploaded image removed"),
            Ok(response) => {
                warn!(key = %image.key, message = ?response.message, "media store kept image")
            },
            Err(err) => warn!(key = %image.key, error = %err, "failed to remove uploaded image"),
        }
    }

    /// Sends the open form as a create or an update.
    pub async fn submit(&self, form: &StudentForm) -> Result<User, ApiError> {
        let image = self.uploaded_image();
        let result = match self.list.editor() {
            EditSurface::Create => {
                let body = form.to_create(image.as_ref())?;
                self.list.submit_create(body).await
            },
            EditSurface::Edit(id) => {
                let original = self
                    .list
                    .find(id)
                    .ok_or_else(|| ApiError::Validation(format!("student {id} is not loaded")))?;
                let body = form.to_update(&original, image.as_ref())?;
                self.list.submit_update(body).await
            },
            EditSurface::Closed => {
                return Err(ApiError::Validation("student form is not open".to_string()));
            },
        };
        if result.is_ok() {
            self.uploaded.lock().take();
        }
        result
    }

    /// Closes the drawer. An image uploaded for a student that was never
    /// created is deleted from storage.
    pub async fn cancel(&self) {
        let Some(closed) = self.list.cancel_edit() else {
            return;
        };
        let orphan = self.uploaded.lock().take();
        if let (EditSurface::Create | EditSurface::Closed, Some(image)) = (closed, orphan) {
            self.discard_image(image).await;
        }
    }

    /// Asks for confirmation before deleting student `id`.
    pub fn request_delete(&self, id: EntityId) {
        self.list.request_delete(id);
    }

    /// Drops the pending delete and forgets the tracked upload.
    pub fn cancel_delete(&self) {
        self.list.cancel_delete();
        self.uploaded.lock().take();
    }

    /// Deletes the pending student along with any tracked upload.
    pub async fn confirm_delete(&self) -> Result<Option<EntityId>, ApiError> {
        let result = self.list.confirm_delete().await;
        let tracked = self.uploaded.lock().take();
        if let Some(image) = tracked {
            self.discard_image(image).await;
        }
        result
    }

    /// Detaches the page; see [`ResourceListController::dispose`].
    pub fn dispose(&self) {
        self.list.dispose();
    }
}
