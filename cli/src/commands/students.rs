//! Student commands.

use anyhow::Result;
use eduflow_frontend::{
    pages::{
        students::{students_api, StudentRequest},
        StudentForm,
    },
    ApiClient, ApiError, CollectionApi, MediaClient,
};
use eduflow_media_types::UploadedImage;
use eduflow_shared::{phone, Role};
use serde_json::json;

use super::{explain, list_query, media::upload_file, print_json};
use crate::cli::{StudentArgs, StudentCommands};

/// Masks a plain `+998...` number so the form check accepts it.
fn masked_phone(raw: &str) -> String {
    phone::to_masked(raw).unwrap_or_else(|| raw.to_string())
}

/// Create form for the given fields. The password doubles as its confirmation.
pub fn create_form(fields: &StudentArgs) -> StudentForm {
    let password = fields.password.clone().unwrap_or_default();
    StudentForm {
        first_name: fields.first_name.clone().unwrap_or_default(),
        last_name: fields.last_name.clone().unwrap_or_default(),
        phone_number: fields.phone.as_deref().map(masked_phone).unwrap_or_default(),
        confirm_password: password.clone(),
        password,
        group_id: fields.group_id,
    }
}

/// Exactly the fields given on the command line.
pub fn update_request(
    fields: &StudentArgs,
    image: Option<&UploadedImage>,
) -> Result<StudentRequest, ApiError> {
    let phone_number = fields
        .phone
        .as_deref()
        .map(phone::normalize)
        .transpose()?;
    Ok(StudentRequest {
        first_name: fields.first_name.clone(),
        last_name: fields.last_name.clone(),
        phone_number,
        password: fields.password.clone(),
        group_id: fields.group_id,
        image: image.map(|image| image.url.clone()),
        role: Role::Student.as_str().to_string(),
    })
}

async fn attach(client: &ApiClient, fields: &StudentArgs) -> Result<Option<UploadedImage>> {
    match &fields.image {
        Some(path) => Ok(Some(upload_file(&MediaClient::new(client.clone()), path).await?)),
        None => Ok(None),
    }
}

/// Runs a student action.
pub async fn run(client: &ApiClient, page_size: u64, action: StudentCommands) -> Result<()> {
    let api = students_api(client.clone());
    match action {
        StudentCommands::List(args) => {
            let list = api.list(list_query(&args, page_size)).await.map_err(explain)?;
            print_json(&list)
        },
        StudentCommands::Create(fields) => {
            // Validate before uploading anything.
            create_form(&fields).to_create(None).map_err(explain)?;
            let image = attach(client, &fields).await?;
            let body = create_form(&fields).to_create(image.as_ref()).map_err(explain)?;
            let created = api.create(body).await.map_err(explain)?;
            print_json(&created)
        },
        StudentCommands::Update {
            id,
            fields,
        } => {
            update_request(&fields, None).map_err(explain)?;
            let image = attach(client, &fields).await?;
            let body = update_request(&fields, image.as_ref()).map_err(explain)?;
            let updated = api.update(id, body).await.map_err(explain)?;
            print_json(&updated)
        },
        StudentCommands::Delete {
            id,
        } => {
            api.remove(id).await.map_err(explain)?;
            print_json(&json!({ "deleted": id }))
        },
    }
}
