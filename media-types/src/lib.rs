//! Wire types of the media endpoint used for profile-image attachments.

use serde::{Deserialize, Serialize};

/// An object stored by the media service, addressed by its opaque `key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedImage {
    /// Storage key, passed back to delete the object.
    pub key: String,
    /// Public URL stored on the owning entity.
    pub url: String,
    /// MIME type the service detected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// Body of `POST /upload/delete`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionRequest {
    /// Storage key of the object to remove.
    pub key: String,
}

/// Reply to a deletion request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeletionResponse {
    /// Whether the object was removed.
    #[serde(default)]
    pub success: bool,
    /// Reason given when it was not.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Multipart field name the upload endpoint reads the file from.
pub const UPLOAD_FIELD: &str = "file";

/// Mime type guessed from a file name; the server re-checks it.
pub fn guess_image_mime(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uploaded_image_tolerates_missing_optional_fields() {
        let image: UploadedImage =
            serde_json::from_str(r#"{"key":"avatars/1.png","url":"https://cdn/1.png"}"#).unwrap();
        assert_eq!(image.key, "avatars/1.png");
        assert!(image.mime_type.is_none());
    }

    #[test]
    fn guess_image_mime_is_case_insensitive() {
        assert_eq!(guess_image_mime("Photo.JPG"), "image/jpeg");
        assert_eq!(guess_image_mime("noext"), "application/octet-stream");
    }
}
