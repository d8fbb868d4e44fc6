//! Request body for post creation.
//!
//! Accepts `multipart/form-data` (text fields `title` and `content`, one
//! optional file under `file`) or a JSON object `{title, content}`. The
//! whole body is buffered before the handler runs, so validation can reject
//! a request before anything is written.

use axum::async_trait;
use axum::extract::multipart::MultipartError;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::Json;
use cork_store::Upload;
use serde::Deserialize;

use crate::error::{body_rejection, ServerError};

/// The only form field that may carry a file.
pub const FILE_FIELD: &str = "file";

#[derive(Debug, Default)]
pub struct CreatePostForm {
    pub title: Option<String>,
    pub content: Option<String>,
    pub upload: Option<Upload>,
}

#[derive(Deserialize)]
struct CreatePostJson {
    title: Option<String>,
    content: Option<String>,
}

impl CreatePostForm {
    async fn from_multipart(mut multipart: Multipart) -> Result<Self, ServerError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
            let name = field.name().unwrap_or_default().to_string();
            if let Some(original_name) = field.file_name().map(str::to_string) {
                if name != FILE_FIELD || form.upload.is_some() {
                    return Err(ServerError::BadRequest(format!("Unexpected field: {name}")));
                }
                let data = field.bytes().await.map_err(bad_multipart)?;
                // Browsers send an empty part for a file input left blank.
                if original_name.is_empty() && data.is_empty() {
                    continue;
                }
                form.upload = Some(Upload::new(name, Some(original_name), data));
                continue;
            }
            let value = field.text().await.map_err(bad_multipart)?;
            match name.as_str() {
                "title" => form.title = Some(value),
                "content" => form.content = Some(value),
                _ => {}
            }
        }
        Ok(form)
    }
}

fn bad_multipart(e: MultipartError) -> ServerError {
    body_rejection(e.status(), e.body_text(), ServerError::BadRequest)
}

#[async_trait]
impl<S> FromRequest<S> for CreatePostForm
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        if is_json {
            let Json(body) = Json::<CreatePostJson>::from_request(req, state)
                .await
                .map_err(|e| body_rejection(e.status(), e.body_text(), ServerError::BadRequest))?;
            return Ok(Self {
                title: body.title,
                content: body.content,
                upload: None,
            });
        }

        let multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| body_rejection(e.status(), e.body_text(), ServerError::BadRequest))?;
        Self::from_multipart(multipart).await
    }
}
