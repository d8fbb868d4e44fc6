use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use cork_types::{Comment, NewPost, Post, PostId, PostMutation, PostPatch};

use crate::error::{body_rejection, ServerError, ServerResult};
use crate::form::CreatePostForm;
use crate::state::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Malformed ids are reported exactly like unknown ones.
fn parse_id(raw: &str) -> ServerResult<PostId> {
    PostId::parse(raw).map_err(|_| ServerError::PostNotFound)
}

/// `GET /api/posts`
pub async fn list_posts(State(state): State<AppState>) -> ServerResult<Json<Vec<Post>>> {
    Ok(Json(state.posts.list().await?))
}

/// `POST /api/posts`
pub async fn create_post(
    State(state): State<AppState>,
    form: CreatePostForm,
) -> ServerResult<(StatusCode, Json<Post>)> {
    let mut new = NewPost::new(form.title, form.content)?;
    if let Some(upload) = form.upload {
        let name = state
            .blobs
            .put(&upload, Utc::now().timestamp_millis())
            .await
            .inspect_err(|e| error!(error = %e, "error storing upload"))?;
        new = new.with_file(name);
    }
    let post = state
        .posts
        .insert(new)
        .await
        .inspect_err(|e| error!(error = %e, "error creating post"))?;
    info!(id = %post.id, file = ?post.file, "created post");
    Ok((StatusCode::CREATED, Json(post)))
}

async fn mutate(
    state: &AppState,
    raw_id: &str,
    mutation: PostMutation,
    action: &'static str,
) -> ServerResult<Json<Post>> {
    let id = parse_id(raw_id)?;
    match state.posts.apply(&id, mutation).await {
        Ok(Some(post)) => Ok(Json(post)),
        Ok(None) => Err(ServerError::PostNotFound),
        Err(e) => {
            error!(error = %e, %id, "error {action} post");
            Err(e.into())
        }
    }
}

/// `POST /api/posts/like/{postId}`
pub async fn like_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> ServerResult<Json<Post>> {
    mutate(&state, &post_id, PostMutation::Like, "liking").await
}

/// `POST /api/posts/dislike/{postId}`
pub async fn dislike_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> ServerResult<Json<Post>> {
    mutate(&state, &post_id, PostMutation::Dislike, "disliking").await
}

/// `POST /api/posts/comment/{postId}`
///
/// A request without a JSON content type appends a comment with no text.
pub async fn comment_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    body: Result<Json<Comment>, JsonRejection>,
) -> ServerResult<Json<Post>> {
    let comment = match body {
        Ok(Json(comment)) => comment,
        Err(JsonRejection::MissingJsonContentType(_)) => Comment::default(),
        Err(rejection) => {
            return Err(body_rejection(
                rejection.status(),
                rejection.body_text(),
                ServerError::BadRequest,
            ))
        }
    };
    mutate(&state, &post_id, PostMutation::Comment(comment), "commenting on").await
}

/// `PUT /api/posts/{postId}`
///
/// An unknown (or malformed) id is 404 rather than a `null` body, matching
/// the other `{postId}` routes. Every other failure is reported as 400,
/// except an oversized body, which is 413.
pub async fn update_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    body: Result<Json<PostPatch>, JsonRejection>,
) -> ServerResult<Json<Post>> {
    let id = parse_id(&post_id)?;
    let Json(patch) =
        body.map_err(|e| body_rejection(e.status(), e.body_text(), ServerError::UpdateRejected))?;
    if patch.touches_engagement() {
        warn!(%id, "update overwrites counters, comments or attachment");
    }
    match state.posts.update(&id, patch).await {
        Ok(Some(post)) => Ok(Json(post)),
        Ok(None) => Err(ServerError::PostNotFound),
        Err(e) => Err(ServerError::UpdateRejected(e.to_string())),
    }
}

/// `DELETE /api/posts/{postId}`
///
/// The attachment, if any, stays in the blob store.
pub async fn delete_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> ServerResult<Json<MessageResponse>> {
    let id = parse_id(&post_id)?;
    if !state.posts.delete(&id).await? {
        return Err(ServerError::PostNotFound);
    }
    Ok(Json(MessageResponse {
        message: "Post deleted".into(),
    }))
}

/// Health check handler.
pub async fn health_handler(State(state): State<AppState>) -> Response {
    match state.posts.ping().await {
        Ok(()) => Json(HealthResponse {
            status: "ok".into(),
        })
        .into_response(),
        Err(e) => {
            warn!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable".into(),
                }),
            )
                .into_response()
        }
    }
}
