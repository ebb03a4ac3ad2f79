//! Route handlers for the tag JSON API.

use axum::{Json, extract::{Path, State}, http::StatusCode, response::IntoResponse};
use serde::Deserialize;

use crate::{
    AppState, Error,
    auth::CurrentUser,
    db::with_lock_retry,
    tag::{TagId, TagName, create_tag, delete_tag, get_all_tags, update_tag},
};

/// The JSON body for creating or renaming a tag.
#[derive(Debug, Deserialize)]
pub struct TagBody {
    /// The tag's display name.
    pub name: String,
}

/// A route handler for listing the signed-in user's tags.
pub async fn get_tags(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, Error> {
    let tags =
        with_lock_retry(&state.db_connection, move |connection| {
            get_all_tags(user.id, connection)
        })
        .await?;

    Ok(Json(tags))
}

/// A route handler for creating a new tag.
pub async fn create_tag_endpoint(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<TagBody>,
) -> Result<impl IntoResponse, Error> {
    let name = TagName::new(&body.name)?;

    let tag = with_lock_retry(&state.db_connection, move |connection| {
        create_tag(user.id, name.clone(), connection)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(tag)))
}

/// A route handler for renaming a tag.
pub async fn update_tag_endpoint(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(tag_id): Path<TagId>,
    Json(body): Json<TagBody>,
) -> Result<impl IntoResponse, Error> {
    let name = TagName::new(&body.name)?;

    with_lock_retry(&state.db_connection, move |connection| {
        update_tag(user.id, tag_id, name.clone(), connection)
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// A route handler for deleting a tag.
///
/// Rows in the junction tables are removed by cascade, so deleting a tag
/// untags everything it was attached to without touching the expenses or logs
/// themselves.
pub async fn delete_tag_endpoint(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(tag_id): Path<TagId>,
) -> Result<impl IntoResponse, Error> {
    with_lock_retry(&state.db_connection, move |connection| {
        delete_tag(user.id, tag_id, connection)
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}
