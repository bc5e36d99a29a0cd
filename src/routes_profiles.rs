// --------------------------------------------------
// Handles API endpoints for display profiles.
//
// Responsibilities:
// - List profiles
// - Create a profile from a multipart form with an avatar upload
// - Update text fields / delete by id
// -------------------------------------------------

use axum::{
    Json,
    extract::{Multipart, Path, State},
};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::Profile;
use crate::profile_registry::ProfileFields;
use crate::AppState;

// -----------------------------
// GET /api/profiles
// -----------------------------
pub async fn get_profiles(State(state): State<AppState>) -> AppResult<Json<Vec<Profile>>> {
    Ok(Json(state.store.list_profiles()?))
}

// -----------------------------
// POST /api/profiles (multipart/form-data)
// Fields: name, remark, account_number, link, avatar (file)
// -----------------------------
pub async fn create_profile(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<Vec<Profile>>> {
    let mut fields = ProfileFields::default();
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("bad form: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "avatar" {
            let filename = field.file_name().unwrap_or_default().to_string();
            // reject the type before reading the body
            crate::avatar::allowed_extension(&filename)?;
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::validation(format!("bad upload: {e}")))?;
            upload = Some((filename, bytes.to_vec()));
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::validation(format!("bad form: {e}")))?;
        match name.as_str() {
            "name" => fields.name = value,
            "remark" => fields.remark = value,
            "account_number" => fields.account_number = value,
            "link" => fields.link = value,
            _ => {}
        }
    }

    let Some((filename, bytes)) = upload else {
        return Err(AppError::InvalidAvatar("avatar file missing".to_string()));
    };
    crate::logic::require_text("name", &fields.name)?;

    let stored = state.avatars.save(&filename, &bytes)?;
    if let Err(e) = state.store.create_profile(&fields, &stored) {
        state.avatars.discard(&stored);
        return Err(e);
    }

    Ok(Json(state.store.list_profiles()?))
}

#[derive(Debug, Deserialize)]
pub struct ProfileInput {
    pub name: String,
    #[serde(default)]
    pub remark: String,
    #[serde(default)]
    pub account_number: String,
    #[serde(default)]
    pub link: String,
}

// -----------------------------
// PUT /api/profiles/:id
// Full replace of the text fields; the avatar stays
// -----------------------------
pub async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<ProfileInput>,
) -> AppResult<Json<Vec<Profile>>> {
    let fields = ProfileFields {
        name: input.name,
        remark: input.remark,
        account_number: input.account_number,
        link: input.link,
    };
    state.store.update_profile(id, &fields)?;
    Ok(Json(state.store.list_profiles()?))
}

// -----------------------------
// DELETE /api/profiles/:id
// -----------------------------
pub async fn delete_profile(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<Profile>>> {
    state.store.delete_profile(id)?;
    Ok(Json(state.store.list_profiles()?))
}
