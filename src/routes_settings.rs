// --------------------------------------------------
// Handles API endpoints for the settings documents.
//
// Responsibilities:
// - Get / put the account template (global_accounts)
// - List / append / replace / remove address book entries by position
// - Get / put theme colors and the legacy defaults map
// -------------------------------------------------

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::logic;
use crate::models::{AddressEntry, ThemeColors};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct AccountsResponse {
    pub text: String,
    pub accounts: Vec<String>,
}

impl From<Vec<String>> for AccountsResponse {
    fn from(accounts: Vec<String>) -> Self {
        Self {
            text: logic::join_account_list(&accounts),
            accounts,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AccountsInput {
    pub text: String,
}

// -----------------------------
// GET /api/accounts
// -----------------------------
pub async fn get_accounts(State(state): State<AppState>) -> AppResult<Json<AccountsResponse>> {
    Ok(Json(state.store.global_accounts()?.into()))
}

// -----------------------------
// PUT /api/accounts
// Replaces the template used to seed new tasks
// -----------------------------
pub async fn put_accounts(
    State(state): State<AppState>,
    Json(input): Json<AccountsInput>,
) -> AppResult<Json<AccountsResponse>> {
    Ok(Json(state.store.put_global_accounts(&input.text)?.into()))
}

// -----------------------------
// GET /api/address-book
// -----------------------------
pub async fn get_address_book(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<AddressEntry>>> {
    Ok(Json(state.store.address_book()?))
}

// -----------------------------
// POST /api/address-book
// Appends to the end, returns the updated list
// -----------------------------
pub async fn append_address(
    State(state): State<AppState>,
    Json(entry): Json<AddressEntry>,
) -> AppResult<Json<Vec<AddressEntry>>> {
    Ok(Json(state.store.append_entry(entry)?))
}

// -----------------------------
// PUT /api/address-book/:index
// Index is the position shown in the last listing
// -----------------------------
pub async fn replace_address(
    State(state): State<AppState>,
    Path(index): Path<i64>,
    Json(entry): Json<AddressEntry>,
) -> AppResult<Json<Vec<AddressEntry>>> {
    Ok(Json(state.store.replace_entry(index, entry)?))
}

// -----------------------------
// DELETE /api/address-book/:index
// Later entries move up by one
// -----------------------------
pub async fn remove_address(
    State(state): State<AppState>,
    Path(index): Path<i64>,
) -> AppResult<Json<Vec<AddressEntry>>> {
    Ok(Json(state.store.remove_entry(index)?))
}

// -----------------------------
// GET /api/theme
// -----------------------------
pub async fn get_theme(State(state): State<AppState>) -> AppResult<Json<ThemeColors>> {
    Ok(Json(state.store.theme()?))
}

// -----------------------------
// PUT /api/theme
// -----------------------------
pub async fn put_theme(
    State(state): State<AppState>,
    Json(theme): Json<ThemeColors>,
) -> AppResult<Json<ThemeColors>> {
    Ok(Json(state.store.put_theme(theme)?))
}

// -----------------------------
// GET /api/defaults
// -----------------------------
pub async fn get_defaults(
    State(state): State<AppState>,
) -> AppResult<Json<BTreeMap<String, String>>> {
    Ok(Json(state.store.defaults()?))
}

// -----------------------------
// PUT /api/defaults
// -----------------------------
pub async fn put_defaults(
    State(state): State<AppState>,
    Json(map): Json<BTreeMap<String, String>>,
) -> AppResult<Json<BTreeMap<String, String>>> {
    Ok(Json(state.store.put_defaults(map)?))
}
