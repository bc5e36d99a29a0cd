// --------------------------------------------------
// Avatar uploads.
//
// Only png / jpg / jpeg / gif / webp are accepted (case-insensitive).
// Stored names are never the client's filename:
//     <unix millis>-<random hex>-<sanitized stem>.<lowercase ext>
// Files are written to a temp name and renamed into place.
// --------------------------------------------------

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

// Lowercased extension if it is an allowed image type
pub fn allowed_extension(filename: &str) -> AppResult<String> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| AppError::InvalidAvatar(format!("{filename:?} has no extension")))?;

    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(AppError::InvalidAvatar(format!("extension {ext:?} not allowed")));
    }
    Ok(ext)
}

// Keep [A-Za-z0-9_-] of the file stem, replace the rest, cap the length
fn sanitize_stem(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");

    let cleaned: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(40)
        .collect();

    if cleaned.trim_matches('_').is_empty() {
        "avatar".to_string()
    } else {
        cleaned
    }
}

// Build the on-disk name for an upload
pub fn stored_name(original: &str) -> AppResult<String> {
    let ext = allowed_extension(original)?;
    let millis = chrono::Utc::now().timestamp_millis();
    let token = Uuid::new_v4().simple().to_string();
    Ok(format!(
        "{millis}-{}-{}.{ext}",
        &token[..8],
        sanitize_stem(original)
    ))
}

#[derive(Debug, Clone)]
pub struct AvatarStore {
    dir: PathBuf,
}

impl AvatarStore {
    pub fn new(dir: impl Into<PathBuf>) -> AppResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // Validate, then write; returns the stored filename
    pub fn save(&self, original: &str, bytes: &[u8]) -> AppResult<String> {
        let name = stored_name(original)?;
        if bytes.is_empty() {
            return Err(AppError::InvalidAvatar("empty file".to_string()));
        }

        let path = self.dir.join(&name);
        let tmp_path = self.dir.join(format!(".{name}.tmp"));
        fs::write(&tmp_path, bytes)?;
        fs::rename(&tmp_path, &path)?;

        info!(original, stored = %name, size = bytes.len(), "avatar stored");
        Ok(name)
    }

    // Used when the profile insert fails after the file was written
    pub fn discard(&self, name: &str) {
        if let Err(e) = fs::remove_file(self.dir.join(name)) {
            tracing::warn!(name, error = %e, "failed to remove orphaned avatar");
        }
    }
}
