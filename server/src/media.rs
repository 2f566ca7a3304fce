// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hotel_common::DomainError;
use tracing::info;
use uuid::Uuid;

/// Largest accepted upload (5 MiB).
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];
const ATTACHMENT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "pdf"];

/// Where an upload belongs. Each kind has its own directory under the media root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Avatar,
    LeaveAttachment,
    CleaningPhoto,
    MaintenancePhoto,
}

impl MediaKind {
    pub fn directory(&self) -> &'static str {
        match self {
            MediaKind::Avatar => "avatars",
            MediaKind::LeaveAttachment => "leaves",
            MediaKind::CleaningPhoto => "cleaning",
            MediaKind::MaintenancePhoto => "maintenance",
        }
    }

    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            MediaKind::LeaveAttachment => ATTACHMENT_EXTENSIONS,
            _ => IMAGE_EXTENSIONS,
        }
    }
}

/// Lowercased extension of `filename` if `kind` accepts it.
pub fn checked_extension(kind: MediaKind, filename: &str) -> Result<String, DomainError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .ok_or_else(|| DomainError::validation(format!("{} has no file extension.", filename)))?;

    if !kind.allowed_extensions().contains(&extension.as_str()) {
        return Err(DomainError::validation(format!(
            "Unsupported file type '{}'. Allowed: {}.",
            extension,
            kind.allowed_extensions().join(", ")
        )));
    }
    Ok(extension)
}

/// Writes `data` to `<media_root>/<kind>/<uuid>.<ext>` and returns the
/// path relative to the media root, as stored on the owning record.
pub async fn store_upload(media_root: &Path, kind: MediaKind, filename: &str, data: &[u8]) -> Result<String> {
    if data.is_empty() {
        return Err(DomainError::validation("The uploaded file is empty.").into());
    }
    if data.len() > MAX_UPLOAD_BYTES {
        return Err(DomainError::validation(format!(
            "The file is too large. Maximum size is {} MiB.",
            MAX_UPLOAD_BYTES / 1024 / 1024
        ))
        .into());
    }
    let extension = checked_extension(kind, filename)?;

    let directory: PathBuf = media_root.join(kind.directory());
    tokio::fs::create_dir_all(&directory)
        .await
        .with_context(|| format!("Failed to create media directory {}", directory.display()))?;

    let stored_name = format!("{}.{}", Uuid::new_v4(), extension);
    let target = directory.join(&stored_name);
    tokio::fs::write(&target, data)
        .await
        .with_context(|| format!("Failed to write upload to {}", target.display()))?;

    info!("Stored {} bytes as {}", data.len(), target.display());
    Ok(format!("{}/{}", kind.directory(), stored_name))
}
