// Copyright 2025 The Shelf Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Photo attachment storage.
//!
//! Uploaded files are stored on disk under an opaque UUID filename; the
//! original name is never used as a path component. A record owns at most one
//! attachment, and the stored file is removed when the attachment is replaced
//! or its record is deleted.

use std::path::{Path, PathBuf};

use log::warn;
use uuid::Uuid;

/// Extensions accepted for photo uploads.
const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// Upload size cap in bytes (2 MiB).
pub const MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("invalid file type. Allowed: png, jpg, jpeg, gif")]
    DisallowedType,

    #[error("file exceeds the {MAX_UPLOAD_BYTES} byte upload limit")]
    TooLarge,

    #[error("upload storage unavailable: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone)]
pub struct AttachmentStore {
    root: PathBuf,
}

impl AttachmentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate and persist an uploaded file. Returns the stored filename.
    pub fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String, UploadError> {
        let extension = allowed_extension(original_name).ok_or(UploadError::DisallowedType)?;
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(UploadError::TooLarge);
        }

        std::fs::create_dir_all(&self.root)?;
        let stored_name = format!("{}.{extension}", Uuid::new_v4().simple());
        std::fs::write(self.root.join(&stored_name), bytes)?;
        Ok(stored_name)
    }

    /// Read a stored file back, with its content type.
    pub fn read(&self, stored_name: &str) -> Result<(Vec<u8>, &'static str), UploadError> {
        let bytes = std::fs::read(self.root.join(stored_name))?;
        Ok((bytes, content_type_for(stored_name)))
    }

    /// Best-effort removal of a stored file. Missing files are not an error;
    /// other failures are logged and swallowed so record deletion can finish.
    pub fn remove(&self, stored_name: &str) {
        let path = self.root.join(stored_name);
        if let Err(e) = std::fs::remove_file(&path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove attachment {}: {e}", path.display());
            }
        }
    }
}

fn allowed_extension(name: &str) -> Option<String> {
    let extension = name.rsplit_once('.')?.1.to_ascii_lowercase();
    ALLOWED_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}

fn content_type_for(stored_name: &str) -> &'static str {
    match stored_name.rsplit_once('.').map(|(_, ext)| ext) {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn save_stores_under_opaque_name() {
        let dir = TempDir::new().unwrap();
        let store = AttachmentStore::new(dir.path());

        let stored = store.save("portrait.PNG", b"fake-png").unwrap();
        assert!(stored.ends_with(".png"));
        assert!(!stored.contains("portrait"));
        assert!(dir.path().join(&stored).exists());
    }

    #[test]
    fn save_rejects_disallowed_extension() {
        let dir = TempDir::new().unwrap();
        let store = AttachmentStore::new(dir.path());

        let err = store.save("malware.exe", b"nope").unwrap_err();
        assert!(matches!(err, UploadError::DisallowedType));

        let err = store.save("no-extension", b"nope").unwrap_err();
        assert!(matches!(err, UploadError::DisallowedType));
    }

    #[test]
    fn save_rejects_oversized_payload() {
        let dir = TempDir::new().unwrap();
        let store = AttachmentStore::new(dir.path());

        let big = vec![0u8; MAX_UPLOAD_BYTES + 1];
        let err = store.save("big.jpg", &big).unwrap_err();
        assert!(matches!(err, UploadError::TooLarge));
    }

    #[test]
    fn read_returns_bytes_and_content_type() {
        let dir = TempDir::new().unwrap();
        let store = AttachmentStore::new(dir.path());

        let stored = store.save("photo.jpeg", b"jpeg-bytes").unwrap();
        let (bytes, content_type) = store.read(&stored).unwrap();
        assert_eq!(bytes, b"jpeg-bytes");
        assert_eq!(content_type, "image/jpeg");
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = AttachmentStore::new(dir.path());

        let stored = store.save("photo.gif", b"gif-bytes").unwrap();
        store.remove(&stored);
        assert!(!dir.path().join(&stored).exists());
        // second removal of a missing file is fine
        store.remove(&stored);
    }
}
