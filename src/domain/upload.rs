//! Transient preview metadata for file selections.

use base64::Engine as _;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

/// A file as handed over by the host's file-selection primitive
#[derive(Debug, Clone, Default)]
pub struct FileHandle {
    pub name: String,
    /// MIME type reported by the host, if any
    pub mime_type: Option<String>,
    pub size: u64,
    /// File bytes, when the host has them in memory
    pub contents: Option<Vec<u8>>,
}

impl FileHandle {
    pub fn new(name: impl Into<String>, mime_type: Option<&str>, size: u64) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.map(String::from),
            size,
            contents: None,
        }
    }

    pub fn with_contents(mut self, contents: Vec<u8>) -> Self {
        self.size = contents.len() as u64;
        self.contents = Some(contents);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilePreview {
    pub id: Uuid,
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    pub display_size: String,
    /// Local `data:` URL, only for images
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
}

impl FilePreview {
    fn from_handle(handle: &FileHandle) -> Self {
        let mime_type = resolve_mime(handle);
        let preview_url = match &handle.contents {
            Some(bytes) if mime_type.starts_with("image/") => Some(format!(
                "data:{};base64,{}",
                mime_type,
                base64::engine::general_purpose::STANDARD.encode(bytes)
            )),
            _ => None,
        };

        Self {
            id: Uuid::new_v4(),
            name: handle.name.clone(),
            display_size: format_size(handle.size),
            size: handle.size,
            mime_type,
            preview_url,
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// Preview state for one file control; independent of form submission
#[derive(Debug, Clone, Default)]
pub struct FileUploadHandler {
    multiple: bool,
    previews: Vec<FilePreview>,
}

impl FileUploadHandler {
    pub fn new(multiple: bool) -> Self {
        Self {
            multiple,
            previews: Vec::new(),
        }
    }

    pub fn is_multiple(&self) -> bool {
        self.multiple
    }

    /// Replace the current selection. Single-file handlers keep the first file.
    pub fn select(&mut self, files: &[FileHandle]) -> &[FilePreview] {
        let take = if self.multiple { files.len() } else { files.len().min(1) };
        self.previews = files[..take].iter().map(FilePreview::from_handle).collect();
        tracing::debug!(count = self.previews.len(), "File selection updated");
        &self.previews
    }

    pub fn remove(&mut self, id: Uuid) -> Option<FilePreview> {
        let idx = self.previews.iter().position(|p| p.id == id)?;
        Some(self.previews.remove(idx))
    }

    pub fn clear(&mut self) {
        self.previews.clear();
    }

    pub fn previews(&self) -> &[FilePreview] {
        &self.previews
    }

    /// `[{name, type, size}]` for the current selection, as the form validates it.
    pub fn metadata(&self) -> Value {
        Value::Array(
            self.previews
                .iter()
                .map(|p| json!({ "name": p.name, "type": p.mime_type, "size": p.size }))
                .collect(),
        )
    }
}

fn resolve_mime(handle: &FileHandle) -> String {
    match handle.mime_type.as_deref().map(str::trim) {
        Some(mime) if !mime.is_empty() => mime.to_ascii_lowercase(),
        _ => mime_guess::from_path(&handle.name)
            .first_or_octet_stream()
            .to_string(),
    }
}

/// Human readable size: `512 B`, `1.5 KB`, `2.0 MB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}
