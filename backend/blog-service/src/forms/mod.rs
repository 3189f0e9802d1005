//! Form binding and validation
//!
//! A request body becomes a [`FormPayload`], the payload binds to a typed
//! form (`PostForm`, `CommentForm`), and validation yields either a typed
//! draft or [`FormErrors`] keyed by field name.

mod comment;
mod payload;
mod post;

pub use comment::{CommentDraft, CommentForm, COMMENT_TEXT_REQUIRED};

pub const TEXT_NULL_CHARACTERS: &str = "Null characters are not allowed.";
pub const TEXT_TOO_LARGE: &str = "The submitted text is too large.";
pub use payload::{FormPayload, UploadedFile, DEFAULT_MAX_UPLOAD_BYTES};
pub use post::{
    ImageChange, PostDraft, PostForm, ValidatedImage, GROUP_INVALID_CHOICE, IMAGE_INVALID,
    IMAGE_TOO_LARGE, POST_TEXT_REQUIRED,
};

use serde::Serialize;
use std::collections::BTreeMap;

/// Validation messages by field name. `__all__` holds form-wide errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, field: &str) -> bool {
        !self.field(field).is_empty()
    }

    /// Messages for each of `fields`, with an empty list for clean fields, so
    /// templates can index any of them unconditionally.
    pub fn by_field(&self, fields: &[&str]) -> BTreeMap<String, Vec<String>> {
        let mut map: BTreeMap<String, Vec<String>> = fields
            .iter()
            .map(|f| (f.to_string(), Vec::new()))
            .collect();
        for (field, messages) in &self.0 {
            map.insert(field.clone(), messages.clone());
        }
        map
    }
}

/// Case-fold `text` and reject it when nothing is left. Only case folding is
/// applied, so whitespace-only input passes. The original text is returned.
///
/// `too_large` marks a text part dropped by the payload reader; NUL
/// characters are rejected since the database cannot store them.
pub(crate) fn clean_text(
    text: Option<&str>,
    too_large: bool,
    message: &str,
    errors: &mut FormErrors,
) -> String {
    if too_large {
        errors.add("text", TEXT_TOO_LARGE);
        return String::new();
    }
    let text = text.unwrap_or_default();
    if text.to_lowercase().is_empty() {
        errors.add("text", message);
    } else if text.contains('\0') {
        errors.add("text", TEXT_NULL_CHARACTERS);
    }
    text.to_string()
}
