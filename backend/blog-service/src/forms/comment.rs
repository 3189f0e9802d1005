use serde::Serialize;

use super::{clean_text, FormErrors, FormPayload};

pub const COMMENT_TEXT_REQUIRED: &str = "Please write something.";

#[derive(Debug, Clone, Default, Serialize)]
pub struct CommentForm {
    pub text: String,
    #[serde(skip)]
    pub text_too_large: bool,
}

#[derive(Debug, Clone)]
pub struct CommentDraft {
    pub text: String,
}

impl CommentForm {
    pub fn bind(payload: &FormPayload) -> Self {
        Self {
            text: payload.field("text").unwrap_or_default().to_string(),
            text_too_large: payload.is_oversized("text"),
        }
    }

    pub fn validate(&self) -> Result<CommentDraft, FormErrors> {
        let mut errors = FormErrors::new();
        let text = clean_text(
            Some(self.text.as_str()),
            self.text_too_large,
            COMMENT_TEXT_REQUIRED,
            &mut errors,
        );
        if errors.is_empty() {
            Ok(CommentDraft { text })
        } else {
            Err(errors)
        }
    }
}
