use image::ImageFormat;
use serde::Serialize;

use super::{clean_text, FormErrors, FormPayload, UploadedFile};
use crate::models::{Group, PostView};

pub const POST_TEXT_REQUIRED: &str = "Please fill in the post text.";
pub const GROUP_INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";
pub const IMAGE_INVALID: &str = "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";
pub const IMAGE_TOO_LARGE: &str = "The uploaded file is too large.";

/// Bound (possibly invalid) post form, as re-rendered on errors.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PostForm {
    pub text: String,
    /// Raw group choice; empty means "no group"
    pub group: String,
    #[serde(skip)]
    pub text_too_large: bool,
    #[serde(skip)]
    pub image: Option<UploadedFile>,
    #[serde(skip)]
    pub clear_image: bool,
}

/// An uploaded file that was recognized as an image.
#[derive(Debug, Clone)]
pub struct ValidatedImage {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

#[derive(Debug, Clone)]
pub enum ImageChange {
    Keep,
    Clear,
    Replace(ValidatedImage),
}

/// Validated post fields ready to persist.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: ImageChange,
}

impl PostForm {
    pub fn bind(mut payload: FormPayload) -> Self {
        Self {
            text: payload.field("text").unwrap_or_default().to_string(),
            text_too_large: payload.is_oversized("text"),
            group: payload.field("group").unwrap_or_default().trim().to_string(),
            clear_image: payload.checkbox("image-clear"),
            image: payload.take_file("image"),
        }
    }

    /// Unbound form pre-filled from an existing post, for the edit page.
    pub fn for_post(post: &PostView) -> Self {
        Self {
            text: post.text.clone(),
            text_too_large: false,
            group: post.group_id.map(|id| id.to_string()).unwrap_or_default(),
            image: None,
            clear_image: false,
        }
    }

    pub fn selected_group(&self) -> Option<i64> {
        self.group.parse().ok()
    }

    /// Validate against the currently available `groups`.
    pub fn validate(&self, groups: &[Group]) -> Result<PostDraft, FormErrors> {
        let mut errors = FormErrors::new();
        let text = clean_text(
            Some(self.text.as_str()),
            self.text_too_large,
            POST_TEXT_REQUIRED,
            &mut errors,
        );

        let group_id = if self.group.is_empty() {
            None
        } else {
            match self.selected_group() {
                Some(id) if groups.iter().any(|g| g.id == id) => Some(id),
                _ => {
                    errors.add("group", GROUP_INVALID_CHOICE);
                    None
                }
            }
        };

        let image = match &self.image {
            Some(file) if file.too_large => {
                errors.add("image", IMAGE_TOO_LARGE);
                ImageChange::Keep
            }
            Some(file) => match decoded_format(&file.bytes) {
                Some(format) => ImageChange::Replace(ValidatedImage {
                    filename: file.filename.clone(),
                    bytes: file.bytes.clone(),
                    format,
                }),
                None => {
                    errors.add("image", IMAGE_INVALID);
                    ImageChange::Keep
                }
            },
            None if self.clear_image => ImageChange::Clear,
            None => ImageChange::Keep,
        };

        if errors.is_empty() {
            Ok(PostDraft {
                text,
                group_id,
                image,
            })
        } else {
            Err(errors)
        }
    }
}

/// Format of `bytes` when they decode as a complete image.
fn decoded_format(bytes: &[u8]) -> Option<ImageFormat> {
    let format = image::guess_format(bytes).ok()?;
    image::load_from_memory_with_format(bytes, format).ok()?;
    Some(format)
}
