use actix_multipart::Multipart;
use actix_web::dev::{Payload, UrlEncoded};
use actix_web::http::header::CONTENT_TYPE;
use actix_web::{error::ErrorBadRequest, web, Error, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use futures_util::StreamExt;
use std::collections::{HashMap, HashSet};

use crate::config::SiteSettings;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// A file part of a multipart submission.
#[derive(Debug, Clone, Default)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
    /// Set when the part exceeded the upload limit; `bytes` is then empty.
    pub too_large: bool,
}

impl UploadedFile {
    /// Browsers send an empty, nameless part for an untouched file input.
    pub fn is_empty(&self) -> bool {
        !self.too_large && self.filename.is_empty() && self.bytes.is_empty()
    }
}

/// Raw submitted fields from an urlencoded or multipart body.
#[derive(Debug, Clone, Default)]
pub struct FormPayload {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, UploadedFile>,
    /// Text parts dropped for exceeding the upload limit.
    pub oversized: HashSet<String>,
}

impl FormPayload {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn is_oversized(&self, name: &str) -> bool {
        self.oversized.contains(name)
    }

    /// HTML checkbox semantics: present and not explicitly false.
    pub fn checkbox(&self, name: &str) -> bool {
        matches!(self.field(name), Some(v) if !matches!(v, "" | "0" | "false" | "off"))
    }

    /// Take the named file unless it is an untouched file input.
    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name).filter(|f| !f.is_empty())
    }
}

impl FromRequest for FormPayload {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        let mut payload = payload.take();

        Box::pin(async move {
            let limit = req
                .app_data::<web::Data<SiteSettings>>()
                .map(|s| s.max_upload_bytes)
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

            let content_type = req
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_ascii_lowercase();

            if content_type.starts_with("multipart/form-data") {
                read_multipart(Multipart::new(req.headers(), payload), limit).await
            } else if content_type.starts_with("application/x-www-form-urlencoded") {
                let fields = UrlEncoded::<HashMap<String, String>>::new(&req, &mut payload)
                    .limit(limit)
                    .await?;
                Ok(FormPayload {
                    fields,
                    ..FormPayload::default()
                })
            } else {
                Ok(FormPayload::default())
            }
        })
    }
}

async fn read_multipart(mut multipart: Multipart, limit: usize) -> Result<FormPayload, Error> {
    let mut form = FormPayload::default();

    while let Some(item) = multipart.next().await {
        let mut field = item.map_err(ErrorBadRequest)?;
        let (name, filename) = match field.content_disposition() {
            Some(cd) => (
                cd.get_name().unwrap_or_default().to_string(),
                cd.get_filename().map(str::to_string),
            ),
            None => (String::new(), None),
        };

        let mut data = Vec::new();
        let mut too_large = false;
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(ErrorBadRequest)?;
            if too_large || data.len() + chunk.len() > limit {
                too_large = true;
                data.clear();
                continue;
            }
            data.extend_from_slice(&chunk);
        }

        if name.is_empty() {
            continue;
        }
        match filename {
            Some(filename) => {
                form.files.insert(
                    name,
                    UploadedFile {
                        filename,
                        bytes: data,
                        too_large,
                    },
                );
            }
            None if too_large => {
                form.oversized.insert(name);
            }
            None => {
                form.fields
                    .insert(name, String::from_utf8_lossy(&data).into_owned());
            }
        }
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkbox_values() {
        let payload = FormPayload::from_pairs([("a", "on"), ("b", ""), ("c", "false")]);
        assert!(payload.checkbox("a"));
        assert!(!payload.checkbox("b"));
        assert!(!payload.checkbox("c"));
        assert!(!payload.checkbox("missing"));
    }

    #[test]
    fn test_untouched_file_input_is_ignored() {
        let mut payload = FormPayload::default();
        payload
            .files
            .insert("image".into(), UploadedFile::default());
        assert!(payload.take_file("image").is_none());
    }

    #[actix_web::test]
    async fn test_urlencoded_body_is_read() {
        let (req, mut pl) = actix_web::test::TestRequest::post()
            .set_form([("text", "hello"), ("group", "3")])
            .to_http_parts();
        let payload = FormPayload::from_request(&req, &mut pl).await.unwrap();
        assert_eq!(payload.field("text"), Some("hello"));
        assert_eq!(payload.field("group"), Some("3"));
    }

    #[actix_web::test]
    async fn test_urlencoded_body_uses_upload_limit() {
        let text = "a".repeat(20_000);
        let (req, mut pl) = actix_web::test::TestRequest::post()
            .app_data(web::Data::new(SiteSettings {
                max_upload_bytes: 64 * 1024,
                ..SiteSettings::default()
            }))
            .set_form([("text", text.as_str())])
            .to_http_parts();
        let payload = FormPayload::from_request(&req, &mut pl).await.unwrap();
        assert_eq!(payload.field("text").map(str::len), Some(20_000));
    }

    #[actix_web::test]
    async fn test_oversized_multipart_text_is_flagged() {
        let body = "--B\r\nContent-Disposition: form-data; name=\"text\"\r\n\r\n0123456789abcdef\r\n--B--\r\n";
        let (req, mut pl) = actix_web::test::TestRequest::post()
            .app_data(web::Data::new(SiteSettings {
                max_upload_bytes: 8,
                ..SiteSettings::default()
            }))
            .insert_header((CONTENT_TYPE, "multipart/form-data; boundary=B"))
            .set_payload(body)
            .to_http_parts();
        let payload = FormPayload::from_request(&req, &mut pl).await.unwrap();
        assert!(payload.is_oversized("text"));
        assert_eq!(payload.field("text"), None);
    }

    #[actix_web::test]
    async fn test_body_without_form_content_type_is_empty() {
        let (req, mut pl) = actix_web::test::TestRequest::post()
            .set_payload("text=hello")
            .to_http_parts();
        let payload = FormPayload::from_request(&req, &mut pl).await.unwrap();
        assert!(payload.fields.is_empty());
    }
}
