//! Decoded HTTP responses

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::HttpError;
use super::request::ResponseType;

/// Response body, decoded per the request's [`ResponseType`]
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseData {
    /// Parsed JSON; an empty body becomes `null`
    Json(Value),
    /// UTF-8 text, lossily decoded
    Text(String),
    /// Raw bytes
    Binary(Vec<u8>),
}

impl ResponseData {
    /// Decode a raw body.
    ///
    /// A JSON request whose body does not parse (a plain-text
    /// acknowledgement, say) decodes to [`ResponseData::Text`].
    ///
    /// # Errors
    /// Currently infallible; kept fallible for transports that decode
    /// eagerly.
    pub fn decode(response_type: ResponseType, bytes: Vec<u8>) -> Result<Self, HttpError> {
        match response_type {
            ResponseType::Json if bytes.iter().all(u8::is_ascii_whitespace) => {
                Ok(Self::Json(Value::Null))
            }
            ResponseType::Json => match serde_json::from_slice(&bytes) {
                Ok(value) => Ok(Self::Json(value)),
                Err(_) => Ok(Self::Text(String::from_utf8_lossy(&bytes).into_owned())),
            },
            ResponseType::Text => Ok(Self::Text(String::from_utf8_lossy(&bytes).into_owned())),
            ResponseType::Binary => Ok(Self::Binary(bytes)),
        }
    }
}

/// Successful (2xx) response
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Header names lower-cased
    pub headers: BTreeMap<String, String>,
    /// Final URL after redirects
    pub url: String,
    /// Decoded body
    pub data: ResponseData,
}

impl HttpResponse {
    /// 200 response with a JSON body.
    #[must_use]
    pub fn json(status: u16, url: impl Into<String>, body: Value) -> Self {
        Self {
            status,
            headers: BTreeMap::from([("content-type".into(), "application/json".into())]),
            url: url.into(),
            data: ResponseData::Json(body),
        }
    }

    /// Response with a binary body.
    #[must_use]
    pub fn binary(status: u16, url: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            url: url.into(),
            data: ResponseData::Binary(bytes),
        }
    }

    /// Adds a header, lower-casing its name.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// The `Content-Type` header.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Body as JSON. Text bodies become a JSON string; binary ones `null`.
    #[must_use]
    pub fn value(&self) -> Value {
        match &self.data {
            ResponseData::Json(v) => v.clone(),
            ResponseData::Text(s) => Value::String(s.clone()),
            ResponseData::Binary(_) => Value::Null,
        }
    }

    /// Body deserialised into `T`.
    ///
    /// # Errors
    /// Returns `HttpError::Decode` when the body does not match `T`.
    pub fn json_as<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        let value = match &self.data {
            ResponseData::Text(s) => serde_json::from_str(s)?,
            _ => self.value(),
        };
        Ok(serde_json::from_value(value)?)
    }

    /// Body as a string; JSON values other than strings are serialised.
    #[must_use]
    pub fn text(&self) -> String {
        match &self.data {
            ResponseData::Json(Value::String(s)) | ResponseData::Text(s) => s.clone(),
            ResponseData::Json(v) => v.to_string(),
            ResponseData::Binary(b) => String::from_utf8_lossy(b).into_owned(),
        }
    }

    /// Body as raw bytes.
    #[must_use]
    pub fn bytes(&self) -> Vec<u8> {
        match &self.data {
            ResponseData::Binary(b) => b.clone(),
            ResponseData::Text(s) => s.as_bytes().to_vec(),
            ResponseData::Json(v) => v.to_string().into_bytes(),
        }
    }

    /// `filename` of a `Content-Disposition: attachment` header
    #[must_use]
    pub fn attachment_filename(&self) -> Option<String> {
        parse_filename(self.header("content-disposition")?)
    }
}

fn parse_filename(disposition: &str) -> Option<String> {
    let lower = disposition.to_ascii_lowercase();
    let start = lower.find("filename=")? + "filename=".len();
    let rest = disposition[start..].trim_start();

    let name = match rest.strip_prefix('"') {
        Some(quoted) => quoted.split('"').next().unwrap_or_default(),
        None => rest.split(';').next().unwrap_or_default().trim(),
    };
    (!name.is_empty()).then(|| name.to_string())
}
