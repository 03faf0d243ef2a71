use base64::{Engine, prelude::BASE64_STANDARD};
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use std::fmt::{Debug, Formatter};
use thiserror::Error;

const DATA_SCHEME: &str = "data:";
const DATA_URI_PREFIX: &str = "data:image/";
const BASE64_MARKER: &str = ";base64,";

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum InvalidImageDataError {
    #[error("Image is not a data:image/ URI")]
    NotAnImageDataUri,
    #[error("Image data URI has no media subtype")]
    MissingSubtype,
    #[error("Image payload is not base64 encoded")]
    NotBase64,
    #[error("Image payload is empty")]
    EmptyPayload,
    #[error("Decoding image payload failed")]
    Decode,
}

/// An embedded image, kept in its `data:image/<subtype>;base64,<payload>`
/// form so it can be handed to a browser unchanged.
#[derive(Clone, Eq, PartialEq, Hash, Serialize)]
#[serde(transparent)]
pub struct ImageData(String);

impl ImageData {
    pub fn new(uri: String) -> Result<Self, InvalidImageDataError> {
        let rest = uri
            .strip_prefix(DATA_URI_PREFIX)
            .ok_or(InvalidImageDataError::NotAnImageDataUri)?;
        let (subtype, payload) = rest
            .split_once(BASE64_MARKER)
            .ok_or(InvalidImageDataError::NotBase64)?;

        if subtype.is_empty() {
            return Err(InvalidImageDataError::MissingSubtype);
        }
        if payload.is_empty() {
            return Err(InvalidImageDataError::EmptyPayload);
        }
        BASE64_STANDARD
            .decode(payload)
            .map_err(|_| InvalidImageDataError::Decode)?;

        Ok(Self(uri))
    }

    #[must_use]
    pub fn media_type(&self) -> &str {
        self.0[DATA_SCHEME.len()..]
            .split_once(BASE64_MARKER)
            .map_or("", |(media_type, _)| media_type)
    }

    #[must_use]
    pub fn as_uri(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Debug for ImageData {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageData")
            .field("media_type", &self.media_type())
            .field("uri_len", &self.0.len())
            .finish()
    }
}

impl TryFrom<String> for ImageData {
    type Error = InvalidImageDataError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for ImageData {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        ImageData::new(inner.clone())
            .map_err(|_| Error::invalid_value(Unexpected::Str(&inner), &"a data:image/ URI"))
    }
}
