// ABOUTME: Validated name for captured images.
// ABOUTME: Enforces the 1-80 character rule set used by managed image names.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageNameError {
    #[error("image name cannot be empty")]
    Empty,

    #[error("image name exceeds maximum length of 80 characters")]
    TooLong,

    #[error("image name must start with a letter or digit")]
    InvalidStart,

    #[error("image name must end with a letter, digit, or underscore")]
    InvalidEnd,

    #[error("invalid character in image name: '{0}'")]
    InvalidChar(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageName(String);

impl ImageName {
    pub fn new(value: &str) -> Result<Self, ImageNameError> {
        let first = value.chars().next().ok_or(ImageNameError::Empty)?;

        if value.len() > 80 {
            return Err(ImageNameError::TooLong);
        }

        if !first.is_ascii_alphanumeric() {
            return Err(ImageNameError::InvalidStart);
        }

        if let Some(last) = value.chars().last()
            && !last.is_ascii_alphanumeric()
            && last != '_'
        {
            return Err(ImageNameError::InvalidEnd);
        }

        for c in value.chars() {
            if !c.is_ascii_alphanumeric() && c != '-' && c != '_' && c != '.' {
                return Err(ImageNameError::InvalidChar(c));
            }
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
