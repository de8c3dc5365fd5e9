// ABOUTME: Gallery image version parsing and validation.
// ABOUTME: Versions follow the MAJOR.MINOR.PATCH form required by shared image galleries.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseGalleryVersionError {
    #[error("gallery image version cannot be empty")]
    Empty,

    #[error("gallery image version must have three dot-separated parts: {0}")]
    InvalidFormat(String),

    #[error("invalid version component '{0}'")]
    InvalidComponent(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GalleryVersion {
    major: u32,
    minor: u32,
    patch: u32,
}

impl GalleryVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    pub fn parse(input: &str) -> Result<Self, ParseGalleryVersionError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseGalleryVersionError::Empty);
        }

        let parts: Vec<&str> = input.split('.').collect();
        let [major, minor, patch] = parts.as_slice() else {
            return Err(ParseGalleryVersionError::InvalidFormat(input.to_string()));
        };

        let component = |part: &str| {
            // Reject signs and whitespace that u32::from_str would otherwise accept.
            if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
                return Err(ParseGalleryVersionError::InvalidComponent(part.to_string()));
            }
            part.parse::<u32>()
                .map_err(|_| ParseGalleryVersionError::InvalidComponent(part.to_string()))
        };

        Ok(Self {
            major: component(*major)?,
            minor: component(*minor)?,
            patch: component(*patch)?,
        })
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    pub fn patch(&self) -> u32 {
        self.patch
    }
}

impl fmt::Display for GalleryVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl std::str::FromStr for GalleryVersion {
    type Err = ParseGalleryVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
