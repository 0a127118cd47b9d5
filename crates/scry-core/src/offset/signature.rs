use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Byte pattern with wildcards, written as `"48 8D 0D ?? ?? ?? ??"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ByteSignature(Vec<Option<u8>>);

impl ByteSignature {
    pub fn new(bytes: Vec<Option<u8>>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::InvalidSignature("Signature pattern is empty".to_string()));
        }
        Ok(Self(bytes))
    }

    pub fn bytes(&self) -> &[Option<u8>] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First concrete byte and its index, used as a search anchor.
    pub fn anchor(&self) -> Option<(usize, u8)> {
        self.0
            .iter()
            .enumerate()
            .find_map(|(i, b)| b.map(|value| (i, value)))
    }

    /// Check the pattern against `window` (which must be at least as long).
    pub fn matches(&self, window: &[u8]) -> bool {
        window.len() >= self.0.len()
            && self
                .0
                .iter()
                .zip(window)
                .all(|(pattern, byte)| pattern.is_none_or(|value| value == *byte))
    }
}

impl FromStr for ByteSignature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_pattern(s).map(Self)
    }
}

impl TryFrom<String> for ByteSignature {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ByteSignature> for String {
    fn from(signature: ByteSignature) -> Self {
        format_pattern(&signature.0)
    }
}

impl fmt::Display for ByteSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_pattern(&self.0))
    }
}

pub fn parse_pattern(pattern: &str) -> Result<Vec<Option<u8>>> {
    let mut bytes = Vec::new();
    for token in pattern.split_whitespace() {
        if token == "??" || token == "?" {
            bytes.push(None);
            continue;
        }

        let value = u8::from_str_radix(token, 16).map_err(|e| {
            Error::InvalidSignature(format!("Invalid signature token '{}': {}", token, e))
        })?;
        bytes.push(Some(value));
    }

    if bytes.is_empty() {
        return Err(Error::InvalidSignature("Signature pattern is empty".to_string()));
    }

    Ok(bytes)
}

pub fn format_pattern(bytes: &[Option<u8>]) -> String {
    bytes
        .iter()
        .map(|b| match b {
            Some(value) => format!("{:02X}", value),
            None => "??".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
