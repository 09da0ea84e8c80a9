use std::fmt::Debug;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single semantic annotation, such as "this axis is a reduction axis" or "this array holds
/// boundary data".
///
/// A tag is identified by its name and may carry an optional payload. Tags are never mutated.
/// Equality, ordering and hashing are all by value.
///
/// Parsed and deserialized tags are both checked for a non-empty name without whitespace.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawTag")]
pub struct Tag {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<String>,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: None,
        }
    }

    pub fn with_payload(name: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: Some(payload.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }

    /// Whether this tag is of the given kind, i.e. has the given name regardless of payload.
    pub fn is_kind(&self, name: &str) -> bool {
        self.name == name
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.payload {
            Some(payload) => write!(f, "{}={}", self.name, payload),
            None => write!(f, "{}", self.name),
        }
    }
}

impl Debug for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tag({self})")
    }
}

impl From<&str> for Tag {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<(&str, &str)> for Tag {
    fn from(value: (&str, &str)) -> Self {
        Self::with_payload(value.0, value.1)
    }
}

#[derive(Error, Debug, PartialEq, Eq, Clone)]
#[non_exhaustive]
pub enum TagParseError {
    #[error("tag name must not be empty")]
    EmptyName,

    #[error("tag name {0:?} contains whitespace")]
    InvalidName(String),
}

fn check_name(name: &str) -> Result<(), TagParseError> {
    if name.is_empty() {
        return Err(TagParseError::EmptyName);
    }

    if name.chars().any(char::is_whitespace) {
        return Err(TagParseError::InvalidName(name.to_owned()));
    }

    Ok(())
}

/// Parses `name` or `name=payload`. Only the first `=` separates name from payload, and
/// surrounding whitespace is trimmed from both.
impl FromStr for Tag {
    type Err = TagParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, payload) = match s.split_once('=') {
            Some((name, payload)) => (name.trim(), Some(payload.trim())),
            None => (s.trim(), None),
        };
        check_name(name)?;

        Ok(match payload {
            Some(payload) => Self::with_payload(name, payload),
            None => Self::new(name),
        })
    }
}

#[derive(Deserialize)]
struct RawTag {
    name: String,
    #[serde(default)]
    payload: Option<String>,
}

impl TryFrom<RawTag> for Tag {
    type Error = TagParseError;

    fn try_from(value: RawTag) -> Result<Self, Self::Error> {
        check_name(&value.name)?;
        Ok(Self {
            name: value.name,
            payload: value.payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_tag() {
        let tag: Tag = "reduction".parse().unwrap();
        assert_eq!(tag, Tag::new("reduction"));
        assert_eq!(tag.payload(), None);
    }

    #[test]
    fn parse_tag_with_payload() {
        let tag: Tag = "layout=row=major".parse().unwrap();
        assert_eq!(tag.name(), "layout");
        assert_eq!(tag.payload(), Some("row=major"));
        assert_eq!(tag.to_string(), "layout=row=major");
    }

    #[test]
    fn parse_rejects_empty_name() {
        assert_eq!("=x".parse::<Tag>(), Err(TagParseError::EmptyName));
        assert_eq!("".parse::<Tag>(), Err(TagParseError::EmptyName));
    }

    #[test]
    fn parse_rejects_whitespace_in_name() {
        assert_eq!(
            "bad name".parse::<Tag>(),
            Err(TagParseError::InvalidName("bad name".to_owned()))
        );
    }

    #[test]
    fn parse_trims_name_and_payload() {
        assert_eq!(" a = b ".parse::<Tag>(), Ok(Tag::with_payload("a", "b")));
        assert_eq!("a=".parse::<Tag>(), Ok(Tag::with_payload("a", "")));
    }

    #[test]
    fn deserialize_checks_name() {
        let tag: Tag = serde_json::from_str(r#"{"name":"unroll","payload":"4"}"#).unwrap();
        assert_eq!(tag, Tag::with_payload("unroll", "4"));

        let err = serde_json::from_str::<Tag>(r#"{"name":""}"#).unwrap_err();
        assert!(err.to_string().contains("tag name must not be empty"));
        let err = serde_json::from_str::<Tag>(r#"{"name":"a b"}"#).unwrap_err();
        assert!(err.to_string().contains("contains whitespace"));
    }

    #[test]
    fn serialized_tags_deserialize() {
        let tag = Tag::with_payload("boundary", "left");
        let json = serde_json::to_string(&tag).unwrap();
        assert_eq!(json, r#"{"name":"boundary","payload":"left"}"#);
        assert_eq!(serde_json::from_str::<Tag>(&json).unwrap(), tag);
    }

    #[test]
    fn payload_is_part_of_identity() {
        assert_ne!(Tag::new("boundary"), Tag::with_payload("boundary", "left"));
        assert!(Tag::with_payload("boundary", "left").is_kind("boundary"));
    }
}
