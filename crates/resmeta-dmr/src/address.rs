//! Concrete resource addresses
//!
//! A [`ResourceAddress`] is an ordered list of resolved `key=value` segments.
//! Its string form `/key=value/key=value` (root is `/`) is used as the key of
//! the persistent metadata tables; its model form is the list of single-entry
//! objects the management server embeds in list results and access-control
//! exceptions.
//!
//! Values may contain `/`, `=` and `%`. The string form escapes them as
//! `%2F`, `%3D` and `%25`; the model form carries them verbatim.

use crate::error::ModelError;
use crate::model::WILDCARD;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Escape a value for the string form of an address or template
#[must_use]
pub fn escape_value(value: &str) -> Cow<'_, str> {
    if !value.contains(['%', '/', '=']) {
        return Cow::Borrowed(value);
    }
    let mut escaped = String::with_capacity(value.len() + 4);
    for c in value.chars() {
        match c {
            '%' => escaped.push_str("%25"),
            '/' => escaped.push_str("%2F"),
            '=' => escaped.push_str("%3D"),
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Reverse [`escape_value`]. Other `%` sequences are kept as they are.
#[must_use]
pub fn unescape_value(text: &str) -> Cow<'_, str> {
    if !text.contains('%') {
        return Cow::Borrowed(text);
    }
    let mut unescaped = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('%') {
        unescaped.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let decoded = match tail.get(1..3) {
            Some(code) if code.eq_ignore_ascii_case("2F") => Some('/'),
            Some(code) if code.eq_ignore_ascii_case("3D") => Some('='),
            Some("25") => Some('%'),
            _ => None,
        };
        match decoded {
            Some(c) => {
                unescaped.push(c);
                rest = &tail[3..];
            }
            None => {
                unescaped.push('%');
                rest = &tail[1..];
            }
        }
    }
    unescaped.push_str(rest);
    Cow::Owned(unescaped)
}

/// A resolved `key=value` pair
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Segment {
    pub key: String,
    pub value: String,
}

impl Segment {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Check if the value is the wildcard `*`
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.value == WILDCARD
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, escape_value(&self.value))
    }
}

/// Concrete address of a resource in the management model
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceAddress {
    segments: Vec<Segment>,
}

impl ResourceAddress {
    /// The empty address of the model root
    #[must_use]
    pub const fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    #[must_use]
    pub const fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Append a segment
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.segments.push(Segment::new(key, value));
        self
    }

    /// Copy of this address extended by one segment
    #[must_use]
    pub fn child(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut child = self.clone();
        child.add(key, value);
        child
    }

    /// Address without the last segment. The parent of root is root.
    #[must_use]
    pub fn parent(&self) -> Self {
        let mut segments = self.segments.clone();
        segments.pop();
        Self { segments }
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.segments.iter()
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[must_use]
    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// Check if any segment carries the wildcard value
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.segments.iter().any(Segment::is_wildcard)
    }

    /// Check if `self` equals `other` or lies below it
    #[must_use]
    pub fn starts_with(&self, other: &Self) -> bool {
        self.segments.starts_with(&other.segments)
    }

    /// Check if `self` lies at or below `pattern`, where `*` values of
    /// `pattern` match any value
    #[must_use]
    pub fn matches_prefix(&self, pattern: &Self) -> bool {
        self.len() >= pattern.len()
            && self.iter().zip(pattern.iter()).all(|(segment, p)| {
                segment.key == p.key && (p.is_wildcard() || segment.value == p.value)
            })
    }

    /// Model form: `[{"key": "value"}, ...]`
    #[must_use]
    pub fn to_model(&self) -> Value {
        Value::Array(
            self.segments
                .iter()
                .map(|s| {
                    let mut entry = Map::new();
                    entry.insert(s.key.clone(), Value::String(s.value.clone()));
                    Value::Object(entry)
                })
                .collect(),
        )
    }

    /// Parse the model form. `null` is the root address.
    pub fn from_model(model: &Value) -> Result<Self, ModelError> {
        let entries = match model {
            Value::Null => return Ok(Self::root()),
            Value::Array(entries) => entries,
            other => {
                return Err(ModelError::unexpected_shape(format!(
                    "address must be a list, got {other}"
                )));
            }
        };

        let mut segments = Vec::with_capacity(entries.len());
        for entry in entries {
            let object = entry.as_object().filter(|o| o.len() == 1).ok_or_else(|| {
                ModelError::unexpected_shape(format!(
                    "address segment must be a single property, got {entry}"
                ))
            })?;
            for (key, value) in object {
                let value = value.as_str().ok_or_else(|| {
                    ModelError::unexpected_shape(format!(
                        "address value of '{key}' must be a string, got {value}"
                    ))
                })?;
                segments.push(Segment::new(key.clone(), value));
            }
        }
        Ok(Self { segments })
    }
}

impl fmt::Display for ResourceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for ResourceAddress {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut segments = Vec::new();
        for part in s.split('/').filter(|p| !p.is_empty()) {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| ModelError::invalid_address(s, format!("'{part}' is not key=value")))?;
            if key.is_empty() {
                return Err(ModelError::invalid_address(s, format!("empty key in '{part}'")));
            }
            segments.push(Segment::new(key, unescape_value(value)));
        }
        Ok(Self { segments })
    }
}

impl TryFrom<String> for ResourceAddress {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResourceAddress> for String {
    fn from(address: ResourceAddress) -> Self {
        address.to_string()
    }
}

impl<'a> IntoIterator for &'a ResourceAddress {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

impl FromIterator<Segment> for ResourceAddress {
    fn from_iter<T: IntoIterator<Item = Segment>>(iter: T) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_root_display() {
        assert_eq!(ResourceAddress::root().to_string(), "/");
        assert!(ResourceAddress::root().is_root());
        assert_eq!(ResourceAddress::root().parent(), ResourceAddress::root());
    }

    #[test]
    fn test_parse_and_display() {
        let address: ResourceAddress = "subsystem=mail/mail-session=default".parse().unwrap();
        assert_eq!(address.len(), 2);
        assert_eq!(address.to_string(), "/subsystem=mail/mail-session=default");
        assert_eq!(address.parent().to_string(), "/subsystem=mail");
        assert_eq!(address.last().unwrap().value, "default");
    }

    #[test]
    fn test_parse_rejects_bare_segment() {
        assert!("/subsystem".parse::<ResourceAddress>().is_err());
        assert!("/=mail".parse::<ResourceAddress>().is_err());
    }

    #[test]
    fn test_model_form() {
        let address: ResourceAddress = "/profile=full/subsystem=mail".parse().unwrap();
        let model = address.to_model();
        assert_eq!(model, json!([{"profile": "full"}, {"subsystem": "mail"}]));
        assert_eq!(ResourceAddress::from_model(&model).unwrap(), address);
        assert_eq!(
            ResourceAddress::from_model(&Value::Null).unwrap(),
            ResourceAddress::root()
        );
    }

    #[test]
    fn test_from_model_rejects_multi_key_segment() {
        let err = ResourceAddress::from_model(&json!([{"a": "b", "c": "d"}])).unwrap_err();
        assert!(matches!(err, ModelError::UnexpectedShape(_)));
    }

    #[test]
    fn test_wildcard_and_prefix() {
        let parent: ResourceAddress = "/subsystem=mail".parse().unwrap();
        let child = parent.child("mail-session", "*");
        assert!(child.is_wildcard());
        assert!(!parent.is_wildcard());
        assert!(child.starts_with(&parent));
        assert!(!parent.starts_with(&child));
    }

    #[test]
    fn test_matches_prefix() {
        let pattern: ResourceAddress = "/profile=*/subsystem=mail".parse().unwrap();
        let full: ResourceAddress = "/profile=full/subsystem=mail/mail-session=default"
            .parse()
            .unwrap();
        assert!(full.matches_prefix(&pattern));
        assert!(full.parent().matches_prefix(&pattern));
        assert!(!full.parent().parent().matches_prefix(&pattern));
        assert!(!"/profile=full/subsystem=jmx"
            .parse::<ResourceAddress>()
            .unwrap()
            .matches_prefix(&pattern));
        assert!(full.matches_prefix(&ResourceAddress::root()));
    }

    #[test]
    fn test_escaped_values() {
        let address = ResourceAddress::root()
            .child("subsystem", "undertow")
            .child("location", "/")
            .child("filter-ref", "a=b%c");
        let text = address.to_string();
        assert_eq!(text, "/subsystem=undertow/location=%2F/filter-ref=a%3Db%25c");
        let back: ResourceAddress = text.parse().unwrap();
        assert_eq!(back, address);
        assert_eq!(back.last().unwrap().value, "a=b%c");
        assert_eq!(address.to_model()[1], json!({"location": "/"}));
    }

    #[test]
    fn test_unescape_keeps_unknown_sequences() {
        assert_eq!(unescape_value("100%"), "100%");
        assert_eq!(unescape_value("%41%2f"), "%41/");
        assert_eq!(escape_value("plain"), "plain");
    }

    #[test]
    fn test_serde_as_string() {
        let address: ResourceAddress = "/host=primary".parse().unwrap();
        let text = serde_json::to_string(&address).unwrap();
        assert_eq!(text, "\"/host=primary\"");
        let back: ResourceAddress = serde_json::from_str(&text).unwrap();
        assert_eq!(back, address);
    }
}
