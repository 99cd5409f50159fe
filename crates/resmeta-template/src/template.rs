//! Address template parsing and construction
//!
//! Grammar:
//!
//! ```text
//! template = "/" | [ "opt:/" ] segment *( "/" segment )
//! segment  = variable | part "=" part
//! part     = variable | "*" | literal
//! variable = "{" name "}"
//! ```
//!
//! Empty segments are skipped, so a missing or doubled leading `/` parses to
//! the same template. The normalized form always starts with `/` and the
//! optional form with `opt://`. Literal values are escaped the same way as
//! in the string form of a [`ResourceAddress`](resmeta_dmr::ResourceAddress).

use crate::error::{Result, TemplateError};
use resmeta_dmr::model::WILDCARD;
use resmeta_dmr::{escape_value, unescape_value};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

const OPTIONAL_PREFIX: &str = "opt:/";

/// One segment of an address template
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Token {
    key: Option<String>,
    value: String,
}

impl Token {
    /// A `key=value` token
    pub fn keyed(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            value: value.into(),
        }
    }

    /// A bare `{variable}` token
    pub fn bare(value: impl Into<String>) -> Self {
        Self {
            key: None,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub const fn has_key(&self) -> bool {
        self.key.is_some()
    }

    /// Check for `key=*`
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.has_key() && self.value == WILDCARD
    }

    pub(crate) fn parse(segment: &str, template: &str) -> Result<Self> {
        let mut parts = segment.split('=');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(bare), None, _) => {
                if variable_name(bare).is_none() {
                    return Err(TemplateError::parse(
                        template,
                        format!("segment '{bare}' is neither key=value nor a {{variable}}"),
                    ));
                }
                validate_part(bare, template)?;
                Ok(Self::bare(bare))
            }
            (Some(key), Some(value), None) => {
                if key.is_empty() || value.is_empty() {
                    return Err(TemplateError::parse(
                        template,
                        format!("empty key or value in '{segment}'"),
                    ));
                }
                if key == WILDCARD {
                    return Err(TemplateError::parse(
                        template,
                        format!("wildcard used as key in '{segment}'"),
                    ));
                }
                validate_part(key, template)?;
                validate_part(value, template)?;
                Ok(Self::keyed(key, unescape_value(value)))
            }
            _ => Err(TemplateError::parse(
                template,
                format!("more than one '=' in '{segment}'"),
            )),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "{key}={}", escape_value(&self.value)),
            None => f.write_str(&self.value),
        }
    }
}

/// Returns the name of a `{name}` placeholder
pub(crate) fn variable_name(part: &str) -> Option<&str> {
    part.strip_prefix('{')
        .and_then(|p| p.strip_suffix('}'))
        .filter(|name| !name.is_empty())
}

fn validate_part(part: &str, template: &str) -> Result<()> {
    if !part.contains(['{', '}']) {
        return Ok(());
    }
    match variable_name(part) {
        Some(name) if !name.contains(['{', '}']) => Ok(()),
        _ if part == "{}" => Err(TemplateError::parse(template, "empty variable '{}'")),
        _ => Err(TemplateError::parse(
            template,
            format!("unbalanced braces in '{part}'"),
        )),
    }
}

/// Generic, possibly wildcarded or parameterized path into the management
/// model. Immutable: every operation returns a new template.
#[derive(Clone, Debug)]
pub struct AddressTemplate {
    /// Tokens joined by `/`, without leading separator or optional prefix
    template: String,
    tokens: Vec<Token>,
    optional: bool,
}

impl AddressTemplate {
    /// The empty template of the model root
    pub const ROOT: Self = Self {
        template: String::new(),
        tokens: Vec::new(),
        optional: false,
    };

    /// Parse a template
    pub fn parse(text: &str) -> Result<Self> {
        if text == "/" {
            return Ok(Self::ROOT);
        }
        let (optional, body) = match text.strip_prefix(OPTIONAL_PREFIX) {
            Some(body) => (true, body),
            None => (false, text),
        };
        let tokens = body
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| Token::parse(segment, text))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_tokens(tokens, optional))
    }

    pub(crate) fn from_tokens(tokens: Vec<Token>, optional: bool) -> Self {
        let template = tokens
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("/");
        Self {
            template,
            tokens,
            optional,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.optional
    }

    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Same template with the optional marker set
    #[must_use]
    pub fn optional(&self) -> Self {
        Self {
            optional: true,
            ..self.clone()
        }
    }

    /// Append a template given as text. A leading `/` on `other` is
    /// optional; exactly one separator ends up between both parts.
    pub fn append(&self, other: &str) -> Result<Self> {
        let other = Self::parse(other.strip_prefix(OPTIONAL_PREFIX).unwrap_or(other))?;
        Ok(self.append_template(&other))
    }

    #[must_use]
    pub fn append_template(&self, other: &Self) -> Self {
        let mut tokens = self.tokens.clone();
        tokens.extend(other.tokens.iter().cloned());
        Self::from_tokens(tokens, self.optional)
    }

    /// Tokens `from..to`, with slice semantics
    pub fn sub_template(&self, from: usize, to: usize) -> Result<Self> {
        let size = self.tokens.len();
        let slice = self
            .tokens
            .get(from..to)
            .ok_or(TemplateError::OutOfRange { from, to, size })?;
        Ok(Self::from_tokens(slice.to_vec(), self.optional))
    }

    /// Template without the last token. The parent of root is root.
    #[must_use]
    pub fn get_parent(&self) -> Self {
        if self.tokens.is_empty() {
            return self.clone();
        }
        Self::from_tokens(
            self.tokens[..self.tokens.len() - 1].to_vec(),
            self.optional,
        )
    }

    /// Replace `key=*` tokens left to right with the given values. Surplus
    /// values are ignored, missing values leave the remaining wildcards.
    #[must_use]
    pub fn replace_wildcards<S: AsRef<str>>(&self, values: &[S]) -> Self {
        let mut values = values.iter();
        let tokens = self
            .tokens
            .iter()
            .map(|token| match (&token.key, token.is_wildcard()) {
                (Some(key), true) => values
                    .next()
                    .map_or_else(|| token.clone(), |v| Token::keyed(key.clone(), v.as_ref())),
                _ => token.clone(),
            })
            .collect();
        Self::from_tokens(tokens, self.optional)
    }

    /// Key of the first token, `None` if it is a bare variable
    #[must_use]
    pub fn first_name(&self) -> Option<&str> {
        self.tokens.first().and_then(Token::key)
    }

    /// Value of the first token, `None` if it is a bare variable
    #[must_use]
    pub fn first_value(&self) -> Option<&str> {
        self.tokens
            .first()
            .filter(|t| t.has_key())
            .map(Token::value)
    }

    /// Key of the last token, `None` if it is a bare variable
    #[must_use]
    pub fn last_name(&self) -> Option<&str> {
        self.tokens.last().and_then(Token::key)
    }

    /// Value of the last token, `None` if it is a bare variable
    #[must_use]
    pub fn last_value(&self) -> Option<&str> {
        self.tokens.last().filter(|t| t.has_key()).map(Token::value)
    }

    /// Resource type: the key of the last token
    #[must_use]
    pub fn resource_type(&self) -> Option<&str> {
        self.last_name()
    }
}

impl fmt::Display for AddressTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.optional {
            f.write_str(OPTIONAL_PREFIX)?;
        }
        write!(f, "/{}", self.template)
    }
}

impl FromStr for AddressTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl PartialEq for AddressTemplate {
    fn eq(&self, other: &Self) -> bool {
        self.optional == other.optional && self.template == other.template
    }
}

impl Eq for AddressTemplate {}

impl Hash for AddressTemplate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.template.hash(state);
        self.optional.hash(state);
    }
}

impl PartialOrd for AddressTemplate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AddressTemplate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.template
            .cmp(&other.template)
            .then(self.optional.cmp(&other.optional))
    }
}

impl serde::Serialize for AddressTemplate {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for AddressTemplate {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(text: &str) -> AddressTemplate {
        AddressTemplate::parse(text).unwrap()
    }

    #[test]
    fn test_root() {
        assert_eq!(t("/"), AddressTemplate::ROOT);
        assert_eq!(t(""), AddressTemplate::ROOT);
        assert!(AddressTemplate::ROOT.is_empty());
        assert_eq!(AddressTemplate::ROOT.to_string(), "/");
    }

    #[test]
    fn test_leading_separator_normalized() {
        assert_eq!(t("/a=b/c=d").to_string(), "/a=b/c=d");
        assert_eq!(t("a=b/c=d").to_string(), "/a=b/c=d");
        assert_eq!(t("a=b/c=d"), t("/a=b/c=d"));
        assert_eq!(t("//a=b//c=d/").to_string(), "/a=b/c=d");
    }

    #[test]
    fn test_round_trip() {
        for text in [
            "/{a}/b=c",
            "/a=b/b={c}",
            "/{selected.profile}/subsystem=mail",
            "/host=*/server-config=*",
            "/{a}/b=c/{d}=e/f=g",
            "opt://a=b",
            "/a=b/c=%2F/d=e",
        ] {
            assert_eq!(t(text).to_string(), text);
        }
    }

    #[test]
    fn test_escaped_values() {
        let template = t("/subsystem=undertow/location=%2F");
        assert_eq!(template.last_value(), Some("/"));

        let built = AddressTemplate::from_tokens(
            vec![Token::keyed("subsystem", "undertow"), Token::keyed("location", "/a=b")],
            false,
        );
        assert_eq!(built.to_string(), "/subsystem=undertow/location=%2Fa%3Db");
        assert_eq!(t(&built.to_string()), built);
    }

    #[test]
    fn test_optional() {
        assert!(!t("a=b").is_optional());
        let at = t("opt://a=b");
        assert!(at.is_optional());
        assert_eq!(at.size(), 1);
        assert_ne!(at, t("a=b"));
        assert_eq!(t("a=b").optional(), at);
    }

    #[test]
    fn test_parse_rejections() {
        for text in [
            "a=b=c",
            "/a=/c=d",
            "/=b",
            "/{a/b=c",
            "/a=b}",
            "/{}",
            "/a={}",
            "/subsystem",
            "/*=b",
            "/a={b}c",
        ] {
            assert!(
                matches!(AddressTemplate::parse(text), Err(TemplateError::Parse { .. })),
                "{text} should be rejected"
            );
        }
    }

    #[test]
    fn test_first_and_last() {
        let root = AddressTemplate::ROOT;
        assert_eq!(root.first_name(), None);
        assert_eq!(root.first_value(), None);
        assert_eq!(root.last_name(), None);
        assert_eq!(root.last_value(), None);

        let at = t("a=b");
        assert_eq!(at.first_name(), Some("a"));
        assert_eq!(at.first_value(), Some("b"));
        assert_eq!(at.last_name(), Some("a"));
        assert_eq!(at.last_value(), Some("b"));

        let at = t("a=b/{c}");
        assert_eq!(at.first_name(), Some("a"));
        assert_eq!(at.first_value(), Some("b"));
        assert_eq!(at.last_name(), None);
        assert_eq!(at.last_value(), None);

        let at = t("{a}/b={c}");
        assert_eq!(at.first_name(), None);
        assert_eq!(at.last_name(), Some("b"));
        assert_eq!(at.last_value(), Some("{c}"));
        assert_eq!(at.resource_type(), Some("b"));
    }

    #[test]
    fn test_append() {
        assert_eq!(t("a=b").append("c=d").unwrap().to_string(), "/a=b/c=d");
        assert_eq!(t("a=b").append("/c=d").unwrap().to_string(), "/a=b/c=d");
        assert_eq!(t("a=b").append("{c}").unwrap().to_string(), "/a=b/{c}");
        assert_eq!(t("a=b").append("c={d}").unwrap().to_string(), "/a=b/c={d}");
        assert_eq!(AddressTemplate::ROOT.append("c=d").unwrap(), t("c=d"));
        assert!(t("opt://a=b").append("c=d").unwrap().is_optional());
        assert!(t("a=b").append("c").is_err());
    }

    #[test]
    fn test_parent() {
        assert_eq!(t("/").get_parent(), t("/"));
        assert_eq!(t("/a=b").get_parent(), t("/"));

        let at = t("{a}/b=c/{d}=e/f=g");
        assert_eq!(at.get_parent(), t("{a}/b=c/{d}=e"));
        assert_eq!(at.get_parent().get_parent(), t("{a}/b=c"));
        assert_eq!(at.get_parent().get_parent().get_parent(), t("{a}"));
        assert_eq!(
            at.get_parent().get_parent().get_parent().get_parent(),
            t("/")
        );
    }

    #[test]
    fn test_sub_template() {
        let at = t("{a}/b=c/{d}=e/f=g");
        assert!(at.sub_template(0, 0).unwrap().is_empty());
        assert!(at.sub_template(2, 2).unwrap().is_empty());
        assert_eq!(at.sub_template(1, 2).unwrap().to_string(), "/b=c");
        assert_eq!(at.sub_template(2, 4).unwrap().to_string(), "/{d}=e/f=g");
        assert_eq!(at.sub_template(0, 4).unwrap(), at);
    }

    #[test]
    fn test_sub_template_out_of_range() {
        let at = t("a=b/c=d");
        assert_eq!(
            at.sub_template(0, 3),
            Err(TemplateError::OutOfRange {
                from: 0,
                to: 3,
                size: 2
            })
        );
        assert!(at.sub_template(2, 1).is_err());
    }

    #[test]
    fn test_replace_wildcards() {
        let none: [&str; 0] = [];
        assert_eq!(t("a=b").replace_wildcards(&none).to_string(), "/a=b");
        assert_eq!(t("a=b").replace_wildcards(&["foo"]).to_string(), "/a=b");
        assert_eq!(
            t("{a}/b={c}").replace_wildcards(&["foo"]).to_string(),
            "/{a}/b={c}"
        );
        assert_eq!(t("a=*/c=*").replace_wildcards(&["b"]).to_string(), "/a=b/c=*");
        assert_eq!(
            t("a=*/c=*").replace_wildcards(&["b", "d"]).to_string(),
            "/a=b/c=d"
        );
        assert_eq!(
            t("a=*/c=*").replace_wildcards(&["b", "d", "foo"]).to_string(),
            "/a=b/c=d"
        );
        assert_eq!(
            t("a=*/c={d}").replace_wildcards(&["b", "d", "foo"]).to_string(),
            "/a=b/c={d}"
        );
    }

    #[test]
    fn test_serde_as_string() {
        let at = t("opt://{selected.host}/subsystem=jmx");
        let json = serde_json::to_string(&at).unwrap();
        assert_eq!(json, "\"opt://{selected.host}/subsystem=jmx\"");
        let back: AddressTemplate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, at);
    }
}
