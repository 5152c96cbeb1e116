//! Expectation value objects and their JSON wire format.
//!
//! An expectation pairs declarative request conditions with a response
//! definition. Conditions accept two JSON spellings: the canonical
//! `{"matcherKind": "value"}` object, and a bare string shorthand that
//! stands for `isEqualTo` (`isSameString` for the method, which is
//! matched case-insensitively in practice).

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};

/// Matcher kinds understood by the engine.
///
/// The JSON names are part of the wire format and must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatcherKind {
    #[serde(rename = "isEqualTo")]
    EqualTo,
    #[serde(rename = "isSameString")]
    SameString,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "matches")]
    Matches,
    #[serde(rename = "isSameJsonObject")]
    SameJsonObject,
}

impl MatcherKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatcherKind::EqualTo => "isEqualTo",
            MatcherKind::SameString => "isSameString",
            MatcherKind::Contains => "contains",
            MatcherKind::Matches => "matches",
            MatcherKind::SameJsonObject => "isSameJsonObject",
        }
    }
}

impl std::fmt::Display for MatcherKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A matcher-kind tag plus the configured expected value.
///
/// The value is kept as a string; matchers interpret it verbatim or as a
/// pattern depending on their kind. Non-string JSON values (useful for
/// `isSameJsonObject`) are stored in their serialized form.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub matcher: MatcherKind,
    pub value: String,
}

impl Condition {
    pub fn new(matcher: MatcherKind, value: impl Into<String>) -> Self {
        Self {
            matcher,
            value: value.into(),
        }
    }
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.matcher.as_str(), &self.value)?;
        map.end()
    }
}

/// Raw deserialization form of a condition: bare string shorthand or a
/// single-entry `{matcherKind: value}` object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum ConditionRaw {
    Shorthand(String),
    Tagged(HashMap<MatcherKind, serde_json::Value>),
}

impl ConditionRaw {
    fn into_condition(self, shorthand_kind: MatcherKind) -> Result<Condition, String> {
        match self {
            ConditionRaw::Shorthand(value) => Ok(Condition::new(shorthand_kind, value)),
            ConditionRaw::Tagged(map) => {
                if map.len() != 1 {
                    return Err(format!(
                        "a condition must declare exactly one matcher, got {}",
                        map.len()
                    ));
                }
                let (matcher, value) = map.into_iter().next().expect("len checked above");
                let value = match value {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                Ok(Condition { matcher, value })
            }
        }
    }
}

/// Per-part request conditions. An absent condition means "don't care";
/// all present conditions must hold for a match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RequestConditionsRaw")]
pub struct RequestConditions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<Condition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<Condition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Condition>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, Condition>,
    /// Required scenario state; only valid together with a scenario name
    /// on the enclosing expectation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario_state: Option<String>,
}

impl RequestConditions {
    /// True when no condition at all was declared.
    pub fn is_empty(&self) -> bool {
        self.method.is_none()
            && self.url.is_none()
            && self.body.is_none()
            && self.headers.is_empty()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RequestConditionsRaw {
    #[serde(default)]
    method: Option<ConditionRaw>,
    #[serde(default)]
    url: Option<ConditionRaw>,
    #[serde(default)]
    body: Option<ConditionRaw>,
    #[serde(default)]
    headers: BTreeMap<String, ConditionRaw>,
    #[serde(default)]
    scenario_state: Option<String>,
}

impl TryFrom<RequestConditionsRaw> for RequestConditions {
    type Error = String;

    fn try_from(raw: RequestConditionsRaw) -> Result<Self, Self::Error> {
        // Bare-string methods compare case-insensitively, everything else
        // defaults to exact equality.
        let method = raw
            .method
            .map(|c| c.into_condition(MatcherKind::SameString))
            .transpose()?;
        let url = raw
            .url
            .map(|c| c.into_condition(MatcherKind::EqualTo))
            .transpose()?;
        let body = raw
            .body
            .map(|c| c.into_condition(MatcherKind::EqualTo))
            .transpose()?;
        let headers = raw
            .headers
            .into_iter()
            .map(|(name, c)| Ok((name, c.into_condition(MatcherKind::EqualTo)?)))
            .collect::<Result<BTreeMap<_, _>, String>>()?;
        Ok(RequestConditions {
            method,
            url,
            body,
            headers,
            scenario_state: raw.scenario_state,
        })
    }
}

/// Response policy of an expectation.
///
/// Plain responses carry status/headers/body; a `proxyTo` target (or the
/// `isProxy` flag) selects the proxy strategy instead. Bodies prefixed
/// with the binary marker carry base64-encoded content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseDefinition {
    #[serde(
        default = "default_status_code",
        deserialize_with = "deserialize_status_code"
    )]
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_proxy: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_to: Option<String>,
    /// Artificial latency applied before the response is sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_millis: Option<u64>,
}

impl Default for ResponseDefinition {
    fn default() -> Self {
        Self {
            status_code: default_status_code(),
            headers: HashMap::new(),
            body: None,
            is_proxy: false,
            proxy_to: None,
            delay_millis: None,
        }
    }
}

impl ResponseDefinition {
    /// True when this definition routes to the proxy strategy.
    pub fn is_proxied(&self) -> bool {
        self.is_proxy || self.proxy_to.is_some()
    }
}

pub fn default_status_code() -> u16 {
    200
}

/// Deserialize statusCode from either a number or a string.
fn deserialize_status_code<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .and_then(|n| u16::try_from(n).ok())
            .ok_or_else(|| D::Error::custom("invalid status code number")),
        serde_json::Value::String(s) => s
            .parse::<u16>()
            .map_err(|_| D::Error::custom(format!("invalid status code string: {s}"))),
        _ => Err(D::Error::custom("statusCode must be a number or string")),
    }
}

/// A registered rule: request conditions paired with a response policy,
/// optionally gated on (and transitioning) a named scenario.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expectation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_scenario_state: Option<String>,
    #[serde(default)]
    pub request: RequestConditions,
    #[serde(default)]
    pub response: ResponseDefinition,
}
