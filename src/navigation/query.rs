//! Query string parsing.

use std::collections::BTreeMap;

use serde::Serialize;

/// A query value: single, or a list when the key repeats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QueryValue {
    Single(String),
    Multiple(Vec<String>),
}

impl QueryValue {
    /// First value for the key.
    pub fn first(&self) -> &str {
        match self {
            QueryValue::Single(v) => v,
            QueryValue::Multiple(values) => values.first().map_or("", String::as_str),
        }
    }

    pub fn all(&self) -> Vec<&str> {
        match self {
            QueryValue::Single(v) => vec![v.as_str()],
            QueryValue::Multiple(values) => values.iter().map(String::as_str).collect(),
        }
    }

    fn append(&mut self, value: String) {
        match self {
            QueryValue::Single(first) => {
                *self = QueryValue::Multiple(vec![std::mem::take(first), value]);
            }
            QueryValue::Multiple(values) => values.push(value),
        }
    }
}

/// Decoded query parameters, ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QueryParams(BTreeMap<String, QueryValue>);

impl QueryParams {
    /// Parse `k=v&k=v` (no leading `?`). `+` decodes to a space.
    pub fn parse(query: &str) -> Self {
        let mut params: BTreeMap<String, QueryValue> = BTreeMap::new();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if key.is_empty() {
                continue;
            }
            match params.get_mut(key.as_ref()) {
                Some(existing) => existing.append(value.into_owned()),
                None => {
                    params.insert(key.into_owned(), QueryValue::Single(value.into_owned()));
                }
            }
        }
        Self(params)
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &QueryValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Split a raw URL into its normalized path and query text.
///
/// Drops the `#fragment`, strips one trailing `/` unless the path is `/`,
/// and maps an empty path to `/`.
pub fn split_url(raw: &str) -> (String, String) {
    let without_fragment = raw.split_once('#').map_or(raw, |(before, _)| before);
    let (path, query) = without_fragment
        .split_once('?')
        .unwrap_or((without_fragment, ""));

    let path = match path.trim() {
        "" | "/" => "/".to_string(),
        p => p.strip_suffix('/').unwrap_or(p).to_string(),
    };

    (path, query.to_string())
}
