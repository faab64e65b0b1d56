//! Path normalization and segment matching.
//!
//! # Responsibilities
//! - Normalize URL paths into ordered, lower-cased segment sequences
//! - Parse route patterns into typed segments (literal, `{param}`, `*`)
//! - Compare a requested path against a route pattern
//! - Compute route priority
//!
//! # Design Decisions
//! - The root path is represented by the single sentinel token `/`
//! - Matching is case-insensitive because both sides are lower-cased up front
//! - The root sentinel never satisfies a `{param}` segment
//! - No regex: segment-wise comparison only

use thiserror::Error;

/// Sentinel token standing for the root path.
pub const ROOT: &str = "/";

/// One segment of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Exact (lower-cased) text.
    Literal(String),
    /// Named parameter, `{name}`. Matches any single token.
    Param(String),
    /// `*`, matches the remainder of the path.
    CatchAll,
}

impl Segment {
    pub fn is_param(&self) -> bool {
        matches!(self, Segment::Param(_))
    }

    pub fn is_catch_all(&self) -> bool {
        matches!(self, Segment::CatchAll)
    }
}

/// A route pattern that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidRouteError {
    #[error("route pattern is empty")]
    Empty,

    #[error("unbalanced braces in segment '{segment}' of route '{pattern}'")]
    UnbalancedBraces { pattern: String, segment: String },

    #[error("empty parameter name in route '{0}'")]
    EmptyParam(String),

    #[error("'*' must be a whole segment in route '{0}'")]
    MisplacedCatchAll(String),

    #[error("'*' must be the last segment in route '{0}'")]
    CatchAllNotLast(String),

    #[error("empty segment in route '{0}'")]
    EmptySegment(String),
}

/// Normalize a path into its segment tokens.
///
/// Lower-cases, strips a single leading and trailing `/` and splits on `/`.
/// `""` and `"/"` both yield `["/"]`.
pub fn normalize(path: &str) -> Vec<String> {
    let lowered = path.to_lowercase();
    let mut trimmed = lowered.as_str();
    trimmed = trimmed.strip_prefix('/').unwrap_or(trimmed);
    trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);

    if trimmed.is_empty() {
        return vec![ROOT.to_string()];
    }

    trimmed.split('/').map(str::to_string).collect()
}

/// Returns true if the tokens are the root sentinel.
pub fn is_root(tokens: &[String]) -> bool {
    tokens.len() == 1 && tokens[0] == ROOT
}

/// Parse a route pattern such as `/user/{id}` or `/docs/*`.
pub fn parse_pattern(pattern: &str) -> Result<Vec<Segment>, InvalidRouteError> {
    let pattern = pattern.trim();
    if pattern.is_empty() {
        return Err(InvalidRouteError::Empty);
    }

    let tokens = normalize(pattern);
    if is_root(&tokens) {
        return Ok(vec![Segment::Literal(ROOT.to_string())]);
    }

    let last = tokens.len() - 1;
    tokens
        .into_iter()
        .enumerate()
        .map(|(index, token)| parse_segment(pattern, token, index == last))
        .collect()
}

fn parse_segment(pattern: &str, token: String, is_last: bool) -> Result<Segment, InvalidRouteError> {
    if token.is_empty() {
        return Err(InvalidRouteError::EmptySegment(pattern.to_string()));
    }

    if token == "*" {
        if !is_last {
            return Err(InvalidRouteError::CatchAllNotLast(pattern.to_string()));
        }
        return Ok(Segment::CatchAll);
    }

    if token.contains('*') {
        return Err(InvalidRouteError::MisplacedCatchAll(pattern.to_string()));
    }

    let opens = token.matches('{').count();
    let closes = token.matches('}').count();

    if opens == 0 && closes == 0 {
        return Ok(Segment::Literal(token));
    }

    if opens != 1 || closes != 1 || !token.starts_with('{') || !token.ends_with('}') {
        return Err(InvalidRouteError::UnbalancedBraces {
            pattern: pattern.to_string(),
            segment: token,
        });
    }

    let name = token[1..token.len() - 1].trim();
    if name.is_empty() {
        return Err(InvalidRouteError::EmptyParam(pattern.to_string()));
    }

    Ok(Segment::Param(name.to_string()))
}

/// Compare request tokens against a parsed pattern.
///
/// A pattern shorter than the request never matches. A longer pattern
/// matches once every request token has been consumed; its unfilled
/// parameters read as empty strings.
pub fn matches(request: &[String], pattern: &[Segment]) -> bool {
    let at_root = is_root(request);

    for (index, token) in request.iter().enumerate() {
        let Some(segment) = pattern.get(index) else {
            return false;
        };

        match segment {
            Segment::Param(_) if !at_root => continue,
            Segment::Param(_) => return false,
            Segment::CatchAll => return true,
            Segment::Literal(literal) => {
                if literal != token {
                    return false;
                }
            }
        }
    }

    true
}

/// Priority of a route: `/` count, plus 10 for a catch-all, minus one per parameter.
pub fn priority(pattern: &str, segments: &[Segment]) -> i32 {
    let slashes = pattern.matches('/').count() as i32;
    let catch_all = if pattern.contains('*') { 10 } else { 0 };
    let params = segments.iter().filter(|s| s.is_param()).count() as i32;
    slashes + catch_all - params
}

/// Indices of the parameter segments, in pattern order.
pub fn param_positions(segments: &[Segment]) -> Vec<usize> {
    segments
        .iter()
        .enumerate()
        .filter(|(_, s)| s.is_param())
        .map(|(i, _)| i)
        .collect()
}
