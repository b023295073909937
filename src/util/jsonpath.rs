//! Path expressions over task results
//!
//! Grammar: `<source>.<segment>(.<segment>)*`
//! - `<source>`: `header` or `body`, selects which half of a [`TaskResult`]
//! - `<segment>`: `field`, `field[3]` (exact index) or `field[?]` (random element)
//! - `[0]` with no field name indexes the current value itself
//!
//! Empty segments (`body..a`) are discarded. Resolution is total: a missing
//! field, a wrong-typed value, an out-of-range index or a null intermediate
//! all yield `None` ("undefined"), never an error.

use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::Value;

use crate::error::FlowError;
use crate::store::TaskResult;

/// Which half of a task result a path starts from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultSource {
    Header,
    Body,
}

impl ResultSource {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "header" => Some(ResultSource::Header),
            "body" => Some(ResultSource::Body),
            _ => None,
        }
    }

    /// Traversal root for this source
    #[inline]
    pub fn select<'a>(&self, result: &'a TaskResult) -> &'a Value {
        match self {
            ResultSource::Header => &result.headers,
            ResultSource::Body => &result.body,
        }
    }
}

/// Bracketed array index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Index {
    At(usize),
    /// `[?]`: one element chosen uniformly at random
    Random,
}

/// A parsed path segment
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Object member access: .field
    Field(String),
    /// Member access followed by array index: .field[0] (field may be empty)
    Indexed { field: String, index: Index },
}

/// A parsed path expression
#[derive(Debug, Clone, PartialEq)]
pub struct PathExpr {
    pub source: ResultSource,
    pub segments: Vec<Segment>,
}

/// Parse a path expression
///
/// Examples:
/// - "body.token" → Body, [Field("token")]
/// - "body.a.b[1]" → Body, [Field("a"), Indexed { "b", At(1) }]
/// - "header.set-cookie[?]" → Header, [Indexed { "set-cookie", Random }]
pub fn parse(path: &str) -> Result<PathExpr, FlowError> {
    let invalid = |reason: &str| FlowError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    let mut parts = path.split('.');
    let source_token = parts.next().unwrap_or_default();
    let source = ResultSource::from_token(source_token)
        .ok_or_else(|| invalid("must start with 'header' or 'body'"))?;

    let mut segments = Vec::new();
    for part in parts.filter(|p| !p.is_empty()) {
        match part.find('[') {
            None => {
                if part.contains(']') {
                    return Err(invalid("unbalanced ']'"));
                }
                segments.push(Segment::Field(part.to_string()));
            }
            Some(bracket_pos) => {
                if !part.ends_with(']') {
                    return Err(invalid("index must close with ']'"));
                }
                let field = &part[..bracket_pos];
                let index_str = &part[bracket_pos + 1..part.len() - 1];
                let index = if index_str == "?" {
                    Index::Random
                } else {
                    index_str
                        .parse::<usize>()
                        .map(Index::At)
                        .map_err(|_| invalid("index must be a non-negative integer or '?'"))?
                };
                segments.push(Segment::Indexed {
                    field: field.to_string(),
                    index,
                });
            }
        }
    }

    Ok(PathExpr { source, segments })
}

/// Apply segments to a JSON value
pub fn apply(value: &Value, segments: &[Segment]) -> Option<Value> {
    apply_with_rng(value, segments, &mut rand::thread_rng())
}

/// Apply segments using the given RNG for `[?]`
pub fn apply_with_rng<R: Rng + ?Sized>(
    value: &Value,
    segments: &[Segment],
    rng: &mut R,
) -> Option<Value> {
    // Zero-clone traversal: references until the final value
    let mut current = value;

    for segment in segments {
        if current.is_null() {
            return None;
        }
        current = match segment {
            Segment::Field(name) => current.as_object()?.get(name)?,
            Segment::Indexed { field, index } => {
                let target = if field.is_empty() {
                    current
                } else {
                    current.as_object()?.get(field)?
                };
                let items = target.as_array()?;
                match index {
                    Index::At(i) => items.get(*i)?,
                    Index::Random => items.choose(rng)?,
                }
            }
        };
    }

    Some(current.clone())
}

/// Resolve a path against a task result; `None` means undefined
pub fn resolve(result: &TaskResult, path: &str) -> Option<Value> {
    let expr = parse(path).ok()?;
    apply(expr.source.select(result), &expr.segments)
}

/// JSON type name for error messages
pub fn value_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
