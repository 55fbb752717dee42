//! JSON Patch (RFC 6902) applied to product documents.
//!
//! Patches are applied to a copy of the document: either every operation
//! succeeds and the patched copy is returned, or the first failing operation is
//! reported and the input is left untouched.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// A single JSON Patch operation
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOperation {
    Add { path: String, value: Value },
    Remove { path: String },
    Replace { path: String, value: Value },
    Move { from: String, path: String },
    Copy { from: String, path: String },
    Test { path: String, value: Value },
}

impl PatchOperation {
    /// Target location of the operation
    pub fn path(&self) -> &str {
        match self {
            Self::Add { path, .. }
            | Self::Remove { path }
            | Self::Replace { path, .. }
            | Self::Move { path, .. }
            | Self::Copy { path, .. }
            | Self::Test { path, .. } => path,
        }
    }

    /// Whether applying the operation can change the value at `pointer`
    /// (or anything below it). The root pointer `""` covers every location.
    pub fn modifies(&self, pointer: &str) -> bool {
        let under = |path: &str| {
            path.is_empty() || path == pointer || path.starts_with(&format!("{pointer}/"))
        };
        match self {
            Self::Test { .. } => false,
            Self::Move { from, path } => under(from) || under(path),
            _ => under(self.path()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    #[error("Patch document must be an array of operations")]
    NotAnArray,

    #[error("Operation {index} is malformed: {reason}")]
    Malformed { index: usize, reason: String },

    #[error("Invalid JSON pointer '{0}'")]
    InvalidPointer(String),

    #[error("Path '{0}' does not exist")]
    PathNotFound(String),

    #[error("Array index out of bounds at '{0}'")]
    IndexOutOfBounds(String),

    #[error("Operation cannot be applied at '{0}'")]
    InvalidTarget(String),

    #[error("Path '{0}' is read-only")]
    ProtectedPath(String),

    #[error("Test operation failed at '{path}'")]
    TestFailed { path: String },
}

impl PatchError {
    /// A failed `test` means the document is not in the state the caller
    /// expected; every other error is a malformed request.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::TestFailed { .. })
    }
}

/// Parse a request body into patch operations
pub fn parse_patch(body: &Value) -> Result<Vec<PatchOperation>, PatchError> {
    let items = body.as_array().ok_or(PatchError::NotAnArray)?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| -> Result<PatchOperation, PatchError> {
            let operation: PatchOperation =
                serde_json::from_value(item.clone()).map_err(|e| PatchError::Malformed {
                    index,
                    reason: e.to_string(),
                })?;
            // Reject bad pointers before anything is applied
            parse_pointer(operation.path())?;
            if let PatchOperation::Move { from, .. } | PatchOperation::Copy { from, .. } =
                &operation
            {
                parse_pointer(from)?;
            }
            Ok(operation)
        })
        .collect()
}

/// Apply `operations` in order to a copy of `document`
pub fn apply_patch(document: &Value, operations: &[PatchOperation]) -> Result<Value, PatchError> {
    let mut patched = document.clone();
    for operation in operations {
        apply_operation(&mut patched, operation)?;
    }
    Ok(patched)
}

fn apply_operation(doc: &mut Value, operation: &PatchOperation) -> Result<(), PatchError> {
    match operation {
        PatchOperation::Add { path, value } => add(doc, path, value.clone()),
        PatchOperation::Remove { path } => remove(doc, path).map(|_| ()),
        PatchOperation::Replace { path, value } => {
            let tokens = parse_pointer(path)?;
            let target = resolve_mut(doc, &tokens)
                .ok_or_else(|| PatchError::PathNotFound(path.clone()))?;
            *target = value.clone();
            Ok(())
        }
        PatchOperation::Move { from, path } => {
            if from == path {
                return Ok(());
            }
            if path.starts_with(&format!("{from}/")) {
                return Err(PatchError::InvalidTarget(path.clone()));
            }
            let value = remove(doc, from)?;
            add(doc, path, value)
        }
        PatchOperation::Copy { from, path } => {
            let tokens = parse_pointer(from)?;
            let value = resolve(doc, &tokens)
                .cloned()
                .ok_or_else(|| PatchError::PathNotFound(from.clone()))?;
            add(doc, path, value)
        }
        PatchOperation::Test { path, value } => {
            let tokens = parse_pointer(path)?;
            match resolve(doc, &tokens) {
                Some(current) if values_equal(current, value) => Ok(()),
                _ => Err(PatchError::TestFailed { path: path.clone() }),
            }
        }
    }
}

fn add(doc: &mut Value, path: &str, value: Value) -> Result<(), PatchError> {
    let tokens = parse_pointer(path)?;
    let Some((last, parents)) = tokens.split_last() else {
        *doc = value;
        return Ok(());
    };

    let parent =
        resolve_mut(doc, parents).ok_or_else(|| PatchError::PathNotFound(path.to_string()))?;

    match parent {
        Value::Object(map) => {
            map.insert(last.clone(), value);
            Ok(())
        }
        Value::Array(items) => {
            if last == "-" {
                items.push(value);
                return Ok(());
            }
            let index = parse_index(last).ok_or_else(|| PatchError::InvalidPointer(path.to_string()))?;
            if index > items.len() {
                return Err(PatchError::IndexOutOfBounds(path.to_string()));
            }
            items.insert(index, value);
            Ok(())
        }
        _ => Err(PatchError::InvalidTarget(path.to_string())),
    }
}

fn remove(doc: &mut Value, path: &str) -> Result<Value, PatchError> {
    let tokens = parse_pointer(path)?;
    let Some((last, parents)) = tokens.split_last() else {
        return Err(PatchError::InvalidTarget(path.to_string()));
    };

    let parent =
        resolve_mut(doc, parents).ok_or_else(|| PatchError::PathNotFound(path.to_string()))?;

    match parent {
        Value::Object(map) => map
            .remove(last)
            .ok_or_else(|| PatchError::PathNotFound(path.to_string())),
        Value::Array(items) => {
            let index = parse_index(last).ok_or_else(|| PatchError::InvalidPointer(path.to_string()))?;
            if index >= items.len() {
                return Err(PatchError::IndexOutOfBounds(path.to_string()));
            }
            Ok(items.remove(index))
        }
        _ => Err(PatchError::InvalidTarget(path.to_string())),
    }
}

/// Split a JSON pointer (RFC 6901) into unescaped reference tokens
fn parse_pointer(pointer: &str) -> Result<Vec<String>, PatchError> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    let Some(rest) = pointer.strip_prefix('/') else {
        return Err(PatchError::InvalidPointer(pointer.to_string()));
    };

    rest.split('/')
        .map(|token| unescape(token).ok_or_else(|| PatchError::InvalidPointer(pointer.to_string())))
        .collect()
}

fn unescape(token: &str) -> Option<String> {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return None,
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

/// Array index token: digits only, no leading zeros
fn parse_index(token: &str) -> Option<usize> {
    if token.is_empty()
        || !token.bytes().all(|b| b.is_ascii_digit())
        || (token.len() > 1 && token.starts_with('0'))
    {
        return None;
    }
    token.parse().ok()
}

fn resolve<'a>(doc: &'a Value, tokens: &[String]) -> Option<&'a Value> {
    tokens.iter().try_fold(doc, |current, token| match current {
        Value::Object(map) => map.get(token),
        Value::Array(items) => parse_index(token).and_then(|i| items.get(i)),
        _ => None,
    })
}

fn resolve_mut<'a>(doc: &'a mut Value, tokens: &[String]) -> Option<&'a mut Value> {
    tokens.iter().try_fold(doc, |current, token| match current {
        Value::Object(map) => map.get_mut(token),
        Value::Array(items) => parse_index(token).and_then(move |i| items.get_mut(i)),
        _ => None,
    })
}

/// Structural equality where numbers compare by value (`1` equals `1.0`)
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        // Integers compare exactly; floats fall back to f64 so 1 == 1.0
        (Value::Number(x), Value::Number(y)) if x.is_f64() || y.is_f64() => {
            x.as_f64() == y.as_f64()
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| values_equal(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, v)| y.get(k).is_some_and(|other| values_equal(v, other)))
        }
        _ => a == b,
    }
}
