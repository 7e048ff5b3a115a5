//! Turning generator text into maze rows
//!
//! Generators are sloppy: answers come wrapped in markdown fences, with
//! single quotes, split over lines, sometimes JSON-encoded twice, sometimes
//! as a bare array and sometimes as `{ "maze": [...] }`. Everything here is
//! about getting rows out; whether the rows make a usable maze is decided by
//! the acceptance rules afterwards.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::wire::MazeRows;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("generator output is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("generator output has no \"maze\" array")]
    MissingMaze,

    #[error("expected an array of rows, found {0}")]
    UnexpectedShape(&'static str),

    #[error("maze rows must be arrays of symbols or strings: {0}")]
    Rows(#[source] serde_json::Error),

    #[error("maze has no rows")]
    Empty,
}

/// A row as generators write it: `["S", ".", "#"]` or `"S.#"`
#[derive(Deserialize)]
#[serde(untagged)]
enum RowRepr {
    Cells(Vec<String>),
    Text(String),
}

impl RowRepr {
    fn into_cells(self) -> Vec<String> {
        match self {
            RowRepr::Cells(cells) => cells,
            RowRepr::Text(text) => text.chars().map(String::from).collect(),
        }
    }
}

/// Strip fences, quotes, and line breaks the way generator output needs
pub fn sanitize(text: &str) -> String {
    text.replace("```javascript", "")
        .replace("```json", "")
        .replace("```", "")
        .replace('\'', "\"")
        .replace(['\r', '\n'], "")
        .trim()
        .to_string()
}

/// Parse raw generator text into rows of symbols
pub fn parse_generated(text: &str) -> Result<MazeRows, ParseError> {
    let cleaned = sanitize(text);
    let mut value: Value = serde_json::from_str(&cleaned)?;
    // Double-encoded: the payload is a JSON string holding the real JSON
    if let Value::String(inner) = &value {
        value = serde_json::from_str(inner)?;
    }
    rows_from_value(value)
}

/// Pull rows out of an already-parsed value (bare array or `{ "maze": [...] }`)
pub fn rows_from_value(value: Value) -> Result<MazeRows, ParseError> {
    let rows = match value {
        Value::Array(_) => value,
        Value::Object(mut map) => match map.remove("maze") {
            Some(rows @ Value::Array(_)) => rows,
            _ => return Err(ParseError::MissingMaze),
        },
        Value::Null => return Err(ParseError::UnexpectedShape("null")),
        Value::Bool(_) => return Err(ParseError::UnexpectedShape("a boolean")),
        Value::Number(_) => return Err(ParseError::UnexpectedShape("a number")),
        Value::String(_) => return Err(ParseError::UnexpectedShape("a string")),
    };

    let rows: Vec<RowRepr> = serde_json::from_value(rows).map_err(ParseError::Rows)?;
    if rows.is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(rows.into_iter().map(RowRepr::into_cells).collect())
}
