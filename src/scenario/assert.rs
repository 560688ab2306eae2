//! Response assertions
//!
//! Every check returns [`Error::Assertion`] with the expected and actual
//! values on mismatch.

use serde_json::Value;

use super::template::{render_value, Variables};
use super::Expectation;
use crate::common::{Error, Result};
use crate::http::ApiResponse;

/// Apply every check in `expect` to `response`, stopping at the first miss
pub fn check(expect: &Expectation, response: &ApiResponse, vars: &Variables) -> Result<()> {
    if let Some(status) = expect.status {
        expect_status(response, status)?;
    }
    if let Some(token) = &expect.content_type {
        expect_content_type(response, token)?;
    }
    for (pointer, expected) in &expect.fields {
        let expected = render_value(expected, vars)?;
        expect_field_eq(&response.body, pointer, &expected)?;
    }
    for (pointer, needle) in &expect.fields_contain {
        expect_field_contains(&response.body, pointer, needle)?;
    }
    for pointer in &expect.non_empty {
        expect_non_empty(&response.body, pointer)?;
    }
    if let Some(len) = expect.min_len {
        expect_min_len(&response.body, len)?;
    }
    if let Some(n) = expect.first_n {
        expect_first_n(&response.body, n)?;
    }
    for id in &expect.contains_ids {
        expect_id_present(&response.body, *id)?;
    }
    Ok(())
}

pub fn expect_status(response: &ApiResponse, expected: u16) -> Result<()> {
    if response.status != expected {
        return Err(Error::Assertion(format!(
            "expected status {}, got {}",
            expected, response.status
        )));
    }
    Ok(())
}

pub fn expect_content_type(response: &ApiResponse, token: &str) -> Result<()> {
    let actual = response.header("content-type").unwrap_or("");
    if !actual.contains(token) {
        return Err(Error::Assertion(format!(
            "expected content-type containing '{}', got '{}'",
            token, actual
        )));
    }
    Ok(())
}

fn field<'a>(body: &'a Value, pointer: &str) -> Result<&'a Value> {
    body.pointer(pointer)
        .ok_or_else(|| Error::Assertion(format!("field '{}' missing from body {}", pointer, preview(body))))
}

pub fn expect_field_eq(body: &Value, pointer: &str, expected: &Value) -> Result<()> {
    let actual = field(body, pointer)?;
    if !values_match(actual, expected) {
        return Err(Error::Assertion(format!(
            "field '{}': expected {}, got {}",
            pointer, expected, actual
        )));
    }
    Ok(())
}

pub fn expect_field_contains(body: &Value, pointer: &str, needle: &str) -> Result<()> {
    let actual = field(body, pointer)?;
    let text = actual.as_str().ok_or_else(|| {
        Error::Assertion(format!("field '{}': expected a string, got {}", pointer, actual))
    })?;
    if !text.contains(needle) {
        return Err(Error::Assertion(format!(
            "field '{}': expected '{}' to contain '{}'",
            pointer, text, needle
        )));
    }
    Ok(())
}

pub fn expect_non_empty(body: &Value, pointer: &str) -> Result<()> {
    match field(body, pointer)? {
        Value::String(s) if !s.is_empty() => Ok(()),
        other => Err(Error::Assertion(format!(
            "field '{}': expected a non-empty string, got {}",
            pointer, other
        ))),
    }
}

fn as_array<'a>(body: &'a Value) -> Result<&'a Vec<Value>> {
    body.as_array()
        .ok_or_else(|| Error::Assertion(format!("expected an array body, got {}", preview(body))))
}

pub fn expect_min_len(body: &Value, len: usize) -> Result<()> {
    let items = as_array(body)?;
    if items.len() < len {
        return Err(Error::Assertion(format!(
            "expected at least {} elements, got {}",
            len,
            items.len()
        )));
    }
    Ok(())
}

/// The first `n` elements of the body number exactly `n`
pub fn expect_first_n(body: &Value, n: usize) -> Result<()> {
    let items = as_array(body)?;
    let taken = items.iter().take(n).count();
    if taken != n {
        return Err(Error::Assertion(format!(
            "expected the first {} elements to number {}, got {}",
            n, n, taken
        )));
    }
    Ok(())
}

/// An element with `id == id` exists and carries that exact id
pub fn expect_id_present(body: &Value, id: i64) -> Result<()> {
    let items = as_array(body)?;
    let found = items
        .iter()
        .find(|item| item.get("id").and_then(Value::as_i64) == Some(id))
        .ok_or_else(|| Error::Assertion(format!("no element with id {}", id)))?;

    let actual = found.get("id").and_then(Value::as_i64);
    if actual != Some(id) {
        return Err(Error::Assertion(format!(
            "element looked up by id {} reports id {:?}",
            id, actual
        )));
    }
    Ok(())
}

/// JSON equality where numbers compare by value (`1` matches `1.0`)
pub fn values_match(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => a == b,
            _ => a.as_f64() == b.as_f64(),
        },
        _ => actual == expected,
    }
}

/// Short rendering of a body for error messages
pub fn preview(body: &Value) -> String {
    let text = body.to_string();
    if text.chars().count() > 200 {
        let cut: String = text.chars().take(200).collect();
        format!("{}...", cut)
    } else {
        text
    }
}
