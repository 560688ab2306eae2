//! `{{name}}` placeholders in paths, headers and bodies
//!
//! A string that is exactly one placeholder is replaced by the variable's
//! JSON value, so `"userId": "{{user_id}}"` stays a number. Placeholders
//! embedded in longer strings are replaced by the value's text form.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::common::{Error, Result};
use crate::fixture::RunFixture;

/// Variables visible to a step: run fixture values plus earlier captures
#[derive(Debug, Clone, Default)]
pub struct Variables {
    values: BTreeMap<String, Value>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with the run fixture's values
    pub fn from_fixture(fixture: &RunFixture) -> Self {
        let mut vars = Self::new();
        for (name, value) in fixture.variables() {
            vars.insert(name, value);
        }
        vars
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    fn lookup(&self, name: &str) -> Result<&Value> {
        self.get(name)
            .ok_or_else(|| Error::MissingVariable(name.to_string()))
    }
}

/// Render every placeholder in `input` as text
pub fn render_str(input: &str, vars: &Variables) -> Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find("}}").ok_or_else(|| {
            Error::Config(format!("Unterminated placeholder in '{}'", input))
        })?;
        let name = after[..end].trim();
        if name.is_empty() {
            return Err(Error::Config(format!("Empty placeholder in '{}'", input)));
        }
        out.push_str(&value_text(vars.lookup(name)?));
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Render placeholders throughout a JSON value
pub fn render_value(value: &Value, vars: &Variables) -> Result<Value> {
    match value {
        Value::String(s) => {
            if let Some(name) = sole_placeholder(s) {
                return vars.lookup(name).cloned();
            }
            Ok(Value::String(render_str(s, vars)?))
        }
        Value::Array(items) => items
            .iter()
            .map(|item| render_value(item, vars))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut rendered = serde_json::Map::with_capacity(map.len());
            for (key, item) in map {
                rendered.insert(key.clone(), render_value(item, vars)?);
            }
            Ok(Value::Object(rendered))
        }
        other => Ok(other.clone()),
    }
}

fn sole_placeholder(s: &str) -> Option<&str> {
    let inner = s.strip_prefix("{{")?.strip_suffix("}}")?;
    if inner.contains("{{") || inner.contains("}}") {
        return None;
    }
    let name = inner.trim();
    (!name.is_empty()).then_some(name)
}

/// Text form of a value as it appears inside a larger string
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars() -> Variables {
        let mut vars = Variables::new();
        vars.insert("post_id", json!(101));
        vars.insert("token", json!("abc.def"));
        vars
    }

    #[test]
    fn test_render_path() {
        assert_eq!(render_str("/posts/{{post_id}}", &vars()).unwrap(), "/posts/101");
        assert_eq!(render_str("/posts/{{ post_id }}", &vars()).unwrap(), "/posts/101");
        assert_eq!(render_str("/posts", &vars()).unwrap(), "/posts");
    }

    #[test]
    fn test_render_header() {
        assert_eq!(
            render_str("Bearer {{token}}", &vars()).unwrap(),
            "Bearer abc.def"
        );
    }

    #[test]
    fn test_missing_variable_is_an_error() {
        let err = render_str("Bearer {{token}}", &Variables::new()).unwrap_err();
        assert!(matches!(err, Error::MissingVariable(ref name) if name == "token"));
    }

    #[test]
    fn test_malformed_placeholders() {
        assert!(matches!(
            render_str("/posts/{{post_id", &vars()),
            Err(Error::Config(_))
        ));
        assert!(matches!(render_str("/posts/{{}}", &vars()), Err(Error::Config(_))));
    }

    #[test]
    fn test_sole_placeholder_keeps_json_type() {
        let body = json!({
            "id": "{{post_id}}",
            "title": "Post {{post_id}}",
            "tags": ["{{token}}", 3],
            "userId": 1
        });
        assert_eq!(
            render_value(&body, &vars()).unwrap(),
            json!({
                "id": 101,
                "title": "Post 101",
                "tags": ["abc.def", 3],
                "userId": 1
            })
        );
    }

    #[test]
    fn test_from_fixture() {
        use crate::fixture::{FixtureProvider, PasswordConstraints, RunFixture};

        let fixture = RunFixture::generate(
            &mut FixtureProvider::seeded(1, "example.com"),
            &PasswordConstraints::default(),
        )
        .unwrap();
        let vars = Variables::from_fixture(&fixture);
        assert_eq!(
            render_str("{{user.email}}", &vars).unwrap(),
            fixture.user.email
        );
        assert_eq!(vars.get("post.id"), Some(&json!(fixture.post_id)));
    }
}
