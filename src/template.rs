//! Template interpolation for YAML client configs
//!
//! Handles `{{ variable }}` interpolation so credentials and hosts can stay
//! out of the config file. Two roots are available: `env` (the process
//! environment) and `vars` (caller supplied values). A bare name such as
//! `{{ company }}` is looked up in `vars`.

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Regex for matching template variables: {{ variable.path }}
static TEMPLATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z_][a-zA-Z0-9_]*)*)\s*\}\}")
        .expect("template regex is valid")
});

/// Context for template interpolation
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    /// Environment variables, as a flat object
    pub env: JsonValue,
    /// Additional context variables
    pub vars: JsonValue,
}

impl TemplateContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context holding the current process environment
    pub fn from_env() -> Self {
        let env: JsonObject = std::env::vars()
            .map(|(k, v)| (k, JsonValue::String(v)))
            .collect();
        Self {
            env: JsonValue::Object(env),
            ..Self::default()
        }
    }

    /// Set environment values
    pub fn set_env(&mut self, env: JsonValue) -> &mut Self {
        self.env = env;
        self
    }

    /// Set additional variables
    pub fn set_vars(&mut self, vars: JsonValue) -> &mut Self {
        self.vars = vars;
        self
    }

    /// Get a value by path (e.g., "env.BC_TOKEN" or "vars.company")
    pub fn get(&self, path: &str) -> Option<&JsonValue> {
        let parts: Vec<&str> = path.split('.').collect();
        let (root, rest) = match parts.split_first()? {
            (&"env", rest) => (&self.env, rest),
            (&"vars", rest) => (&self.vars, rest),
            _ => (&self.vars, parts.as_slice()),
        };
        get_nested_value(root, rest)
    }
}

/// Get a nested value from a JSON value by path
fn get_nested_value<'a>(value: &'a JsonValue, path: &[&str]) -> Option<&'a JsonValue> {
    let mut current = value;
    for part in path {
        match current {
            JsonValue::Object(map) => {
                current = map.get(*part)?;
            }
            _ => return None,
        }
    }
    Some(current)
}

/// Render a template string with the given context
///
/// Every undefined variable is reported in one `UndefinedVariable` error.
pub fn render(template: &str, ctx: &TemplateContext) -> Result<String> {
    let mut missing = Vec::new();

    let rendered = TEMPLATE_REGEX.replace_all(template, |cap: &Captures<'_>| {
        match ctx.get(&cap[1]) {
            Some(value) => value_to_string(value),
            None => {
                missing.push(cap[1].to_string());
                cap[0].to_string()
            }
        }
    });

    if missing.is_empty() {
        Ok(rendered.into_owned())
    } else {
        Err(Error::undefined_var(missing.join(", ")))
    }
}

/// Check if a string contains template variables
pub fn has_templates(s: &str) -> bool {
    TEMPLATE_REGEX.is_match(s)
}

/// Convert a JSON value to a string for template substitution
fn value_to_string(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Null => String::new(),
        _ => value.to_string(),
    }
}

/// Render all string values in a JSON value
///
/// A string that is exactly one placeholder takes the variable's JSON value,
/// so `max_attempts: "{{ vars.retries }}"` stays a number.
pub fn render_value(value: &JsonValue, ctx: &TemplateContext) -> Result<JsonValue> {
    match value {
        JsonValue::String(s) if has_templates(s) => {
            if let Some(cap) = TEMPLATE_REGEX.captures(s.trim()) {
                if cap[0].len() == s.trim().len() {
                    return ctx
                        .get(&cap[1])
                        .cloned()
                        .ok_or_else(|| Error::undefined_var(&cap[1]));
                }
            }
            Ok(JsonValue::String(render(s, ctx)?))
        }
        JsonValue::Object(map) => {
            let mut new_map = JsonObject::new();
            for (k, v) in map {
                new_map.insert(k.clone(), render_value(v, ctx)?);
            }
            Ok(JsonValue::Object(new_map))
        }
        JsonValue::Array(arr) => arr.iter().map(|v| render_value(v, ctx)).collect(),
        _ => Ok(value.clone()),
    }
}
