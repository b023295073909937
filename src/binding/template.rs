//! Template Resolution - `${taskId.name}` and `${ENV.NAME}` substitution
//!
//! Each pass replaces every match in a field in a single scan, so text
//! inserted by a pass is never re-expanded by that same pass. Unknown
//! references are left untouched; [`has_unresolved`] detects them afterwards.
//!
//! Order matters: [`interpolate`] runs the flow pass first, then the
//! environment pass.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

use crate::ast::Fields;
use crate::store::FlowVariables;

use super::environment::Environment;

/// Pattern for ${ENV.NAME} references
static ENV_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{ENV\.([a-zA-Z0-9_-]+)\}").unwrap());

/// Pattern for ${taskId.name} references
static FLOW_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([a-zA-Z0-9_-]+)\.([a-zA-Z0-9_-]+)\}").unwrap());

/// Task id prefix owned by environment placeholders
const ENV_PREFIX: &str = "ENV";

/// Replace `${ENV.NAME}` with the snapshot value when the variable is set
pub fn substitute_environment_str<'a>(text: &'a str, env: &Environment) -> Cow<'a, str> {
    ENV_PATTERN.replace_all(text, |cap: &Captures| match env.get(&cap[1]) {
        Some(value) => value.to_string(),
        None => cap[0].to_string(),
    })
}

/// Replace `${taskId.name}` with the flow variable when present and non-null
pub fn substitute_flow_str<'a>(text: &'a str, vars: &FlowVariables) -> Cow<'a, str> {
    FLOW_PATTERN.replace_all(text, |cap: &Captures| {
        if &cap[1] == ENV_PREFIX {
            return cap[0].to_string();
        }
        match vars.get(&FlowVariables::key(&cap[1], &cap[2])) {
            Some(value) => value.to_string(),
            None => cap[0].to_string(),
        }
    })
}

/// Flow pass then environment pass over one string
pub fn interpolate_str(text: &str, vars: &FlowVariables, env: &Environment) -> String {
    let flowed = substitute_flow_str(text, vars);
    substitute_environment_str(&flowed, env).into_owned()
}

/// Environment pass over every string-valued field; other values pass through
pub fn substitute_environment(fields: &Fields, env: &Environment) -> Fields {
    map_strings(fields, |s| substitute_environment_str(s, env))
}

/// Flow pass over every string-valued field; other values pass through
pub fn substitute_flow(fields: &Fields, vars: &FlowVariables) -> Fields {
    map_strings(fields, |s| substitute_flow_str(s, vars))
}

/// Both passes, in order
pub fn interpolate(fields: &Fields, vars: &FlowVariables, env: &Environment) -> Fields {
    substitute_environment(&substitute_flow(fields, vars), env)
}

/// Whether any `${ENV.*}` or `${id.name}` placeholder remains in `text`
#[inline]
pub fn has_unresolved(text: &str) -> bool {
    // ENV placeholders are a subset of the flow pattern
    FLOW_PATTERN.is_match(text)
}

/// Every placeholder left in `text`, in order of appearance
pub fn unresolved_placeholders(text: &str) -> Vec<String> {
    FLOW_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

fn map_strings<F>(fields: &Fields, f: F) -> Fields
where
    F: for<'a> Fn(&'a str) -> Cow<'a, str>,
{
    fields
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => Value::String(f(s).into_owned()),
                other => other.clone(),
            };
            (key.clone(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(entries: &[(&str, &str, Option<&str>)]) -> FlowVariables {
        let mut vars = FlowVariables::new();
        for (task, name, value) in entries {
            vars.insert(task, name, value.map(str::to_string));
        }
        vars
    }

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    // ─────────────────────────────────────────────────────────────
    // Environment pass
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn env_set_is_replaced() {
        let env = Environment::new().with("COOKIE", "c=1");
        assert_eq!(substitute_environment_str("Cookie ${ENV.COOKIE}", &env), "Cookie c=1");
    }

    #[test]
    fn env_unset_is_untouched() {
        let env = Environment::new();
        let text = "key=${ENV.MISSING_VAR}";
        let out = substitute_environment_str(text, &env);
        assert_eq!(out, text);
        assert!(has_unresolved(&out));
    }

    #[test]
    fn env_empty_value_counts_as_set() {
        let env = Environment::new().with("EMPTY", "");
        assert_eq!(substitute_environment_str("[${ENV.EMPTY}]", &env), "[]");
    }

    #[test]
    fn env_replaces_every_occurrence() {
        let env = Environment::new().with("A", "1").with("B", "2");
        assert_eq!(
            substitute_environment_str("${ENV.A}-${ENV.B}-${ENV.A}", &env),
            "1-2-1"
        );
    }

    // ─────────────────────────────────────────────────────────────
    // Flow pass
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn flow_present_is_replaced() {
        let v = vars(&[("fetchA", "token", Some("abc"))]);
        assert_eq!(
            substitute_flow_str("https://x/?t=${fetchA.token}", &v),
            "https://x/?t=abc"
        );
    }

    #[test]
    fn flow_absent_is_untouched() {
        let v = vars(&[]);
        assert_eq!(substitute_flow_str("${taskId.name}", &v), "${taskId.name}");
    }

    #[test]
    fn flow_null_is_untouched() {
        let v = vars(&[("a", "x", None)]);
        assert_eq!(substitute_flow_str("${a.x}", &v), "${a.x}");
    }

    #[test]
    fn flow_pass_ignores_env_placeholders() {
        let v = vars(&[("ENV", "HOME", Some("hijacked"))]);
        assert_eq!(substitute_flow_str("${ENV.HOME}", &v), "${ENV.HOME}");
    }

    #[test]
    fn flow_handles_multiple_distinct_placeholders() {
        let v = vars(&[("a", "x", Some("1")), ("get-daily-status", "cookieAA", Some("2"))]);
        assert_eq!(
            substitute_flow_str("${a.x}/${get-daily-status.cookieAA}/${b.y}", &v),
            "1/2/${b.y}"
        );
    }

    // ─────────────────────────────────────────────────────────────
    // Combined
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn flow_runs_before_env() {
        // A flow value carrying an env placeholder is expanded by the later pass
        let v = vars(&[("a", "x", Some("${ENV.USER_NAME}"))]);
        let env = Environment::new().with("USER_NAME", "neo");
        assert_eq!(interpolate_str("hi ${a.x}", &v, &env), "hi neo");
    }

    #[test]
    fn non_string_fields_pass_through() {
        let v = vars(&[("a", "x", Some("1"))]);
        let env = Environment::new();
        let input = fields(json!({"n": 5, "flag": true, "list": ["${a.x}"], "s": "${a.x}"}));
        let out = interpolate(&input, &v, &env);
        assert_eq!(out["n"], json!(5));
        assert_eq!(out["flag"], json!(true));
        assert_eq!(out["list"], json!(["${a.x}"]));
        assert_eq!(out["s"], json!("1"));
    }

    #[test]
    fn substitution_is_idempotent_once_resolved() {
        let v = vars(&[("a", "x", Some("value"))]);
        let env = Environment::new().with("K", "key");
        let input = fields(json!({"h": "${a.x}:${ENV.K}"}));
        let once = interpolate(&input, &v, &env);
        let twice = interpolate(&once, &v, &env);
        assert_eq!(once, twice);
        assert_eq!(once["h"], json!("value:key"));
    }

    #[test]
    fn unresolved_detection() {
        assert!(has_unresolved("x ${ENV.MISSING_VAR}"));
        assert!(has_unresolved("${a.b}"));
        assert!(!has_unresolved("$ENV.A {a.b} ${a} ${a.b.c"));
        assert_eq!(
            unresolved_placeholders(r#"{"a":"${ENV.X}","b":"${t.y}"}"#),
            vec!["${ENV.X}".to_string(), "${t.y}".to_string()]
        );
    }
}
