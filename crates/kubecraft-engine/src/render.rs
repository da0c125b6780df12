//! Helm-style placeholder substitution
//!
//! Only five placeholder families are understood:
//!
//! | Placeholder                | Replacement                          |
//! |----------------------------|--------------------------------------|
//! | `{{ .Values.a.b }}`        | value at `a.b`, empty when missing   |
//! | `{{ .Release.Name }}`      | release name (`release`)             |
//! | `{{ .Chart.Name }}`        | chart name (`chart`)                 |
//! | `{{ .Release.Namespace }}` | namespace (`default`)                |
//! | `{{ .Chart.Version }}`     | chart version (`0.1.0`)              |
//!
//! Each family is a separate replace-all pass, applied in the order above.
//! Anything else between braces is left untouched.

use kubecraft_core::{Mapping, Value};
use once_cell::sync::Lazy;
use regex::{Captures, NoExpand, Regex};

use crate::context::TemplateContext;

static VALUES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*\.Values\.([A-Za-z0-9_-]+(?:\.[A-Za-z0-9_-]+)*)\s*\}\}")
        .expect("valid regex")
});

static RELEASE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*\.Release\.Name\s*\}\}").expect("valid regex"));

static CHART_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*\.Chart\.Name\s*\}\}").expect("valid regex"));

static RELEASE_NAMESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*\.Release\.Namespace\s*\}\}").expect("valid regex"));

static CHART_VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*\.Chart\.Version\s*\}\}").expect("valid regex"));

static ANY_PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{.*?\}\}").expect("valid regex"));

/// Render a template against a context
///
/// Never fails: unknown placeholders stay verbatim and unresolvable
/// `.Values` paths become empty strings.
pub fn render(template: &str, context: &TemplateContext) -> String {
    let text = substitute(template, &VALUES_RE, "values", |caps| {
        lookup(&context.values, &caps[1])
            .map(display)
            .unwrap_or_default()
    });

    let passes: [(&Regex, &str, &str); 4] = [
        (&*RELEASE_NAME_RE, "release.name", context.release_name()),
        (&*CHART_NAME_RE, "chart.name", context.chart_name()),
        (&*RELEASE_NAMESPACE_RE, "release.namespace", context.namespace()),
        (&*CHART_VERSION_RE, "chart.version", context.chart_version()),
    ];

    passes
        .into_iter()
        .fold(text, |text, (re, pass, replacement)| {
            replace_literal(&text, re, pass, replacement)
        })
}

/// Placeholders still present in rendered output
pub fn unresolved_placeholders(rendered: &str) -> Vec<String> {
    ANY_PLACEHOLDER_RE
        .find_iter(rendered)
        .map(|m| m.as_str().to_string())
        .collect()
}

fn substitute(
    text: &str,
    re: &Regex,
    pass: &str,
    mut replacement: impl FnMut(&Captures) -> String,
) -> String {
    let mut count = 0usize;
    let out = re.replace_all(text, |caps: &Captures| {
        count += 1;
        replacement(caps)
    });
    if count > 0 {
        tracing::debug!(pass, count, "substituted placeholders");
    }
    out.into_owned()
}

fn replace_literal(text: &str, re: &Regex, pass: &str, replacement: &str) -> String {
    let count = re.find_iter(text).count();
    if count == 0 {
        return text.to_string();
    }
    tracing::debug!(pass, count, "substituted placeholders");
    re.replace_all(text, NoExpand(replacement)).into_owned()
}

fn lookup<'a>(values: &'a Mapping, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let root = values.get(segments.next()?)?;
    let rest: Vec<&str> = segments.collect();
    root.get_path(&rest)
}

/// Text form of a resolved value; null and containers have none
fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => String::new(),
    }
}
