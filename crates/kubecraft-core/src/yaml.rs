//! YAML serializer for Kubernetes manifests
//!
//! Emits the subset of YAML that manifests need: block mappings and
//! sequences, inline `[]`/`{}` for empty containers, and plain scalars that
//! are double-quoted whenever YAML would otherwise read them as something
//! other than a string.
//!
//! Layout rules:
//! - Every line of a block rendered at indent `n` starts with `n` spaces.
//! - A mapping entry whose value is a block puts `key:` on its own line and
//!   renders the value at `n + 2`.
//! - A sequence item that is a block starts right after `- `; its following
//!   lines align under the item, two columns past the dash.

use crate::value::{Mapping, Value};

/// Words YAML 1.1 readers turn into booleans or null
const RESERVED_WORDS: [&str; 5] = ["true", "false", "null", "yes", "no"];

/// Serialize a value, prefixing block lines with `indent` spaces
///
/// Never fails. Scalars and empty containers ignore `indent`.
pub fn to_yaml(value: &Value, indent: usize) -> String {
    let mut out = String::new();
    write_value(&mut out, value, indent);
    out
}

/// Serialize a value at the top level
pub fn to_yaml_string(value: &Value) -> String {
    to_yaml(value, 0)
}

/// Serialize several documents into one stream
///
/// Each document is introduced by `---`; documents are joined with a newline.
pub fn to_yaml_multi_doc(values: &[Value]) -> String {
    values
        .iter()
        .map(|value| format!("---\n{}", to_yaml(value, 0)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a string scalar, quoting it when needed
pub fn scalar(s: &str) -> String {
    if needs_quotes(s) {
        quote(s)
    } else {
        s.to_string()
    }
}

/// Whether a string must be double-quoted to survive a YAML round trip
pub fn needs_quotes(s: &str) -> bool {
    s.is_empty()
        || s.contains([':', '#', '\n', '"', '\''])
        || s.starts_with(['{', '[', '*', '&'])
        || RESERVED_WORDS.contains(&s)
        || s.bytes().all(|b| b.is_ascii_digit())
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

fn write_value(out: &mut String, value: &Value, indent: usize) {
    match value {
        Value::Sequence(items) if !items.is_empty() => write_sequence(out, items, indent),
        Value::Mapping(map) if map.present_len() > 0 => write_mapping(out, map, indent),
        other => write_inline(out, other),
    }
}

fn write_inline(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => out.push_str(&scalar(s)),
        Value::Sequence(_) => out.push_str("[]"),
        Value::Mapping(_) => out.push_str("{}"),
    }
}

fn write_mapping(out: &mut String, map: &Mapping, indent: usize) {
    let pad = " ".repeat(indent);

    for (i, (key, value)) in map.present().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&pad);
        out.push_str(&scalar(key));
        out.push(':');

        if value.is_block() {
            out.push('\n');
            write_value(out, value, indent + 2);
        } else {
            out.push(' ');
            write_inline(out, value);
        }
    }
}

fn write_sequence(out: &mut String, items: &[Value], indent: usize) {
    let pad = " ".repeat(indent);

    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&pad);
        out.push_str("- ");

        if item.is_block() {
            // The nested block's first line takes the place of its own padding
            let nested = to_yaml(item, indent + 2);
            out.push_str(nested.get(indent + 2..).unwrap_or(&nested));
        } else {
            write_inline(out, item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn yaml(json: serde_json::Value) -> String {
        to_yaml_string(&Value::from(json))
    }

    #[test]
    fn test_scalars() {
        assert_eq!(to_yaml_string(&Value::Null), "null");
        assert_eq!(to_yaml_string(&Value::from(true)), "true");
        assert_eq!(to_yaml_string(&Value::from(false)), "false");
        assert_eq!(to_yaml_string(&Value::from(42)), "42");
        assert_eq!(to_yaml_string(&Value::from(2.0)), "2");
        assert_eq!(to_yaml_string(&Value::from(0.5)), "0.5");
        assert_eq!(to_yaml_string(&Value::from("nginx")), "nginx");
    }

    #[test]
    fn test_quoting_rules() {
        assert_eq!(scalar(""), "\"\"");
        assert_eq!(scalar("http://x:80"), "\"http://x:80\"");
        assert_eq!(scalar("a # comment"), "\"a # comment\"");
        assert_eq!(scalar("line1\nline2"), "\"line1\nline2\"");
        assert_eq!(scalar("it's"), "\"it's\"");
        assert_eq!(scalar("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(scalar("{json}"), "\"{json}\"");
        assert_eq!(scalar("[list]"), "\"[list]\"");
        assert_eq!(scalar("*alias"), "\"*alias\"");
        assert_eq!(scalar("&anchor"), "\"&anchor\"");
        assert_eq!(scalar("123"), "\"123\"");
        assert_eq!(scalar("0"), "\"0\"");
    }

    #[test]
    fn test_reserved_words_are_case_sensitive() {
        for word in ["true", "false", "null", "yes", "no"] {
            assert_eq!(scalar(word), format!("\"{}\"", word));
        }
        assert_eq!(scalar("True"), "True");
        assert_eq!(scalar("NO"), "NO");
        assert_eq!(scalar("yesterday"), "yesterday");
    }

    #[test]
    fn test_backslash_escaped_only_when_quoted() {
        assert_eq!(scalar(r"C:\path"), r#""C:\\path""#);
        assert_eq!(scalar(r"plain\path"), r"plain\path");
    }

    #[test]
    fn test_strings_that_stay_bare() {
        assert_eq!(scalar("1.5"), "1.5");
        assert_eq!(scalar("-1"), "-1");
        assert_eq!(scalar("12a"), "12a");
        assert_eq!(scalar("app.kubernetes.io/name"), "app.kubernetes.io/name");
        assert!(scalar("nginx:1.25").starts_with('"'));
    }

    #[test]
    fn test_digit_only_strings_quoted() {
        for s in ["1", "123", "8080", "007"] {
            let out = to_yaml_string(&Value::from(s));
            assert_eq!(out, format!("\"{}\"", s));
        }
    }

    #[test]
    fn test_empty_containers_inline() {
        assert_eq!(yaml(json!([])), "[]");
        assert_eq!(yaml(json!({})), "{}");
        assert_eq!(yaml(json!({"key": {}})), "key: {}");
        assert_eq!(yaml(json!({"items": []})), "items: []");
        assert_eq!(yaml(json!([[], {}])), "- []\n- {}");
    }

    #[test]
    fn test_absent_entries_dropped_null_kept() {
        let map = Mapping::new()
            .with_opt("a", None::<Value>)
            .with("b", Value::Null);
        let out = to_yaml_string(&Value::Mapping(map));

        assert_eq!(out, "b: null");
        assert!(!out.contains("a:"));
    }

    #[test]
    fn test_mapping_empty_after_filtering() {
        let map = Mapping::new()
            .with_opt("a", None::<Value>)
            .with_opt("b", None::<Value>);
        assert_eq!(to_yaml_string(&Value::Mapping(map.clone())), "{}");

        let outer = Mapping::new().with("resources", map);
        assert_eq!(to_yaml_string(&Value::Mapping(outer)), "resources: {}");
    }

    #[test]
    fn test_nested_indent() {
        let out = yaml(json!({"spec": {"replicas": 2}}));
        assert_eq!(out, "spec:\n  replicas: 2");

        let lines: Vec<&str> = out.lines().collect();
        let spec_indent = lines[0].len() - lines[0].trim_start().len();
        let replicas_indent = lines[1].len() - lines[1].trim_start().len();
        assert_eq!(replicas_indent, spec_indent + 2);
    }

    #[test]
    fn test_indent_argument_prefixes_block_lines() {
        let value = Value::from(json!({"a": 1, "b": {"c": 2}}));
        assert_eq!(to_yaml(&value, 4), "    a: 1\n    b:\n      c: 2");
        assert_eq!(to_yaml(&Value::from("x"), 4), "x");
    }

    #[test]
    fn test_sequence_of_scalars() {
        assert_eq!(yaml(json!(["a", 1, true, null])), "- a\n- 1\n- true\n- null");
    }

    #[test]
    fn test_sequence_of_mappings() {
        let out = yaml(json!([
            {"name": "http", "port": 80},
            {"name": "https", "port": 443}
        ]));
        assert_eq!(out, "- name: http\n  port: 80\n- name: https\n  port: 443");
    }

    #[test]
    fn test_sequence_item_with_nested_block() {
        let out = yaml(json!({
            "containers": [{
                "name": "web",
                "ports": [{"containerPort": 80}],
                "env": []
            }]
        }));

        assert_eq!(
            out,
            "containers:\n  - name: web\n    ports:\n      - containerPort: 80\n    env: []"
        );
    }

    #[test]
    fn test_nested_sequences() {
        assert_eq!(yaml(json!([[1, 2], [3]])), "- - 1\n  - 2\n- - 3");
    }

    #[test]
    fn test_keys_are_quoted_like_scalars() {
        let out = yaml(json!({"a:b": 1, "8080": "http", "plain": "x"}));
        assert_eq!(out, "\"a:b\": 1\n\"8080\": http\nplain: x");
    }

    #[test]
    fn test_service_manifest() {
        let service = json!({
            "apiVersion": "v1",
            "kind": "Service",
            "spec": {
                "ports": [{"port": 80}],
                "selector": {"app": "x"}
            }
        });
        let out = yaml(service);
        let lines: Vec<&str> = out.lines().collect();

        assert!(lines.contains(&"apiVersion: v1"));
        assert!(lines.contains(&"kind: Service"));
        assert!(lines.contains(&"spec:"));
        assert!(lines.contains(&"  ports:"));
        assert!(lines.iter().any(|l| l.trim_start() == "- port: 80"));
        assert!(out.contains("  - port: 80"));

        let selector = lines.iter().position(|l| *l == "  selector:").unwrap();
        assert_eq!(lines[selector + 1], "    app: x");

        insta::assert_snapshot!(out, @r"
        apiVersion: v1
        kind: Service
        spec:
          ports:
            - port: 80
          selector:
            app: x
        ");
    }

    #[test]
    fn test_multi_doc() {
        let docs = vec![
            Value::from(json!({"kind": "Namespace"})),
            Value::from(json!({"kind": "ConfigMap"})),
            Value::from(json!({"kind": "Deployment"})),
        ];
        let out = to_yaml_multi_doc(&docs);

        assert_eq!(out.matches("---").count(), 3);
        assert_eq!(
            out,
            "---\nkind: Namespace\n---\nkind: ConfigMap\n---\nkind: Deployment"
        );
    }

    #[test]
    fn test_multi_doc_empty() {
        assert_eq!(to_yaml_multi_doc(&[]), "");
    }

    #[test]
    fn test_display_matches_serializer() {
        let value = Value::from(json!({"metadata": {"name": "web"}}));
        assert_eq!(value.to_string(), to_yaml_string(&value));
    }
}
