//! Values loading and `--set` parsing

use kubecraft_core::{Mapping, Value};
use std::fs;
use std::path::Path;

use crate::error::{CliError, Result};

/// Read a YAML values file; an empty file gives empty values
pub fn load_values_file(path: &Path) -> Result<Mapping> {
    let content = fs::read_to_string(path).map_err(|e| CliError::io_at(path, e))?;
    let json: serde_json::Value = serde_yaml::from_str(&content).map_err(|e| {
        CliError::template(format!("{}: invalid YAML: {}", path.display(), e))
    })?;

    match Value::from(json) {
        Value::Mapping(map) => Ok(map),
        Value::Null => Ok(Mapping::new()),
        _ => Err(CliError::template_with_help(
            format!("{}: values must be a mapping", path.display()),
            "values files hold key: value pairs at the top level",
        )),
    }
}

/// Deep-merge `overlay` into `base`; nested mappings merge, anything else
/// in `overlay` replaces what `base` had
pub fn merge_values(base: &mut Mapping, overlay: &Mapping) {
    for (key, value) in overlay.present() {
        if let (Some(Value::Mapping(existing)), Value::Mapping(incoming)) =
            (base.get_mut(key), value)
        {
            merge_values(existing, incoming);
            continue;
        }
        base.insert(key, value.clone());
    }
}

/// Parse `--set key=value` arguments
///
/// Keys are dotted paths (`image.tag=1.25`). Values become booleans,
/// `null`, integers or floats when they parse as such, otherwise strings.
pub fn parse_set_values(set_args: &[String]) -> Result<Mapping> {
    let mut values = Mapping::new();

    for arg in set_args {
        let (key, raw) = arg.split_once('=').ok_or_else(|| {
            CliError::validation_with_help(
                format!("Invalid --set format: '{}'", arg),
                "expected key=value, e.g. --set image.tag=1.25",
            )
        })?;

        if key.is_empty() || key.split('.').any(str::is_empty) {
            return Err(CliError::validation(format!("Invalid --set key: '{}'", key)));
        }

        set_path(&mut values, key, infer_scalar(raw));
    }

    Ok(values)
}

fn infer_scalar(raw: &str) -> Value {
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        _ => {
            if let Ok(n) = raw.parse::<i64>() {
                return Value::from(n);
            }
            // "inf" and "NaN" parse as f64 but are meant as text
            match raw.parse::<f64>() {
                Ok(f) if f.is_finite() => Value::from(f),
                _ => Value::from(raw),
            }
        }
    }
}

/// Set a dotted path, creating (or replacing non-mapping) parents
fn set_path(values: &mut Mapping, dotted: &str, value: Value) {
    match dotted.split_once('.') {
        None => values.insert(dotted, value),
        Some((head, rest)) => {
            if !matches!(values.get(head), Some(Value::Mapping(_))) {
                values.insert(head, Mapping::new());
            }
            if let Some(Value::Mapping(child)) = values.get_mut(head) {
                set_path(child, rest, value);
            }
        }
    }
}
