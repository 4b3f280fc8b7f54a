//! Schema-checked loading of assertion view files.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use jsonschema::validator_for;
use serde_json::Value;

use crate::core::types::AssertionView;
use crate::io::catalog_store::write_json;

const ASSERTION_VIEWS_SCHEMA: &str = include_str!("../../schemas/assertion_views.schema.json");

/// Check a raw JSON value against the assertion view schema and deserialize it.
pub fn validate_assertion_views(value: &Value) -> Result<Vec<AssertionView>> {
    let schema: Value =
        serde_json::from_str(ASSERTION_VIEWS_SCHEMA).context("parse assertion view schema")?;
    let compiled = validator_for(&schema).map_err(|err| anyhow!("invalid schema: {}", err))?;
    let messages: Vec<String> = compiled
        .iter_errors(value)
        .map(|err| err.to_string())
        .collect();
    if !messages.is_empty() {
        bail!(
            "assertion view schema validation failed:\n- {}",
            messages.join("\n- ")
        );
    }
    serde_json::from_value(value.clone()).context("deserialize assertion views")
}

/// Read `input`, validate it and write the canonical form to `output`.
pub fn parse_assertion_views(input: &Path, output: &Path) -> Result<Vec<AssertionView>> {
    let raw = fs::read_to_string(input)
        .with_context(|| format!("read assertion views {}", input.display()))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("parse assertion views {}", input.display()))?;
    let views = validate_assertion_views(&value)
        .with_context(|| format!("validate assertion views {}", input.display()))?;
    write_json(output, &views)?;
    Ok(views)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_views_deserialize() {
        let value = json!([
            { "title": "By section", "groups": [
                { "title": "Section A", "assertionIds": ["a1", "a2"] }
            ] },
            { "title": "Empty", "groups": [] }
        ]);
        let views = validate_assertion_views(&value).expect("valid");
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].groups[0].assertion_ids, vec!["a1", "a2"]);
    }

    /// Schema errors list every offending field.
    #[test]
    fn schema_errors_are_reported() {
        let value = json!([
            { "title": "", "groups": [ { "title": "G" } ] }
        ]);
        let err = validate_assertion_views(&value).expect_err("invalid");
        let message = err.to_string();
        assert!(message.starts_with("assertion view schema validation failed"));
        assert!(message.contains("assertionIds"));
    }

    #[test]
    fn non_array_input_is_rejected() {
        let err = validate_assertion_views(&json!({ "title": "V" })).expect_err("object");
        assert!(err.to_string().contains("schema validation failed"));
    }

    /// Output is pretty JSON with a trailing newline, whatever the input layout.
    #[test]
    fn parse_rewrites_canonical_json() {
        let temp = tempfile::tempdir().expect("tempdir");
        let input = temp.path().join("in.json");
        let output = temp.path().join("out.json");
        fs::write(
            &input,
            r#"[{"groups":[{"assertionIds":["x"],"title":"G"}],"title":"V"}]"#,
        )
        .expect("write");

        let views = parse_assertion_views(&input, &output).expect("parse");
        assert_eq!(views[0].title, "V");
        let written = fs::read_to_string(&output).expect("read output");
        assert!(written.ends_with("}\n]\n"));
        assert!(written.starts_with("[\n  {\n    \"title\": \"V\""));
    }

    #[test]
    fn parse_reports_malformed_json_with_path() {
        let temp = tempfile::tempdir().expect("tempdir");
        let input = temp.path().join("broken.json");
        fs::write(&input, "[{").expect("write");
        let err = parse_assertion_views(&input, &temp.path().join("out.json"))
            .expect_err("malformed");
        assert!(format!("{:#}", err).contains("broken.json"));
        assert!(!temp.path().join("out.json").exists());
    }
}
