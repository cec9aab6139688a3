//! `.env` reconciliation.
//!
//! The file is treated as an ordered list of lines. Only lines that bind
//! [`MODEL_ENV_KEY`] are touched; comments, blank lines, other keys and line
//! terminators pass through byte-for-byte.
//!
//! | Input                         | Result                                  |
//! |-------------------------------|-----------------------------------------|
//! | no file                       | template rendered ([`EnvEdit::Created`])|
//! | file without the key          | line appended ([`EnvEdit::Appended`])   |
//! | file with the key, new value  | line replaced ([`EnvEdit::Updated`])    |
//! | file with the key, same value | nothing changes ([`EnvEdit::Unchanged`])|

use tera::{Context, Tera};

use crate::error::CoreError;
use crate::types::{EnvEdit, ModelName, MODEL_ENV_KEY};

const ENV_TEMPLATE: &str = include_str!("templates/env.tera");

/// Render a fresh `.env` for `model`, including commented-out placeholders.
pub fn render_template(model: &ModelName) -> Result<String, CoreError> {
    let mut ctx = Context::new();
    ctx.insert("model", model.as_str());
    Ok(Tera::one_off(ENV_TEMPLATE, &ctx, false)?)
}

/// Split a raw line into `(body, terminator)`; the terminator is `""`, `"\n"`
/// or `"\r\n"`.
fn split_terminator(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

/// Parse an active `KEY=value` line. Comments and lines without `=` yield
/// `None`. A leading `export ` is accepted, as shells and dotenv loaders do.
pub fn parse_binding(line: &str) -> Option<(&str, &str)> {
    let (body, _) = split_terminator(line);
    let trimmed = body.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
    let (key, value) = trimmed.split_once('=')?;
    Some((key.trim(), value))
}

/// Value of the first active binding of `key`, if any.
pub fn lookup<'a>(contents: &'a str, key: &str) -> Option<&'a str> {
    contents
        .split_inclusive('\n')
        .filter_map(parse_binding)
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

/// Reconcile `existing` file contents (or `None` if absent) so that exactly
/// one active line reads `OLLAMA_MODEL=<model>`.
///
/// Extra active bindings of the key beyond the first are dropped; the first
/// keeps its position and line terminator.
pub fn reconcile(existing: Option<&str>, model: &ModelName) -> Result<(String, EnvEdit), CoreError> {
    let Some(contents) = existing else {
        return Ok((render_template(model)?, EnvEdit::Created));
    };

    let wanted = format!("{MODEL_ENV_KEY}={model}");
    let mut out = String::with_capacity(contents.len() + wanted.len() + 1);
    let mut found = false;

    for line in contents.split_inclusive('\n') {
        let binds_key = matches!(parse_binding(line), Some((key, _)) if key == MODEL_ENV_KEY);
        if !binds_key {
            out.push_str(line);
            continue;
        }
        if found {
            tracing::warn!("dropping duplicate {MODEL_ENV_KEY} line: {}", line.trim_end());
            continue;
        }
        found = true;
        let (_, terminator) = split_terminator(line);
        out.push_str(&wanted);
        out.push_str(terminator);
    }

    if !found {
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&wanted);
        out.push('\n');
        return Ok((out, EnvEdit::Appended));
    }

    let edit = if out == contents {
        EnvEdit::Unchanged
    } else {
        EnvEdit::Updated
    };
    Ok((out, edit))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(name: &str) -> ModelName {
        ModelName::from(name)
    }

    #[test]
    fn template_binds_model_and_comments_placeholders() {
        let rendered = render_template(&model("llama3.2")).expect("render");
        assert_eq!(lookup(&rendered, MODEL_ENV_KEY), Some("llama3.2"));
        assert!(rendered.contains("# LANGSMITH_API_KEY="));
        assert_eq!(lookup(&rendered, "LANGSMITH_API_KEY"), None);
        assert_eq!(
            rendered
                .lines()
                .filter(|l| l.starts_with(MODEL_ENV_KEY))
                .count(),
            1
        );
    }

    #[test]
    fn absent_file_is_created() {
        let (out, edit) = reconcile(None, &model("mistral")).expect("reconcile");
        assert_eq!(edit, EnvEdit::Created);
        assert_eq!(lookup(&out, MODEL_ENV_KEY), Some("mistral"));
    }

    #[test]
    fn missing_key_is_appended_after_final_newline() {
        let (out, edit) = reconcile(Some("FOO=1\nBAR=2"), &model("m")).expect("reconcile");
        assert_eq!(edit, EnvEdit::Appended);
        assert_eq!(out, "FOO=1\nBAR=2\nOLLAMA_MODEL=m\n");
    }

    #[test]
    fn empty_file_gets_single_line() {
        let (out, edit) = reconcile(Some(""), &model("m")).expect("reconcile");
        assert_eq!(edit, EnvEdit::Appended);
        assert_eq!(out, "OLLAMA_MODEL=m\n");
    }

    #[test]
    fn commented_key_does_not_count() {
        let (out, edit) =
            reconcile(Some("# OLLAMA_MODEL=old\n"), &model("new")).expect("reconcile");
        assert_eq!(edit, EnvEdit::Appended);
        assert_eq!(out, "# OLLAMA_MODEL=old\nOLLAMA_MODEL=new\n");
    }

    #[test]
    fn existing_key_is_replaced_in_place() {
        let input = "A=1\nOLLAMA_MODEL=old\nB=2\n";
        let (out, edit) = reconcile(Some(input), &model("new")).expect("reconcile");
        assert_eq!(edit, EnvEdit::Updated);
        assert_eq!(out, "A=1\nOLLAMA_MODEL=new\nB=2\n");
    }

    #[test]
    fn same_value_is_byte_identical() {
        let input = "# header\r\nOLLAMA_MODEL=x\r\nOTHER=y";
        let (out, edit) = reconcile(Some(input), &model("x")).expect("reconcile");
        assert_eq!(edit, EnvEdit::Unchanged);
        assert_eq!(out, input);
    }

    #[test]
    fn duplicate_bindings_collapse_to_first() {
        let input = "OLLAMA_MODEL=a\nK=v\nexport OLLAMA_MODEL=b\n";
        let (out, edit) = reconcile(Some(input), &model("c")).expect("reconcile");
        assert_eq!(edit, EnvEdit::Updated);
        assert_eq!(out, "OLLAMA_MODEL=c\nK=v\n");
    }

    #[test]
    fn similar_key_prefix_is_not_a_match() {
        let input = "OLLAMA_MODEL_PATH=/tmp\n";
        let (out, edit) = reconcile(Some(input), &model("m")).expect("reconcile");
        assert_eq!(edit, EnvEdit::Appended);
        assert_eq!(out, "OLLAMA_MODEL_PATH=/tmp\nOLLAMA_MODEL=m\n");
    }

    #[test]
    fn parse_binding_handles_export_and_spacing() {
        assert_eq!(parse_binding("export KEY=v\n"), Some(("KEY", "v")));
        assert_eq!(parse_binding("  KEY = v"), Some(("KEY", " v")));
        assert_eq!(parse_binding("   # KEY=v"), None);
        assert_eq!(parse_binding("no equals"), None);
    }
}
