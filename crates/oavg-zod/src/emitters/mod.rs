pub mod index;
pub mod operation;
pub mod schema;
pub mod support;

use std::collections::{BTreeMap, BTreeSet};

use minijinja::{Environment, context};

use crate::error::EmitError;

/// Escape `*/` sequences that would prematurely close JSDoc comment blocks.
fn escape_jsdoc(value: String) -> String {
    value.replace("*/", "*\\/")
}

/// The template environment shared by every emitter.
pub fn environment() -> Result<Environment<'static>, EmitError> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.add_filter("escape_jsdoc", escape_jsdoc);
    env.add_template("schema.ts.j2", include_str!("../../templates/schema.ts.j2"))?;
    env.add_template("operation.ts.j2", include_str!("../../templates/operation.ts.j2"))?;
    env.add_template(
        "operations_index.ts.j2",
        include_str!("../../templates/operations_index.ts.j2"),
    )?;
    env.add_template("index.ts.j2", include_str!("../../templates/index.ts.j2"))?;
    Ok(env)
}

/// JSDoc body lines from a summary, a description and a deprecation flag.
fn doc_lines(summary: Option<&str>, description: Option<&str>, deprecated: bool) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for block in [summary, description].into_iter().flatten() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.extend(block.trim().lines().map(|l| l.trim_end().to_string()));
    }
    if deprecated {
        lines.push("@deprecated".to_string());
    }
    lines
}

/// One import line per schema module, sorted by module.
fn import_entries(uses: &BTreeMap<String, BTreeSet<String>>, dir: &str) -> Vec<minijinja::Value> {
    uses.iter()
        .map(|(base, names)| {
            context! {
                module => format!("{dir}{base}"),
                names => names.iter().cloned().collect::<Vec<_>>(),
            }
        })
        .collect()
}

/// Render `{ key: value, ... }` on one line; `{}` when empty.
fn object_literal(entries: &[(String, String)]) -> String {
    if entries.is_empty() {
        return "{}".to_string();
    }
    let body: Vec<String> = entries.iter().map(|(k, v)| format!("{k}: {v}")).collect();
    format!("{{ {} }}", body.join(", "))
}

/// Render a multi-line object literal indented by two spaces per level.
fn block_literal(entries: &[(String, String)]) -> String {
    if entries.is_empty() {
        return "{}".to_string();
    }
    let body: Vec<String> = entries.iter().map(|(k, v)| format!("  {k}: {v},")).collect();
    format!("{{\n{}\n}}", body.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_lines_join_blocks() {
        let lines = doc_lines(Some("List pets"), Some("All of them.\nPaged. "), true);
        assert_eq!(lines, vec!["List pets", "", "All of them.", "Paged.", "@deprecated"]);
    }

    #[test]
    fn literals() {
        assert_eq!(object_literal(&[]), "{}");
        let entries = vec![("\"200\"".to_string(), "Pet".to_string())];
        assert_eq!(object_literal(&entries), "{ \"200\": Pet }");
        assert_eq!(block_literal(&entries), "{\n  \"200\": Pet,\n}");
    }

    #[test]
    fn jsdoc_terminators_are_escaped() {
        assert_eq!(escape_jsdoc("a */ b".to_string()), "a *\\/ b");
    }
}
