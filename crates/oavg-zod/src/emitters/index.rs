use minijinja::{Environment, context};
use oavg_core::GeneratedFile;
use oavg_core::ir::IrSpec;

use crate::error::EmitError;

/// Emit `operations/index.ts`, re-exporting every operation file.
pub fn emit_operations_index(env: &Environment<'_>, ir: &IrSpec) -> Result<GeneratedFile, EmitError> {
    let operations: Vec<&str> = ir.operations.iter().map(|op| op.names.camel.as_str()).collect();
    let content = env
        .get_template("operations_index.ts.j2")?
        .render(context! { operations => operations })?;
    Ok(GeneratedFile {
        path: "operations/index.ts".to_string(),
        content,
    })
}

/// Emit the top-level `index.ts` barrel.
pub fn emit_index(env: &Environment<'_>, ir: &IrSpec) -> Result<GeneratedFile, EmitError> {
    let schemas: Vec<&str> = ir
        .schemas
        .iter()
        .map(|s| s.name().pascal_case.as_str())
        .collect();
    let content = env
        .get_template("index.ts.j2")?
        .render(context! { schemas => schemas })?;
    Ok(GeneratedFile {
        path: "index.ts".to_string(),
        content,
    })
}
