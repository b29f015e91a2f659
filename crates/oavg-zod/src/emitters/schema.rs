use minijinja::{Environment, context};
use oavg_core::GeneratedFile;
use oavg_core::ir::{IrSchema, IrSpec};
use oavg_core::resolve::strict_name;
use oavg_core::union::Flavor;

use super::{doc_lines, import_entries};
use crate::error::EmitError;
use crate::type_mapper::TypeMapper;

/// Emit `schemas/<Id>.ts` with the loose and strict variant of one named schema.
pub fn emit_schema(
    env: &Environment<'_>,
    ir: &IrSpec,
    schema: &IrSchema,
    jsdoc: bool,
) -> Result<GeneratedFile, EmitError> {
    let name = schema.name().pascal_case.as_str();
    let recursive = ir.is_recursive(name);

    let mut mapper = TypeMapper::new(ir, Some(name));
    let loose = mapper.zod_schema(schema, Flavor::Loose);
    let strict = mapper.zod_schema(schema, Flavor::Strict);
    let (ts_loose, ts_strict) = if recursive {
        (
            Some(mapper.ts_schema(schema, Flavor::Loose)),
            Some(mapper.ts_schema(schema, Flavor::Strict)),
        )
    } else {
        (None, None)
    };

    let doc = if jsdoc {
        doc_lines(None, schema.description(), false)
    } else {
        Vec::new()
    };

    let tmpl = env.get_template("schema.ts.j2")?;
    let content = tmpl.render(context! {
        imports => import_entries(mapper.uses(), "./"),
        doc => doc,
        name => name,
        strict_name => strict_name(name),
        recursive => recursive,
        loose => loose,
        strict => strict,
        ts_loose => ts_loose,
        ts_strict => ts_strict,
    })?;

    Ok(GeneratedFile {
        path: format!("schemas/{name}.ts"),
        content,
    })
}
