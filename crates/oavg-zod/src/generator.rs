use log::debug;
use oavg_core::config::OavgConfig;
use oavg_core::ir::IrSpec;
use oavg_core::pool::{DEFAULT_CONCURRENCY, run_bounded};
use oavg_core::{CodeGenerator, GeneratedFile};

use crate::emitters;
use crate::error::EmitError;

/// Output switches for [`ZodGenerator`].
#[derive(Debug, Clone)]
pub struct ZodOptions {
    /// Emit the top-level `index.ts` barrel.
    pub index: bool,
    pub jsdoc: bool,
    pub concurrency: usize,
}

impl Default for ZodOptions {
    fn default() -> Self {
        Self {
            index: true,
            jsdoc: true,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl From<&OavgConfig> for ZodOptions {
    fn from(config: &OavgConfig) -> Self {
        Self {
            index: config.emit.index,
            jsdoc: config.emit.jsdoc,
            concurrency: config.concurrency,
        }
    }
}

/// TypeScript + zod generator.
pub struct ZodGenerator;

impl CodeGenerator for ZodGenerator {
    type Config = ZodOptions;
    type Error = EmitError;

    fn generate(&self, ir: &IrSpec, options: &ZodOptions) -> Result<Vec<GeneratedFile>, EmitError> {
        let env = emitters::environment()?;

        let mut files = run_bounded(&ir.schemas, options.concurrency, |schema| {
            emitters::schema::emit_schema(&env, ir, schema, options.jsdoc)
        })?;
        files.extend(run_bounded(&ir.operations, options.concurrency, |op| {
            emitters::operation::emit_operation(&env, ir, op, options.jsdoc)
        })?);
        files.push(emitters::index::emit_operations_index(&env, ir)?);
        files.push(emitters::support::emit_support());
        if options.index {
            files.push(emitters::index::emit_index(&env, ir)?);
        }

        debug!("emitted {} files", files.len());
        Ok(files)
    }
}
