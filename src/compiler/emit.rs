//! Writing the finished module out as LLVM IR, assembly or an object file.

use std::{fs, path::Path};

use inkwell::targets::FileType;
use tracing::info;

use crate::{
    config::EmitKind,
    errors::errors::{Error, ErrorImpl},
    MK_ERROR,
};

use super::compiler::Compiler;

impl<'a> Compiler<'a> {
    /// Writes the module to `output` in the configured format.
    ///
    /// Assembly is post-processed with `postprocess_assembly`, prefixed by the
    /// configured bootstrap file if there is one.
    pub fn emit(&self, output: &Path) -> Result<(), Error> {
        let backend_error = |message: String| {
            MK_ERROR!(ErrorImpl::BackendError { message }, 0, self.file)
        };

        match self.options.emit {
            EmitKind::LlvmIr => self
                .module
                .print_to_file(output)
                .map_err(|error| backend_error(error.to_string()))?,
            EmitKind::Object => self
                .target_machine
                .write_to_file(&self.module, FileType::Object, output)
                .map_err(|error| backend_error(error.to_string()))?,
            EmitKind::Assembly => {
                let buffer = self
                    .target_machine
                    .write_to_memory_buffer(&self.module, FileType::Assembly)
                    .map_err(|error| backend_error(error.to_string()))?;
                let assembly = String::from_utf8_lossy(buffer.as_slice());

                let bootstrap = match &self.options.bootstrap {
                    Some(path) => Some(fs::read_to_string(path).map_err(|error| {
                        backend_error(format!("cannot read bootstrap {}: {}", path.display(), error))
                    })?),
                    None => None,
                };

                fs::write(output, postprocess_assembly(&assembly, bootstrap.as_deref()))
                    .map_err(|error| {
                        backend_error(format!("cannot write {}: {}", output.display(), error))
                    })?;
            }
        }

        info!(output = %output.display(), kind = ?self.options.emit, "emitted module");
        Ok(())
    }
}

/// Drops assembler directives and prepends the startup code.
///
/// A directive is a line whose first non-blank character is `.`. Label
/// definitions such as `.LBB0_2:` are kept, since branches refer to them.
pub fn postprocess_assembly(assembly: &str, bootstrap: Option<&str>) -> String {
    let mut result = String::new();

    if let Some(bootstrap) = bootstrap {
        result.push_str(bootstrap);
        if !bootstrap.ends_with('\n') {
            result.push('\n');
        }
        result.push('\n');
    }

    for line in assembly.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('.') && !trimmed.ends_with(':') {
            continue;
        }

        result.push_str(line);
        result.push('\n');
    }

    result
}
