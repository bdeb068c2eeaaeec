//! Compilation options and command line parsing.
//!
//! `CompileOptions` carries everything the code generator and the emitter
//! need to know about the target and the output. The binary builds it from
//! its arguments with `parse_args`.

use std::path::{Path, PathBuf};

use inkwell::{targets::RelocMode, OptimizationLevel};
use thiserror::Error;

pub const DEFAULT_ENTRY_SYMBOL: &str = "_start";

pub const USAGE: &str = "usage: snlc <tree-file> [-o <out>] [--target <triple>] [--cpu <cpu>] \
[--features <features>] [--emit ir|asm|obj] [--entry <symbol>] [--source <snl-file>] \
[--bootstrap <file>] [-O0|-O1|-O2|-O3]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitKind {
    LlvmIr,
    Assembly,
    Object,
}

impl EmitKind {
    pub fn extension(&self) -> &'static str {
        match self {
            EmitKind::LlvmIr => "ll",
            EmitKind::Assembly => "s",
            EmitKind::Object => "o",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// `None` targets the host.
    pub target_triple: Option<String>,
    pub cpu: String,
    pub features: String,
    pub opt_level: OptimizationLevel,
    pub reloc_mode: RelocMode,
    /// External symbol that allocates the root frame and runs the program body.
    pub entry_symbol: String,
    pub emit: EmitKind,
    pub output: Option<PathBuf>,
    /// Startup code prepended to emitted assembly.
    pub bootstrap: Option<PathBuf>,
    /// Program source the tree was produced from, used to quote lines in diagnostics.
    pub source: Option<PathBuf>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            target_triple: None,
            cpu: String::from("generic"),
            features: String::new(),
            opt_level: OptimizationLevel::Default,
            reloc_mode: RelocMode::PIC,
            entry_symbol: String::from(DEFAULT_ENTRY_SYMBOL),
            emit: EmitKind::LlvmIr,
            output: None,
            bootstrap: None,
            source: None,
        }
    }
}

impl CompileOptions {
    /// Explicit output path, or `<input stem>.<ll|s|o>` next to the input.
    pub fn output_path(&self, input: &Path) -> PathBuf {
        match &self.output {
            Some(output) => output.clone(),
            None => input.with_extension(self.emit.extension()),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("missing input tree file")]
    MissingInput,
    #[error("unexpected extra argument {0:?}")]
    UnexpectedArgument(String),
    #[error("option {0} expects a value")]
    MissingValue(String),
    #[error("unknown option {0:?}")]
    UnknownOption(String),
    #[error("unknown emit kind {0:?}, expected ir, asm or obj")]
    UnknownEmitKind(String),
}

/// A parsed command line: the tree file to compile and how to compile it.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub input: PathBuf,
    pub options: CompileOptions,
}

/// Parses the arguments following the program name.
pub fn parse_args<I>(args: I) -> Result<Invocation, ConfigError>
where
    I: IntoIterator<Item = String>,
{
    let mut options = CompileOptions::default();
    let mut input = None;
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        let mut value = |option: &str| {
            args.next()
                .ok_or_else(|| ConfigError::MissingValue(option.to_string()))
        };

        match arg.as_str() {
            "-o" => options.output = Some(PathBuf::from(value("-o")?)),
            "--target" => options.target_triple = Some(value("--target")?),
            "--cpu" => options.cpu = value("--cpu")?,
            "--features" => options.features = value("--features")?,
            "--entry" => options.entry_symbol = value("--entry")?,
            "--source" => options.source = Some(PathBuf::from(value("--source")?)),
            "--bootstrap" => options.bootstrap = Some(PathBuf::from(value("--bootstrap")?)),
            "--emit" => {
                options.emit = match value("--emit")?.as_str() {
                    "ir" => EmitKind::LlvmIr,
                    "asm" => EmitKind::Assembly,
                    "obj" => EmitKind::Object,
                    other => return Err(ConfigError::UnknownEmitKind(other.to_string())),
                }
            }
            "-O0" => options.opt_level = OptimizationLevel::None,
            "-O1" => options.opt_level = OptimizationLevel::Less,
            "-O2" => options.opt_level = OptimizationLevel::Default,
            "-O3" => options.opt_level = OptimizationLevel::Aggressive,
            option if option.starts_with('-') => {
                return Err(ConfigError::UnknownOption(option.to_string()))
            }
            _ => {
                if input.is_some() {
                    return Err(ConfigError::UnexpectedArgument(arg));
                }
                input = Some(PathBuf::from(arg));
            }
        }
    }

    Ok(Invocation {
        input: input.ok_or(ConfigError::MissingInput)?,
        options,
    })
}
