use std::{env, process, time::Instant};

use inkwell::context::Context;
use snlc::{
    compiler::compiler::compile,
    config::{parse_args, USAGE},
    display_error, init_tracing,
    reader::reader::read_program_file,
};
use tracing::info;

fn main() {
    init_tracing();

    let invocation = match parse_args(env::args().skip(1)) {
        Ok(invocation) => invocation,
        Err(error) => {
            eprintln!("{}", error);
            eprintln!("{}", USAGE);
            process::exit(2);
        }
    };

    let options = invocation.options;
    let source = options.source.clone();
    let output = options.output_path(&invocation.input);

    let start = Instant::now();

    let program = match read_program_file(&invocation.input) {
        Ok(program) => program,
        Err(error) => {
            display_error(&error, source.as_deref());
            process::exit(1);
        }
    };

    info!(elapsed = ?start.elapsed(), "read tree");

    let context = Context::create();
    let file = invocation.input.to_string_lossy().to_string().into();

    let compile_start = Instant::now();
    let compiled = match compile(&program, &context, file, options) {
        Ok(compiled) => compiled,
        Err(error) => {
            display_error(&error, source.as_deref());
            process::exit(1);
        }
    };

    info!(elapsed = ?compile_start.elapsed(), "generated module");

    if let Err(error) = compiled.emit(&output) {
        display_error(&error, source.as_deref());
        process::exit(1);
    }

    info!(elapsed = ?start.elapsed(), output = %output.display(), "done");
}
