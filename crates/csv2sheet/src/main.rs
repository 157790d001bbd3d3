mod args;
mod commands;
mod server;

use std::io;

use clap::Parser;

use crate::args::Arguments;

fn main() {
    let args = Arguments::parse();
    logutil::configure_global_logger(args.log_level, args.log_format, io::stderr);

    // Nested result. Outer result for the panic, inner is execution result.
    let result = std::panic::catch_unwind(|| {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("csv2sheet")
            .build()?;
        runtime.block_on(commands::run(args))
    });

    match result {
        Ok(Err(err)) => {
            // "Normal" error.
            println!("ERROR: {err}");
            std::process::exit(1);
        }
        Err(err) => {
            // Panic error.
            println!("PANIC: {err:?}");
            std::process::exit(2);
        }
        Ok(Ok(())) => (),
    }
}
