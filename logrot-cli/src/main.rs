//! logrot CLI binary.
//!
//! Entry point for the `logrot` command-line tool.

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use logrot_cli::exit::{child_exit_code, codes, exit_code};
use logrot_cli::{
    execute_pipe, execute_run, execute_status, Cli, Command, CommandError, PipeArgs, RunArgs,
    StatusArgs,
};
use logrot_fs::{Logger, RealFilesystem, StderrLogger, Verbosity};

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(codes::INVALID_ARGS as u8)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let result = match cli.command {
        Command::Pipe(args) => run_pipe(args),
        Command::Run(args) => run_run(args),
        Command::Status(args) => run_status(args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(exit_code(&e) as u8)
        }
    }
}

fn logger(verbose: u8) -> Arc<dyn Logger> {
    Arc::new(StderrLogger::stderr(Verbosity::from_count(verbose)))
}

/// Run the pipe command.
fn run_pipe(args: PipeArgs) -> Result<u8, CommandError> {
    let logger = logger(args.writer.verbose);
    let stdin = io::stdin();

    let result = execute_pipe(&args, stdin.lock(), RealFilesystem, logger)?;

    println!(
        "Wrote {} entries ({} bytes) to {}",
        result.stats.entries,
        result.stats.bytes,
        result.path.display()
    );

    Ok(codes::SUCCESS as u8)
}

/// Run the run command, exiting with the child's code.
fn run_run(args: RunArgs) -> Result<u8, CommandError> {
    let logger = logger(args.writer.verbose);

    let result = execute_run(&args, RealFilesystem, logger)?;

    Ok(child_exit_code(result.exit_code))
}

/// Run the status command.
fn run_status(args: StatusArgs) -> Result<u8, CommandError> {
    let report = execute_status(&args, &RealFilesystem)?;

    if args.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.to_text());
    }

    Ok(codes::SUCCESS as u8)
}
