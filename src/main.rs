use std::{path::PathBuf, process};

use clap::{Parser, Subcommand};

use redex::interpreter::Interpreter;

#[derive(Debug, Parser)]
#[command(
    name = "redex",
    version,
    about = "An interpreter for a small term-rewriting language."
)]
struct RedexArgs {
    #[command(subcommand)]
    command: ArgsCommand,
}

#[derive(Debug, Subcommand)]
enum ArgsCommand {
    /// Parse, load, validate, and evaluate a program file.
    Run {
        /// The path to the program file to run.
        #[arg(required = true)]
        file: PathBuf,
        /// Print the rewrite trace of every evaluated expression.
        #[arg(long)]
        trace: bool,
        /// Run the unit tests embedded in imported modules first.
        #[arg(long)]
        test: bool,
        /// Directory searched for user modules (<dir>/<Name>.rx).
        #[arg(long, default_value = "modules")]
        modules: PathBuf,
    },
}

fn main() {
    let args = RedexArgs::parse();

    match args.command {
        ArgsCommand::Run {
            file,
            trace,
            test,
            modules,
        } => {
            let interpreter = Interpreter::new(modules)
                .with_trace(trace)
                .with_tests(test);
            let report = match interpreter.run_file(&file) {
                Ok(report) => report,
                Err(e) => {
                    eprintln!("{:?}", miette::Report::new(e));
                    process::exit(1);
                }
            };

            if let Some(tests) = &report.tests {
                println!("{tests}");
                if !tests.all_passed() {
                    process::exit(1);
                }
            }

            let mut failed = false;
            for evaluation in report.evaluations {
                match evaluation.outcome {
                    Ok(result) => {
                        if let Some(trace) = &evaluation.trace {
                            for entry in trace {
                                println!("{entry}");
                            }
                            println!("Initial Expression: {}", evaluation.expression);
                            println!("Result: {result}");
                        } else {
                            println!("{} = {result}", evaluation.expression);
                        }
                    }
                    Err(e) => {
                        failed = true;
                        eprintln!("{:?}", miette::Report::new(e));
                    }
                }
            }
            if failed {
                process::exit(1);
            }
        }
    }
}
