// Command-line entry point for cpp_envoy.

use clap::Parser;
use cpp_envoy::application::GenerateUsecase;
use cpp_envoy::infrastructure::build_env::BuildEnv;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Build environment JSON file
    #[arg(short, long)]
    env: PathBuf,

    /// Pre-serialized AST document (skips the clang invocation)
    #[arg(short, long)]
    ast: Option<PathBuf>,

    /// Also write a sorted env.json snapshot to the project root
    #[arg(long)]
    dump_env: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let env = match BuildEnv::from_file(&cli.env) {
        Ok(env) => env,
        Err(e) => {
            eprintln!("Error: {e:?}");
            return ExitCode::FAILURE;
        }
    };
    let usecase = GenerateUsecase { env };

    if cli.dump_env {
        match usecase.dump_env() {
            Ok(path) => println!("[ENV] Snapshot written to {}", path.display()),
            Err(e) => {
                eprintln!("Error: {e:?}");
                return ExitCode::FAILURE;
            }
        }
    }

    match usecase.run(cli.ast.as_deref()) {
        Ok(summary) => {
            println!(
                "Generation completed! {} function(s) bound, {} of {} member(s) kept",
                summary.functions, summary.members_kept, summary.members_total
            );
            if !summary.diagnostics.is_empty() {
                println!(
                    "{} declaration(s) skipped, see diagnostics above",
                    summary.diagnostics.len()
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}
