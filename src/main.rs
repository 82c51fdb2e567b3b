use std::process::ExitCode;

use ava_to_jest::cli::Cli;
use ava_to_jest::cli::run::run_codemod;
use ava_to_jest::error::CodemodError;
use clap::Parser;

fn main() -> ExitCode {
    ava_to_jest::init_tracing();

    match run() {
        Ok((output, failed)) => {
            println!("{output}");
            if failed {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(error) => {
            let serialized = serde_json::to_string_pretty(&error.to_error_response()).unwrap_or_else(
                |_| {
                    "{\"error\":{\"type\":\"serialization_error\",\"message\":\"Failed to serialize error response\"}}"
                        .to_string()
                },
            );
            println!("{serialized}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(String, bool), CodemodError> {
    let cli = Cli::parse();
    let response = run_codemod(&cli)?;
    let failed = response.summary.files_failed > 0;
    let output = serde_json::to_string_pretty(&response)
        .map_err(|source| CodemodError::ResponseSerialization { source })?;
    Ok((output, failed))
}
