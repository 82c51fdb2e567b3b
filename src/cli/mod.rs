use std::path::PathBuf;

use clap::Parser;

mod io;
pub mod run;

#[derive(Debug, Parser)]
#[command(name = "ava-to-jest")]
#[command(about = "Rewrite AVA test files to Jest")]
#[command(
    long_about = "Rewrite AVA test files to Jest in place. Files that do not import AVA are left untouched unless --skip-import-detection is given. Warnings for constructs that could not be rewritten are printed to stderr."
)]
pub struct Cli {
    #[arg(
        long,
        help = "Treat calls of the test function as AVA registrations even without an import"
    )]
    pub skip_import_detection: bool,
    #[arg(
        long,
        value_name = "NAME",
        help = "Test function name used with --skip-import-detection (default: test)"
    )]
    pub test_function_name: Option<String>,
    #[arg(long, value_name = "FILE", help = "Read options from a TOML file")]
    pub config: Option<PathBuf>,
    #[arg(long, help = "Report results without writing files")]
    pub dry_run: bool,
    #[arg(long, help = "Include the rewritten source of each file in output")]
    pub verbose: bool,
    #[arg(value_name = "FILE", required = true, help = "Test files to rewrite")]
    pub files: Vec<PathBuf>,
}
