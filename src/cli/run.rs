use std::fs;
use std::path::Path;

use serde::Serialize;

use super::Cli;
use super::io::write_text_atomically;
use crate::config::{TransformOptions, is_identifier};
use crate::error::{CodemodError, ErrorBody};
use crate::provider::ProviderRegistry;
use crate::transform::transform_source_with;

#[derive(Debug, Serialize)]
pub struct CodemodResponse {
    pub files: Vec<FileResult>,
    pub summary: CodemodSummary,
}

#[derive(Debug, Serialize)]
pub struct FileResult {
    pub file: String,
    pub changed: bool,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Default, Serialize)]
pub struct CodemodSummary {
    pub files_scanned: usize,
    pub files_changed: usize,
    pub files_failed: usize,
    pub warnings: usize,
}

/// Options from `--config`, overridden by flags.
pub fn resolve_options(cli: &Cli) -> Result<TransformOptions, CodemodError> {
    let mut options = match &cli.config {
        Some(path) => TransformOptions::load(path)?,
        None => TransformOptions::default(),
    };

    if cli.skip_import_detection {
        options.skip_import_detection = true;
    }
    if let Some(name) = &cli.test_function_name {
        if !is_identifier(name) {
            return Err(CodemodError::InvalidRequest {
                message: format!("--test-function-name '{name}' is not a valid identifier"),
            });
        }
        options.test_function_name = Some(name.clone());
    }

    Ok(options)
}

pub fn run_codemod(cli: &Cli) -> Result<CodemodResponse, CodemodError> {
    let options = resolve_options(cli)?;
    let registry = ProviderRegistry::default();
    tracing::debug!(?options, files = cli.files.len(), dry_run = cli.dry_run, "starting run");

    let mut files = Vec::with_capacity(cli.files.len());
    let mut summary = CodemodSummary::default();

    for path in &cli.files {
        summary.files_scanned += 1;
        let result = match transform_file(&registry, path, &options, cli) {
            Ok(result) => result,
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "file skipped");
                summary.files_failed += 1;
                FileResult {
                    file: path.display().to_string(),
                    changed: false,
                    warnings: Vec::new(),
                    output: None,
                    error: Some(error.to_error_response().error),
                }
            }
        };

        if result.changed {
            summary.files_changed += 1;
        }
        summary.warnings += result.warnings.len();
        files.push(result);
    }

    Ok(CodemodResponse { files, summary })
}

fn transform_file(
    registry: &ProviderRegistry,
    path: &Path,
    options: &TransformOptions,
    cli: &Cli,
) -> Result<FileResult, CodemodError> {
    let source = fs::read_to_string(path).map_err(|error| CodemodError::io(path, error))?;
    let transformed = transform_source_with(registry, path, &source, options)?;
    let file = path.display().to_string();

    let warnings = transformed.rendered_warnings(&file);
    for warning in &warnings {
        eprintln!("{warning}");
    }

    if transformed.changed && !cli.dry_run {
        write_text_atomically(path, &transformed.output)?;
    }

    Ok(FileResult {
        file,
        changed: transformed.changed,
        warnings,
        output: cli.verbose.then_some(transformed.output),
        error: None,
    })
}
