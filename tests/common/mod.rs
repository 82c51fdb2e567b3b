#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use ava_to_jest::{TransformOptions, TransformOutput, transform_source};
use serde_json::Value;
use tempfile::TempDir;

/// File name warnings are rendered against.
pub const FILE_NAME: &str = "test.js";

pub fn transform(source: &str) -> TransformOutput {
    transform_with(source, &TransformOptions::default())
}

pub fn transform_with(source: &str, options: &TransformOptions) -> TransformOutput {
    transform_source(Path::new(FILE_NAME), source, options).expect("transform should succeed")
}

/// Asserts the rewritten text and that no warnings were produced.
pub fn expect_transformation(source: &str, expected: &str) {
    expect_transformation_with(source, expected, &TransformOptions::default());
}

pub fn expect_transformation_with(source: &str, expected: &str, options: &TransformOptions) {
    let result = transform_with(source, options);
    assert_eq!(result.output, expected);
    assert_eq!(warnings_of(&result), Vec::<String>::new());
}

pub fn warnings(source: &str) -> Vec<String> {
    warnings_of(&transform(source))
}

pub fn warnings_of(result: &TransformOutput) -> Vec<String> {
    result.rendered_warnings(FILE_NAME)
}

pub fn write_temp_file(directory: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = directory.path().join(name);
    fs::write(&path, content).expect("temp file write should succeed");
    path
}

pub fn run_ava_to_jest(args: &[&str]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_ava-to-jest"));
    command.env_remove("AVA_TO_JEST_LOG");
    command.args(args);
    command.output().expect("failed to run ava-to-jest binary")
}

pub fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON")
}
