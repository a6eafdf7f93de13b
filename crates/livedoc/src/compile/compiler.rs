// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Unit compilation through the host `rustc`.

use super::{ArtifactBundle, CompileError, CompilerConfig};
use std::fs;
use std::path::Path;
use std::process::Command;
use std::time::Instant;

/// Turns unit source into compiled artifacts.
pub trait UnitCompiler: Send + Sync {
    fn compile(&self, unit_name: &str, source: &str) -> Result<ArtifactBundle, CompileError>;
}

/// Builds units as `cdylib`s with the host `rustc`.
///
/// The source is written into a scratch directory that is removed once
/// every emitted file has been captured into the returned bundle. A build
/// failure is returned as is; there is no retry.
#[derive(Debug, Clone, Default)]
pub struct RustcCompiler {
    config: CompilerConfig,
}

impl RustcCompiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }
}

impl UnitCompiler for RustcCompiler {
    fn compile(&self, unit_name: &str, source: &str) -> Result<ArtifactBundle, CompileError> {
        let started = Instant::now();
        let scratch = tempfile::Builder::new()
            .prefix("livedoc-unit-")
            .tempdir()
            .map_err(CompileError::Scratch)?;
        let source_path = scratch.path().join(format!("{unit_name}.rs"));
        let out_dir = scratch.path().join("out");
        fs::write(&source_path, source).map_err(CompileError::Scratch)?;
        fs::create_dir(&out_dir).map_err(CompileError::Scratch)?;

        let args = self.config.rustc_args(unit_name, &source_path, &out_dir);
        log::debug!(
            "[compile] {} {}",
            self.config.rustc.display(),
            args.join(" ")
        );
        let output = Command::new(&self.config.rustc)
            .args(&args)
            .output()
            .map_err(|source| CompileError::Spawn {
                rustc: self.config.rustc.display().to_string(),
                source,
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            log::warn!("[compile] unit '{}' failed: {}", unit_name, output.status);
            return Err(CompileError::Rustc {
                unit: unit_name.to_string(),
                status: output.status.code(),
                stderr,
            });
        }

        let bundle = capture(unit_name, &out_dir)?;
        if !bundle.contains(&bundle.library_name()) {
            return Err(CompileError::MissingLibrary(bundle.library_name()));
        }
        log::info!(
            "[compile] unit '{}': {} artifact(s), {} bytes in {:?}",
            unit_name,
            bundle.len(),
            bundle.resident_bytes(),
            started.elapsed()
        );
        Ok(bundle)
    }
}

/// Read every regular file of `dir` into a bundle.
fn capture(unit_name: &str, dir: &Path) -> Result<ArtifactBundle, CompileError> {
    let mut bundle = ArtifactBundle::new(unit_name);
    for entry in fs::read_dir(dir).map_err(CompileError::Capture)? {
        let entry = entry.map_err(CompileError::Capture)?;
        if !entry.file_type().map_err(CompileError::Capture)?.is_file() {
            continue;
        }
        let bytes = fs::read(entry.path()).map_err(CompileError::Capture)?;
        bundle.insert(entry.file_name().to_string_lossy().into_owned(), bytes);
    }
    Ok(bundle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_reads_regular_files() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(dir.path().join("libdemo.so"), b"elf").expect("write");
        fs::create_dir(dir.path().join("nested")).expect("mkdir");
        let bundle = capture("demo", dir.path()).expect("capture");
        assert_eq!(bundle.len(), 1);
        assert!(bundle.contains("libdemo.so"));
    }

    #[test]
    fn test_missing_rustc_is_spawn_error() {
        let compiler = RustcCompiler::new(CompilerConfig {
            rustc: "/nonexistent/livedoc-rustc".into(),
            ..CompilerConfig::default()
        });
        let err = compiler.compile("demo", "").unwrap_err();
        assert!(matches!(err, CompileError::Spawn { .. }));
    }
}
