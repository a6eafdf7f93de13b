// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic compilation pipeline.
//!
//! ```text
//! source --RustcCompiler--> ArtifactBundle --UnitLoader::load--> Artifact --open--> Library
//! ```
//!
//! The bundle holds every file rustc emitted, in memory. Loading is a
//! consuming operation at each step: the loader moves an artifact out of
//! the bundle and opening consumes the artifact, so a unit is mapped at
//! most once per bundle.

mod bundle;
mod compiler;
mod config;
mod loader;

pub use bundle::{library_file_name, Artifact, ArtifactBundle};
pub use compiler::{RustcCompiler, UnitCompiler};
pub use config::{CompilerConfig, ConfigError, ExternCrate};
pub use loader::{Library, UnitLoader};

use thiserror::Error;

/// Failure to build a unit. Always fatal for the factory being built.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("scratch directory: {0}")]
    Scratch(#[source] std::io::Error),

    #[error("failed to run '{rustc}': {source}")]
    Spawn {
        rustc: String,
        source: std::io::Error,
    },

    #[error("rustc failed for unit '{unit}' (status {status:?}):\n{stderr}")]
    Rustc {
        unit: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("reading compiled artifacts: {0}")]
    Capture(#[source] std::io::Error),

    #[error("rustc did not produce '{0}'")]
    MissingLibrary(String),
}

/// Failure to load a compiled unit.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("artifact '{0}' not found")]
    NotFound(String),

    #[error("artifact '{0}' was already loaded")]
    AlreadyConsumed(String),

    #[error("writing artifact for loading: {0}")]
    Materialize(#[source] std::io::Error),

    #[error("dlopen failed: {0}")]
    Open(String),

    #[error("symbol '{0}' not found")]
    MissingSymbol(String),

    #[error("unit ABI version {found} does not match host version {expected}")]
    AbiMismatch { expected: u32, found: u32 },

    #[error("dynamic loading is not supported on this platform")]
    Unsupported,
}
