// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! End-to-end pipeline: declarations to a bound factory.
//!
//! ```text
//! SpaceDeclarations -> check -> generate_unit -> UnitCompiler -> DocumentFactory
//! ```
//!
//! Each stage is fatal on failure; there is no partial success.

use crate::check::{CheckedSpace, Diagnostics};
use crate::codegen::{generate_unit, CodegenError, GeneratedUnit};
use crate::compile::{CompileError, UnitCompiler};
use crate::declare::SpaceDeclarations;
use crate::factory::{DocumentFactory, ErrorCode, FactoryError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpaceError {
    #[error("space '{space}' is not deployable:\n{diagnostics}")]
    NotDeployable {
        space: String,
        diagnostics: Diagnostics,
    },

    #[error(transparent)]
    Codegen(#[from] CodegenError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Factory(#[from] FactoryError),
}

impl SpaceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotDeployable { .. } => ErrorCode::NotDeployable,
            Self::Codegen(_) => ErrorCode::CodegenFailed,
            Self::Compile(_) => ErrorCode::CompileFailed,
            Self::Factory(e) => e.code(),
        }
    }
}

/// Check and generate without compiling.
pub fn generate(decls: &SpaceDeclarations) -> Result<(CheckedSpace, GeneratedUnit), SpaceError> {
    let checked = decls.check();
    if !checked.is_deployable() {
        log::warn!(
            "[space] '{}': {} type error(s)",
            decls.space,
            checked.diagnostics().len()
        );
        return Err(SpaceError::NotDeployable {
            space: decls.space.clone(),
            diagnostics: checked.diagnostics().clone(),
        });
    }
    let unit = generate_unit(&checked, &decls.document, &decls.unit_name())?;
    Ok((checked, unit))
}

/// Run the whole pipeline.
pub fn build_factory(
    decls: &SpaceDeclarations,
    compiler: &dyn UnitCompiler,
) -> Result<DocumentFactory, SpaceError> {
    let (_, unit) = generate(decls)?;
    let bundle = compiler.compile(&unit.unit_name, &unit.source)?;
    let factory = DocumentFactory::new(decls.space.clone(), bundle)?;
    log::info!("[space] '{}' deployed as '{}'", decls.space, unit.unit_name);
    Ok(factory)
}
