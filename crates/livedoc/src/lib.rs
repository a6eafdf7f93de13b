// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # livedoc - reactive document compiler
//!
//! Type-checks declarations of reactive fields, records, messages, aliases
//! and tables, lowers them into a Rust unit implementing a transactional,
//! indexable, delta-synchronized *living document*, compiles that unit into
//! a shared library and binds it into a per-space document factory.
//!
//! ## Quick Start
//!
//! ```rust
//! use livedoc::declare::SpaceDeclarations;
//! use livedoc::types::{StructureStorage, TypeNode};
//!
//! let decls = SpaceDeclarations::new("shop")
//!     .record(
//!         StructureStorage::record("Item")
//!             .field("id", TypeNode::int())
//!             .field("sku", TypeNode::string())
//!             .index("sku"),
//!     )
//!     .root(StructureStorage::root().field("items", TypeNode::table("Item")));
//!
//! let (checked, unit) = livedoc::space::generate(&decls).expect("deployable");
//! assert!(checked.is_deployable());
//! assert!(unit.source.contains("pub struct RTxItem {"));
//! assert_eq!(unit.reflection["root"]["fields"]["items"]["type"]["nature"], "reactive_table");
//! ```
//!
//! ## Architecture
//!
//! ```text
//! declarations -> types -> check -> codegen -> compile -> factory -> documents
//!                                  \-> reflect
//! ```
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`types`] | reactive type hierarchy and capabilities |
//! | [`check`] | resolution, validation, dependency graph |
//! | [`codegen`] | unit source generation |
//! | [`reflect`] | reflection JSON schema |
//! | [`compile`] | rustc invocation, in-memory artifacts, loading |
//! | [`factory`] | bound units, policies, config, embedded tests |
//! | [`declare`] | declaration input model |
//! | [`space`] | end-to-end pipeline |

pub mod check;
pub mod codegen;
pub mod compile;
pub mod declare;
pub mod factory;
pub mod reflect;
pub mod space;
pub mod types;

pub use check::{CheckedSpace, Checker, Diagnostics, DocumentError};
pub use codegen::{generate_unit, DocumentSurface, GeneratedUnit};
pub use compile::{ArtifactBundle, CompilerConfig, RustcCompiler, UnitCompiler, UnitLoader};
pub use declare::SpaceDeclarations;
pub use factory::{DocumentFactory, ErrorCode, FactoryError};
pub use space::{build_factory, SpaceError};
pub use types::{StructureStorage, TypeNode};
