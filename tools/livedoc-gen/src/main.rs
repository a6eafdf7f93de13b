// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! livedoc-gen - command-line front end for the reactive document compiler.
//!
//! # Usage
//!
//! ```bash
//! # Type-check a space
//! livedoc-gen check shop.json
//!
//! # Emit the generated unit source and its reflection
//! livedoc-gen generate shop.json -o shop.rs
//! livedoc-gen reflect shop.json -o shop.schema.json
//!
//! # Compile, bind and run the embedded tests
//! livedoc-gen build shop.json --compiler-config rustc.toml
//! livedoc-gen test shop.json --compiler-config rustc.toml --json
//! ```
//!
//! Failures exit with the numeric error code of the failing stage.

use anyhow::Context;
use clap::{Parser, Subcommand};
use livedoc::compile::{CompilerConfig, RustcCompiler};
use livedoc::declare::SpaceDeclarations;
use livedoc::factory::{DocumentFactory, TestOutcome};
use livedoc::space::{self, SpaceError};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "livedoc-gen")]
#[command(about = "Reactive document compiler - check, generate, build and test spaces")]
#[command(version)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Type-check declarations and report every diagnostic
    Check {
        /// Declarations file (JSON)
        input: PathBuf,
    },

    /// Generate the unit source
    Generate {
        input: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Emit the reflection schema
    Reflect {
        input: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compile and bind the unit, then print its configuration
    Build {
        input: PathBuf,

        /// Compiler configuration (TOML)
        #[arg(short, long)]
        compiler_config: Option<PathBuf>,
    },

    /// Compile the unit and run its embedded tests
    Test {
        input: PathBuf,

        #[arg(short, long)]
        compiler_config: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let result = match args.command {
        Commands::Check { input } => cmd_check(&input),
        Commands::Generate { input, output } => cmd_generate(&input, output.as_deref()),
        Commands::Reflect { input, output } => cmd_reflect(&input, output.as_deref()),
        Commands::Build {
            input,
            compiler_config,
        } => cmd_build(&input, compiler_config.as_deref()),
        Commands::Test {
            input,
            compiler_config,
            json,
        } => cmd_test(&input, compiler_config.as_deref(), json),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("[ERROR] {:#}", e);
            exit_code_of(&e)
        }
    }
}

/// Pipeline failures exit with the low byte of their error code.
fn exit_code_of(error: &anyhow::Error) -> ExitCode {
    match error.downcast_ref::<SpaceError>() {
        Some(e) => {
            let code = e.code();
            eprintln!("[ERROR] code {}", code);
            ExitCode::from(u8::try_from(code.as_u32() % 256).unwrap_or(1).max(1))
        }
        None => ExitCode::FAILURE,
    }
}

fn load(input: &Path) -> anyhow::Result<SpaceDeclarations> {
    SpaceDeclarations::from_file(input)
        .with_context(|| format!("reading declarations from {}", input.display()))
}

fn load_compiler(path: Option<&Path>) -> anyhow::Result<RustcCompiler> {
    let config = match path {
        Some(path) => CompilerConfig::from_file(path)
            .with_context(|| format!("reading compiler config from {}", path.display()))?,
        None => CompilerConfig::default(),
    };
    Ok(RustcCompiler::new(config))
}

fn write_output(output: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("writing {}", path.display()))?;
            tracing::info!("Wrote {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

fn cmd_check(input: &Path) -> anyhow::Result<ExitCode> {
    let decls = load(input)?;
    let checked = decls.check();
    if checked.is_deployable() {
        println!("[OK] space '{}' is deployable", decls.space);
        return Ok(ExitCode::SUCCESS);
    }
    for error in checked.diagnostics().iter() {
        println!("{}", error);
    }
    Err(SpaceError::NotDeployable {
        space: decls.space.clone(),
        diagnostics: checked.diagnostics().clone(),
    }
    .into())
}

fn cmd_generate(input: &Path, output: Option<&Path>) -> anyhow::Result<ExitCode> {
    let decls = load(input)?;
    let (_, unit) = space::generate(&decls)?;
    write_output(output, &unit.source)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_reflect(input: &Path, output: Option<&Path>) -> anyhow::Result<ExitCode> {
    let decls = load(input)?;
    let (_, unit) = space::generate(&decls)?;
    let schema = serde_json::to_string_pretty(&unit.reflection)?;
    write_output(output, &schema)?;
    Ok(ExitCode::SUCCESS)
}

fn build(input: &Path, compiler_config: Option<&Path>) -> anyhow::Result<DocumentFactory> {
    let decls = load(input)?;
    let compiler = load_compiler(compiler_config)?;
    Ok(space::build_factory(&decls, &compiler)?)
}

fn cmd_build(input: &Path, compiler_config: Option<&Path>) -> anyhow::Result<ExitCode> {
    let factory = build(input, compiler_config)?;
    let config = factory.config();

    println!("Space: {}", factory.space());
    println!("  maximum_history:      {}", config.maximum_history);
    println!("  delete_on_close:      {}", config.delete_on_close);
    println!("  readonly:             {}", config.readonly);
    println!("  frequency:            {}", config.frequency);
    println!("  temporal_resolution:  {}", config.temporal_resolution_ms);
    println!("  sweep_export_delay:   {}", config.sweep_export_delay);
    if !factory.services().is_empty() {
        println!("  services:");
        for name in factory.services().keys() {
            println!("    - {}", name);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_test(input: &Path, compiler_config: Option<&Path>, json: bool) -> anyhow::Result<ExitCode> {
    let factory = build(input, compiler_config)?;
    let report = factory.run_tests().map_err(SpaceError::from)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for case in &report.cases {
            let mark = if case.passed() { "PASS" } else { "FAIL" };
            println!(
                "[{}] {} ({} assertion(s), {} ms)",
                mark, case.name, case.assertions, case.duration_ms
            );
            if let TestOutcome::Aborted(reason) = &case.outcome {
                println!("       aborted: {}", reason);
            }
            for failure in &case.failures {
                println!("       {}", failure);
            }
        }
        println!();
        println!("{} passed, {} failed", report.passed(), report.failed());
    }

    if report.all_passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
