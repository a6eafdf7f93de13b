// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic
#![allow(clippy::missing_panics_doc)] // Tests/examples panic on failure

//! Factory behavior over an in-process unit that serves a declared surface.
//!
//! The unit answers exactly what a generated unit would answer for the same
//! `DocumentSurface`, so configuration, services and test listing can be
//! checked without invoking rustc.

use livedoc::codegen::DocumentSurface;
use livedoc::compile::{library_file_name, ArtifactBundle, LoadError, UnitLoader};
use livedoc::factory::{
    ClientRegistry, DocumentConfig, DocumentFactory, DocumentInstance, DocumentMonitor,
    DocumentUnit, ErrorCode, GenericClient, HeaderDecryptor, InvokeError, MockMonitor,
    NoDecryptor, Principal, RequestContext, TestOutcome,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct SurfaceUnit {
    surface: DocumentSurface,
    constructed: AtomicUsize,
}

impl SurfaceUnit {
    fn new(surface: DocumentSurface) -> Arc<Self> {
        Arc::new(Self {
            surface,
            constructed: AtomicUsize::new(0),
        })
    }
}

struct SurfaceDocument {
    surface: DocumentSurface,
    monitor: Arc<dyn DocumentMonitor>,
    constructed: bool,
}

impl DocumentUnit for SurfaceUnit {
    fn construct(
        &self,
        monitor: Arc<dyn DocumentMonitor>,
    ) -> Result<Box<dyn DocumentInstance>, InvokeError> {
        self.constructed.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(SurfaceDocument {
            surface: self.surface.clone(),
            monitor,
            constructed: false,
        }))
    }

    fn can_create(&self, _context: &RequestContext) -> Result<bool, InvokeError> {
        Ok(self.surface.policies.can_create.is_some())
    }

    fn can_invent(&self, _context: &RequestContext) -> Result<bool, InvokeError> {
        Ok(self.surface.policies.can_invent.is_some())
    }

    fn can_send_while_disconnected(&self, _context: &RequestContext) -> Result<bool, InvokeError> {
        Err(InvokeError::new("policy panicked"))
    }

    fn config(&self) -> Result<String, InvokeError> {
        Ok(Value::Object(self.surface.config.clone()).to_string())
    }

    fn services(&self) -> Result<String, InvokeError> {
        Ok(json!(self.surface.services).to_string())
    }

    fn create_generic_clients(
        &self,
        registry: &ClientRegistry,
        decryptor: Arc<dyn HeaderDecryptor>,
    ) -> Result<usize, InvokeError> {
        let descriptors = self.surface.generic_clients();
        let list = descriptors.as_array().cloned().unwrap_or_default();
        for descriptor in &list {
            registry.register(GenericClient {
                service: descriptor["service"].as_str().unwrap_or_default().to_string(),
                class: descriptor["class"].as_str().unwrap_or_default().to_string(),
                decryptor: Arc::clone(&decryptor),
            });
        }
        Ok(list.len())
    }

    fn tests(&self) -> Result<Vec<String>, InvokeError> {
        Ok(self.surface.tests.iter().map(|t| t.name.clone()).collect())
    }
}

impl DocumentInstance for SurfaceDocument {
    fn transact_construct(&mut self, _who: &Principal, _arg: &str) -> Result<String, InvokeError> {
        self.constructed = true;
        let patch = json!({ "data": {} }).to_string();
        self.monitor.on_patch(&patch);
        Ok(patch)
    }

    fn late_bind(&mut self, _space: &str, _key: &str) -> Result<(), InvokeError> {
        Ok(())
    }

    fn run_test(&mut self, name: &str) -> Result<Value, InvokeError> {
        if !self.constructed {
            return Err(InvokeError::new("not constructed"));
        }
        let test = self
            .surface
            .tests
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| InvokeError::new(format!("no test '{name}'")))?;
        Ok(match test.body.as_str() {
            "pass" => json!({ "assertions": 2, "failures": [] }),
            "fail" => json!({ "assertions": 1, "failures": ["expected 1, got 2"] }),
            _ => json!("garbage"),
        })
    }
}

#[test]
fn test_missing_config_keys_take_defaults() {
    let unit = SurfaceUnit::new(DocumentSurface::default().config("frequency", 5));
    let factory = DocumentFactory::from_unit("cfg", unit).expect("bind");

    let config = factory.config();
    assert_eq!(config.frequency, 5);
    assert_eq!(config.maximum_history, 1000);
    assert!(!config.delete_on_close);
    assert!(!config.readonly);
    assert_eq!(config.temporal_resolution_ms, 0);
    assert_eq!(config.sweep_export_delay, 0);
    assert_eq!(config.app_mode(), Some(Duration::from_millis(5)));
    assert_eq!(factory.raw_config().len(), 1);
}

#[test]
fn test_wrong_typed_config_values_fall_back() {
    let unit = SurfaceUnit::new(
        DocumentSurface::default()
            .config("maximum_history", "lots")
            .config("readonly", true)
            .config("sweep_export_delay", 10_000_000_000_i64),
    );
    let factory = DocumentFactory::from_unit("cfg", unit).expect("bind");

    let config = factory.config();
    assert_eq!(config.maximum_history, DocumentConfig::default().maximum_history);
    assert!(config.readonly);
    assert_eq!(config.sweep_export_delay, 10_000_000_000);
    assert_eq!(config.app_mode(), None);
}

#[test]
fn test_null_and_unknown_values_default_per_key() {
    let unit = SurfaceUnit::new(
        DocumentSurface::default()
            .config("frequency", 5)
            .config("note", Value::Null)
            .config("delete_on_close", json!({ "nested": null }))
            .config("readonly", true),
    );
    let factory = DocumentFactory::from_unit("cfg", unit).expect("bind");

    let config = factory.config();
    assert_eq!(config.frequency, 5);
    assert!(config.readonly);
    assert!(!config.delete_on_close);
    assert_eq!(config.maximum_history, 1000);
    assert_eq!(factory.raw_config().len(), 2);
}

#[test]
fn test_services_and_clients_follow_declarations() {
    let surface = DocumentSurface::default()
        .service("mail", vec![("class".to_string(), "smtp".to_string())])
        .service("audit", Vec::new());
    let factory = DocumentFactory::from_unit("svc", SurfaceUnit::new(surface)).expect("bind");

    let names: Vec<&String> = factory.services().keys().collect();
    assert_eq!(names, ["mail", "audit"]);
    assert_eq!(factory.services()["mail"]["class"], "smtp");

    let clients = factory.clients(Arc::new(NoDecryptor)).expect("clients");
    assert_eq!(clients.services(), ["audit", "mail"]);
    assert_eq!(clients.get("audit").expect("audit").class, "generic");
    assert_eq!(clients.get("mail").expect("mail").class, "smtp");

    let again = factory.clients(Arc::new(NoDecryptor)).expect("clients");
    assert!(Arc::ptr_eq(&clients, &again));
}

#[test]
fn test_policy_failures_carry_their_codes() {
    let surface = DocumentSurface::default().can_create("true");
    let factory = DocumentFactory::from_unit("pol", SurfaceUnit::new(surface)).expect("bind");
    let context = RequestContext::mock();

    assert!(factory.can_create(&context).expect("can_create"));
    assert!(!factory.can_invent(&context).expect("can_invent"));
    let err = factory.can_send_while_disconnected(&context).unwrap_err();
    assert_eq!(err.code(), ErrorCode::CanSendWhileDisconnectedFailed);
    assert_eq!(err.code().as_u32(), 150_004);
}

#[test]
fn test_runner_builds_a_fresh_document_per_test() {
    let surface = DocumentSurface::default()
        .test("passes", "pass")
        .test("fails", "fail")
        .test("garbled", "???");
    let unit = SurfaceUnit::new(surface);
    let factory = DocumentFactory::from_unit("tests", unit.clone()).expect("bind");

    let report = factory.run_tests().expect("run");
    assert_eq!(unit.constructed.load(Ordering::SeqCst), 3);
    assert_eq!(report.space, "tests");
    assert_eq!(report.cases.len(), 3);
    assert_eq!(report.passed(), 1);
    assert_eq!(report.failed(), 2);
    assert!(!report.all_passed());

    let passes = &report.cases[0];
    assert_eq!(passes.outcome, TestOutcome::Passed);
    assert_eq!(passes.assertions, 2);
    assert_eq!(passes.patches, 1);

    let fails = &report.cases[1];
    assert_eq!(fails.outcome, TestOutcome::Failed);
    assert_eq!(fails.failures, ["expected 1, got 2"]);

    assert!(matches!(report.cases[2].outcome, TestOutcome::Aborted(_)));
}

#[test]
fn test_created_documents_report_to_their_monitor() {
    let factory =
        DocumentFactory::from_unit("mon", SurfaceUnit::new(DocumentSurface::default()))
            .expect("bind");
    let monitor = Arc::new(MockMonitor::new());
    let mut document = factory.create(monitor.clone()).expect("create");

    let patch = document
        .transact_construct(&Principal::system(), "{}")
        .expect("construct");
    assert_eq!(monitor.patches(), [patch]);
}

#[test]
fn test_loader_hands_out_each_artifact_once() {
    let mut bundle = ArtifactBundle::new("livedoc_demo");
    bundle.insert("notes.txt", b"hello".to_vec());
    assert_eq!(bundle.library_name(), library_file_name("livedoc_demo"));

    let mut loader = UnitLoader::new(bundle);
    let artifact = loader.load("notes.txt").expect("first load");
    assert_eq!(artifact.into_bytes(), b"hello");
    assert_eq!(loader.remaining(), 0);

    assert!(matches!(
        loader.load("notes.txt"),
        Err(LoadError::AlreadyConsumed(name)) if name == "notes.txt"
    ));
    assert!(matches!(
        loader.load("missing.txt"),
        Err(LoadError::NotFound(name)) if name == "missing.txt"
    ));
    assert!(matches!(loader.load_library(), Err(LoadError::NotFound(_))));
}

#[test]
fn test_missing_library_is_a_bind_failure() {
    let err = DocumentFactory::new("none", ArtifactBundle::new("livedoc_none")).unwrap_err();
    assert_eq!(err.code(), ErrorCode::FactoryBindFailed);
}
