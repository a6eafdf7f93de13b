// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Document factory.
//!
//! A [`DocumentFactory`] binds one compiled unit for one space. Binding
//! reads the unit's static configuration and service map once; afterwards
//! the factory is shared read-only (`Arc<DocumentFactory>`) and every
//! document it creates transacts independently.
//!
//! # Errors
//!
//! | Failure | Code |
//! |---------|------|
//! | load or bind | `FACTORY_BIND_FAILED` |
//! | `can_create` | `CAN_CREATE_FAILED` |
//! | `can_invent` | `CAN_INVENT_FAILED` |
//! | `can_send_while_disconnected` | `CAN_SEND_WHILE_DISCONNECTED_FAILED` |
//! | document creation | `CATASTROPHIC_CREATE_FAILED` |

mod config;
mod contract;
mod error;
mod native;
mod test_runner;

pub use config::{ConfigMap, ConfigValue, DocumentConfig};
pub use contract::{
    ClientRegistry, DocumentInstance, DocumentMonitor, DocumentUnit, GenericClient,
    HeaderDecryptor, MockMonitor, NoDecryptor, Principal, RequestContext,
};
pub use error::{ErrorCode, FactoryError, InvokeError};
pub use native::NativeUnit;
pub use test_runner::{run_tests, TestCaseReport, TestOutcome, TestSuiteReport};

use crate::compile::{ArtifactBundle, UnitLoader};
use indexmap::IndexMap;
use std::sync::{Arc, OnceLock};

/// Service name to its binding properties.
pub type ServiceMap = IndexMap<String, IndexMap<String, String>>;

pub struct DocumentFactory {
    space: String,
    unit: Arc<dyn DocumentUnit>,
    config: DocumentConfig,
    raw_config: ConfigMap,
    services: ServiceMap,
    clients: OnceLock<Arc<ClientRegistry>>,
}

impl std::fmt::Debug for DocumentFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentFactory")
            .field("space", &self.space)
            .field("config", &self.config)
            .field("services", &self.services.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl DocumentFactory {
    /// Load the unit library out of `bundle` and bind it.
    pub fn new(space: impl Into<String>, bundle: ArtifactBundle) -> Result<Self, FactoryError> {
        let mut loader = UnitLoader::new(bundle);
        let library = loader.load_library()?;
        let unit = NativeUnit::bind(library)?;
        Self::from_unit(space, Arc::new(unit))
    }

    /// Bind an already loaded unit.
    pub fn from_unit(
        space: impl Into<String>,
        unit: Arc<dyn DocumentUnit>,
    ) -> Result<Self, FactoryError> {
        let space = space.into();
        let config_json = unit.config().map_err(FactoryError::Bind)?;
        let (config, raw_config) = DocumentConfig::from_json(&config_json);
        let services_json = unit.services().map_err(FactoryError::Bind)?;
        let services: ServiceMap = serde_json::from_str(&services_json).unwrap_or_else(|e| {
            log::warn!("[factory] space '{}': unreadable services ({})", space, e);
            ServiceMap::new()
        });
        log::info!(
            "[factory] space '{}' bound: {} config key(s), {} service(s)",
            space,
            raw_config.len(),
            services.len()
        );
        Ok(Self {
            space,
            unit,
            config,
            raw_config,
            services,
            clients: OnceLock::new(),
        })
    }

    pub fn space(&self) -> &str {
        &self.space
    }

    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    /// The configuration map as reported by the unit.
    pub fn raw_config(&self) -> &ConfigMap {
        &self.raw_config
    }

    pub fn services(&self) -> &ServiceMap {
        &self.services
    }

    /// Instantiate a document reporting to `monitor`.
    pub fn create(
        &self,
        monitor: Arc<dyn DocumentMonitor>,
    ) -> Result<Box<dyn DocumentInstance>, FactoryError> {
        self.unit.construct(monitor).map_err(|e| {
            log::warn!("[factory] space '{}': create failed: {}", self.space, e);
            FactoryError::Create(e)
        })
    }

    pub fn can_create(&self, context: &RequestContext) -> Result<bool, FactoryError> {
        self.unit.can_create(context).map_err(FactoryError::CanCreate)
    }

    pub fn can_invent(&self, context: &RequestContext) -> Result<bool, FactoryError> {
        self.unit.can_invent(context).map_err(FactoryError::CanInvent)
    }

    pub fn can_send_while_disconnected(
        &self,
        context: &RequestContext,
    ) -> Result<bool, FactoryError> {
        self.unit
            .can_send_while_disconnected(context)
            .map_err(FactoryError::CanSendWhileDisconnected)
    }

    /// Service clients of this space. Resolved on first call and cached;
    /// later calls return the same registry whatever `decryptor` they pass.
    pub fn clients(
        &self,
        decryptor: Arc<dyn HeaderDecryptor>,
    ) -> Result<Arc<ClientRegistry>, FactoryError> {
        if let Some(registry) = self.clients.get() {
            return Ok(Arc::clone(registry));
        }
        let registry = Arc::new(ClientRegistry::new());
        let count = self
            .unit
            .create_generic_clients(&registry, decryptor)
            .map_err(FactoryError::Bind)?;
        log::debug!("[factory] space '{}': {} generic client(s)", self.space, count);
        Ok(Arc::clone(self.clients.get_or_init(|| registry)))
    }

    /// Run every embedded test, each on a fresh document.
    pub fn run_tests(&self) -> Result<TestSuiteReport, FactoryError> {
        run_tests(self.unit.as_ref(), &self.space, "test")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-process unit: a counter document with three tests.
    #[derive(Default)]
    struct CounterUnit {
        constructed: AtomicUsize,
        client_calls: AtomicUsize,
        fail_invent: bool,
        config: Option<String>,
    }

    struct CounterDocument {
        count: i32,
        bound: Option<(String, String)>,
        monitor: Arc<dyn DocumentMonitor>,
    }

    impl DocumentUnit for CounterUnit {
        fn construct(
            &self,
            monitor: Arc<dyn DocumentMonitor>,
        ) -> Result<Box<dyn DocumentInstance>, InvokeError> {
            self.constructed.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(CounterDocument {
                count: 0,
                bound: None,
                monitor,
            }))
        }

        fn can_create(&self, context: &RequestContext) -> Result<bool, InvokeError> {
            Ok(context.who.authority == "system")
        }

        fn can_invent(&self, _context: &RequestContext) -> Result<bool, InvokeError> {
            if self.fail_invent {
                Err(InvokeError::new("panicked"))
            } else {
                Ok(false)
            }
        }

        fn can_send_while_disconnected(
            &self,
            _context: &RequestContext,
        ) -> Result<bool, InvokeError> {
            Ok(true)
        }

        fn config(&self) -> Result<String, InvokeError> {
            Ok(self
                .config
                .clone()
                .unwrap_or_else(|| r#"{"frequency": 5, "readonly": true}"#.to_string()))
        }

        fn services(&self) -> Result<String, InvokeError> {
            Ok(r#"{"billing": {"class": "http"}}"#.to_string())
        }

        fn create_generic_clients(
            &self,
            registry: &ClientRegistry,
            decryptor: Arc<dyn HeaderDecryptor>,
        ) -> Result<usize, InvokeError> {
            self.client_calls.fetch_add(1, Ordering::SeqCst);
            registry.register(GenericClient {
                service: "billing".into(),
                class: "http".into(),
                decryptor,
            });
            Ok(1)
        }

        fn tests(&self) -> Result<Vec<String>, InvokeError> {
            Ok(vec!["bump".into(), "starts_at_zero".into(), "explodes".into()])
        }
    }

    impl DocumentInstance for CounterDocument {
        fn transact_construct(&mut self, who: &Principal, _arg: &str) -> Result<String, InvokeError> {
            if who.agent.is_empty() {
                return Err(InvokeError::new("anonymous construct"));
            }
            let patch = json!({ "data": { "count": self.count } }).to_string();
            self.monitor.on_patch(&patch);
            Ok(patch)
        }

        fn late_bind(&mut self, space: &str, key: &str) -> Result<(), InvokeError> {
            self.bound = Some((space.to_string(), key.to_string()));
            Ok(())
        }

        fn run_test(&mut self, name: &str) -> Result<Value, InvokeError> {
            match name {
                "bump" => {
                    self.count += 1;
                    Ok(json!({ "assertions": 1, "failures": [] }))
                }
                "starts_at_zero" => {
                    let mut failures = Vec::new();
                    if self.count != 0 {
                        failures.push(format!("count was {}", self.count));
                    }
                    if self.bound.is_none() {
                        failures.push("not late-bound".to_string());
                    }
                    Ok(json!({ "assertions": 1, "failures": failures, "log": ["checked"] }))
                }
                _ => Err(InvokeError::new(format!("test '{name}' failed inside the unit"))),
            }
        }
    }

    fn factory(unit: CounterUnit) -> (DocumentFactory, Arc<CounterUnit>) {
        let unit = Arc::new(unit);
        let factory = DocumentFactory::from_unit("space", unit.clone()).expect("bind");
        (factory, unit)
    }

    #[test]
    fn test_binding_reads_config_and_services() {
        let (factory, _) = factory(CounterUnit::default());
        assert_eq!(factory.config().app_mode(), Some(std::time::Duration::from_millis(5)));
        assert!(factory.config().readonly);
        assert_eq!(factory.config().maximum_history, 1000);
        assert_eq!(factory.services()["billing"]["class"], "http");
    }

    #[test]
    fn test_garbage_config_defaults() {
        let (factory, _) = factory(CounterUnit {
            config: Some("not json".into()),
            ..CounterUnit::default()
        });
        assert_eq!(*factory.config(), DocumentConfig::default());
    }

    #[test]
    fn test_predicates_map_failures_to_codes() {
        let (factory, _) = factory(CounterUnit {
            fail_invent: true,
            ..CounterUnit::default()
        });
        let context = RequestContext::mock();
        assert!(factory.can_create(&context).expect("can_create"));
        assert!(factory.can_send_while_disconnected(&context).expect("offline"));
        let err = factory.can_invent(&context).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CanInventFailed);
    }

    #[test]
    fn test_clients_resolved_once() {
        let (factory, unit) = factory(CounterUnit::default());
        let first = factory.clients(Arc::new(NoDecryptor)).expect("clients");
        let second = factory.clients(Arc::new(NoDecryptor)).expect("clients");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(unit.client_calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.services(), vec!["billing".to_string()]);
    }

    #[test]
    fn test_runner_uses_fresh_instance_per_test() {
        let (factory, unit) = factory(CounterUnit::default());
        let report = factory.run_tests().expect("run");
        assert_eq!(unit.constructed.load(Ordering::SeqCst), 3);
        assert_eq!(report.cases.len(), 3);
        // "bump" ran first; a shared instance would fail "starts_at_zero"
        assert!(report.cases[0].passed());
        assert!(report.cases[1].passed(), "{:?}", report.cases[1]);
        assert_eq!(report.cases[1].log, vec!["checked".to_string()]);
        assert_eq!(report.cases[1].patches, 1);
        assert!(matches!(report.cases[2].outcome, TestOutcome::Aborted(ref why) if why.contains("explodes")));
        assert_eq!(report.passed(), 2);
        assert!(!report.all_passed());
    }

    #[test]
    fn test_create_returns_instance() {
        let (factory, unit) = factory(CounterUnit::default());
        let monitor = Arc::new(MockMonitor::new());
        let mut document = factory.create(monitor.clone()).expect("create");
        document.transact_construct(&Principal::new("alice", "users"), "{}").expect("construct");
        assert_eq!(monitor.patches(), vec![r#"{"data":{"count":0}}"#.to_string()]);
        assert_eq!(unit.constructed.load(Ordering::SeqCst), 1);
    }
}
