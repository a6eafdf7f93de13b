// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The fixed surface a compiled unit exposes to its factory.
//!
//! Native units implement it through the exported vtable (see
//! [`NativeUnit`](super::NativeUnit)); tests and embedders can implement it
//! directly in Rust.

use super::InvokeError;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Who is acting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    pub agent: String,
    pub authority: String,
}

impl Principal {
    pub fn new(agent: impl Into<String>, authority: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            authority: authority.into(),
        }
    }

    /// The principal synthetic transactions run as.
    pub fn system() -> Self {
        Self::new("?", "system")
    }
}

/// Context handed to the policy predicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub who: Principal,
    pub origin: String,
    pub ip: String,
}

impl RequestContext {
    pub fn new(who: Principal, origin: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            who,
            origin: origin.into(),
            ip: ip.into(),
        }
    }

    /// Context used by embedded tests.
    pub fn mock() -> Self {
        Self::new(Principal::system(), "origin", "127.0.0.1")
    }
}

/// Receives the patches a document commits.
pub trait DocumentMonitor: Send + Sync {
    fn on_patch(&self, patch: &str);
}

/// Monitor that records every patch.
#[derive(Debug, Default)]
pub struct MockMonitor {
    patches: Mutex<Vec<String>>,
}

impl MockMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn patches(&self) -> Vec<String> {
        self.patches.lock().clone()
    }
}

impl DocumentMonitor for MockMonitor {
    fn on_patch(&self, patch: &str) {
        self.patches.lock().push(patch.to_string());
    }
}

/// Decrypts the secret headers attached to service calls.
pub trait HeaderDecryptor: Send + Sync {
    fn decrypt(&self, encrypted: &str) -> Option<String>;
}

/// Decryptor that rejects everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDecryptor;

impl HeaderDecryptor for NoDecryptor {
    fn decrypt(&self, _encrypted: &str) -> Option<String> {
        None
    }
}

/// One service client a unit asked for.
#[derive(Clone)]
pub struct GenericClient {
    pub service: String,
    pub class: String,
    pub decryptor: Arc<dyn HeaderDecryptor>,
}

impl std::fmt::Debug for GenericClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenericClient")
            .field("service", &self.service)
            .field("class", &self.class)
            .finish_non_exhaustive()
    }
}

/// Service clients by service name.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: DashMap<String, GenericClient>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client; returns the one it replaced.
    pub fn register(&self, client: GenericClient) -> Option<GenericClient> {
        self.clients.insert(client.service.clone(), client)
    }

    pub fn get(&self, service: &str) -> Option<GenericClient> {
        self.clients.get(service).map(|entry| entry.value().clone())
    }

    pub fn services(&self) -> Vec<String> {
        let mut names: Vec<String> = self.clients.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

/// Static surface of a compiled unit.
pub trait DocumentUnit: Send + Sync {
    fn construct(
        &self,
        monitor: Arc<dyn DocumentMonitor>,
    ) -> Result<Box<dyn DocumentInstance>, InvokeError>;

    fn can_create(&self, context: &RequestContext) -> Result<bool, InvokeError>;

    fn can_invent(&self, context: &RequestContext) -> Result<bool, InvokeError>;

    fn can_send_while_disconnected(&self, context: &RequestContext) -> Result<bool, InvokeError>;

    /// Static configuration as a JSON object.
    fn config(&self) -> Result<String, InvokeError>;

    /// Service bindings as a two-level JSON object.
    fn services(&self) -> Result<String, InvokeError>;

    /// Register one client per declared service; returns how many.
    fn create_generic_clients(
        &self,
        registry: &ClientRegistry,
        decryptor: Arc<dyn HeaderDecryptor>,
    ) -> Result<usize, InvokeError>;

    /// Names of the embedded tests.
    fn tests(&self) -> Result<Vec<String>, InvokeError>;
}

/// One live document.
pub trait DocumentInstance: Send {
    /// Run the construct transaction; returns the forward patch.
    fn transact_construct(&mut self, who: &Principal, arg: &str) -> Result<String, InvokeError>;

    fn late_bind(&mut self, space: &str, key: &str) -> Result<(), InvokeError>;

    /// Run one embedded test; returns the unit's JSON report.
    fn run_test(&mut self, name: &str) -> Result<Value, InvokeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_replaces_by_service() {
        let registry = ClientRegistry::new();
        let client = |class: &str| GenericClient {
            service: "billing".into(),
            class: class.into(),
            decryptor: Arc::new(NoDecryptor),
        };
        assert!(registry.register(client("http")).is_none());
        let replaced = registry.register(client("grpc")).expect("replaced");
        assert_eq!(replaced.class, "http");
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("billing").map(|c| c.class), Some("grpc".into()));
    }

    #[test]
    fn test_request_context_json() {
        let json = serde_json::to_string(&RequestContext::mock()).expect("serialize");
        assert_eq!(
            json,
            r#"{"who":{"agent":"?","authority":"system"},"origin":"origin","ip":"127.0.0.1"}"#
        );
    }

    #[test]
    fn test_mock_monitor_records() {
        let monitor = MockMonitor::new();
        monitor.on_patch("{}");
        assert_eq!(monitor.patches(), vec!["{}".to_string()]);
    }
}
