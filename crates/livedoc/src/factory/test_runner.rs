// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Embedded test runner.
//!
//! Every test runs against a fresh document: construct with a
//! [`MockMonitor`], run the construct transaction as the system principal,
//! late-bind, then run the test. Nothing carries over between tests.

use super::{DocumentUnit, FactoryError, MockMonitor, Principal};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Argument of the synthetic construct transaction.
const CONSTRUCT_ARG: &str = "{}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum TestOutcome {
    Passed,
    /// At least one assertion failed.
    Failed,
    /// The test could not complete.
    Aborted(String),
}

/// What a unit reports for one test.
#[derive(Debug, Default, Deserialize)]
struct UnitTestResult {
    #[serde(default)]
    assertions: u32,
    #[serde(default)]
    failures: Vec<String>,
    #[serde(default)]
    log: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseReport {
    pub name: String,
    pub outcome: TestOutcome,
    pub assertions: u32,
    pub failures: Vec<String>,
    pub log: Vec<String>,
    /// Patches the document committed while under test.
    pub patches: usize,
    pub duration_ms: u64,
}

impl TestCaseReport {
    pub fn passed(&self) -> bool {
        self.outcome == TestOutcome::Passed
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSuiteReport {
    pub space: String,
    pub cases: Vec<TestCaseReport>,
}

impl TestSuiteReport {
    pub fn passed(&self) -> usize {
        self.cases.iter().filter(|c| c.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.cases.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }
}

/// Run every embedded test of `unit`.
///
/// Only listing the tests can fail; a test that can not run is reported
/// as [`TestOutcome::Aborted`].
pub fn run_tests(
    unit: &dyn DocumentUnit,
    space: &str,
    key: &str,
) -> Result<TestSuiteReport, FactoryError> {
    let names = unit.tests().map_err(|source| FactoryError::Test {
        name: "*".into(),
        source,
    })?;
    let cases = names
        .iter()
        .map(|name| run_one(unit, space, key, name))
        .collect::<Vec<_>>();
    let report = TestSuiteReport {
        space: space.to_string(),
        cases,
    };
    log::info!(
        "[test] space '{}': {} passed, {} failed",
        space,
        report.passed(),
        report.failed()
    );
    Ok(report)
}

fn run_one(unit: &dyn DocumentUnit, space: &str, key: &str, name: &str) -> TestCaseReport {
    let started = Instant::now();
    let monitor = Arc::new(MockMonitor::new());
    let result = (|| {
        let mut document = unit.construct(monitor.clone())?;
        document.transact_construct(&Principal::system(), CONSTRUCT_ARG)?;
        document.late_bind(space, key)?;
        document.run_test(name)
    })();
    let mut report = TestCaseReport {
        name: name.to_string(),
        outcome: TestOutcome::Passed,
        assertions: 0,
        failures: Vec::new(),
        log: Vec::new(),
        patches: monitor.patches().len(),
        duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    };
    match result.map(serde_json::from_value::<UnitTestResult>) {
        Ok(Ok(result)) => {
            report.outcome = if result.failures.is_empty() {
                TestOutcome::Passed
            } else {
                TestOutcome::Failed
            };
            report.assertions = result.assertions;
            report.failures = result.failures;
            report.log = result.log;
        }
        Ok(Err(e)) => report.outcome = TestOutcome::Aborted(format!("unreadable report: {e}")),
        Err(e) => report.outcome = TestOutcome::Aborted(e.to_string()),
    }
    log::debug!("[test] {} -> {:?}", name, report.outcome);
    report
}
