//! JSON clearing report

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use smkt_clear::{ClearingResult, UnitOutcome};
use smkt_core::Diagnostics;

/// Summary of one clearing run, for machine consumption
#[derive(Debug, Clone, Serialize)]
pub struct ClearingReport {
    /// Case file or label the run was made on
    pub case: String,
    pub units: usize,
    pub running: usize,
    pub shut_down: usize,
    /// Whether reactive cost rows were produced
    pub reactive: bool,
    /// Cost table width, header columns included
    pub gencost_width: usize,
    pub outcomes: Vec<UnitOutcome>,
    pub diagnostics: Diagnostics,
    pub summary: String,
}

impl ClearingReport {
    pub fn from_result(case: impl Into<String>, result: &ClearingResult) -> Self {
        Self {
            case: case.into(),
            units: result.gen.len(),
            running: result.outcomes.iter().filter(|o| o.state.is_running()).count(),
            shut_down: result.shut_down().count(),
            reactive: result.has_reactive(),
            gencost_width: result.gencost.width(),
            outcomes: result.outcomes.clone(),
            diagnostics: result.diagnostics.clone(),
            summary: result.diagnostics.summary(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serializing clearing report")
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)
            .with_context(|| format!("writing report: {}", path.display()))
    }
}
