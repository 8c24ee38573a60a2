//! # smkt-core: Market Case Data Model
//!
//! Row types shared by the clearing engine, the case I/O layer and the CLI.
//!
//! ## Tables
//!
//! A market case is two positional tables:
//!
//! - **Generator table**: `Vec<GenRecord>`, one row per generator *or*
//!   dispatchable load. A dispatchable load is a record with `Pmin < 0` and
//!   `Pmax == 0` (see [`GenRecord::is_load`]).
//! - **Cost table**: [`CostTable`], one [`CostRecord`] per generator record,
//!   optionally followed by a second block of the same size holding reactive
//!   power costs.
//!
//! Rows are identified by position only. Row `i` of the cost table prices row
//! `i` of the generator table; row `N + i` (when present) prices its reactive
//! output.
//!
//! ## Cost table columns
//!
//! The cost table keeps the MATPOWER `gencost` column layout so the rebuilt
//! table can be handed to a dispatch solver unchanged:
//!
//! | Column | Constant | Meaning |
//! |--------|----------|---------|
//! | 0 | [`MODEL`] | 1 = piecewise linear, 2 = polynomial |
//! | 1 | [`STARTUP`] | startup cost ($) |
//! | 2 | [`SHUTDOWN`] | shutdown cost ($) |
//! | 3 | [`NCOST`] | breakpoints (PWL) or coefficients (polynomial) |
//! | 4.. | [`COST`] | `x1 y1 x2 y2 ...` or `c(n-1) ... c0` |
//!
//! ## Modules
//!
//! - [`diagnostics`] - Typed soft-error reporting
//! - [`error`] - Hard failures

use serde::{Deserialize, Serialize};

pub mod diagnostics;
pub mod error;

pub use diagnostics::{DiagnosticIssue, DiagnosticKind, Diagnostics, Severity};
pub use error::{SmktError, SmktResult};

/// Cost model column
pub const MODEL: usize = 0;
/// Startup cost column
pub const STARTUP: usize = 1;
/// Shutdown cost column
pub const SHUTDOWN: usize = 2;
/// Breakpoint / coefficient count column
pub const NCOST: usize = 3;
/// First cost data column
pub const COST: usize = 4;

/// One row of the generator table.
///
/// Column order follows MATPOWER `mpc.gen`. Columns beyond `Pmin` are kept
/// verbatim in `extra` so a case survives a read/clear/write cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenRecord {
    /// Bus number
    pub bus: usize,
    /// Active power output (MW)
    pub pg: f64,
    /// Reactive power output (Mvar)
    pub qg: f64,
    /// Maximum reactive power output (Mvar)
    pub qmax: f64,
    /// Minimum reactive power output (Mvar)
    pub qmin: f64,
    /// Voltage setpoint (per-unit)
    pub vg: f64,
    /// Machine MVA base
    pub mbase: f64,
    /// In-service status
    pub status: bool,
    /// Maximum active power output (MW)
    pub pmax: f64,
    /// Minimum active power output (MW)
    pub pmin: f64,
    /// Remaining columns (capability curve, ramp rates, ...)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<f64>,
}

impl Default for GenRecord {
    fn default() -> Self {
        Self {
            bus: 0,
            pg: 0.0,
            qg: 0.0,
            qmax: 0.0,
            qmin: 0.0,
            vg: 1.0,
            mbase: 100.0,
            status: true,
            pmax: 0.0,
            pmin: 0.0,
            extra: Vec::new(),
        }
    }
}

impl GenRecord {
    /// Create an in-service record at `bus` with zero limits
    pub fn new(bus: usize) -> Self {
        Self {
            bus,
            ..Self::default()
        }
    }

    /// Set active power limits (in MW)
    pub fn with_p_limits(mut self, pmin: f64, pmax: f64) -> Self {
        self.pmin = pmin;
        self.pmax = pmax;
        self
    }

    /// Set reactive power limits (in Mvar)
    pub fn with_q_limits(mut self, qmin: f64, qmax: f64) -> Self {
        self.qmin = qmin;
        self.qmax = qmax;
        self
    }

    /// Set in-service status
    pub fn with_status(mut self, status: bool) -> Self {
        self.status = status;
        self
    }

    /// Dispatchable load test: negative minimum output and zero maximum.
    pub fn is_load(&self) -> bool {
        self.pmin < 0.0 && self.pmax == 0.0
    }

    /// Whether `Pmin <= 0 <= Pmax`
    pub fn straddles_zero_p(&self) -> bool {
        self.pmin <= 0.0 && self.pmax >= 0.0
    }

    /// Whether `Qmin <= 0 <= Qmax`
    pub fn straddles_zero_q(&self) -> bool {
        self.qmin <= 0.0 && self.qmax >= 0.0
    }
}

/// Split record indices into (true generators, dispatchable loads).
pub fn partition_units(gen: &[GenRecord]) -> (Vec<usize>, Vec<usize>) {
    (0..gen.len()).partition(|&i| !gen[i].is_load())
}

/// `gencost` model tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostModelKind {
    /// Breakpoint pairs `(quantity, cumulative cost)`
    PiecewiseLinear,
    /// Polynomial coefficients, highest order first
    Polynomial,
}

impl CostModelKind {
    /// Numeric code used in the `MODEL` column
    pub fn code(&self) -> i32 {
        match self {
            CostModelKind::PiecewiseLinear => 1,
            CostModelKind::Polynomial => 2,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(CostModelKind::PiecewiseLinear),
            2 => Some(CostModelKind::Polynomial),
            _ => None,
        }
    }
}

/// One row of the cost table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRecord {
    pub model: CostModelKind,
    /// Startup cost ($)
    pub startup: f64,
    /// Shutdown cost ($)
    pub shutdown: f64,
    /// Breakpoint count (PWL) or coefficient count (polynomial)
    pub ncost: usize,
    /// Cost data columns, possibly zero-padded past what `ncost` needs
    pub cost: Vec<f64>,
}

impl CostRecord {
    /// Build a piecewise-linear row from breakpoints
    pub fn piecewise_linear(startup: f64, shutdown: f64, points: &[(f64, f64)]) -> Self {
        let cost = points.iter().flat_map(|&(x, y)| [x, y]).collect();
        Self {
            model: CostModelKind::PiecewiseLinear,
            startup,
            shutdown,
            ncost: points.len(),
            cost,
        }
    }

    /// Build a polynomial row, coefficients highest order first
    pub fn polynomial(startup: f64, shutdown: f64, coeffs: &[f64]) -> Self {
        Self {
            model: CostModelKind::Polynomial,
            startup,
            shutdown,
            ncost: coeffs.len(),
            cost: coeffs.to_vec(),
        }
    }

    /// Breakpoints of a piecewise-linear row (empty for polynomial rows)
    pub fn breakpoints(&self) -> Vec<(f64, f64)> {
        if self.model != CostModelKind::PiecewiseLinear {
            return Vec::new();
        }
        self.cost
            .chunks_exact(2)
            .take(self.ncost)
            .map(|pair| (pair[0], pair[1]))
            .collect()
    }

    /// Number of cost data columns actually used
    pub fn columns_needed(&self) -> usize {
        match self.model {
            CostModelKind::PiecewiseLinear => 2 * self.ncost,
            CostModelKind::Polynomial => self.ncost,
        }
    }

    /// Zero-pad or truncate the cost data to `columns` entries
    pub fn resize_cost(&mut self, columns: usize) {
        self.cost.resize(columns, 0.0);
    }

    /// Evaluable form of this row
    pub fn cost_model(&self) -> CostModel {
        match self.model {
            CostModelKind::PiecewiseLinear => CostModel::PiecewiseLinear(self.breakpoints()),
            CostModelKind::Polynomial => {
                let n = self.ncost.min(self.cost.len());
                CostModel::Polynomial(self.cost[..n].iter().rev().copied().collect())
            }
        }
    }
}

/// The cost table: `N` active rows, optionally followed by `N` reactive rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostTable {
    pub rows: Vec<CostRecord>,
}

impl CostTable {
    pub fn new(rows: Vec<CostRecord>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Total column count, header columns included
    pub fn width(&self) -> usize {
        COST + self.rows.iter().map(|r| r.cost.len()).max().unwrap_or(0)
    }

    /// Largest `ncost` across all rows
    pub fn max_ncost(&self) -> usize {
        self.rows.iter().map(|r| r.ncost).max().unwrap_or(0)
    }

    /// Pad or truncate every row so the table is exactly `width` columns wide
    pub fn set_width(&mut self, width: usize) {
        let columns = width.saturating_sub(COST);
        for row in &mut self.rows {
            row.resize_cost(columns);
        }
    }

    /// Whether the table carries a reactive block for `ngen` generator records
    pub fn has_reactive_block(&self, ngen: usize) -> bool {
        ngen > 0 && self.rows.len() == 2 * ngen
    }
}

/// Generator cost function
#[derive(Debug, Clone, PartialEq)]
pub enum CostModel {
    /// Polynomial cost: `cost = sum(coeffs[i] * P^i)` where `coeffs[0]` is constant term.
    Polynomial(Vec<f64>),
    /// Piecewise linear cost: Vec<(quantity, cost)> breakpoints
    PiecewiseLinear(Vec<(f64, f64)>),
}

impl CostModel {
    /// Evaluate cost at a given output, clamped to the curve's domain for PWL
    pub fn evaluate(&self, q: f64) -> f64 {
        match self {
            CostModel::Polynomial(coeffs) => coeffs
                .iter()
                .enumerate()
                .map(|(i, c)| c * q.powi(i as i32))
                .sum(),
            CostModel::PiecewiseLinear(points) => {
                let (first, last) = match (points.first(), points.last()) {
                    (Some(first), Some(last)) => (*first, *last),
                    _ => return 0.0,
                };
                if q <= first.0 {
                    return first.1;
                }
                if q >= last.0 {
                    return last.1;
                }
                for w in points.windows(2) {
                    let (a, b) = (w[0], w[1]);
                    if q >= a.0 && q <= b.0 && b.0 > a.0 {
                        let t = (q - a.0) / (b.0 - a.0);
                        return a.1 + t * (b.1 - a.1);
                    }
                }
                last.1
            }
        }
    }

    /// Marginal cost (slope) at a given output
    pub fn marginal_cost(&self, q: f64) -> f64 {
        match self {
            CostModel::Polynomial(coeffs) => coeffs
                .iter()
                .enumerate()
                .skip(1)
                .map(|(i, c)| (i as f64) * c * q.powi(i as i32 - 1))
                .sum(),
            CostModel::PiecewiseLinear(points) => {
                let slopes: Vec<(f64, f64, f64)> = points
                    .windows(2)
                    .filter(|w| w[1].0 > w[0].0)
                    .map(|w| (w[0].0, w[1].0, (w[1].1 - w[0].1) / (w[1].0 - w[0].0)))
                    .collect();
                // Slope of the segment containing q, else of the nearest end segment
                slopes
                    .iter()
                    .find(|(lo, hi, _)| q >= *lo && q <= *hi)
                    .or_else(|| match slopes.first() {
                        Some(first) if q < first.0 => Some(first),
                        _ => slopes.last(),
                    })
                    .map(|(_, _, slope)| *slope)
                    .unwrap_or(0.0)
            }
        }
    }
}
