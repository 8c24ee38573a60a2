//! Market clearing: submissions to updated limits and cost curves
//!
//! [`offers_to_case`] resolves which schedule rows belong to which unit, then
//! clears every unit independently with [`clear_unit`]. Each unit produces its
//! own generator record, cost row(s), outcome, and diagnostics; the results are
//! stitched back together in unit order and the cost table is sized once at the
//! end.
//!
//! # Per-unit states
//!
//! ```text
//!             +-- active curve only -----------------> ActiveOnly
//! curves -----+-- reactive curve only (fallback ok) --> ReactiveOnly
//!             +-- both ------------------------------> Both
//!             +-- neither, or fallback refused -------> ShutDown
//! ```
//!
//! A unit with no cleared capability never keeps running, so that case is
//! reported as [`UnitState::ShutDown`].
//!
//! A unit that enters the run already shut down stays shut down, with its
//! limits and cost rows untouched.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use smkt_core::{
    partition_units, CostRecord, CostTable, DiagnosticKind, Diagnostics, GenRecord, SmktError,
    SmktResult, COST,
};

use crate::index::resolve_indices;
use crate::limits::{price_limits, PriceLimits, ResolvedLimits};
use crate::offers::{BlockRow, OfferBidSet};
use crate::pwl::{merge_curves, offbid_to_pwl, PwlCurve, Side};

/// Clearing run options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClearingConfig {
    /// Fail with [`SmktError::Rejected`] if any diagnostic is raised
    pub strict: bool,
    /// Clear units on the rayon thread pool (needs the `parallel` feature)
    pub parallel: bool,
}

impl Default for ClearingConfig {
    fn default() -> Self {
        Self {
            strict: false,
            parallel: true,
        }
    }
}

impl ClearingConfig {
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    pub fn serial(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// Where a unit ended up after clearing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitState {
    /// Active power curve only
    ActiveOnly,
    /// Reactive power curve only; active power pinned at zero
    ReactiveOnly,
    Both,
    ShutDown,
}

impl UnitState {
    fn from_curves(active: bool, reactive: bool) -> Self {
        match (active, reactive) {
            (true, true) => UnitState::Both,
            (true, false) => UnitState::ActiveOnly,
            (false, true) => UnitState::ReactiveOnly,
            (false, false) => UnitState::ShutDown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UnitState::ActiveOnly => "active_only",
            UnitState::ReactiveOnly => "reactive_only",
            UnitState::Both => "both",
            UnitState::ShutDown => "shut_down",
        }
    }

    pub fn is_running(&self) -> bool {
        *self != UnitState::ShutDown
    }
}

/// Per-unit summary of a clearing run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitOutcome {
    /// Row in the generator table
    pub unit: usize,
    pub is_load: bool,
    pub state: UnitState,
    /// Breakpoints in the rebuilt active cost curve (0 if the row was kept)
    pub p_points: usize,
    /// Breakpoints in the rebuilt reactive cost curve (0 if the row was kept)
    pub q_points: usize,
    /// Whether any of PMIN, PMAX, QMIN, QMAX changed
    pub limits_changed: bool,
}

/// Output of [`offers_to_case`]
#[derive(Debug, Clone, PartialEq)]
pub struct ClearingResult {
    /// Updated generator table, same rows as the input
    pub gen: Vec<GenRecord>,
    /// Rebuilt cost table: N active rows, then N reactive rows if modeled
    pub gencost: CostTable,
    pub outcomes: Vec<UnitOutcome>,
    pub diagnostics: Diagnostics,
}

impl ClearingResult {
    /// Units shut down by this run or before it
    pub fn shut_down(&self) -> impl Iterator<Item = &UnitOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.state == UnitState::ShutDown)
    }

    /// Whether reactive cost rows are present
    pub fn has_reactive(&self) -> bool {
        self.gencost.has_reactive_block(self.gen.len())
    }
}

/// The submission rows that apply to one unit
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UnitSubmissions<'a> {
    pub p_offer: Option<BlockRow<'a>>,
    pub p_bid: Option<BlockRow<'a>>,
    pub q_offer: Option<BlockRow<'a>>,
    pub q_bid: Option<BlockRow<'a>>,
}

/// Result of clearing one unit
#[derive(Debug, Clone, PartialEq)]
pub struct UnitClearing {
    pub gen: GenRecord,
    pub p_cost: CostRecord,
    pub q_cost: Option<CostRecord>,
    pub outcome: UnitOutcome,
    pub diagnostics: Diagnostics,
}

/// Convert offers and bids into updated generator limits and PWL cost curves.
///
/// `gencost` must have at least one row per generator record. Reactive power is
/// modeled when either `offers` or `bids` carries a `q` schedule; the cost
/// table must then have N or 2N rows (with N rows, zero reactive costs are
/// filled in). Soft problems end up in [`ClearingResult::diagnostics`], or in
/// [`SmktError::Rejected`] when `config.strict` is set.
pub fn offers_to_case(
    gen: &[GenRecord],
    gencost: &CostTable,
    offers: &OfferBidSet,
    bids: Option<&OfferBidSet>,
    lim: Option<&PriceLimits>,
    config: &ClearingConfig,
) -> SmktResult<ClearingResult> {
    let ngen = gen.len();
    let have_q = offers.q.is_some() || bids.is_some_and(|b| b.q.is_some());
    let limits = price_limits(lim, have_q);

    if gencost.len() < ngen {
        return Err(SmktError::Shape(format!(
            "gencost has {} rows, expected at least {}",
            gencost.len(),
            ngen
        )));
    }

    let mut diag = Diagnostics::new();
    let active_rows = &gencost.rows[..ngen];
    let reactive_rows: Option<Vec<CostRecord>> = if have_q {
        if gencost.len() == ngen {
            Some(default_reactive_costs(gen, active_rows))
        } else if gencost.len() == 2 * ngen {
            Some(gencost.rows[ngen..].to_vec())
        } else {
            return Err(SmktError::Shape(format!(
                "gencost should have either {} or {} rows, found {}",
                ngen,
                2 * ngen,
                gencost.len()
            )));
        }
    } else {
        if gencost.len() > ngen {
            diag.add_warning(
                DiagnosticKind::CostTable,
                format!(
                    "reactive power not modeled, dropping {} cost rows past the first {}",
                    gencost.len() - ngen,
                    ngen
                ),
            );
        }
        None
    };

    let empty_bids = OfferBidSet::default();
    let bids = bids.unwrap_or(&empty_bids);

    let (gens, loads) = partition_units(gen);
    let idx = resolve_indices(offers, bids, &gens, &loads, have_q, &mut diag);
    debug!(
        generators = gens.len(),
        loads = loads.len(),
        have_q,
        "resolved submission indices"
    );

    let clear = |i: usize| {
        let sub = UnitSubmissions {
            p_offer: idx.p_offer[i].and_then(|r| offers.p.row(r)),
            p_bid: idx.p_bid[i].and_then(|r| bids.p.row(r)),
            q_offer: idx.q_offer[i].and_then(|r| offers.q.as_ref().and_then(|q| q.row(r))),
            q_bid: idx.q_bid[i].and_then(|r| bids.q.as_ref().and_then(|q| q.row(r))),
        };
        clear_unit(
            i,
            &gen[i],
            &active_rows[i],
            reactive_rows.as_ref().map(|rows| &rows[i]),
            &sub,
            &limits,
        )
    };
    let cleared = map_units(ngen, config.parallel, clear);

    let mut new_gen = Vec::with_capacity(ngen);
    let mut p_rows = Vec::with_capacity(ngen);
    let mut q_rows = Vec::new();
    let mut outcomes = Vec::with_capacity(ngen);
    for unit in cleared {
        new_gen.push(unit.gen);
        p_rows.push(unit.p_cost);
        q_rows.extend(unit.q_cost);
        outcomes.push(unit.outcome);
        diag.merge(unit.diagnostics);
    }

    p_rows.append(&mut q_rows);
    let mut table = CostTable::new(p_rows);
    table.set_width(COST + 2 * table.max_ncost());

    for issue in &diag.issues {
        warn!("{}", issue);
    }
    let shut_down = outcomes
        .iter()
        .filter(|o| o.state == UnitState::ShutDown)
        .count();
    info!(
        units = ngen,
        shut_down,
        reactive = have_q,
        width = table.width(),
        "market clearing complete: {}",
        diag.summary()
    );

    if config.strict && diag.has_issues() {
        return Err(SmktError::Rejected(diag));
    }

    Ok(ClearingResult {
        gen: new_gen,
        gencost: table,
        outcomes,
        diagnostics: diag,
    })
}

/// Zero-cost reactive rows: `(0,0),(1,0)` for generators, `(-1,0),(0,0)` for loads.
pub fn default_reactive_costs(gen: &[GenRecord], active: &[CostRecord]) -> Vec<CostRecord> {
    gen.iter()
        .zip(active)
        .map(|(g, c)| {
            let points = if g.is_load() {
                [(-1.0, 0.0), (0.0, 0.0)]
            } else {
                [(0.0, 0.0), (1.0, 0.0)]
            };
            CostRecord::piecewise_linear(c.startup, c.shutdown, &points)
        })
        .collect()
}

#[cfg(feature = "parallel")]
fn map_units<F>(n: usize, parallel: bool, f: F) -> Vec<UnitClearing>
where
    F: Fn(usize) -> UnitClearing + Sync + Send,
{
    use rayon::prelude::*;

    if parallel {
        (0..n).into_par_iter().map(f).collect()
    } else {
        (0..n).map(f).collect()
    }
}

#[cfg(not(feature = "parallel"))]
fn map_units<F>(n: usize, _parallel: bool, f: F) -> Vec<UnitClearing>
where
    F: Fn(usize) -> UnitClearing,
{
    (0..n).map(f).collect()
}

/// Clear a single unit.
///
/// `q_cost` is the unit's reactive cost row; its presence means reactive power
/// is modeled for this run.
pub fn clear_unit(
    unit: usize,
    gen: &GenRecord,
    p_cost: &CostRecord,
    q_cost: Option<&CostRecord>,
    sub: &UnitSubmissions<'_>,
    limits: &ResolvedLimits,
) -> UnitClearing {
    let mut diag = Diagnostics::new();
    let have_q = q_cost.is_some();
    let is_load = gen.is_load();

    let kept = |state: UnitState, diag: Diagnostics| UnitClearing {
        gen: gen.clone().with_status(false),
        p_cost: p_cost.clone(),
        q_cost: q_cost.cloned(),
        outcome: UnitOutcome {
            unit,
            is_load,
            state,
            p_points: 0,
            q_points: 0,
            limits_changed: false,
        },
        diagnostics: diag,
    };

    if !gen.status {
        debug!(unit, "already shut down, left untouched");
        return kept(UnitState::ShutDown, diag);
    }

    check_direction(sub, gen, unit, &mut diag);

    let mut curve = |row: Option<BlockRow<'_>>, side: Side, threshold: Option<f64>| {
        row.map(|row| offbid_to_pwl(row, side, threshold, &mut diag, unit))
            .unwrap_or_default()
    };
    let p_bid = curve(sub.p_bid, Side::Bid, limits.p.bid_threshold());
    let p_offer = curve(sub.p_offer, Side::Offer, limits.p.offer_threshold());
    let (q_bid, q_offer) = if have_q {
        (
            curve(sub.q_bid, Side::Bid, limits.q.bid_threshold()),
            curve(sub.q_offer, Side::Offer, limits.q.offer_threshold()),
        )
    } else {
        (PwlCurve::default(), PwlCurve::default())
    };

    let p_curve = merge_curves(&p_bid, &p_offer, &mut diag, unit, "active");
    let q_curve = merge_curves(&q_bid, &q_offer, &mut diag, unit, "reactive");
    let has_p = p_curve.is_usable();
    let has_q = q_curve.is_usable();
    debug!(
        unit,
        is_load,
        p_points = p_curve.len(),
        q_points = q_curve.len(),
        has_p,
        has_q,
        "built curves"
    );

    let mut running = true;
    let (mut pmin, mut pmax) = (gen.pmin, gen.pmax);
    let (mut qmin, mut qmax) = (gen.qmin, gen.qmax);
    let mut new_p_cost = None;
    let mut new_q_cost = None;

    if has_p {
        if gen.pmax > 0.0 {
            pmax = p_curve.max_quantity();
            let lower = gen.pmin.max(0.0);
            if pmax < lower || pmax > gen.pmax {
                diag.add_warning_for_unit(
                    DiagnosticKind::BoundViolation,
                    format!(
                        "offer quantity ({}) must be between max(0,PMIN) ({}) and PMAX ({})",
                        pmax, lower, gen.pmax
                    ),
                    unit,
                );
            }
        }
        if gen.pmin < 0.0 {
            pmin = p_curve.min_quantity();
            if pmin >= gen.pmin && pmin <= gen.pmax {
                if is_load {
                    // Keep the load's power factor
                    qmin = gen.qmin * pmin / gen.pmin;
                    qmax = gen.qmax * pmin / gen.pmin;
                }
            } else {
                diag.add_warning_for_unit(
                    DiagnosticKind::BoundViolation,
                    format!(
                        "bid quantity ({}) must be between max(0,-PMAX) ({}) and -PMIN ({})",
                        -pmin,
                        (-gen.pmax).max(0.0),
                        -gen.pmin
                    ),
                    unit,
                );
            }
        }
        new_p_cost = Some(CostRecord::piecewise_linear(
            p_cost.startup,
            p_cost.shutdown,
            &p_curve.points,
        ));
    } else if has_q && !is_load && gen.straddles_zero_p() {
        // Reactive-only dispatch at zero active power
        pmin = 0.0;
        pmax = 0.0;
    } else {
        running = false;
    }

    if has_q {
        if gen.qmax > 0.0 {
            qmax = qmax.min(q_curve.max_quantity());
            if qmax >= gen.qmin && qmax <= gen.qmax {
                if is_load {
                    pmin = gen.pmin * qmax / gen.qmax;
                }
            } else {
                diag.add_warning_for_unit(
                    DiagnosticKind::BoundViolation,
                    format!(
                        "reactive offer quantity ({}) must be between max(0,QMIN) ({}) and QMAX ({})",
                        qmax,
                        gen.qmin.max(0.0),
                        gen.qmax
                    ),
                    unit,
                );
            }
        }
        if gen.qmin < 0.0 {
            qmin = qmin.max(q_curve.min_quantity());
            if qmin >= gen.qmin && qmin <= gen.qmax {
                if is_load {
                    pmin = gen.pmin * qmin / gen.qmin;
                }
            } else {
                diag.add_warning_for_unit(
                    DiagnosticKind::BoundViolation,
                    format!(
                        "reactive bid quantity ({}) must be between max(0,-QMAX) ({}) and -QMIN ({})",
                        -qmin,
                        (-gen.qmax).max(0.0),
                        -gen.qmin
                    ),
                    unit,
                );
            }
        }
        if let Some(q_cost) = q_cost {
            new_q_cost = Some(CostRecord::piecewise_linear(
                q_cost.startup,
                q_cost.shutdown,
                &q_curve.points,
            ));
        }
    } else if have_q {
        if has_p && gen.straddles_zero_q() {
            if is_load && (gen.qmax > 0.0 || gen.qmin < 0.0) {
                // A load with non-unity power factor cannot run at zero Q
                running = false;
            } else {
                qmin = 0.0;
                qmax = 0.0;
            }
        } else {
            running = false;
        }
    }

    if !running {
        debug!(unit, "shut down");
        return kept(UnitState::ShutDown, diag);
    }

    let limits_changed =
        pmin != gen.pmin || pmax != gen.pmax || qmin != gen.qmin || qmax != gen.qmax;
    let mut cleared = gen.clone();
    cleared.pmin = pmin;
    cleared.pmax = pmax;
    cleared.qmin = qmin;
    cleared.qmax = qmax;

    let outcome = UnitOutcome {
        unit,
        is_load,
        state: UnitState::from_curves(has_p, has_q),
        p_points: new_p_cost.as_ref().map_or(0, |c| c.ncost),
        q_points: new_q_cost.as_ref().map_or(0, |c| c.ncost),
        limits_changed,
    };
    debug!(unit, state = ?outcome.state, limits_changed, "cleared");

    UnitClearing {
        gen: cleared,
        p_cost: new_p_cost.unwrap_or_else(|| p_cost.clone()),
        q_cost: new_q_cost.or_else(|| q_cost.cloned()),
        outcome,
        diagnostics: diag,
    }
}

/// Report non-zero offers from units that cannot produce and bids from units
/// that cannot consume. The rows are still cleared.
fn check_direction(
    sub: &UnitSubmissions<'_>,
    gen: &GenRecord,
    unit: usize,
    diag: &mut Diagnostics,
) {
    let checks = [
        (sub.p_bid, gen.pmin >= 0.0, "Pmin >= 0, bid not allowed"),
        (sub.p_offer, gen.pmax <= 0.0, "Pmax <= 0, offer not allowed"),
        (sub.q_bid, gen.qmin >= 0.0, "Qmin >= 0, reactive bid not allowed"),
        (sub.q_offer, gen.qmax <= 0.0, "Qmax <= 0, reactive offer not allowed"),
    ];
    for (row, blocked, message) in checks {
        if blocked && row.is_some_and(|r| r.any_quantity()) {
            diag.add_warning_for_unit(DiagnosticKind::DisallowedSubmission, message, unit);
        }
    }
}
