//! Piecewise-linear total cost curves from block submissions
//!
//! An offer row `qty = [10, 20], prc = [5, 8]` becomes the curve
//!
//! ```text
//! (0, 0) -> (10, 50) -> (30, 210)
//! ```
//!
//! A bid row is accumulated from its last block inward and then shifted so the
//! curve ends at the origin. `qty = [20], prc = [30]` becomes
//!
//! ```text
//! (-20, -600) -> (0, 0)
//! ```
//!
//! so a bid and an offer for the same unit can be joined at `(0, 0)` into a
//! single curve spanning negative (consumption) and positive (production)
//! quantities.

use serde::Serialize;
use smkt_core::{DiagnosticKind, Diagnostics};

use crate::offers::BlockRow;

/// Which side of the market a block row came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Offer,
    Bid,
}

/// Ordered `(quantity, cumulative cost)` breakpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PwlCurve {
    pub points: Vec<(f64, f64)>,
}

impl PwlCurve {
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    /// Number of breakpoints
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// A curve needs at least one segment to carry any capability
    pub fn is_usable(&self) -> bool {
        self.points.len() >= 2
    }

    pub fn first(&self) -> Option<(f64, f64)> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<(f64, f64)> {
        self.points.last().copied()
    }

    /// Largest breakpoint quantity (`-inf` for an empty curve)
    pub fn max_quantity(&self) -> f64 {
        self.points
            .iter()
            .map(|&(x, _)| x)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Smallest breakpoint quantity (`+inf` for an empty curve)
    pub fn min_quantity(&self) -> f64 {
        self.points
            .iter()
            .map(|&(x, _)| x)
            .fold(f64::INFINITY, f64::min)
    }
}

/// Build the total cost curve for one submission row.
///
/// Zero-quantity blocks are dropped. With a `threshold`, bid blocks priced
/// below it and offer blocks priced above it are dropped as withheld.
/// Negative quantities are reported and kept. If nothing survives the curve
/// is empty.
pub fn offbid_to_pwl(
    row: BlockRow<'_>,
    side: Side,
    threshold: Option<f64>,
    diag: &mut Diagnostics,
    unit: usize,
) -> PwlCurve {
    if row.qty.iter().any(|&q| q < 0.0) {
        diag.add_warning_for_unit(
            DiagnosticKind::NegativeQuantity,
            "offer/bid quantities must be non-negative",
            unit,
        );
    }

    let accepted = |&(q, p): &(f64, f64)| {
        q != 0.0
            && match (side, threshold) {
                (_, None) => true,
                (Side::Bid, Some(min_bid)) => p >= min_bid,
                (Side::Offer, Some(max_offer)) => p <= max_offer,
            }
    };
    let mut blocks: Vec<(f64, f64)> = row
        .qty
        .iter()
        .copied()
        .zip(row.prc.iter().copied())
        .filter(accepted)
        .collect();

    if blocks.is_empty() {
        return PwlCurve::default();
    }
    if side == Side::Bid {
        blocks.reverse();
    }

    let mut points = Vec::with_capacity(blocks.len() + 1);
    let (mut x, mut y) = (0.0, 0.0);
    points.push((x, y));
    for (q, p) in blocks {
        x += q;
        y += p * q;
        points.push((x, y));
    }

    if side == Side::Bid {
        for pt in &mut points {
            pt.0 -= x;
            pt.1 -= y;
        }
    }

    PwlCurve::new(points)
}

/// Join a bid curve and an offer curve at their shared origin.
///
/// When both are usable the result is the bid points followed by the offer
/// points without its leading origin, and a continuity problem is reported if
/// the halves do not meet at `(0, 0)`. When only one is usable it is returned
/// alone; when neither is, the result is empty.
pub fn merge_curves(
    bid: &PwlCurve,
    offer: &PwlCurve,
    diag: &mut Diagnostics,
    unit: usize,
    label: &str,
) -> PwlCurve {
    match (bid.is_usable(), offer.is_usable()) {
        (true, true) => {
            let (bx, by) = bid.last().unwrap_or_default();
            let (ox, oy) = offer.first().unwrap_or_default();
            if bx != 0.0 || by != 0.0 || ox != 0.0 || oy != 0.0 {
                diag.add_warning_for_unit(
                    DiagnosticKind::CurveContinuity,
                    format!(
                        "{} bid and offer curves do not meet at the origin: bid ends at ({}, {}), offer starts at ({}, {})",
                        label, bx, by, ox, oy
                    ),
                    unit,
                );
            }
            let mut points = bid.points.clone();
            points.extend_from_slice(&offer.points[1..]);
            PwlCurve::new(points)
        }
        (false, true) => offer.clone(),
        (true, false) => bid.clone(),
        (false, false) => PwlCurve::default(),
    }
}
