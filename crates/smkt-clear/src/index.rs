//! Submission index resolution
//!
//! Maps schedule rows onto generator-table rows. A schedule may list one row
//! per record, one row per eligible record (true generators for offers,
//! dispatchable loads for active bids), or nothing at all:
//!
//! ```text
//! records:        G0  L1  G2  L3            (G = generator, L = load)
//! offers, 4 rows:  0   1   2   3            one row per record
//! offers, 2 rows:  0   -   1   -            one row per generator
//! bids,   2 rows:  -   0   -   1            one row per load
//! ```
//!
//! Reactive bids only accept the one-row-per-record form. Any other row count,
//! or a quantity/price shape mismatch, is reported and the schedule is treated
//! as absent.

use smkt_core::{DiagnosticKind, Diagnostics};

use crate::offers::{BlockSchedule, OfferBidSet};

/// The four submission kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleKind {
    ActiveOffer,
    ActiveBid,
    ReactiveOffer,
    ReactiveBid,
}

impl ScheduleKind {
    pub fn label(&self) -> &'static str {
        match self {
            ScheduleKind::ActiveOffer => "offers.P",
            ScheduleKind::ActiveBid => "bids.P",
            ScheduleKind::ReactiveOffer => "offers.Q",
            ScheduleKind::ReactiveBid => "bids.Q",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            ScheduleKind::ActiveOffer => "active power offers",
            ScheduleKind::ActiveBid => "active power bids",
            ScheduleKind::ReactiveOffer => "reactive power offers",
            ScheduleKind::ReactiveBid => "reactive power bids",
        }
    }
}

/// Per-record schedule row for each submission kind.
///
/// `None` means the record has no submission of that kind; `Some(r)` is the
/// 0-based row in the corresponding schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionIndices {
    pub p_offer: Vec<Option<usize>>,
    pub p_bid: Vec<Option<usize>>,
    pub q_offer: Vec<Option<usize>>,
    pub q_bid: Vec<Option<usize>>,
}

impl SubmissionIndices {
    /// Whether record `i` has any active power submission
    pub fn has_active(&self, i: usize) -> bool {
        self.p_offer[i].is_some() || self.p_bid[i].is_some()
    }
}

/// Resolve all four index vectors.
///
/// `gens` and `loads` partition `0..gens.len() + loads.len()`. Reactive
/// schedules are only consulted when `have_q` is set.
pub fn resolve_indices(
    offers: &OfferBidSet,
    bids: &OfferBidSet,
    gens: &[usize],
    loads: &[usize],
    have_q: bool,
    diag: &mut Diagnostics,
) -> SubmissionIndices {
    let total = gens.len() + loads.len();
    let none = || vec![None; total];

    let p_offer = resolve_one(
        ScheduleKind::ActiveOffer,
        Some(&offers.p),
        Some(gens),
        total,
        diag,
    );
    let p_bid = resolve_one(
        ScheduleKind::ActiveBid,
        Some(&bids.p),
        Some(loads),
        total,
        diag,
    );

    let (q_offer, q_bid) = if have_q {
        (
            resolve_one(
                ScheduleKind::ReactiveOffer,
                offers.q.as_ref(),
                Some(gens),
                total,
                diag,
            ),
            resolve_one(
                ScheduleKind::ReactiveBid,
                bids.q.as_ref(),
                None,
                total,
                diag,
            ),
        )
    } else {
        (none(), none())
    };

    SubmissionIndices {
        p_offer,
        p_bid,
        q_offer,
        q_bid,
    }
}

/// Resolve one schedule. A missing schedule is the same as a zero-row one.
fn resolve_one(
    kind: ScheduleKind,
    schedule: Option<&BlockSchedule>,
    eligible: Option<&[usize]>,
    total: usize,
    diag: &mut Diagnostics,
) -> Vec<Option<usize>> {
    let mut idx = vec![None; total];
    let Some(schedule) = schedule else {
        return idx;
    };

    let rows = match schedule.checked_shape() {
        Ok((rows, _)) => rows,
        Err(msg) => {
            diag.add_error(
                DiagnosticKind::ShapeMismatch,
                format!("{}: {}", kind.label(), msg),
            );
            return idx;
        }
    };

    if rows == total {
        for (i, slot) in idx.iter_mut().enumerate() {
            *slot = Some(i);
        }
    } else if let Some(subset) = eligible.filter(|s| s.len() == rows) {
        for (r, &i) in subset.iter().enumerate() {
            idx[i] = Some(r);
        }
    } else if rows != 0 {
        let expected = match kind {
            ScheduleKind::ActiveOffer | ScheduleKind::ReactiveOffer => {
                "zero or match either the number of generators or the total number of rows in gen"
            }
            ScheduleKind::ActiveBid => {
                "zero or match either the number of dispatchable loads or the total number of rows in gen"
            }
            ScheduleKind::ReactiveBid => "zero or match the total number of rows in gen",
        };
        diag.add_error(
            DiagnosticKind::SubmissionCount,
            format!(
                "number of {} ({}) must be {}",
                kind.description(),
                rows,
                expected
            ),
        );
    }

    idx
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(rows: usize) -> BlockSchedule {
        BlockSchedule::new(vec![vec![1.0]; rows], vec![vec![10.0]; rows])
    }

    // records: G0 L1 G2 L3
    const GENS: [usize; 2] = [0, 2];
    const LOADS: [usize; 2] = [1, 3];

    #[test]
    fn test_full_count_assigns_all_records() {
        let offers = OfferBidSet::active(schedule(4));
        let mut diag = Diagnostics::new();
        let idx = resolve_indices(
            &offers,
            &OfferBidSet::default(),
            &GENS,
            &LOADS,
            false,
            &mut diag,
        );

        assert_eq!(idx.p_offer, vec![Some(0), Some(1), Some(2), Some(3)]);
        assert_eq!(idx.p_bid, vec![None; 4]);
        assert!(!diag.has_issues());
    }

    #[test]
    fn test_subset_counts() {
        let offers = OfferBidSet::active(schedule(2));
        let bids = OfferBidSet::active(schedule(2));
        let mut diag = Diagnostics::new();
        let idx = resolve_indices(&offers, &bids, &GENS, &LOADS, false, &mut diag);

        assert_eq!(idx.p_offer, vec![Some(0), None, Some(1), None]);
        assert_eq!(idx.p_bid, vec![None, Some(0), None, Some(1)]);
        assert!(idx.has_active(0));
        assert!(!diag.has_issues());
    }

    #[test]
    fn test_bad_count_degrades_to_no_submission() {
        let offers = OfferBidSet::active(schedule(3));
        let mut diag = Diagnostics::new();
        let idx = resolve_indices(
            &offers,
            &OfferBidSet::default(),
            &GENS,
            &LOADS,
            false,
            &mut diag,
        );

        assert_eq!(idx.p_offer, vec![None; 4]);
        assert_eq!(diag.by_kind(DiagnosticKind::SubmissionCount).count(), 1);
        assert!(diag.issues[0].message.contains("active power offers (3)"));
    }

    #[test]
    fn test_shape_mismatch_degrades_to_no_submission() {
        let bad = BlockSchedule::new(vec![vec![1.0, 2.0]; 4], vec![vec![10.0]; 4]);
        let offers = OfferBidSet::active(bad);
        let mut diag = Diagnostics::new();
        let idx = resolve_indices(
            &offers,
            &OfferBidSet::default(),
            &GENS,
            &LOADS,
            false,
            &mut diag,
        );

        assert_eq!(idx.p_offer, vec![None; 4]);
        let issue = diag.by_kind(DiagnosticKind::ShapeMismatch).next().unwrap();
        assert!(issue.message.starts_with("offers.P"));
    }

    #[test]
    fn test_reactive_bids_only_accept_full_count() {
        let offers = OfferBidSet::active(schedule(0)).with_reactive(schedule(2));
        let bids = OfferBidSet::active(schedule(0)).with_reactive(schedule(2));
        let mut diag = Diagnostics::new();
        let idx = resolve_indices(&offers, &bids, &GENS, &LOADS, true, &mut diag);

        assert_eq!(idx.q_offer, vec![Some(0), None, Some(1), None]);
        assert_eq!(idx.q_bid, vec![None; 4]);
        assert_eq!(diag.error_count(), 1);
        assert!(diag.issues[0].message.contains("reactive power bids"));
    }

    #[test]
    fn test_missing_reactive_side_is_zero_rows() {
        let offers = OfferBidSet::active(schedule(4)).with_reactive(schedule(4));
        let mut diag = Diagnostics::new();
        let idx = resolve_indices(
            &offers,
            &OfferBidSet::default(),
            &GENS,
            &LOADS,
            true,
            &mut diag,
        );

        assert_eq!(idx.q_offer.iter().filter(|i| i.is_some()).count(), 4);
        assert_eq!(idx.q_bid, vec![None; 4]);
        assert!(!diag.has_issues());
    }

    #[test]
    fn test_reactive_ignored_without_have_q() {
        let offers = OfferBidSet::active(schedule(4)).with_reactive(schedule(4));
        let mut diag = Diagnostics::new();
        let idx = resolve_indices(
            &offers,
            &OfferBidSet::default(),
            &GENS,
            &LOADS,
            false,
            &mut diag,
        );
        assert_eq!(idx.q_offer, vec![None; 4]);
    }
}
