//! # smkt-clear: Offer/Bid to Cost Curve Conversion
//!
//! Turns block price/quantity submissions into updated generator limits and
//! piecewise-linear cost curves that a dispatch solver can consume directly.
//!
//! ## Pipeline
//!
//! 1. [`price_limits`] fills in missing withholding thresholds.
//! 2. [`resolve_indices`] maps schedule rows onto generator-table rows.
//! 3. [`offbid_to_pwl`] builds one curve per submission row, and
//!    [`merge_curves`] joins a unit's bid and offer curves at the origin.
//! 4. [`offers_to_case`] clears every unit and rebuilds the cost table.
//!
//! ## Example
//!
//! ```
//! use smkt_clear::{offers_to_case, BlockSchedule, ClearingConfig, OfferBidSet};
//! use smkt_core::{CostRecord, CostTable, GenRecord};
//!
//! let gen = vec![GenRecord::new(1).with_p_limits(0.0, 100.0)];
//! let gencost = CostTable::new(vec![CostRecord::polynomial(0.0, 0.0, &[0.01, 20.0, 0.0])]);
//! let offers = OfferBidSet::active(BlockSchedule::single_block(&[(50.0, 10.0)]));
//!
//! let result = offers_to_case(&gen, &gencost, &offers, None, None, &ClearingConfig::default())?;
//! assert_eq!(result.gen[0].pmax, 50.0);
//! assert_eq!(result.gencost.rows[0].breakpoints(), vec![(0.0, 0.0), (50.0, 500.0)]);
//! # Ok::<(), smkt_core::SmktError>(())
//! ```

pub mod clearing;
pub mod index;
pub mod limits;
pub mod offers;
pub mod pwl;

pub use clearing::{
    clear_unit, default_reactive_costs, offers_to_case, ClearingConfig, ClearingResult,
    UnitClearing, UnitOutcome, UnitState, UnitSubmissions,
};
pub use index::{resolve_indices, ScheduleKind, SubmissionIndices};
pub use limits::{price_limits, LimitPair, PriceLimits, ResolvedLimits, SideLimits};
pub use offers::{BlockRow, BlockSchedule, OfferBidSet};
pub use pwl::{merge_curves, offbid_to_pwl, PwlCurve, Side};
