//! Offer and bid block schedules
//!
//! A schedule is a pair of equally shaped matrices, one row per submission and
//! one column per block. Blocks are kept in submitted order; nothing here sorts
//! by price.

use serde::{Deserialize, Serialize};

/// Quantity and price blocks for one kind of submission (e.g. active power offers)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockSchedule {
    /// Block quantities (MW or Mvar), one row per submission
    pub qty: Vec<Vec<f64>>,
    /// Block prices ($/MWh or $/Mvarh), same shape as `qty`
    pub prc: Vec<Vec<f64>>,
}

/// One submission row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockRow<'a> {
    pub qty: &'a [f64],
    pub prc: &'a [f64],
}

impl BlockRow<'_> {
    /// Whether any block carries a non-zero quantity
    pub fn any_quantity(&self) -> bool {
        self.qty.iter().any(|&q| q != 0.0)
    }
}

impl BlockSchedule {
    pub fn new(qty: Vec<Vec<f64>>, prc: Vec<Vec<f64>>) -> Self {
        Self { qty, prc }
    }

    /// Single-block-per-row schedule from `(qty, prc)` pairs
    pub fn single_block(rows: &[(f64, f64)]) -> Self {
        Self {
            qty: rows.iter().map(|&(q, _)| vec![q]).collect(),
            prc: rows.iter().map(|&(_, p)| vec![p]).collect(),
        }
    }

    /// Number of submissions
    pub fn rows(&self) -> usize {
        self.qty.len()
    }

    pub fn is_empty(&self) -> bool {
        self.qty.is_empty()
    }

    /// Verify that `qty` and `prc` are rectangular and of the same shape.
    ///
    /// Returns the common `(rows, blocks)` shape, or a description of the mismatch.
    pub fn checked_shape(&self) -> Result<(usize, usize), String> {
        let qty = matrix_shape(&self.qty).ok_or("qty rows have differing block counts")?;
        let prc = matrix_shape(&self.prc).ok_or("prc rows have differing block counts")?;
        if qty != prc {
            return Err(format!(
                "dimensions of qty ({} x {}) and prc ({} x {}) do not match",
                qty.0, qty.1, prc.0, prc.1
            ));
        }
        Ok(qty)
    }

    /// Borrow one submission row
    pub fn row(&self, r: usize) -> Option<BlockRow<'_>> {
        match (self.qty.get(r), self.prc.get(r)) {
            (Some(qty), Some(prc)) => Some(BlockRow { qty, prc }),
            _ => None,
        }
    }
}

fn matrix_shape(m: &[Vec<f64>]) -> Option<(usize, usize)> {
    let cols = m.first().map_or(0, Vec::len);
    m.iter().all(|row| row.len() == cols).then_some((m.len(), cols))
}

/// Active power schedule plus optional reactive power schedule.
///
/// Used for both the offer side and the bid side of a clearing run. The
/// presence of `q` on either side switches on reactive cost modeling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OfferBidSet {
    #[serde(alias = "P", default)]
    pub p: BlockSchedule,
    #[serde(alias = "Q", default, skip_serializing_if = "Option::is_none")]
    pub q: Option<BlockSchedule>,
}

impl OfferBidSet {
    pub fn active(p: BlockSchedule) -> Self {
        Self { p, q: None }
    }

    pub fn with_reactive(mut self, q: BlockSchedule) -> Self {
        self.q = Some(q);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_shape() {
        let ok = BlockSchedule::new(vec![vec![1.0, 2.0]; 3], vec![vec![5.0, 6.0]; 3]);
        assert_eq!(ok.checked_shape(), Ok((3, 2)));

        let mismatch = BlockSchedule::new(vec![vec![1.0, 2.0]; 3], vec![vec![5.0]; 3]);
        let err = mismatch.checked_shape().unwrap_err();
        assert!(err.contains("(3 x 2)"));
        assert!(err.contains("(3 x 1)"));

        let ragged = BlockSchedule::new(vec![vec![1.0, 2.0], vec![1.0]], vec![vec![5.0, 6.0]; 2]);
        assert!(ragged.checked_shape().unwrap_err().contains("qty rows"));
    }

    #[test]
    fn test_empty_schedule_shape() {
        assert_eq!(BlockSchedule::default().checked_shape(), Ok((0, 0)));
    }

    #[test]
    fn test_row_access() {
        let s = BlockSchedule::single_block(&[(10.0, 20.0), (0.0, 30.0)]);
        let row = s.row(0).unwrap();
        assert_eq!(row.qty, &[10.0]);
        assert_eq!(row.prc, &[20.0]);
        assert!(row.any_quantity());
        assert!(!s.row(1).unwrap().any_quantity());
        assert!(s.row(2).is_none());
    }

    #[test]
    fn test_deserialize_matpower_style_keys() {
        let json = r#"{"P": {"qty": [[50]], "prc": [[10]]}, "Q": {"qty": [[5]], "prc": [[1]]}}"#;
        let set: OfferBidSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.p.rows(), 1);
        assert!(set.q.is_some());

        let lower = r#"{"p": {"qty": [], "prc": []}}"#;
        let set: OfferBidSet = serde_json::from_str(lower).unwrap();
        assert!(set.p.is_empty());
        assert!(set.q.is_none());
    }
}
