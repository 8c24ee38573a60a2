//! Withholding price limits
//!
//! Offers priced above `max_offer` and bids priced below `min_bid` are treated
//! as withheld capacity. Limits are optional at every level; [`price_limits`]
//! resolves whatever the caller supplied into a complete set where every
//! missing threshold means "no limit".

use serde::{Deserialize, Serialize};

/// Thresholds for one power type, as supplied by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitPair {
    /// Lowest acceptable bid price
    pub min_bid: Option<f64>,
    /// Highest acceptable offer price
    pub max_offer: Option<f64>,
}

impl LimitPair {
    /// Field-wise override: values in `self` win over `base`
    pub fn or(self, base: LimitPair) -> LimitPair {
        LimitPair {
            min_bid: self.min_bid.or(base.min_bid),
            max_offer: self.max_offer.or(base.max_offer),
        }
    }
}

/// Possibly partial price limits for active (`p`) and reactive (`q`) power
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceLimits {
    #[serde(alias = "P")]
    pub p: Option<LimitPair>,
    #[serde(alias = "Q")]
    pub q: Option<LimitPair>,
}

impl PriceLimits {
    /// Field-wise override: values in `self` win over `base`
    pub fn or(self, base: &PriceLimits) -> PriceLimits {
        let join = |a: Option<LimitPair>, b: Option<LimitPair>| match (a, b) {
            (Some(a), Some(b)) => Some(a.or(b)),
            (a, b) => a.or(b),
        };
        PriceLimits {
            p: join(self.p, base.p),
            q: join(self.q, base.q),
        }
    }
}

/// Fully resolved thresholds for one power type
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SideLimits {
    pub min_bid: f64,
    pub max_offer: f64,
}

impl SideLimits {
    pub const UNLIMITED: SideLimits = SideLimits {
        min_bid: f64::NEG_INFINITY,
        max_offer: f64::INFINITY,
    };

    /// Threshold for the bid side, `None` when nothing is withheld
    pub fn bid_threshold(&self) -> Option<f64> {
        self.min_bid.is_finite().then_some(self.min_bid)
    }

    /// Threshold for the offer side, `None` when nothing is withheld
    pub fn offer_threshold(&self) -> Option<f64> {
        self.max_offer.is_finite().then_some(self.max_offer)
    }

    fn from_pair(pair: Option<LimitPair>) -> SideLimits {
        let pair = pair.unwrap_or_default();
        SideLimits {
            min_bid: pair
                .min_bid
                .filter(|v| v.is_finite())
                .unwrap_or(f64::NEG_INFINITY),
            max_offer: pair
                .max_offer
                .filter(|v| v.is_finite())
                .unwrap_or(f64::INFINITY),
        }
    }
}

/// Limits for both power types after defaults are applied
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedLimits {
    pub p: SideLimits,
    pub q: SideLimits,
}

impl Default for ResolvedLimits {
    fn default() -> Self {
        Self {
            p: SideLimits::UNLIMITED,
            q: SideLimits::UNLIMITED,
        }
    }
}

/// Fill in missing thresholds.
///
/// Unset or non-finite values resolve to no limit. The reactive side is only
/// read when `have_q` is set.
pub fn price_limits(lim: Option<&PriceLimits>, have_q: bool) -> ResolvedLimits {
    let lim = lim.copied().unwrap_or_default();
    ResolvedLimits {
        p: SideLimits::from_pair(lim.p),
        q: if have_q {
            SideLimits::from_pair(lim.q)
        } else {
            SideLimits::UNLIMITED
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_limits_mean_no_withholding() {
        let resolved = price_limits(None, true);
        assert_eq!(resolved, ResolvedLimits::default());
        assert_eq!(resolved.p.bid_threshold(), None);
        assert_eq!(resolved.q.offer_threshold(), None);
    }

    #[test]
    fn test_partial_limits() {
        let lim = PriceLimits {
            p: Some(LimitPair {
                min_bid: None,
                max_offer: Some(100.0),
            }),
            q: Some(LimitPair {
                min_bid: Some(1.0),
                max_offer: None,
            }),
        };
        let resolved = price_limits(Some(&lim), true);
        assert_eq!(resolved.p.offer_threshold(), Some(100.0));
        assert_eq!(resolved.p.bid_threshold(), None);
        assert_eq!(resolved.q.bid_threshold(), Some(1.0));

        // Reactive limits are ignored when Q is not modeled
        let resolved = price_limits(Some(&lim), false);
        assert_eq!(resolved.q, SideLimits::UNLIMITED);
    }

    #[test]
    fn test_non_finite_limits_are_unset() {
        let lim = PriceLimits {
            p: Some(LimitPair {
                min_bid: Some(f64::NAN),
                max_offer: Some(f64::INFINITY),
            }),
            q: None,
        };
        assert_eq!(price_limits(Some(&lim), false).p, SideLimits::UNLIMITED);
    }

    #[test]
    fn test_override_layering() {
        let file = PriceLimits {
            p: Some(LimitPair {
                min_bid: Some(5.0),
                max_offer: Some(200.0),
            }),
            q: None,
        };
        let submitted = PriceLimits {
            p: Some(LimitPair {
                min_bid: None,
                max_offer: Some(150.0),
            }),
            q: None,
        };
        let merged = submitted.or(&file);
        let p = merged.p.unwrap();
        assert_eq!(p.min_bid, Some(5.0));
        assert_eq!(p.max_offer, Some(150.0));
    }

    #[test]
    fn test_deserialize_from_toml() {
        let lim: PriceLimits = toml::from_str("[p]\nmax_offer = 250.0\n").unwrap();
        assert_eq!(lim.p.and_then(|p| p.max_offer), Some(250.0));
        assert!(lim.q.is_none());
    }
}
