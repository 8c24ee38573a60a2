//! Offer/bid submission files
//!
//! A submission file holds the offer schedule, an optional bid schedule and
//! optional withholding limits. JSON and TOML are accepted, picked by file
//! extension:
//!
//! ```toml
//! [offers.P]
//! qty = [[60.0, 20.0], [50.0, 0.0]]
//! prc = [[12.0, 18.0], [20.0, 0.0]]
//!
//! [bids.P]
//! qty = [[20.0]]
//! prc = [[30.0]]
//!
//! [limits.P]
//! max_offer = 150.0
//! ```

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use smkt_clear::{OfferBidSet, PriceLimits};

/// Everything submitted to one clearing run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionFile {
    #[serde(default)]
    pub offers: OfferBidSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bids: Option<OfferBidSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<PriceLimits>,
}

/// Load a submission file, `.json` or `.toml`
pub fn load_submissions(path: &Path) -> Result<SubmissionFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading submission file: {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let parsed = match ext.as_deref() {
        Some("json") => parse_submissions_json(&content),
        Some("toml") => parse_submissions_toml(&content),
        _ => bail!(
            "unsupported submission file {} (expected .json or .toml)",
            path.display()
        ),
    };
    parsed.with_context(|| format!("parsing submission file: {}", path.display()))
}

pub fn parse_submissions_json(content: &str) -> Result<SubmissionFile> {
    serde_json::from_str(content).context("invalid submission JSON")
}

pub fn parse_submissions_toml(content: &str) -> Result<SubmissionFile> {
    toml::from_str(content).context("invalid submission TOML")
}
