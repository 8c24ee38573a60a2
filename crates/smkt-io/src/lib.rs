//! # smkt-io: Case and Submission Files
//!
//! - [`matpower`] - read `mpc.gen` / `mpc.gencost` from MATPOWER case text and
//!   write cleared tables back into it
//! - [`submissions`] - offer/bid files in JSON or TOML
//! - [`report`] - JSON summary of a clearing run
//! - [`helpers`] - checked numeric conversions

pub mod helpers;
pub mod matpower;
pub mod report;
pub mod submissions;

pub use matpower::{parse_case_file, parse_case_string, rewrite_case, MarketCase};
pub use report::ClearingReport;
pub use submissions::{load_submissions, SubmissionFile};
