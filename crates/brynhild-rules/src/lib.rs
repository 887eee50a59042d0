//! Brynhild Rules - discovers and merges project/global rules files.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod error;
pub mod manager;

pub use error::{RulesError, RulesResult};
pub use manager::{RuleFile, RulesManager};
