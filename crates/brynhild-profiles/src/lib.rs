//! Brynhild Profiles - per-model system-prompt and API-parameter
//! profiles.
//!
//! A [`ModelProfile`] bundles a system-prompt prefix/suffix, named
//! prompt patterns, and default API parameters for a model or model
//! family. [`ProfileManager`] resolves the right profile for a
//! (model, provider) pair from user, plugin, and builtin tiers.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod error;
pub mod manager;
pub mod types;

pub use error::{ProfileError, ProfileResult};
pub use manager::ProfileManager;
pub use types::ModelProfile;
