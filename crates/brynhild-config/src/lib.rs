//! Layered, deep-merging configuration for brynhild.
//!
//! The centerpiece is [`DeepChainMap`], a mapping over an ordered stack of
//! immutable source layers plus a mutable front overlay. [`ConfigLoader`]
//! assembles that layer stack from brynhild's on-disk and environment
//! configuration sources in priority order.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod error;
pub mod frozen;
pub mod loader;
pub mod map;
pub mod merge;
pub mod proxy;
pub mod value;

pub use error::{ConfigError, ConfigResult};
pub use frozen::{Frozen, FrozenMapping, FrozenSequence};
pub use loader::{ConfigLayerKind, ConfigLoader, LoadedLayer};
pub use map::{DeepChainMap, ListOp};
pub use merge::{merge_candidates, merge_candidates_tracking, merge_pair, Provenance};
pub use proxy::MutableProxy;
pub use value::Value;
