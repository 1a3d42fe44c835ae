//! Leaf utilities shared by the vizkit crates.
//!
//! - [`weak_handle`]: non-owning handles that can tell when their target is gone
//! - [`persistent`]: named values that survive the destruction of their owner
//! - [`scaled_value`]: magnitudes relative to the scene length scale
//! - [`options`] and [`logging`]: viewer settings and the tracing bootstrap

pub mod logging;
pub mod options;
pub mod persistent;
pub mod scaled_value;
pub mod type_tag;
pub mod weak_handle;

pub use options::{Options, TransparencyMode};
pub use persistent::{CacheError, PersistentCache, PersistentEdit, PersistentValue};
pub use scaled_value::{absolute_value, relative_value, ScaledValue};
pub use type_tag::TypeTag;
pub use weak_handle::{retain_valid, GenericWeakHandle, Referrable, WeakHandle, WeakHandleError};
