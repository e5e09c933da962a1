//! Session cleaning.
//!
//! Turns the raw extract into validated sessions with a resolved charge
//! window: [`sanitize`] orders and types the records, [`derive`] filters
//! them and computes the derived duration and overstay fields.

pub mod derive;
pub mod sanitize;
pub mod timestamp;
pub mod types;

pub use derive::derive;
pub use sanitize::sanitize;
pub use types::{DerivationAudit, DerivedSession, RawRecord, SanitizedSession};
