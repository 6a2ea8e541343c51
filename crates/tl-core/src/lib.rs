//! tl-core: shared foundation for thermoloop.
//!
//! Contains:
//! - numeric (Real + tolerances + float helpers)
//! - error (shared error types)

pub mod error;
pub mod numeric;

pub use error::{TlError, TlResult};
pub use numeric::*;
