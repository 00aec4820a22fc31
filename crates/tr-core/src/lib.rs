//! tr-core: shared foundation for thermoreg.
//!
//! Contains:
//! - ids (bounded channel and sensor indices, fixed channel/sensor counts)
//! - fault (fault-code taxonomy shared by sensors, alarms and the wire protocol)
//! - numeric (Real + finiteness and admissible-range helpers)
//! - timing (tick duration measurement and overrun accounting)
//! - units (uom SI types + constructors)
//! - error (shared error types)

pub mod error;
pub mod fault;
pub mod ids;
pub mod numeric;
pub mod timing;
pub mod units;

pub use error::{TrError, TrResult};
pub use fault::FaultCode;
pub use ids::*;
pub use numeric::*;
pub use timing::{TickStats, TickTimer};
