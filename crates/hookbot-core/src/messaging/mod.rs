//! Wire types, the delivery channel and the outbound port.

pub mod delivery;
pub mod port;
pub mod types;
