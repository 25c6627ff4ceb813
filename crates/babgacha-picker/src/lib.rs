//! The gacha picker: a multi-phase randomized reveal over a candidate
//! pool, plus the device-geolocation model used to scope that pool.

mod geo;
mod machine;

pub use geo::{FixedLocation, GeolocationError, LocationSource, Position};
pub use machine::{GachaMachine, GachaPhase, GachaTimings, SpinError};
