//! Closed-loop simulation for thermoloop.
//!
//! Provides:
//! - `Plant` trait and the water boiler plant (transport delay + heat loss)
//! - Fixed-depth delay line used for the transport delay
//! - Logical and wall clocks feeding elapsed time into the loop
//! - Scheduled setpoint changes
//! - The measure -> control -> actuate -> advance loop and its trajectory

pub mod boiler;
pub mod clock;
pub mod delay;
pub mod error;
pub mod model;
pub mod schedule;
pub mod sim;

pub use boiler::{Boiler, BoilerParams};
pub use clock::{Clock, LogicalClock, Tick, WallClock};
pub use delay::DelayLine;
pub use error::{SimError, SimResult};
pub use model::Plant;
pub use schedule::{SetpointChange, SetpointSchedule};
pub use sim::{LoopState, Sample, SimOptions, SimRecord, Simulation, run_sim};
