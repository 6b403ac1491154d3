pub mod actuator;
pub mod client;
pub mod host;

pub use actuator::{Actuator, LoggingActuator};
pub use client::ModelClient;
pub use host::{CycleReport, EdgeHost, ParticipantWeight};
