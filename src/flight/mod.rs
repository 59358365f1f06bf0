mod runner;
mod transmitter;

pub use runner::{run, FlightOptions};
