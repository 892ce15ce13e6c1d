mod billing;
mod command;
mod message;
mod state;

pub use billing::{Bill, Tariff};
pub use command::{CommandMessage, MeterCommand, ThresholdInput};
pub use message::{Acknowledgement, Reading};
pub use state::{MeterError, MeterMode, MeterState, ThresholdCrossing};
