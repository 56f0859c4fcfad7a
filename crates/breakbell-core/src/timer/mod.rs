mod anchor;
mod engine;
mod main_timer;
mod sleep;

pub use anchor::next_anchor;
pub use engine::{EngineOutcome, EngineSetup, EngineTuning, ReminderEngine};
pub use main_timer::{AppStatus, Countdown, MainTimer};
pub use sleep::SleepDetector;
