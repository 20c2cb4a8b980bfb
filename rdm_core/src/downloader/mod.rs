pub mod runner;

pub use runner::{spawn, RunnerEvent, RunnerHandle};
