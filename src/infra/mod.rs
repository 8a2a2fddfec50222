//! Infrastructure built on top of the scheduler.

pub mod console_log;

pub use console_log::BufferedLogger;
