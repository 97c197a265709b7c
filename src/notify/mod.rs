//! Console output for scan progress and results.

pub mod console;

pub use console::ConsoleOutput;
