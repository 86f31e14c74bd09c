//! Remote session backends

mod bench;

pub use bench::{BenchError, BenchRemote};
