//! Bridge tasks
//!
//! Two units of concurrency share the board UART: the input task owns the
//! receive half, the session task writes LED commands through the shared
//! transmit mutex.

pub mod input;
pub mod session;

pub use input::input_task;
pub use session::session_task;
