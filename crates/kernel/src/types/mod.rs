mod errors;
mod time;

pub use errors::{KernelError, KernelErrorLevel, KernelResult};
pub use time::{Hertz, Milliseconds};
