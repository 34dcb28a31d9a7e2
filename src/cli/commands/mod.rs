mod check;
mod parse;
mod queue;

pub use check::cmd_check;
pub use parse::cmd_parse;
pub use queue::cmd_queue;
