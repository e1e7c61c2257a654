// Text completion capability. The decomposer consumes this behind a trait
// so tests can substitute a deterministic fake.

mod command;
mod error;
mod mock;
mod traits;

pub use command::CommandCompleter;
pub use error::{Error, Result};
pub use mock::MockCompleter;
pub use traits::TextCompleter;
