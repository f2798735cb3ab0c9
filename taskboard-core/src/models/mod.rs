mod query;
mod task;

pub use query::*;
pub use task::*;
