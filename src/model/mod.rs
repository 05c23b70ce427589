pub mod config;
pub mod operation;
pub mod record;
pub mod task;

pub use config::*;
pub use operation::*;
pub use record::*;
pub use task::*;
