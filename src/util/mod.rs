pub mod clock;
pub mod ids;

pub use clock::{Clock, FixedClock, SystemClock, iso};
pub use ids::{IdSource, SequentialIds, UuidSource};
