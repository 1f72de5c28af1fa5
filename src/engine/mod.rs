pub mod mistakes;
pub mod progress;
pub mod selection;
pub mod stats;

pub use mistakes::get_mistakes;
pub use progress::{AttemptRecord, UserProgress};
pub use selection::{Selection, SelectionMode, SelectionTier, select_next};
pub use stats::{Stats, compute_statistics};
