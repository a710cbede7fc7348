pub mod alignment;
pub mod body;
pub mod time;

pub use alignment::*;
pub use body::*;
pub use time::*;
