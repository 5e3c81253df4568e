pub mod calendar;
pub mod macros;
pub mod report;
pub mod store;
pub mod timeline;
pub mod timezone;
pub mod window;

pub use calendar::*;
pub use report::*;
pub use store::*;
pub use timeline::*;
pub use timezone::*;
pub use window::*;
