pub mod family;
pub mod record;
pub mod report;
pub mod search;

pub use family::*;
pub use record::*;
pub use report::*;
pub use search::*;
