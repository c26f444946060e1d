pub mod classifier;
pub mod flows;
pub mod models;
pub mod parsers;
pub mod reporting;

// Re-export commonly used items
pub use classifier::*;
pub use flows::*;
pub use models::*;
pub use parsers::*;
pub use reporting::*;
