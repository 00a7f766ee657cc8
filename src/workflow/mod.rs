pub mod claim;
pub mod discovery;
pub mod executor;
pub mod flows;
pub mod report;
pub mod resolver;
pub mod types;

pub use flows::run;
