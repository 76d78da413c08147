pub mod diagram;
pub mod schema;

// Re-export for convenience
pub use diagram::{DiagramParseError, DiagramParser};
pub use schema::*;
