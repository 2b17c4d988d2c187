//! Identifiers, errors and the filesystem seam shared by the sitekit crates.

pub mod error;
pub mod filesystem;
pub mod ids;

pub use error::*;
pub use filesystem::*;
pub use ids::*;
