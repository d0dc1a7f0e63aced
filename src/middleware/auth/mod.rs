pub mod access;
pub mod bearer;
pub mod entry_point;
pub mod public_paths;

pub use access::{AccessGate, AuthError};
pub use entry_point::{AuthEntryPoint, JsonEntryPoint};
pub use public_paths::PublicPaths;
