mod principal;
mod validated;

pub use principal::{AuthPrincipal, Principal};
pub use validated::{ValidatedJson, ValidatedQuery};
