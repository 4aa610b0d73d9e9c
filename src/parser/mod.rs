pub mod form;
mod utils;

pub use form::{PResult, ParsedEquation};
#[cfg(target_arch = "wasm32")]
pub(crate) use utils::{LETTER_RE, VARIABLE_RE};
