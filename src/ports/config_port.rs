//! Configuration access port trait.
//!
//! Lookups by INI section and key. `Ok(None)` means the key is absent; a value
//! that is present but does not parse is a `ConfigInvalid` error.

use crate::domain::error::BreakoutError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, BreakoutError>;
    fn get_double(&self, section: &str, key: &str) -> Result<Option<f64>, BreakoutError>;
}
