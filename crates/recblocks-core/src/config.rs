//! Typed configuration parsing from block parameter bags.
//!
//! Blocks carry a forward-compatible parameter bag (string keys, arbitrary
//! JSON values, unknown keys accepted silently). Each stage declares a
//! typed config struct with named, defaulted fields and parses the bag
//! through [`parse_config`]; type mismatches become validation error
//! strings, mirroring `validate_config`'s contract.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::block::ParamMap;

/// Parses a parameter bag into a typed config struct.
///
/// Unknown keys are ignored (forward compatibility); missing keys take the
/// struct's defaults. A type mismatch produces a human-readable error
/// string suitable for a `validate_config` result.
///
/// # Examples
///
/// ```
/// use recblocks_core::{parse_config, ParamMap};
/// use serde::Deserialize;
/// use serde_json::json;
///
/// #[derive(Debug, Deserialize)]
/// #[serde(default)]
/// struct SplitConfig {
///     test_size: f64,
/// }
///
/// impl Default for SplitConfig {
///     fn default() -> Self {
///         Self { test_size: 0.2 }
///     }
/// }
///
/// let mut params = ParamMap::new();
/// params.insert("test_size".into(), json!(0.3));
/// params.insert("unknown_key".into(), json!("ignored"));
///
/// let config: SplitConfig = parse_config(&params).unwrap();
/// assert_eq!(config.test_size, 0.3);
/// ```
pub fn parse_config<T: DeserializeOwned>(params: &ParamMap) -> Result<T, String> {
    serde_json::from_value(Value::Object(params.clone()))
        .map_err(|err| format!("Invalid configuration: {err}"))
}
