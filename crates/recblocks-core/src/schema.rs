//! Self-description types returned by a block's `get_schema`.
//!
//! A schema is the only contract consumers can introspect, so stage
//! implementations must keep it synchronized with their actual behavior:
//! accepted input keys, produced output keys, and recognized configuration
//! options with their defaults.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// Description of one input or output key.
#[derive(Debug, Clone, Serialize)]
pub struct FieldSpec {
    /// The payload kind expected/produced under this key.
    pub value_type: &'static str,
    /// Whether the key must be present (inputs only).
    pub required: bool,
}

/// Description of one recognized configuration option.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSpec {
    /// The JSON type of the option.
    pub value_type: &'static str,
    /// The default applied when the option is absent.
    pub default: Option<Value>,
    /// Closed set of accepted values, when applicable.
    pub options: Option<Vec<&'static str>>,
}

/// A block's full self-description.
///
/// Built with chained setters:
///
/// ```
/// use recblocks_core::BlockSchema;
/// use serde_json::json;
///
/// let schema = BlockSchema::new("split")
///     .input("dataframe", "rows", true)
///     .output("train_data", "rows")
///     .config("test_size", "float", Some(json!(0.2)));
/// assert_eq!(schema.block_type, "split");
/// assert!(schema.inputs["dataframe"].required);
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct BlockSchema {
    /// The stage type tag.
    pub block_type: &'static str,
    /// Accepted input keys.
    pub inputs: BTreeMap<&'static str, FieldSpec>,
    /// Produced output keys.
    pub outputs: BTreeMap<&'static str, FieldSpec>,
    /// Recognized configuration options. Unknown keys in a parameter bag
    /// are accepted silently; this map documents the keys that have effect.
    pub config: BTreeMap<&'static str, ConfigSpec>,
}

impl BlockSchema {
    /// Creates an empty schema for the given block type.
    pub fn new(block_type: &'static str) -> Self {
        Self {
            block_type,
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
            config: BTreeMap::new(),
        }
    }

    /// Declares an input key.
    pub fn input(mut self, key: &'static str, value_type: &'static str, required: bool) -> Self {
        self.inputs.insert(
            key,
            FieldSpec {
                value_type,
                required,
            },
        );
        self
    }

    /// Declares an output key.
    pub fn output(mut self, key: &'static str, value_type: &'static str) -> Self {
        self.outputs.insert(
            key,
            FieldSpec {
                value_type,
                required: false,
            },
        );
        self
    }

    /// Declares a configuration option and its default.
    pub fn config(mut self, key: &'static str, value_type: &'static str, default: Option<Value>) -> Self {
        self.config.insert(
            key,
            ConfigSpec {
                value_type,
                default,
                options: None,
            },
        );
        self
    }

    /// Declares a configuration option restricted to a closed value set.
    pub fn config_options(
        mut self,
        key: &'static str,
        value_type: &'static str,
        default: Option<Value>,
        options: Vec<&'static str>,
    ) -> Self {
        self.config.insert(
            key,
            ConfigSpec {
                value_type,
                default,
                options: Some(options),
            },
        );
        self
    }
}
