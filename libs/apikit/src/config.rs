use anyhow::anyhow;
use runtime::ConfigProvider;
use serde::{Deserialize, Serialize};

use crate::api::request::MAX_BODY_BYTES;

/// Name of this crate's entry in the module configuration bag.
pub const MODULE_NAME: &str = "apikit";

/// Pipeline settings, read from `modules.apikit`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Largest accepted request body in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: u64,
}

fn default_max_body_bytes() -> u64 {
    MAX_BODY_BYTES
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: MAX_BODY_BYTES,
        }
    }
}

impl ApiConfig {
    /// Reads the `apikit` section; a missing section yields the defaults.
    pub fn from_provider(provider: &dyn ConfigProvider) -> anyhow::Result<Self> {
        match provider.get_module_config(MODULE_NAME) {
            None => Ok(Self::default()),
            Some(val) => serde_json::from_value(val.clone())
                .map_err(|e| anyhow!("invalid {MODULE_NAME} config: {e}")),
        }
    }
}
