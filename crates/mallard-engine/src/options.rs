//! Duck-typing options
//!
//! Options can be built in code or read from the `[duck]` table of a TOML
//! document:
//!
//! ```toml
//! [duck]
//! fuzzy = true
//! allow-conversion = false
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Options controlling how sources are matched against shapes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DuckOptions {
    /// Match member names ignoring case, for objects and for mappings
    /// whatever their own key comparison
    pub fuzzy: bool,

    /// Resolve members whose types differ through registered converters
    pub allow_conversion: bool,

    /// Reuse resolution plans for objects of the same concrete type
    pub memoize_object_plans: bool,
}

impl Default for DuckOptions {
    fn default() -> Self {
        Self {
            fuzzy: false,
            allow_conversion: true,
            memoize_object_plans: true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct OptionsDocument {
    #[serde(default)]
    duck: DuckOptions,
}

impl DuckOptions {
    /// Default options with fuzzy member matching on
    pub fn fuzzy() -> Self {
        Self {
            fuzzy: true,
            ..Self::default()
        }
    }

    /// Parse options from the `[duck]` table of a TOML document. A document
    /// without the table yields the defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let document: OptionsDocument = toml::from_str(content)?;
        Ok(document.duck)
    }
}
