//! Session configuration.
//!
//! Every option is named and defaulted; a configuration can come from a JSON
//! file, a JSON string, or be built in code, and a few options can be
//! overridden from the environment.
//!
//! # Examples
//!
//! ```
//! use vger::{CardinalityPolicy, Config};
//!
//! let config = Config::from_json_str(
//!     r#"{ "database": "/srv/voyager.db", "cataloging_location": "Cataloging", "cardinality": "strict" }"#,
//! )?;
//! assert_eq!(config.cardinality, CardinalityPolicy::Strict);
//! assert_eq!(config.record_encoding, "utf-8");
//! # Ok::<(), vger::VgerError>(())
//! ```

use std::path::{Path, PathBuf};

use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use time::UtcOffset;

use crate::error::{Result, VgerError};
use crate::status::CardinalityPolicy;
use crate::timestamp::parse_offset;

/// Default installation path of the write-back client.
pub const DEFAULT_APP_PATH: &str = r"C:\Voyager";

/// Options for opening a [`crate::Session`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Path of the catalog store.
    pub database: PathBuf,
    /// Schema qualifier prefixed to every table reference.
    pub schema: Option<String>,
    /// Database attached under [`Config::schema`] when the session opens.
    pub attach: Option<PathBuf>,
    /// Name of the location item edits are attributed to.
    pub cataloging_location: Option<String>,
    /// Default owning library for scoped iteration.
    pub library_id: Option<i64>,
    /// Offset (`+HH:MM`) in which audit timestamps are stored.
    pub catalog_utc_offset: String,
    /// Label of the text encoding stored records use.
    pub record_encoding: String,
    /// Handling of unexpected extra rows.
    pub cardinality: CardinalityPolicy,
    /// Settings for a caller-supplied write-back channel.
    ///
    /// The crate never reads these itself: whoever builds the
    /// [`crate::WriteBackChannel`] passed to [`crate::Session::with_write_back`]
    /// reads them from [`crate::Session::config`].
    pub write_back: Option<WriteBackConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: PathBuf::from("voyager.db"),
            schema: None,
            attach: None,
            cataloging_location: None,
            library_id: None,
            catalog_utc_offset: "+00:00".to_string(),
            record_encoding: "utf-8".to_string(),
            cardinality: CardinalityPolicy::Warn,
            write_back: None,
        }
    }
}

/// Credentials and install path for the external write-back client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteBackConfig {
    /// Cataloging username.
    pub username: String,
    /// Password.
    pub password: String,
    /// Client installation path.
    #[serde(default = "default_app_path")]
    pub app_path: PathBuf,
}

fn default_app_path() -> PathBuf {
    PathBuf::from(DEFAULT_APP_PATH)
}

impl Config {
    /// Parse a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`VgerError::Config`] for malformed JSON or unknown keys.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| VgerError::Config(e.to_string()))
    }

    /// Load a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`VgerError::Io`] if the file cannot be read and
    /// [`VgerError::Config`] if it does not parse.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| VgerError::Config(format!("{}: {e}", path.display())))
    }

    /// Apply `VGER_DATABASE`, `VGER_SCHEMA`, `VGER_CATALOGING_LOCATION` and
    /// `VGER_LIBRARY_ID` from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`VgerError::Config`] if `VGER_LIBRARY_ID` is not an integer.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(database) = lookup("VGER_DATABASE") {
            self.database = PathBuf::from(database);
        }
        if let Some(schema) = lookup("VGER_SCHEMA") {
            self.schema = Some(schema);
        }
        if let Some(location) = lookup("VGER_CATALOGING_LOCATION") {
            self.cataloging_location = Some(location);
        }
        if let Some(library) = lookup("VGER_LIBRARY_ID") {
            let id = library
                .parse()
                .map_err(|_| VgerError::Config(format!("VGER_LIBRARY_ID {library:?} is not an integer")))?;
            self.library_id = Some(id);
        }
        Ok(self)
    }

    /// Resolve [`Config::record_encoding`].
    ///
    /// # Errors
    ///
    /// Returns [`VgerError::Config`] for unknown labels.
    pub fn encoding(&self) -> Result<&'static Encoding> {
        Encoding::for_label(self.record_encoding.as_bytes()).ok_or_else(|| {
            VgerError::Config(format!("unknown record encoding {:?}", self.record_encoding))
        })
    }

    /// Resolve [`Config::catalog_utc_offset`].
    ///
    /// # Errors
    ///
    /// Returns [`VgerError::Config`] for malformed offsets.
    pub fn utc_offset(&self) -> Result<UtcOffset> {
        parse_offset(&self.catalog_utc_offset)
    }
}
