/*
    Copyright 2025 MydriaTech AB

    Licensed under the Apache License 2.0 with Free world makers exception
    1.0.0 (the "License"); you may not use this file except in compliance with
    the License. You should have obtained a copy of the License with the source
    or binary distribution in file named

        LICENSE-Apache-2.0-with-FWM-Exception-1.0.0

    Unless required by applicable law or agreed to in writing, software
    distributed under the License is distributed on an "AS IS" BASIS,
    WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
    See the License for the specific language governing permissions and
    limitations under the License.
*/

//! Parsing of application configuration.

mod azure_config;
mod backend_config;
mod dynamodb_config;
mod policy_config;

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use config::builder::BuilderState;
use serde::Deserialize;
use serde::Serialize;

pub use self::azure_config::AzureConfig;
pub use self::backend_config::BackendConfig;
pub use self::dynamodb_config::DynamoDbConfig;
pub use self::policy_config::PolicyConfig;

/// Package version reported by Cargo at build time.
const CARGO_PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Static trait for tracking implementations.
trait AppConfigDefaults {
    fn set_defaults<T: BuilderState>(
        config_builder: ConfigBuilder<T>,
        prefix: &str,
    ) -> Result<ConfigBuilder<T>, ConfigError>;
}

/**
Application configration root.

The application name defaults to the Rust package name, but can be overridden
with the environment variable `APP_NAME`.

Configuration will be loaded from

1. the file `{application name}.json` in the current working directory.
2. environment variable overrides in the form
   `{APPLICATION_NAME}_MODULE_CONFIGKEYWITHOUTSPACES`
 */
#[derive(Debug, Deserialize, Serialize)]
pub struct AppConfig {
    /// Selection of policy backend.
    pub backend: BackendConfig,
    /// Configuration of the DynamoDB policy backend.
    pub dynamodb: DynamoDbConfig,
    /// Configuration of the Azure API Management policy backend.
    pub azure: AzureConfig,
    /// Source of the desired policies.
    pub policy: PolicyConfig,

    /// Lower case application name. Ignored when loading configuration.
    #[serde(skip_deserializing)]
    app_name: String,
}

impl AppConfig {
    /// The application name defaults to the Rust package name, but can be
    /// overridden with the environment variable `APP_NAME`.
    fn read_app_name_lowercase(cargo_pkg_name: &str) -> String {
        std::env::var("APP_NAME")
            .map_err(|e| {
                log::debug!(
                    "Environment variable APP_NAME: {e:?} -> Default app name '{cargo_pkg_name}' will be used."
                );
            })
            .ok()
            .map(|value| value.to_lowercase())
            .unwrap_or(cargo_pkg_name.to_owned())
    }

    /// Lower case application name.
    pub fn app_name_lowercase(&self) -> &str {
        &self.app_name
    }

    /// SemVer application version derived from the Rust package version.
    pub fn app_version(&self) -> &'static str {
        CARGO_PKG_VERSION
    }

    /** Creates a new instance pre-populated with defaults, an optional
    configurations file and environment variable overrides.

    Use `env!("CARGO_PKG_NAME")` as `cargo_pkg_name`.
    */
    pub fn new(cargo_pkg_name: &str) -> Result<Self, ConfigError> {
        let app_name = Self::read_app_name_lowercase(cargo_pkg_name);
        let config_filename = app_name.to_owned() + ".json";
        let conf_file = std::env::current_dir()
            .map_err(|e| ConfigError::Message(format!("No current directory: {e}")))?
            .join(config_filename);
        if log::log_enabled!(log::Level::Debug) {
            log::debug!(
                "Will load '{}' configuration if present.",
                conf_file.display()
            );
        }
        let config_builder = Self::builder_with_defaults()?
            .add_source(File::from(conf_file).required(false))
            .add_source(
                Environment::with_prefix(&app_name.to_uppercase())
                    .separator("_")
                    .list_separator(","),
            );
        let mut app_config = Self::from_builder(config_builder)?;
        app_config.app_name = app_name;
        log::info!("Running with configuration: {app_config:?}");
        Ok(app_config)
    }

    /// Configuration builder populated with the defaults of every section.
    fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
    {
        let mut config_builder = Config::builder();
        config_builder = BackendConfig::set_defaults(config_builder, "backend")?;
        config_builder = DynamoDbConfig::set_defaults(config_builder, "dynamodb")?;
        config_builder = AzureConfig::set_defaults(config_builder, "azure")?;
        config_builder = PolicyConfig::set_defaults(config_builder, "policy")?;
        Ok(config_builder)
    }

    fn from_builder(
        config_builder: ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        config_builder.build()?.try_deserialize()
    }

    /// Return an instance from defaults and a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config_builder = Self::builder_with_defaults()?
            .add_source(File::from_str(json, config::FileFormat::Json));
        Self::from_builder(config_builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let app_config = AppConfig::from_json("{}").unwrap();
        assert_eq!(app_config.backend.implementation(), "mem");
        assert_eq!(app_config.dynamodb.table(), "ResourcePolicies");
        assert_eq!(app_config.dynamodb.region(), None);
        assert_eq!(app_config.dynamodb.definition(), None);
        assert_eq!(app_config.azure.poll_frequency().as_millis(), 1000);
        assert_eq!(app_config.policy.file(), "idql.json");
    }

    #[test]
    fn overrides() {
        let app_config = AppConfig::from_json(
            r#"{
                "backend": { "implementation": "dynamodb" },
                "dynamodb": { "table": "Policies", "region": "eu-north-1", "timeoutmillis": "500" },
                "azure": { "key": "{\"secret\":\"very-secret\"}", "pollmillis": "250" }
            }"#,
        )
        .unwrap();
        assert_eq!(app_config.backend.implementation(), "dynamodb");
        assert_eq!(app_config.dynamodb.table(), "Policies");
        assert_eq!(app_config.dynamodb.region(), Some("eu-north-1"));
        assert_eq!(app_config.dynamodb.timeout_millis(), 500);
        assert_eq!(app_config.azure.poll_frequency().as_millis(), 250);
        assert!(!format!("{app_config:?}").contains("very-secret"));
    }
}
