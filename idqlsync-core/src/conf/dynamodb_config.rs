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

//! Parsing of configuration for the DynamoDB policy backend.

use config::ConfigBuilder;
use config::ConfigError;
use config::builder::BuilderState;
use serde::Deserialize;
use serde::Serialize;

use super::AppConfigDefaults;

/// Configuration of the DynamoDB policy backend.
#[derive(Debug, Deserialize, Serialize)]
pub struct DynamoDbConfig {
    /// Table name.
    table: String,
    /// AWS region. Empty to use the default from the environment.
    region: String,
    /// Endpoint URL override. E.g. for DynamoDB local.
    endpoint: String,
    /// JSON table definition. Empty to use the default layout.
    definition: String,
    /// Operation timeout in milliseconds.
    timeoutmillis: String,
}

impl AppConfigDefaults for DynamoDbConfig {
    /// Provide defaults for this part of the configuration
    fn set_defaults<T: BuilderState>(
        config_builder: ConfigBuilder<T>,
        prefix: &str,
    ) -> Result<ConfigBuilder<T>, ConfigError> {
        config_builder
            .set_default(prefix.to_string() + "." + "table", "ResourcePolicies")?
            .set_default(prefix.to_string() + "." + "region", "")?
            .set_default(prefix.to_string() + "." + "endpoint", "")?
            .set_default(prefix.to_string() + "." + "definition", "")?
            .set_default(prefix.to_string() + "." + "timeoutmillis", "10000")
    }
}

impl DynamoDbConfig {
    /// Table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// AWS region override.
    pub fn region(&self) -> Option<&str> {
        Some(self.region.trim()).filter(|value| !value.is_empty())
    }

    /// Endpoint URL override.
    pub fn endpoint(&self) -> Option<&str> {
        Some(self.endpoint.trim()).filter(|value| !value.is_empty())
    }

    /// JSON table definition if any.
    pub fn definition(&self) -> Option<&str> {
        Some(self.definition.trim()).filter(|value| !value.is_empty())
    }

    /// Operation timeout in milliseconds.
    pub fn timeout_millis(&self) -> u64 {
        self.timeoutmillis.parse::<u64>().unwrap_or(10_000)
    }
}
