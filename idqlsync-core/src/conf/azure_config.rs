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

//! Parsing of configuration for the Azure API Management policy backend.

use config::ConfigBuilder;
use config::ConfigError;
use config::builder::BuilderState;
use serde::Deserialize;
use serde::Serialize;
use std::time::Duration;

use super::AppConfigDefaults;

/// Configuration of the Azure API Management policy backend.
#[derive(Deserialize, Serialize)]
pub struct AzureConfig {
    /// Resource group of the API Management service.
    resourcegroup: String,
    /// API Management service name.
    service: String,
    /// JSON service principal credentials.
    key: String,
    /// Poll frequency of asynchronous updates in milliseconds.
    pollmillis: String,
    /// HTTP request timeout in milliseconds.
    timeoutmillis: String,
}

impl std::fmt::Debug for AzureConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureConfig")
            .field("resourcegroup", &self.resourcegroup)
            .field("service", &self.service)
            .field("key", &"*redacted*")
            .field("pollmillis", &self.pollmillis)
            .field("timeoutmillis", &self.timeoutmillis)
            .finish()
    }
}

impl AppConfigDefaults for AzureConfig {
    /// Provide defaults for this part of the configuration
    fn set_defaults<T: BuilderState>(
        config_builder: ConfigBuilder<T>,
        prefix: &str,
    ) -> Result<ConfigBuilder<T>, ConfigError> {
        config_builder
            .set_default(prefix.to_string() + "." + "resourcegroup", "")?
            .set_default(prefix.to_string() + "." + "service", "")?
            .set_default(prefix.to_string() + "." + "key", "")?
            .set_default(prefix.to_string() + "." + "pollmillis", "1000")?
            .set_default(prefix.to_string() + "." + "timeoutmillis", "30000")
    }
}

impl AzureConfig {
    /// Resource group of the API Management service.
    pub fn resource_group(&self) -> &str {
        &self.resourcegroup
    }

    /// API Management service name.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// JSON service principal credentials.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Poll frequency of asynchronous updates.
    pub fn poll_frequency(&self) -> Duration {
        Duration::from_millis(self.pollmillis.parse::<u64>().unwrap_or(1000))
    }

    /// HTTP request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeoutmillis.parse::<u64>().unwrap_or(30_000))
    }
}
