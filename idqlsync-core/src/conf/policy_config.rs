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

//! Parsing of configuration for the desired policies.

use config::ConfigBuilder;
use config::ConfigError;
use config::builder::BuilderState;
use serde::Deserialize;
use serde::Serialize;

use super::AppConfigDefaults;

/// Source of the desired policies.
#[derive(Debug, Deserialize, Serialize)]
pub struct PolicyConfig {
    /// IDQL policy document file name.
    file: String,
    /// Name of the application the policies belong to.
    application: String,
}

impl AppConfigDefaults for PolicyConfig {
    /// Provide defaults for this part of the configuration
    fn set_defaults<T: BuilderState>(
        config_builder: ConfigBuilder<T>,
        prefix: &str,
    ) -> Result<ConfigBuilder<T>, ConfigError> {
        config_builder
            .set_default(prefix.to_string() + "." + "file", "idql.json")?
            .set_default(prefix.to_string() + "." + "application", "idqlsync")
    }
}

impl PolicyConfig {
    /// IDQL policy document file name.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Name of the application the policies belong to.
    pub fn application(&self) -> &str {
        &self.application
    }
}
