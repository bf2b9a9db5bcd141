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

//! Application the policies belong to.

/// Identifies the application whose policies are read from a store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationContext {
    object_id: String,
    name: String,
}

impl ApplicationContext {
    /// Return a new instance.
    pub fn new(object_id: &str, name: &str) -> Self {
        Self {
            object_id: object_id.to_owned(),
            name: name.to_owned(),
        }
    }

    /// Backend identifier of the application.
    pub fn object_id(&self) -> &str {
        &self.object_id
    }

    /// Human readable application name.
    pub fn name(&self) -> &str {
        &self.name
    }
}
