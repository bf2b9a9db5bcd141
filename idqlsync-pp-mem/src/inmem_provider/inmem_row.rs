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

//! Stored row.

use idqlsync_pp::policy::PolicyError;
use idqlsync_pp::policy::ResourceActionRoles;
use idqlsync_pp::pp::RarMapper;

/// A single stored resource and action with its members.
#[derive(Debug, Clone)]
pub struct InMemRow {
    resource: String,
    action: String,
    members: Vec<String>,
}

impl InMemRow {
    /// Return a new instance.
    pub fn new(resource: &str, action: &str, members: &[String]) -> Self {
        Self {
            resource: resource.to_owned(),
            action: action.to_owned(),
            members: members.to_vec(),
        }
    }

    /// Lookup key of the row.
    pub fn key(&self) -> String {
        ResourceActionRoles::mapping_key_for(&self.action, &self.resource)
    }
}

impl RarMapper for InMemRow {
    fn map_to(&self) -> Result<ResourceActionRoles, PolicyError> {
        ResourceActionRoles::new(&self.resource, &[&self.action], &self.members)
    }
}
