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

//! Backend policy store contract.

use super::ApplicationContext;
use crate::policy::PolicyError;
use crate::policy::ResourceActionRoles;

/** Backend that persists canonical policies in its own physical layout.

The contract is intentionally narrow: there is no delete, bulk write or
transaction support.
*/
#[async_trait::async_trait]
pub trait PolicyStore: Send + Sync {
    /// Short name of the backend for logging.
    fn name(&self) -> &str;

    /// Return all policies currently stored for the application.
    ///
    /// Fails as a whole if any stored item can't be mapped to a
    /// [ResourceActionRoles], unless the store documents otherwise.
    async fn get_policies(
        &self,
        app_context: &ApplicationContext,
    ) -> Result<Vec<ResourceActionRoles>, PolicyError>;

    /// Replace the members stored for the resource and first action of `rar`.
    ///
    /// Writing the same policy again has no further effect.
    async fn set_policy(&self, rar: &ResourceActionRoles) -> Result<(), PolicyError>;
}
