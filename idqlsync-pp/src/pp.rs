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

//! Policy Provider abstraction

mod application_context;
mod policy_store;
mod rar_mapper;

pub use self::application_context::ApplicationContext;
pub use self::policy_store::PolicyStore;
pub use self::rar_mapper::RarMapper;
use crate::policy::PolicyError;
use crate::policy::ResourceActionRoles;
use std::sync::Arc;

/// The Policy Provider.
///
/// Implementation logic is abstracted by a [PolicyStore] for the backend in
/// use.
#[derive(Clone)]
pub struct PolicyProvider {
    store: Arc<dyn PolicyStore>,
}

impl PolicyProvider {
    /// Return a new instance.
    pub fn new(policy_store: Arc<dyn PolicyStore>) -> Self {
        Self {
            store: policy_store,
        }
    }
}

#[async_trait::async_trait]
impl PolicyStore for PolicyProvider {
    fn name(&self) -> &str {
        self.store.name()
    }

    async fn get_policies(
        &self,
        app_context: &ApplicationContext,
    ) -> Result<Vec<ResourceActionRoles>, PolicyError> {
        self.store.get_policies(app_context).await
    }

    async fn set_policy(&self, rar: &ResourceActionRoles) -> Result<(), PolicyError> {
        self.store.set_policy(rar).await
    }
}
