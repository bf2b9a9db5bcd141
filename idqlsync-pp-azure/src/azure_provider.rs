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

//! Azure API Management Named Value implementation of [PolicyStore].

mod arm_client;
mod arm_update_operation;
mod azure_credentials;
mod named_value;
mod named_value_key;
#[cfg(test)]
mod test_server;

pub use self::arm_client::*;
pub use self::azure_credentials::*;
pub use self::named_value::*;
pub use self::named_value_key::*;

use futures::FutureExt;
use idqlsync_pp::policy::PolicyError;
use idqlsync_pp::policy::ResourceActionRoles;
use idqlsync_pp::pp::ApplicationContext;
use idqlsync_pp::pp::PolicyProvider;
use idqlsync_pp::pp::PolicyStore;
use idqlsync_pp::pp::RarMapper;
use idqlsync_pp::util::LongRunningOperationPoller;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Azure API Management Named Value implementation of [PolicyStore].
pub struct AzureApimPolicyStore {
    arm_client: Arc<ArmClient>,
    resource_group: String,
    service_name: String,
    poll_frequency: Duration,
    cancel: CancellationToken,
}

impl AzureApimPolicyStore {
    /// Return a new instance.
    ///
    /// Policies are read from and written to the Named Values of the API
    /// Management service `service_name`.
    pub fn new(
        arm_client: Arc<ArmClient>,
        resource_group: &str,
        service_name: &str,
        poll_frequency: Duration,
    ) -> Arc<Self> {
        if log::log_enabled!(log::Level::Debug) {
            log::debug!(
                "Using API Management service '{service_name}' in resource group '{resource_group}'."
            );
        }
        Arc::new(Self {
            arm_client,
            resource_group: resource_group.to_owned(),
            service_name: service_name.to_owned(),
            poll_frequency,
            cancel: CancellationToken::new(),
        })
    }

    /// Get [PolicyProvider] instance.
    pub fn as_policy_provider(self: &Arc<Self>) -> PolicyProvider {
        PolicyProvider::new(Arc::clone(self) as Arc<dyn PolicyStore>)
    }

    /// Stop waiting for any pending updates.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    fn named_values_url(&self) -> String {
        self.arm_client
            .named_values_url(&self.resource_group, &self.service_name)
    }

    /// Decode a page of Named Values, skipping the ones that aren't policies.
    fn decode_page(
        named_values: Vec<Result<NamedValueContract, PolicyError>>,
    ) -> Vec<ResourceActionRoles> {
        named_values
            .into_iter()
            .filter_map(|named_value| {
                named_value
                    .and_then(|named_value| named_value.map_to())
                    .map_err(|e| {
                        if log::log_enabled!(log::Level::Debug) {
                            log::debug!("Skipping Named Value: {e}");
                        }
                    })
                    .ok()
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl PolicyStore for AzureApimPolicyStore {
    fn name(&self) -> &str {
        "azure"
    }

    async fn get_policies(
        &self,
        application_context: &ApplicationContext,
    ) -> Result<Vec<ResourceActionRoles>, PolicyError> {
        let mut ret = vec![];
        let mut next_url = Some(ArmClient::with_api_version(&self.named_values_url()));
        while let Some(url) = next_url.take() {
            let page = self
                .arm_client
                .list_named_values_page(&url)
                .await
                .map_err(|e| e.in_operation("NamedValue_ListByService"))?;
            next_url = page.next_link().map(str::to_owned);
            ret.append(&mut Self::decode_page(page.into_contracts()));
        }
        if log::log_enabled!(log::Level::Debug) {
            log::debug!(
                "Found {} policies in service '{}' for app '{}'.",
                ret.len(),
                self.service_name,
                application_context.name()
            );
        }
        Ok(ret)
    }

    async fn set_policy(&self, rar: &ResourceActionRoles) -> Result<(), PolicyError> {
        let Some(key) = NamedValueKey::from_rar(rar) else {
            log::info!(
                "Policy for '{}' can't be expressed as a Named Value. Nothing to do.",
                rar.mapping_key()
            );
            return Ok(());
        };
        let named_value_url = format!("{}/{key}", self.named_values_url());
        let value = NamedValueContract::encode_members(rar.members());
        let arm_client = Arc::clone(&self.arm_client);
        let poller = LongRunningOperationPoller::new(move || {
            async move {
                arm_client
                    .begin_update_named_value(&named_value_url, &value)
                    .await
            }
            .boxed()
        });
        let updated = poller
            .poll_for_result(&self.cancel, self.poll_frequency)
            .await
            .map_err(|e| e.in_operation("NamedValue_Update"))?;
        if log::log_enabled!(log::Level::Debug) {
            log::debug!(
                "Updated Named Value '{key}': {:?}",
                updated.as_ref().and_then(NamedValueContract::value)
            );
        }
        Ok(())
    }
}
