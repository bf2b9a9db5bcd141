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

//! Creation of the configured policy backend.

use crate::AppConfig;
use idqlsync_pp::policy::PolicyError;
use idqlsync_pp::policy::PolicyErrorKind;
use idqlsync_pp::pp::PolicyProvider;
use idqlsync_pp::pp::PolicyStore;
use idqlsync_pp_azure::ArmClient;
use idqlsync_pp_azure::AzureApimPolicyStore;
use idqlsync_pp_azure::AzureCredentials;
use idqlsync_pp_dynamodb::DefinedItem;
use idqlsync_pp_dynamodb::DynamoDbPolicyStore;
use idqlsync_pp_dynamodb::SimpleItem;
use idqlsync_pp_dynamodb::TableDefinitionBuilder;
use idqlsync_pp_mem::InMemoryPolicyStore;

/// Create the [PolicyProvider] selected by `backend.implementation`.
pub async fn policy_provider_from_config(
    app_config: &AppConfig,
) -> Result<PolicyProvider, PolicyError> {
    let policy_provider = match app_config.backend.implementation() {
        "dynamodb" => {
            let conf = &app_config.dynamodb;
            let client = DynamoDbPolicyStore::<SimpleItem>::connect(
                conf.region(),
                conf.endpoint(),
                Some(conf.timeout_millis()),
            )
            .await;
            if let Some(definition) = conf.definition() {
                let table_definition = TableDefinitionBuilder::from_json(definition).map_err(|e| {
                    PolicyErrorKind::InvalidTableDefinition
                        .error_with_msg(format!("Unable to parse table definition: {e}"))
                })?;
                DynamoDbPolicyStore::<DefinedItem>::with_table_definition(
                    client,
                    conf.table(),
                    table_definition,
                )?
                .as_policy_provider()
            } else {
                DynamoDbPolicyStore::<SimpleItem>::new(client, conf.table())?.as_policy_provider()
            }
        }
        "azure" => {
            let conf = &app_config.azure;
            let credentials = AzureCredentials::from_json(conf.key())?;
            let arm_client = ArmClient::new(credentials, conf.timeout())?;
            AzureApimPolicyStore::new(
                arm_client,
                conf.resource_group(),
                conf.service(),
                conf.poll_frequency(),
            )
            .as_policy_provider()
        }
        "mem" => InMemoryPolicyStore::new().as_policy_provider(),
        unknown_provider => Err(PolicyErrorKind::MalformedInput
            .error_with_msg(format!("Unknown policy backend '{unknown_provider}'.")))?,
    };
    log::info!("Using policy backend '{}'.", policy_provider.name());
    Ok(policy_provider)
}
