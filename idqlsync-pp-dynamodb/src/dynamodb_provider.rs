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

//! DynamoDB implementation of [PolicyStore].

mod dynamo_item;
mod input_builder;
mod item_codec;
mod table_definition;
mod table_definition_error;

pub use self::dynamo_item::*;
pub use self::input_builder::*;
pub use self::item_codec::ItemCodec;
pub use self::table_definition::*;
pub use self::table_definition_error::*;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_smithy_types::timeout::TimeoutConfig;
use idqlsync_pp::policy::PolicyError;
use idqlsync_pp::policy::PolicyErrorKind;
use idqlsync_pp::policy::ResourceActionRoles;
use idqlsync_pp::pp::ApplicationContext;
use idqlsync_pp::pp::PolicyProvider;
use idqlsync_pp::pp::PolicyStore;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

/// DynamoDB [PolicyStore] implementation.
///
/// Items of the table are decoded as `R`.
pub struct DynamoDbPolicyStore<R: DynamoItem> {
    client: Client,
    table_name: String,
    table_definition: TableDefinition,
    item_type: PhantomData<fn() -> R>,
}

impl<R: DynamoItem> DynamoDbPolicyStore<R> {
    /// Return a new instance using the table layout declared by `R`.
    pub fn new(client: Client, table_name: &str) -> Result<Arc<Self>, PolicyError> {
        Self::with_table_definition(client, table_name, R::table_definition())
    }

    /// Return a new instance using an explicit table layout.
    ///
    /// The layout is validated here and never again. It must be one that `R`
    /// can decode, see [DynamoItem::supports].
    pub fn with_table_definition(
        client: Client,
        table_name: &str,
        table_definition: TableDefinitionBuilder,
    ) -> Result<Arc<Self>, PolicyError> {
        let table_definition = table_definition.build().map_err(|e| {
            log::warn!("Table '{table_name}': {e}");
            PolicyError::from(e)
        })?;
        if !R::supports(&table_definition) {
            let msg = format!(
                "Table '{table_name}': item type '{}' can't decode items laid out as {table_definition:?}.",
                std::any::type_name::<R>()
            );
            log::warn!("{msg}");
            Err(PolicyErrorKind::InvalidTableDefinition.error_with_msg(msg))?;
        }
        if log::log_enabled!(log::Level::Debug) {
            log::debug!("Using table '{table_name}' with definition {table_definition:?}.");
        }
        Ok(Arc::new(Self {
            client,
            table_name: table_name.to_owned(),
            table_definition,
            item_type: PhantomData,
        }))
    }

    /// Create a client from the default AWS environment with optional
    /// overrides.
    pub async fn connect(
        region: Option<&str>,
        endpoint: Option<&str>,
        timeout_ms: Option<u64>,
    ) -> Client {
        let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let mut builder = aws_sdk_dynamodb::config::Builder::from(&sdk_config);
        if let Some(region) = region {
            builder = builder.region(aws_sdk_dynamodb::config::Region::new(region.to_owned()));
        }
        // E.g. DynamoDB local
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        if let Some(timeout_ms) = timeout_ms {
            builder = builder.timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(Duration::from_millis(timeout_ms))
                    .build(),
            );
        }
        Client::from_conf(builder.build())
    }

    /// Get [PolicyProvider] instance.
    pub fn as_policy_provider(self: &Arc<Self>) -> PolicyProvider {
        PolicyProvider::new(Arc::clone(self) as Arc<dyn PolicyStore>)
    }

    /// The validated table layout.
    pub fn table_definition(&self) -> &TableDefinition {
        &self.table_definition
    }
}

#[async_trait::async_trait]
impl<R: DynamoItem> PolicyStore for DynamoDbPolicyStore<R> {
    fn name(&self) -> &str {
        "dynamodb"
    }

    async fn get_policies(
        &self,
        app_context: &ApplicationContext,
    ) -> Result<Vec<ResourceActionRoles>, PolicyError> {
        let mut rars = Vec::new();
        let mut exclusive_start_key = None;
        loop {
            let response = self
                .client
                .scan()
                .table_name(&self.table_name)
                .set_exclusive_start_key(exclusive_start_key.take())
                .send()
                .await
                .map_err(|e| {
                    PolicyErrorKind::BackendCommunication
                        .error_with_msg(format!("in Scan: {}", DisplayErrorContext(&e)))
                })?;
            for item in response.items() {
                let json = ItemCodec::item_to_json(item)?;
                let rar = R::from_item(json, &self.table_definition)?.map_to()?;
                rars.push(rar);
            }
            match response.last_evaluated_key() {
                Some(key) if !key.is_empty() => exclusive_start_key = Some(key.clone()),
                _ => break,
            }
        }
        if log::log_enabled!(log::Level::Debug) {
            log::debug!(
                "Scanned {} policies from '{}' for application '{}'.",
                rars.len(),
                self.table_name,
                app_context.name()
            );
        }
        Ok(rars)
    }

    async fn set_policy(&self, rar: &ResourceActionRoles) -> Result<(), PolicyError> {
        let input = InputBuilder::new(&self.table_definition).update_item_input(rar)?;
        self.client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(input.key))
            .update_expression(input.update_expression)
            .set_expression_attribute_names(Some(input.expression_attribute_names))
            .set_expression_attribute_values(Some(input.expression_attribute_values))
            .send()
            .await
            .map_err(|e| {
                PolicyErrorKind::BackendCommunication
                    .error_with_msg(format!("in UpdateItem: {}", DisplayErrorContext(&e)))
            })?;
        if log::log_enabled!(log::Level::Debug) {
            log::debug!(
                "Updated members of '{} {}' in '{}'.",
                rar.first_action(),
                rar.resource(),
                self.table_name
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_client() -> Client {
        let config = aws_sdk_dynamodb::Config::builder()
            .behavior_version(aws_sdk_dynamodb::config::BehaviorVersion::latest())
            .region(aws_sdk_dynamodb::config::Region::new("eu-north-1"))
            .build();
        Client::from_conf(config)
    }

    #[test]
    fn invalid_definition_fails_construction() {
        let e = DynamoDbPolicyStore::<DefinedItem>::with_table_definition(
            offline_client(),
            "policies",
            TableDefinition::builder()
                .resource(AttributeDefinition::new("resource", ValType::String))
                .actions(AttributeDefinition::new("action", ValType::String))
                .members(AttributeDefinition::new("members", ValType::String)),
        )
        .err()
        .unwrap();
        assert_eq!(e.kind(), &PolicyErrorKind::InvalidTableDefinition);
        assert!(e.to_string().contains("partition key"));
    }

    #[test]
    fn simple_item_rejects_custom_definition() {
        let custom = || {
            TableDefinition::builder()
                .resource(AttributeDefinition::new("path", ValType::String).pk())
                .actions(AttributeDefinition::new("method", ValType::String).sk())
                .members(AttributeDefinition::new("roles", ValType::StringArray))
        };
        let e = DynamoDbPolicyStore::<SimpleItem>::with_table_definition(
            offline_client(),
            "policies",
            custom(),
        )
        .err()
        .unwrap();
        assert_eq!(e.kind(), &PolicyErrorKind::InvalidTableDefinition);
        let store = DynamoDbPolicyStore::<DefinedItem>::with_table_definition(
            offline_client(),
            "policies",
            custom(),
        )
        .unwrap();
        assert_eq!(store.table_definition().partition_key().name(), "path");
        assert!(
            DynamoDbPolicyStore::<SimpleItem>::with_table_definition(
                offline_client(),
                "policies",
                SimpleItem::table_definition(),
            )
            .is_ok()
        );
    }

    #[test]
    fn item_declared_definition() {
        let store = DynamoDbPolicyStore::<SimpleItem>::new(offline_client(), "policies").unwrap();
        assert_eq!(store.table_definition().partition_key().name(), "resource");
        assert_eq!(store.as_policy_provider().name(), "dynamodb");
    }
}
