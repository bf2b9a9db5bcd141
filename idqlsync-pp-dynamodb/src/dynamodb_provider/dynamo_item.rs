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

//! Native item types of policy tables.

use super::AttributeDefinition;
use super::ItemCodec;
use super::TableAttribute;
use super::TableDefinition;
use super::TableDefinitionBuilder;
use super::ValType;
use idqlsync_pp::policy::PolicyError;
use idqlsync_pp::policy::PolicyErrorKind;
use idqlsync_pp::policy::ResourceActionRoles;
use idqlsync_pp::pp::RarMapper;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// Item type of a policy table.
pub trait DynamoItem: RarMapper + Sized + Send + Sync + 'static {
    /// The table layout this item type is stored in.
    fn table_definition() -> TableDefinitionBuilder;

    /// Decode a scanned item (converted to JSON by [ItemCodec]).
    fn from_item(item: Value, table_definition: &TableDefinition) -> Result<Self, PolicyError>;

    /// Return `true` if items of this type can be decoded from a table laid
    /// out as `table_definition`.
    fn supports(_table_definition: &TableDefinition) -> bool {
        true
    }
}

/// Parse a JSON encoded member array. A blank string means no members.
fn members_from_json_string(members: &str) -> Result<Vec<String>, PolicyError> {
    if members.trim().is_empty() {
        return Ok(Vec::default());
    }
    serde_json::from_str(members).map_err(|e| {
        PolicyErrorKind::DecodeFailure
            .error_with_msg(format!("Members '{members}' are not a JSON string array: {e}"))
    })
}

/** Item of the default table layout.

| attribute  | type   | key       |
|------------|--------|-----------|
| `resource` | string | partition |
| `action`   | string | sort      |
| `members`  | string | JSON encoded array of members |
*/
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleItem {
    /// The protected resource.
    pub resource: String,
    /// The HTTP method.
    pub action: String,
    /// JSON encoded string array of members.
    #[serde(default)]
    pub members: String,
}

impl DynamoItem for SimpleItem {
    fn table_definition() -> TableDefinitionBuilder {
        TableDefinition::builder()
            .resource(AttributeDefinition::new("resource", ValType::String).pk())
            .actions(AttributeDefinition::new("action", ValType::String).sk())
            .members(AttributeDefinition::new("members", ValType::String))
    }

    fn from_item(item: Value, _table_definition: &TableDefinition) -> Result<Self, PolicyError> {
        serde_json::from_value(item).map_err(|e| {
            PolicyErrorKind::DecodeFailure.error_with_msg(format!("Failed to unmarshal item: {e}"))
        })
    }

    /// Field names are fixed, so only the default layout is supported.
    fn supports(table_definition: &TableDefinition) -> bool {
        Self::table_definition()
            .build()
            .is_ok_and(|own| &own == table_definition)
    }
}

impl RarMapper for SimpleItem {
    fn map_to(&self) -> Result<ResourceActionRoles, PolicyError> {
        let members = members_from_json_string(&self.members)?;
        ResourceActionRoles::new(&self.resource, &[&self.action], &members)
    }
}

/// Item decoded using the attribute paths and value types of any
/// [TableDefinition].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinedItem {
    resource: String,
    actions: Vec<String>,
    members: Vec<String>,
}

impl DefinedItem {
    fn extract<'a>(item: &'a Value, attribute: &TableAttribute) -> Result<&'a Value, PolicyError> {
        ItemCodec::lookup(item, attribute.path()).ok_or_else(|| {
            PolicyErrorKind::DecodeFailure.error_with_msg(format!(
                "Item is missing the {} attribute '{}'.",
                attribute.role(),
                attribute.path().join("/")
            ))
        })
    }

    fn scalar_as_string(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.to_owned()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn values_as_strings(value: &Value, attribute: &TableAttribute) -> Result<Vec<String>, PolicyError> {
        let type_error = || {
            PolicyErrorKind::DecodeFailure.error_with_msg(format!(
                "The {} attribute does not hold a '{}'.",
                attribute.role(),
                attribute.val_type().as_str()
            ))
        };
        match attribute.val_type() {
            ValType::String | ValType::Int => Self::scalar_as_string(value)
                .map(|scalar| vec![scalar])
                .ok_or_else(type_error),
            ValType::StringArray | ValType::IntArray => value
                .as_array()
                .ok_or_else(type_error)?
                .iter()
                .map(|element| Self::scalar_as_string(element).ok_or_else(type_error))
                .collect(),
        }
    }
}

impl DynamoItem for DefinedItem {
    fn table_definition() -> TableDefinitionBuilder {
        SimpleItem::table_definition()
    }

    fn from_item(item: Value, table_definition: &TableDefinition) -> Result<Self, PolicyError> {
        let resource_attribute = table_definition.resource();
        let resource = Self::values_as_strings(
            Self::extract(&item, resource_attribute)?,
            resource_attribute,
        )?
        .concat();
        let actions_attribute = table_definition.actions();
        let actions =
            Self::values_as_strings(Self::extract(&item, actions_attribute)?, actions_attribute)?;
        let members_attribute = table_definition.members();
        let members = match ItemCodec::lookup(&item, members_attribute.path()) {
            None | Some(Value::Null) => Vec::default(),
            Some(Value::String(json)) if members_attribute.val_type() == ValType::String => {
                members_from_json_string(json)?
            }
            Some(value) => Self::values_as_strings(value, members_attribute)?,
        };
        Ok(Self {
            resource,
            actions,
            members,
        })
    }
}

impl RarMapper for DefinedItem {
    fn map_to(&self) -> Result<ResourceActionRoles, PolicyError> {
        ResourceActionRoles::new(&self.resource, &self.actions, &self.members)
    }
}
