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

//! Builds DynamoDB request parameters from a [TableDefinition].

use super::AttributeRole;
use super::TableAttribute;
use super::TableDefinition;
use super::ValType;
use aws_sdk_dynamodb::types::AttributeValue;
use idqlsync_pp::policy::PolicyError;
use idqlsync_pp::policy::PolicyErrorKind;
use idqlsync_pp::policy::ResourceActionRoles;
use std::collections::HashMap;

/// Parameters of an `UpdateItem` request.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateItemInput {
    /// Primary key of the item.
    pub key: HashMap<String, AttributeValue>,
    /// E.g. `SET #members = :members`.
    pub update_expression: String,
    /// Placeholder to attribute name bindings.
    pub expression_attribute_names: HashMap<String, String>,
    /// Placeholder to value bindings.
    pub expression_attribute_values: HashMap<String, AttributeValue>,
}

/// Builds request parameters for a validated [TableDefinition].
pub struct InputBuilder<'a> {
    table_definition: &'a TableDefinition,
}

impl<'a> InputBuilder<'a> {
    const MEMBERS_NAME_PLACEHOLDER: &'static str = "#members";
    const MEMBERS_VALUE_PLACEHOLDER: &'static str = ":members";

    /// Return a new instance.
    pub fn new(table_definition: &'a TableDefinition) -> Self {
        Self { table_definition }
    }

    /// Build the update that replaces the members of the row identified by
    /// the resource and first action of `rar`.
    pub fn update_item_input(&self, rar: &ResourceActionRoles) -> Result<UpdateItemInput, PolicyError> {
        let mut key = HashMap::new();
        let partition_key = self.table_definition.partition_key();
        key.insert(
            partition_key.name().to_owned(),
            Self::key_value(partition_key, Self::key_source(partition_key, rar))?,
        );
        if let Some(sort_key) = self.table_definition.sort_key() {
            key.insert(
                sort_key.name().to_owned(),
                Self::key_value(sort_key, Self::key_source(sort_key, rar))?,
            );
        }
        let members = self.table_definition.members();
        let (members_path_expression, expression_attribute_names) = Self::path_placeholders(members);
        let expression_attribute_values = HashMap::from([(
            Self::MEMBERS_VALUE_PLACEHOLDER.to_owned(),
            Self::members_value(members, rar.members())?,
        )]);
        Ok(UpdateItemInput {
            key,
            update_expression: format!(
                "SET {members_path_expression} = {}",
                Self::MEMBERS_VALUE_PLACEHOLDER
            ),
            expression_attribute_names,
            expression_attribute_values,
        })
    }

    /// The value of `rar` that the key attribute holds.
    fn key_source<'r>(attribute: &TableAttribute, rar: &'r ResourceActionRoles) -> &'r str {
        match attribute.role() {
            AttributeRole::Actions => rar.first_action(),
            _ => rar.resource(),
        }
    }

    /// Marshal a key value according to the declared type.
    fn key_value(attribute: &TableAttribute, value: &str) -> Result<AttributeValue, PolicyError> {
        match attribute.val_type() {
            ValType::String => Ok(AttributeValue::S(value.to_owned())),
            ValType::Int => value
                .trim()
                .parse::<i64>()
                .map(|n| AttributeValue::N(n.to_string()))
                .map_err(|e| {
                    PolicyErrorKind::MalformedInput.error_with_msg(format!(
                        "The {} key '{value}' is not an int: {e}",
                        attribute.role()
                    ))
                }),
            val_type => Err(PolicyErrorKind::InvalidTableDefinition.error_with_msg(format!(
                "The {} key has unsupported valType '{}'.",
                attribute.role(),
                val_type.as_str()
            ))),
        }
    }

    /// Members as a JSON encoded string or a native list.
    fn members_value(attribute: &TableAttribute, members: &[String]) -> Result<AttributeValue, PolicyError> {
        match attribute.val_type() {
            ValType::String => Ok(AttributeValue::S(serde_json::to_string(members)?)),
            ValType::StringArray => Ok(AttributeValue::L(
                members
                    .iter()
                    .map(|member| AttributeValue::S(member.to_owned()))
                    .collect(),
            )),
            val_type => Err(PolicyErrorKind::InvalidTableDefinition.error_with_msg(format!(
                "The members attribute has unsupported valType '{}'.",
                val_type.as_str()
            ))),
        }
    }

    /// Placeholders for each path segment of the attribute.
    ///
    /// `policy/members` becomes `#members.#members_1`.
    fn path_placeholders(attribute: &TableAttribute) -> (String, HashMap<String, String>) {
        let placeholders = attribute
            .path()
            .iter()
            .enumerate()
            .map(|(index, segment)| {
                let placeholder = if index == 0 {
                    Self::MEMBERS_NAME_PLACEHOLDER.to_owned()
                } else {
                    format!("{}_{index}", Self::MEMBERS_NAME_PLACEHOLDER)
                };
                (placeholder, segment.to_owned())
            })
            .collect::<Vec<_>>();
        let expression = placeholders
            .iter()
            .map(|(placeholder, _)| placeholder.as_str())
            .collect::<Vec<_>>()
            .join(".");
        (expression, placeholders.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AttributeDefinition;
    use crate::DynamoItem;
    use crate::SimpleItem;

    fn rar(resource: &str, actions: &[&str], members: &[&str]) -> ResourceActionRoles {
        ResourceActionRoles::new(resource, actions, members).unwrap()
    }

    #[test]
    fn simple_update() {
        let table_definition = SimpleItem::table_definition().build().unwrap();
        let input = InputBuilder::new(&table_definition)
            .update_item_input(&rar("/hr/us", &["POST", "GET"], &["b", "a"]))
            .unwrap();
        assert_eq!(input.update_expression, "SET #members = :members");
        assert_eq!(
            input.key,
            HashMap::from([
                ("resource".to_string(), AttributeValue::S("/hr/us".to_string())),
                ("action".to_string(), AttributeValue::S("GET".to_string())),
            ])
        );
        assert_eq!(
            input.expression_attribute_names,
            HashMap::from([("#members".to_string(), "members".to_string())])
        );
        assert_eq!(
            input.expression_attribute_values.get(":members"),
            Some(&AttributeValue::S("[\"a\",\"b\"]".to_string()))
        );
    }

    #[test]
    fn nested_members_and_list_value() {
        let table_definition = TableDefinition::builder()
            .resource(AttributeDefinition::new("resource", ValType::String).pk())
            .actions(AttributeDefinition::new("action", ValType::String))
            .members(AttributeDefinition::new("policy/members", ValType::StringArray))
            .build()
            .unwrap();
        let input = InputBuilder::new(&table_definition)
            .update_item_input(&rar("/a", &["GET"], &["m"]))
            .unwrap();
        assert_eq!(input.update_expression, "SET #members.#members_1 = :members");
        assert_eq!(input.key.len(), 1);
        assert_eq!(input.expression_attribute_names["#members"], "policy");
        assert_eq!(input.expression_attribute_names["#members_1"], "members");
        assert_eq!(
            input.expression_attribute_values[":members"],
            AttributeValue::L(vec![AttributeValue::S("m".to_string())])
        );
    }

    #[test]
    fn int_keys() {
        let table_definition = TableDefinition::builder()
            .resource(AttributeDefinition::new("resource_id", ValType::Int).pk())
            .actions(AttributeDefinition::new("action", ValType::String).sk())
            .members(AttributeDefinition::new("members", ValType::String))
            .build()
            .unwrap();
        let builder = InputBuilder::new(&table_definition);
        let input = builder.update_item_input(&rar("42", &["GET"], &[])).unwrap();
        assert_eq!(input.key["resource_id"], AttributeValue::N("42".to_string()));
        assert_eq!(
            input.expression_attribute_values[":members"],
            AttributeValue::S("[]".to_string())
        );
        let e = builder.update_item_input(&rar("/not/a/number", &["GET"], &[])).unwrap_err();
        assert_eq!(e.kind(), &PolicyErrorKind::MalformedInput);
    }
}
