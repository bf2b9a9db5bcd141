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

//! Declaration of the physical layout of a policy table.

use super::TableDefinitionError;
use super::TableDefinitionIssue;
use serde::Deserialize;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Separator of nested attribute paths.
pub const PATH_SEPARATOR: &str = "/";

/// The part of a policy an attribute holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeRole {
    /// The protected resource.
    Resource,
    /// The action (HTTP method).
    Actions,
    /// The granted principals.
    Members,
}

impl fmt::Display for AttributeRole {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Resource => "resource",
            Self::Actions => "actions",
            Self::Members => "members",
        })
    }
}

/// Value type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValType {
    /// `string`
    String,
    /// `int`
    Int,
    /// `[]string`
    StringArray,
    /// `[]int`
    IntArray,
}

impl ValType {
    /// Return `true` for array types.
    pub fn is_array(&self) -> bool {
        matches!(self, Self::StringArray | Self::IntArray)
    }

    /// Return `true` for numeric types.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int | Self::IntArray)
    }

    /// Declared name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::StringArray => "[]string",
            Self::IntArray => "[]int",
        }
    }
}

impl FromStr for ValType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "string" => Ok(Self::String),
            "int" => Ok(Self::Int),
            "[]string" => Ok(Self::StringArray),
            "[]int" => Ok(Self::IntArray),
            other => Err(other.to_owned()),
        }
    }
}

fn default_val_type() -> String {
    ValType::String.as_str().to_owned()
}

/// Declared attribute as provided by the caller. Validated on build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    /// Attribute name or `/` separated path to a nested attribute.
    #[serde(rename = "name")]
    pub name_or_path: String,
    /// One of `string`, `int`, `[]string` or `[]int`.
    #[serde(rename = "type", default = "default_val_type")]
    pub val_type: String,
    /// Partition key.
    #[serde(default)]
    pub pk: bool,
    /// Sort key.
    #[serde(default)]
    pub sk: bool,
}

impl AttributeDefinition {
    /// Return a new non-key attribute.
    pub fn new(name_or_path: &str, val_type: ValType) -> Self {
        Self {
            name_or_path: name_or_path.to_owned(),
            val_type: val_type.as_str().to_owned(),
            pk: false,
            sk: false,
        }
    }

    /// Mark as partition key.
    pub fn pk(mut self) -> Self {
        self.pk = true;
        self
    }

    /// Mark as sort key.
    pub fn sk(mut self) -> Self {
        self.sk = true;
        self
    }
}

/// A validated attribute of a [TableDefinition].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableAttribute {
    role: AttributeRole,
    path: Vec<String>,
    val_type: ValType,
    pk: bool,
    sk: bool,
}

impl TableAttribute {
    /// The policy part this attribute holds.
    pub fn role(&self) -> AttributeRole {
        self.role
    }

    /// Path segments. A single segment for top level attributes.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Top level attribute name.
    pub fn name(&self) -> &str {
        &self.path[0]
    }

    /// Value type.
    pub fn val_type(&self) -> ValType {
        self.val_type
    }

    /// Return `true` if this is part of the table key.
    pub fn is_key(&self) -> bool {
        self.pk || self.sk
    }

    /// Return `true` if this is the partition key.
    pub fn is_pk(&self) -> bool {
        self.pk
    }

    /// Return `true` if this is the sort key.
    pub fn is_sk(&self) -> bool {
        self.sk
    }
}

/** Builder and serialized form of a [TableDefinition].

```json
{
  "resource": {"name": "resource", "type": "string", "pk": true},
  "actions":  {"name": "action",   "type": "string", "sk": true},
  "members":  {"name": "members",  "type": "string"}
}
```
*/
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinitionBuilder {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    resource: Option<AttributeDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    actions: Option<AttributeDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    members: Option<AttributeDefinition>,
}

impl TableDefinitionBuilder {
    /// Parse the JSON form.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Declare the resource attribute.
    pub fn resource(mut self, attribute: AttributeDefinition) -> Self {
        self.resource = Some(attribute);
        self
    }

    /// Declare the actions attribute.
    pub fn actions(mut self, attribute: AttributeDefinition) -> Self {
        self.actions = Some(attribute);
        self
    }

    /// Declare the members attribute.
    pub fn members(mut self, attribute: AttributeDefinition) -> Self {
        self.members = Some(attribute);
        self
    }

    /// Validate the declaration.
    ///
    /// All problems are collected and returned together.
    pub fn build(self) -> Result<TableDefinition, TableDefinitionError> {
        let mut issues = Vec::new();
        let resource = Self::resolve(AttributeRole::Resource, self.resource, &mut issues);
        let actions = Self::resolve(AttributeRole::Actions, self.actions, &mut issues);
        let members = Self::resolve(AttributeRole::Members, self.members, &mut issues);
        let resolved = [&resource, &actions, &members]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();
        match resolved.iter().filter(|attribute| attribute.pk).count() {
            0 => issues.push(TableDefinitionIssue::NoPartitionKey),
            1 => {}
            _ => issues.push(TableDefinitionIssue::MultiplePartitionKeys),
        }
        if resolved.iter().filter(|attribute| attribute.sk).count() > 1 {
            issues.push(TableDefinitionIssue::MultipleSortKeys);
        }
        for attribute in &resolved {
            if attribute.pk && attribute.sk {
                issues.push(TableDefinitionIssue::PartitionAndSortKey(attribute.role));
            }
            if attribute.is_key() {
                if attribute.role == AttributeRole::Members {
                    issues.push(TableDefinitionIssue::MembersAsKey);
                }
                if attribute.path.len() > 1 {
                    issues.push(TableDefinitionIssue::CompositeKeyPath(
                        attribute.role,
                        attribute.path.join(PATH_SEPARATOR),
                    ));
                }
                if attribute.val_type.is_array() && attribute.role != AttributeRole::Resource {
                    issues.push(TableDefinitionIssue::ArrayTypedKey(attribute.role));
                }
            }
        }
        if let Some(resource) = &resource
            && resource.val_type.is_array()
        {
            issues.push(TableDefinitionIssue::ArrayTypedResource);
        }
        if let Some(actions) = &actions
            && actions.val_type.is_numeric()
        {
            issues.push(TableDefinitionIssue::NumericActions);
        }
        if let Some(members) = &members
            && members.val_type.is_numeric()
        {
            issues.push(TableDefinitionIssue::NumericMembers);
        }
        match (resource, actions, members) {
            (Some(resource), Some(actions), Some(members)) if issues.is_empty() => {
                Ok(TableDefinition {
                    resource,
                    actions,
                    members,
                })
            }
            _ => Err(TableDefinitionError::new(issues)),
        }
    }

    fn resolve(
        role: AttributeRole,
        attribute: Option<AttributeDefinition>,
        issues: &mut Vec<TableDefinitionIssue>,
    ) -> Option<TableAttribute> {
        let Some(attribute) = attribute else {
            issues.push(TableDefinitionIssue::MissingAttribute(role));
            return None;
        };
        let path = attribute
            .name_or_path
            .trim()
            .split(PATH_SEPARATOR)
            .map(|segment| segment.trim().to_owned())
            .collect::<Vec<_>>();
        if path.iter().any(String::is_empty) {
            issues.push(TableDefinitionIssue::EmptyName(role));
            return None;
        }
        let val_type = ValType::from_str(&attribute.val_type)
            .map_err(|val_type| {
                issues.push(TableDefinitionIssue::UnsupportedValType(role, val_type));
            })
            .ok()?;
        Some(TableAttribute {
            role,
            path,
            val_type,
            pk: attribute.pk,
            sk: attribute.sk,
        })
    }
}

/// Validated physical layout of a policy table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    resource: TableAttribute,
    actions: TableAttribute,
    members: TableAttribute,
}

impl TableDefinition {
    /// Return a new [TableDefinitionBuilder].
    pub fn builder() -> TableDefinitionBuilder {
        TableDefinitionBuilder::default()
    }

    /// The resource attribute.
    pub fn resource(&self) -> &TableAttribute {
        &self.resource
    }

    /// The actions attribute.
    pub fn actions(&self) -> &TableAttribute {
        &self.actions
    }

    /// The members attribute.
    pub fn members(&self) -> &TableAttribute {
        &self.members
    }

    /// The partition key attribute.
    pub fn partition_key(&self) -> &TableAttribute {
        // Validation guarantees exactly one partition key
        if self.actions.pk {
            &self.actions
        } else {
            &self.resource
        }
    }

    /// The sort key attribute if any.
    pub fn sort_key(&self) -> Option<&TableAttribute> {
        [&self.resource, &self.actions]
            .into_iter()
            .find(|attribute| attribute.sk)
    }
}
