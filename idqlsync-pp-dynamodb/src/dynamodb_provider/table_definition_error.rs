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

//! Problems found when validating a [super::TableDefinition].

use super::AttributeRole;
use idqlsync_pp::policy::PolicyError;
use idqlsync_pp::policy::PolicyErrorKind;
use std::error::Error;
use std::fmt;

/// A single problem with a table definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableDefinitionIssue {
    /// No attribute was declared for the role.
    MissingAttribute(AttributeRole),
    /// The attribute name or path is blank or has blank path segments.
    EmptyName(AttributeRole),
    /// The declared value type is not one of `string`, `int`, `[]string` or
    /// `[]int`.
    UnsupportedValType(AttributeRole, String),
    /// No attribute is marked as partition key.
    NoPartitionKey,
    /// More than one attribute is marked as partition key.
    MultiplePartitionKeys,
    /// More than one attribute is marked as sort key.
    MultipleSortKeys,
    /// An attribute is marked as both partition and sort key.
    PartitionAndSortKey(AttributeRole),
    /// The members attribute is marked as a key.
    MembersAsKey,
    /// A key attribute uses a composite (`/` separated) path.
    CompositeKeyPath(AttributeRole, String),
    /// A key attribute uses an array value type.
    ArrayTypedKey(AttributeRole),
    /// The resource attribute uses an array value type.
    ArrayTypedResource,
    /// The actions attribute uses a numeric value type.
    NumericActions,
    /// The members attribute uses a numeric value type.
    NumericMembers,
}

impl fmt::Display for TableDefinitionIssue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::MissingAttribute(role) => write!(f, "no attribute is defined for {role}"),
            Self::EmptyName(role) => write!(f, "the {role} attribute has an empty name or path"),
            Self::UnsupportedValType(role, val_type) => {
                write!(f, "the {role} attribute has unsupported valType '{val_type}'")
            }
            Self::NoPartitionKey => write!(f, "no attribute is marked as partition key"),
            Self::MultiplePartitionKeys => write!(f, "more than one partition key"),
            Self::MultipleSortKeys => write!(f, "more than one sort key"),
            Self::PartitionAndSortKey(role) => {
                write!(f, "the {role} attribute is both partition and sort key")
            }
            Self::MembersAsKey => write!(f, "the members attribute can't be a key"),
            Self::CompositeKeyPath(role, path) => {
                write!(f, "the {role} key attribute has composite path '{path}'")
            }
            Self::ArrayTypedKey(role) => write!(f, "the {role} key attribute is array typed"),
            Self::ArrayTypedResource => write!(f, "the resource attribute is array typed"),
            Self::NumericActions => write!(f, "the actions attribute is numeric"),
            Self::NumericMembers => write!(f, "the members attribute is numeric"),
        }
    }
}

/// All problems found in a table definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinitionError {
    issues: Vec<TableDefinitionIssue>,
}

impl TableDefinitionError {
    /// Return a new instance.
    pub fn new(issues: Vec<TableDefinitionIssue>) -> Self {
        Self { issues }
    }

    /// The problems found.
    pub fn issues(&self) -> &[TableDefinitionIssue] {
        &self.issues
    }

    /// Return `true` if `issue` is among the problems found.
    pub fn has_issue(&self, issue: &TableDefinitionIssue) -> bool {
        self.issues.contains(issue)
    }
}

impl fmt::Display for TableDefinitionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Invalid table definition: ")?;
        for (index, issue) in self.issues.iter().enumerate() {
            if index > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl Error for TableDefinitionError {}

impl From<TableDefinitionError> for PolicyError {
    fn from(e: TableDefinitionError) -> Self {
        PolicyErrorKind::InvalidTableDefinition.error_with_msg(e.to_string())
    }
}
