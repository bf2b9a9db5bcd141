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

//! IDQL policy documents.

use super::PolicyError;
use serde::Deserialize;
use serde::Serialize;

/// IDQL version written when exporting policies.
pub const IDQL_VERSION: &str = "0.5";

/** An IDQL policy document.

```json
{
  "meta": {"version": "0.5"},
  "actions": [{"actionUri": "http:GET"}],
  "subject": {"members": ["Read.HR_US"]},
  "object": {"resourceId": "/humanresources/us"}
}
```
*/
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PolicyInfo {
    /// Document meta data.
    #[serde(default)]
    pub meta: MetaInfo,
    /// Actions granted by the policy.
    #[serde(default)]
    pub actions: Vec<ActionInfo>,
    /// Principals the policy applies to.
    #[serde(default)]
    pub subject: SubjectInfo,
    /// The protected resource.
    #[serde(default)]
    pub object: ObjectInfo,
}

impl PolicyInfo {
    /// Return a new instance for the current IDQL version.
    pub fn new<A: AsRef<str>, M: AsRef<str>>(resource: &str, actions: &[A], members: &[M]) -> Self {
        Self {
            meta: MetaInfo {
                version: IDQL_VERSION.to_owned(),
            },
            actions: actions
                .iter()
                .map(|action| ActionInfo {
                    action_uri: action.as_ref().to_owned(),
                })
                .collect(),
            subject: SubjectInfo {
                members: members.iter().map(|m| m.as_ref().to_owned()).collect(),
            },
            object: ObjectInfo {
                resource_id: resource.to_owned(),
            },
        }
    }
}

/// IDQL document meta data.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetaInfo {
    /// IDQL version of the document.
    #[serde(default)]
    pub version: String,
}

/// An IDQL action.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionInfo {
    /// Action URI like `http:GET`.
    #[serde(rename = "actionUri")]
    pub action_uri: String,
}

/// An IDQL subject.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubjectInfo {
    /// Roles, groups or identities.
    #[serde(default)]
    pub members: Vec<String>,
}

/// An IDQL object.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Resource path like `/humanresources/us`.
    #[serde(rename = "resourceId", default)]
    pub resource_id: String,
}

/// Accepted top-level layouts of IDQL JSON.
#[derive(Deserialize)]
#[serde(untagged)]
enum PoliciesLayout {
    Wrapped { policies: Vec<PolicyInfo> },
    List(Vec<PolicyInfo>),
    Single(PolicyInfo),
}

/// A set of IDQL policy documents.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Policies {
    /// The policy documents.
    pub policies: Vec<PolicyInfo>,
}

impl Policies {
    /// Parse a single policy, an array of policies or `{"policies":[...]}`.
    pub fn from_json(json: &str) -> Result<Self, PolicyError> {
        let policies = match serde_json::from_str::<PoliciesLayout>(json)? {
            PoliciesLayout::Wrapped { policies } => policies,
            PoliciesLayout::List(policies) => policies,
            PoliciesLayout::Single(policy) => vec![policy],
        };
        Ok(Self { policies })
    }

    /// Serialize as `{"policies":[...]}`.
    pub fn as_json(&self) -> Result<String, PolicyError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY: &str = r#"{
        "meta": {"version": "0.5"},
        "actions": [{"actionUri": "http:GET"}, {"actionUri": "http:POST"}],
        "subject": {"members": ["Read.HR_US", "Read.Profile"]},
        "object": {"resourceId": "/humanresources/us"}
    }"#;

    #[test]
    fn parse_layouts() {
        let single = Policies::from_json(POLICY).unwrap();
        assert_eq!(single.policies.len(), 1);
        let policy = &single.policies[0];
        assert_eq!(policy.object.resource_id, "/humanresources/us");
        assert_eq!(policy.actions[1].action_uri, "http:POST");
        assert_eq!(policy.subject.members, ["Read.HR_US", "Read.Profile"]);
        let list = Policies::from_json(&format!("[{POLICY},{POLICY}]")).unwrap();
        assert_eq!(list.policies.len(), 2);
        let wrapped = Policies::from_json(&format!(r#"{{"policies":[{POLICY}]}}"#)).unwrap();
        assert_eq!(wrapped, single);
    }

    #[test]
    fn missing_parts_default() {
        let parsed = Policies::from_json(r#"{"object":{"resourceId":"/x"}}"#).unwrap();
        assert!(parsed.policies[0].actions.is_empty());
        assert!(parsed.policies[0].subject.members.is_empty());
    }

    #[test]
    fn invalid_json() {
        assert!(Policies::from_json("{").is_err());
    }
}
