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

//! Mapping between IDQL documents and canonical policies.

use super::HttpMethod;
use super::PolicyError;
use super::PolicyErrorKind;
use super::PolicyInfo;
use super::ResourceActionRoles;
use std::collections::BTreeMap;

/// Canonical policies by mapping key (`action + resource`).
pub type RarMap = BTreeMap<String, ResourceActionRoles>;

/// Maps between IDQL documents and [ResourceActionRoles].
pub struct IdqlMapper {}

impl IdqlMapper {
    /** Fold IDQL documents into one canonical policy per action and resource.

    Members of documents that share the same action and resource are merged.

    Any malformed document fails the whole batch.
    */
    pub fn to_rar_map(policies: &[PolicyInfo]) -> Result<RarMap, PolicyError> {
        let mut rar_map = RarMap::new();
        for policy in policies {
            let resource = policy.object.resource_id.trim();
            if resource.is_empty() {
                Err(PolicyErrorKind::MalformedInput
                    .error_with_msg("Policy has an empty resource (object.resourceId)."))?;
            }
            if policy.actions.is_empty() {
                Err(PolicyErrorKind::MalformedInput
                    .error_with_msg(format!("Policy for '{resource}' has a nil actionUri.")))?;
            }
            for action_info in &policy.actions {
                let action = HttpMethod::strip_action_prefix(&action_info.action_uri);
                if action.is_empty() {
                    Err(PolicyErrorKind::MalformedInput
                        .error_with_msg(format!("Policy for '{resource}' has an empty actionUri.")))?;
                }
                let key = ResourceActionRoles::mapping_key_for(action, resource);
                let members = rar_map
                    .get(&key)
                    .map(|existing| existing.members().to_vec())
                    .unwrap_or_default()
                    .into_iter()
                    .chain(policy.subject.members.iter().cloned())
                    .collect::<Vec<_>>();
                let rar = ResourceActionRoles::new(resource, &[action], &members)?;
                rar_map.insert(key, rar);
            }
        }
        Ok(rar_map)
    }

    /// Express canonical policies as IDQL documents. One document per policy.
    pub fn to_idql(rars: &[ResourceActionRoles]) -> Vec<PolicyInfo> {
        rars.iter()
            .map(|rar| {
                let actions = rar
                    .actions()
                    .iter()
                    .map(|action| HttpMethod::ACTION_URI_PREFIX.to_string() + action)
                    .collect::<Vec<_>>();
                PolicyInfo::new(rar.resource(), &actions, rar.members())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(resource: &str, actions: &[&str], members: &[&str]) -> PolicyInfo {
        PolicyInfo::new(resource, actions, members)
    }

    #[test]
    fn merges_members_of_same_key() {
        let rar_map = IdqlMapper::to_rar_map(&[
            policy("/hr/us", &["http:GET"], &["roleA"]),
            policy("/hr/us", &["http:GET"], &["roleB"]),
        ])
        .unwrap();
        assert_eq!(rar_map.len(), 1);
        let rar = rar_map.get("GET/hr/us").unwrap();
        assert_eq!(rar.members(), ["roleA", "roleB"]);
        assert_eq!(rar.actions(), ["GET"]);
    }

    #[test]
    fn splits_actions_into_rows() {
        let rar_map = IdqlMapper::to_rar_map(&[policy(
            "/humanresources/us",
            &["http:GET", "http:POST"],
            &["Read.Profile", "Read.HR_US"],
        )])
        .unwrap();
        assert_eq!(
            rar_map.keys().collect::<Vec<_>>(),
            ["GET/humanresources/us", "POST/humanresources/us"]
        );
        for rar in rar_map.values() {
            assert_eq!(rar.members(), ["Read.HR_US", "Read.Profile"]);
        }
    }

    #[test]
    fn identical_documents_collapse() {
        let doc = policy("/a", &["http:PUT"], &["m1", "m2"]);
        let once = IdqlMapper::to_rar_map(&[doc.clone()]).unwrap();
        let twice = IdqlMapper::to_rar_map(&[doc.clone(), doc]).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn rejects_malformed_documents() {
        let e = IdqlMapper::to_rar_map(&[policy(" ", &["http:GET"], &["a"])]).unwrap_err();
        assert!(e.to_string().contains("empty resource"));
        let e = IdqlMapper::to_rar_map(&[policy("/a", &[], &["a"])]).unwrap_err();
        assert!(e.to_string().contains("nil actionUri"));
        let e = IdqlMapper::to_rar_map(&[policy("/a", &["http: "], &["a"])]).unwrap_err();
        assert!(e.to_string().contains("empty actionUri"));
        let e = IdqlMapper::to_rar_map(&[
            policy("/a", &["http:GET"], &["a"]),
            policy("/a", &["http:SOMETHING"], &["a"]),
        ])
        .unwrap_err();
        assert!(e.to_string().contains("Invalid http method"));
    }

    #[test]
    fn export_to_idql() {
        let rar = ResourceActionRoles::new("/a", &["POST", "GET"], &["m"]).unwrap();
        let idql = IdqlMapper::to_idql(&[rar.clone()]);
        assert_eq!(idql.len(), 1);
        assert_eq!(idql[0].actions[0].action_uri, "http:GET");
        assert_eq!(idql[0].actions[1].action_uri, "http:POST");
        let back = IdqlMapper::to_rar_map(&idql).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back.get("POST/a").unwrap().members(), rar.members());
    }
}
