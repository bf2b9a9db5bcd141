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

//! Calculation of policies that need to be written to a store.

use super::RarMap;
use super::ResourceActionRoles;

/// Outcome for a single existing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateDecision {
    /// The desired members replace the existing ones.
    Update,
    /// Not part of the desired policies. The store is left untouched.
    SkipNotDesired,
    /// Members are already as desired.
    SkipUnchanged,
}

/// Trace of a decision taken for an existing policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTraceEntry {
    /// Mapping key of the existing policy.
    pub key: String,
    /// What was decided.
    pub decision: UpdateDecision,
}

/// Result of [UpdateCalculator::calculate].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateList {
    updates: Vec<ResourceActionRoles>,
    trace: Vec<UpdateTraceEntry>,
}

impl UpdateList {
    /// Policies to write, in the order of the existing policies.
    pub fn updates(&self) -> &[ResourceActionRoles] {
        &self.updates
    }

    /// Take ownership of the policies to write.
    pub fn into_updates(self) -> Vec<ResourceActionRoles> {
        self.updates
    }

    /// One entry per existing policy describing the decision.
    pub fn trace(&self) -> &[UpdateTraceEntry] {
        &self.trace
    }

    /// Return `true` when nothing needs to be written.
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}

/** Compares existing policies of a store with desired policies.

Only policies that already exist in the store are considered. A desired policy
without a stored counterpart is never created and a stored policy without a
desired counterpart is never removed.
*/
pub struct UpdateCalculator {}

impl UpdateCalculator {
    /// Return the desired policies whose members differ from the existing.
    pub fn calculate(existing_rars: &[ResourceActionRoles], desired_rar_map: &RarMap) -> UpdateList {
        let mut update_list = UpdateList::default();
        for existing in existing_rars {
            // Only the first action identifies a stored row
            let key = existing.mapping_key();
            let decision = match desired_rar_map.get(&key) {
                None => UpdateDecision::SkipNotDesired,
                Some(desired) if desired.has_same_members(existing) => {
                    UpdateDecision::SkipUnchanged
                }
                Some(desired) => {
                    update_list.updates.push(desired.clone());
                    UpdateDecision::Update
                }
            };
            update_list.trace.push(UpdateTraceEntry { key, decision });
        }
        update_list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::IdqlMapper;
    use crate::policy::PolicyInfo;

    fn rar(resource: &str, action: &str, members: &[&str]) -> ResourceActionRoles {
        ResourceActionRoles::new(resource, &[action], members).unwrap()
    }

    fn rar_map(rars: &[ResourceActionRoles]) -> RarMap {
        rars.iter()
            .map(|rar| (rar.mapping_key(), rar.clone()))
            .collect()
    }

    #[test]
    fn unchanged_is_skipped_every_time() {
        let existing = vec![rar("/a", "GET", &["x", "y"]), rar("/a", "POST", &[])];
        let desired = rar_map(&existing);
        for _ in 0..2 {
            let update_list = UpdateCalculator::calculate(&existing, &desired);
            assert!(update_list.is_empty());
            assert!(
                update_list
                    .trace()
                    .iter()
                    .all(|entry| entry.decision == UpdateDecision::SkipUnchanged)
            );
        }
    }

    #[test]
    fn never_creates_rows() {
        let existing = vec![rar("/a", "GET", &["x"])];
        let desired = rar_map(&[rar("/a", "GET", &["x"]), rar("/b", "GET", &["x"])]);
        let update_list = UpdateCalculator::calculate(&existing, &desired);
        assert!(update_list.is_empty());
        assert_eq!(update_list.trace().len(), 1);
    }

    #[test]
    fn never_touches_undesired_rows() {
        let existing = vec![rar("/a", "GET", &["x"]), rar("/b", "GET", &["y"])];
        let desired = rar_map(&[rar("/b", "GET", &["z"])]);
        let update_list = UpdateCalculator::calculate(&existing, &desired);
        assert_eq!(update_list.updates(), [rar("/b", "GET", &["z"])]);
        assert_eq!(update_list.trace()[0].decision, UpdateDecision::SkipNotDesired);
        assert_eq!(update_list.trace()[1].decision, UpdateDecision::Update);
    }

    #[test]
    fn replaces_members() {
        let existing = vec![rar("/a", "GET", &["a", "b"])];
        let desired = rar_map(&[rar("/a", "GET", &["c"])]);
        let updates = UpdateCalculator::calculate(&existing, &desired).into_updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].members(), ["c"]);
    }

    #[test]
    fn empty_member_lists_differ_from_non_empty() {
        let existing = vec![rar("/a", "GET", &[]), rar("/a", "PUT", &["x"])];
        let desired = rar_map(&[rar("/a", "GET", &["x"]), rar("/a", "PUT", &[])]);
        let updates = UpdateCalculator::calculate(&existing, &desired).into_updates();
        assert_eq!(updates, [rar("/a", "GET", &["x"]), rar("/a", "PUT", &[])]);
    }

    #[test]
    fn output_follows_existing_order() {
        let existing = vec![rar("/z", "GET", &[]), rar("/a", "GET", &[])];
        let desired = rar_map(&[rar("/a", "GET", &["m"]), rar("/z", "GET", &["m"])]);
        let updates = UpdateCalculator::calculate(&existing, &desired).into_updates();
        assert_eq!(updates[0].resource(), "/z");
        assert_eq!(updates[1].resource(), "/a");
    }

    #[test]
    fn mapped_idql_against_existing() {
        let desired = IdqlMapper::to_rar_map(&[PolicyInfo::new(
            "/humanresources/us",
            &["http:GET", "http:POST"],
            &["Read.HR_US", "Read.Profile"],
        )])
        .unwrap();
        let existing = vec![
            rar("/humanresources/us", "GET", &["Read.HR_US"]),
            rar("/humanresources/us", "POST", &["Read.HR_US"]),
        ];
        let updates = UpdateCalculator::calculate(&existing, &desired).into_updates();
        assert_eq!(updates.len(), 2);
        for update in &updates {
            assert_eq!(update.members(), ["Read.HR_US", "Read.Profile"]);
        }
        let update_list = UpdateCalculator::calculate(&updates, &desired);
        assert!(update_list.is_empty());
    }
}
