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

//! Ephemeral in-memory implementation of [PolicyStore].

mod inmem_row;

use self::inmem_row::InMemRow;
use crossbeam_skiplist::SkipMap;
use idqlsync_pp::policy::PolicyError;
use idqlsync_pp::policy::ResourceActionRoles;
use idqlsync_pp::pp::ApplicationContext;
use idqlsync_pp::pp::PolicyProvider;
use idqlsync_pp::pp::PolicyStore;
use idqlsync_pp::pp::RarMapper;
use std::sync::Arc;

/// Ephemeral in-memory implementation of [PolicyStore].
///
/// Rows are keyed by the mapping key of the resource and first action.
#[derive(Default)]
pub struct InMemoryPolicyStore {
    rows: SkipMap<String, InMemRow>,
}

impl InMemoryPolicyStore {
    /// Return a new instance.
    pub fn new() -> Arc<Self> {
        if log::log_enabled!(log::Level::Trace) {
            log::trace!("Using in-mem policy store.");
        }
        Arc::new(Self::default())
    }

    /// Get [PolicyProvider] instance.
    pub fn as_policy_provider(self: &Arc<Self>) -> PolicyProvider {
        PolicyProvider::new(Arc::clone(self) as Arc<dyn PolicyStore>)
    }

    /// Seed a row for every action of `rar`, replacing existing rows.
    pub fn insert(&self, rar: &ResourceActionRoles) {
        for action in rar.actions() {
            let row = InMemRow::new(rar.resource(), action, rar.members());
            self.rows.insert(row.key(), row);
        }
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Return `true` if there are no stored rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait::async_trait]
impl PolicyStore for InMemoryPolicyStore {
    fn name(&self) -> &str {
        "mem"
    }

    async fn get_policies(
        &self,
        app_context: &ApplicationContext,
    ) -> Result<Vec<ResourceActionRoles>, PolicyError> {
        if log::log_enabled!(log::Level::Trace) {
            log::trace!(
                "Listing {} rows for application '{}'.",
                self.rows.len(),
                app_context.name()
            );
        }
        self.rows.iter().map(|entry| entry.value().map_to()).collect()
    }

    async fn set_policy(&self, rar: &ResourceActionRoles) -> Result<(), PolicyError> {
        let row = InMemRow::new(rar.resource(), rar.first_action(), rar.members());
        self.rows.insert(row.key(), row);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rar(resource: &str, actions: &[&str], members: &[&str]) -> ResourceActionRoles {
        ResourceActionRoles::new(resource, actions, members).unwrap()
    }

    #[tokio::test]
    async fn seeded_rows_are_listed_per_action() {
        let store = InMemoryPolicyStore::new();
        store.insert(&rar("/hr", &["GET", "POST"], &["a"]));
        assert_eq!(store.len(), 2);
        let listed = store
            .get_policies(&ApplicationContext::default())
            .await
            .unwrap();
        assert_eq!(listed, [rar("/hr", &["GET"], &["a"]), rar("/hr", &["POST"], &["a"])]);
    }

    #[tokio::test]
    async fn set_policy_upserts_first_action_only() {
        let store = InMemoryPolicyStore::new();
        let provider = store.as_policy_provider();
        let update = rar("/hr", &["GET", "PUT"], &["b", "a"]);
        provider.set_policy(&update).await.unwrap();
        provider.set_policy(&update).await.unwrap();
        let listed = provider
            .get_policies(&ApplicationContext::default())
            .await
            .unwrap();
        assert_eq!(listed, [rar("/hr", &["GET"], &["a", "b"])]);
    }
}
