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

//! Reconciliation of IDQL policies against a policy backend.

use super::ReconcileReport;
use idqlsync_pp::policy::IdqlMapper;
use idqlsync_pp::policy::Policies;
use idqlsync_pp::policy::PolicyError;
use idqlsync_pp::policy::PolicyErrorKind;
use idqlsync_pp::policy::PolicyInfo;
use idqlsync_pp::policy::UpdateCalculator;
use idqlsync_pp::policy::UpdateDecision;
use idqlsync_pp::pp::ApplicationContext;
use idqlsync_pp::pp::PolicyProvider;
use idqlsync_pp::pp::PolicyStore;

/**
Brings the members of policies stored in a backend in line with IDQL policies.

Only policies that already exist in the backend are written. Nothing is ever
created or removed.
*/
pub struct PolicyReconciler {
    policy_provider: PolicyProvider,
}

impl PolicyReconciler {
    /// Return a new instance.
    pub fn new(policy_provider: PolicyProvider) -> Self {
        Self { policy_provider }
    }

    /// Read an IDQL document from a file.
    pub async fn load_policies(filename: &str) -> Result<Policies, PolicyError> {
        let json = tokio::fs::read_to_string(filename).await.map_err(|e| {
            PolicyErrorKind::MalformedInput
                .error_with_msg(format!("Unable to read IDQL document '{filename}': {e}"))
        })?;
        Policies::from_json(&json)
    }

    /// Write every existing policy whose members differ from `policies`.
    ///
    /// Writes are sequential and the first failure aborts the pass.
    pub async fn reconcile(
        &self,
        app_context: &ApplicationContext,
        policies: &[PolicyInfo],
    ) -> Result<ReconcileReport, PolicyError> {
        let desired = IdqlMapper::to_rar_map(policies)?;
        let existing = self.policy_provider.get_policies(app_context).await?;
        let update_list = UpdateCalculator::calculate(&existing, &desired);
        if log::log_enabled!(log::Level::Debug) {
            for entry in update_list.trace() {
                match entry.decision {
                    UpdateDecision::Update => log::debug!("'{}': update", entry.key),
                    UpdateDecision::SkipUnchanged => log::debug!("'{}': unchanged", entry.key),
                    UpdateDecision::SkipNotDesired => log::debug!("'{}': not desired", entry.key),
                }
            }
        }
        let total = update_list.updates().len();
        for (written, rar) in update_list.updates().iter().enumerate() {
            self.policy_provider.set_policy(rar).await.map_err(|e| {
                log::warn!(
                    "Aborting '{}' after {written} of {total} updates: {e}",
                    app_context.name()
                );
                e.kind().error_with_msg(format!(
                    "Update of '{}' failed after {written} of {total} updates: {e}",
                    rar.mapping_key()
                ))
            })?;
        }
        let report = ReconcileReport::new(desired.len(), &update_list, total);
        log::info!(
            "Reconciled '{}' ({}) with '{}': {report}",
            app_context.name(),
            app_context.object_id(),
            self.policy_provider.name()
        );
        Ok(report)
    }

    /// Current backend policies expressed as IDQL.
    pub async fn export(&self, app_context: &ApplicationContext) -> Result<Policies, PolicyError> {
        let existing = self.policy_provider.get_policies(app_context).await?;
        Ok(Policies {
            policies: IdqlMapper::to_idql(&existing),
        })
    }
}
