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

//! Outcome of a reconciliation pass.

use idqlsync_pp::policy::UpdateDecision;
use idqlsync_pp::policy::UpdateList;
use std::fmt;

/// Outcome of a reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    desired: usize,
    existing: usize,
    updated: usize,
    unchanged: usize,
    not_desired: usize,
}

impl ReconcileReport {
    /// Return a new instance from the decisions taken and the number of
    /// policies written.
    pub fn new(desired: usize, update_list: &UpdateList, updated: usize) -> Self {
        let count = |decision: UpdateDecision| {
            update_list
                .trace()
                .iter()
                .filter(|entry| entry.decision == decision)
                .count()
        };
        Self {
            desired,
            existing: update_list.trace().len(),
            updated,
            unchanged: count(UpdateDecision::SkipUnchanged),
            not_desired: count(UpdateDecision::SkipNotDesired),
        }
    }

    /// Number of desired policies after mapping.
    pub fn desired(&self) -> usize {
        self.desired
    }

    /// Number of policies found in the backend.
    pub fn existing(&self) -> usize {
        self.existing
    }

    /// Number of policies written to the backend.
    pub fn updated(&self) -> usize {
        self.updated
    }

    /// Number of existing policies left as is.
    pub fn skipped(&self) -> usize {
        self.unchanged + self.not_desired
    }

    /// Number of existing policies that already had the desired members.
    pub fn unchanged(&self) -> usize {
        self.unchanged
    }

    /// Number of existing policies without a desired counterpart.
    pub fn not_desired(&self) -> usize {
        self.not_desired
    }
}

impl fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "desired: {}, existing: {}, updated: {}, unchanged: {}, not desired: {}",
            self.desired, self.existing, self.updated, self.unchanged, self.not_desired
        )
    }
}
