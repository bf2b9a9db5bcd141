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

//! Canonical form of a policy: a resource, its actions and its members.

use super::HttpMethod;
use super::PolicyError;
use super::PolicyErrorKind;
use std::collections::BTreeSet;

/** Canonical and comparable policy fact: "`members` may perform `actions` on
`resource`".

Invariants enforced when constructed:

* `resource` is non-empty after trimming.
* `actions` holds at least one valid [HttpMethod] in canonical form, sorted and
  without duplicates.
* `members` is sorted, without duplicates and without blank entries.

Equality is structural.
*/
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceActionRoles {
    resource: String,
    actions: Vec<String>,
    members: Vec<String>,
}

impl ResourceActionRoles {
    /// Return a new instance or fail if any of the invariants are violated.
    pub fn new<A: AsRef<str>, M: AsRef<str>>(
        resource: &str,
        actions: &[A],
        members: &[M],
    ) -> Result<Self, PolicyError> {
        let resource = resource.trim();
        if resource.is_empty() {
            Err(PolicyErrorKind::MalformedInput.error_with_msg("Policy has an empty resource."))?;
        }
        if actions.is_empty() {
            Err(PolicyErrorKind::MalformedInput
                .error_with_msg(format!("Policy for '{resource}' has a nil actionUri.")))?;
        }
        let actions = actions
            .iter()
            .map(|action| HttpMethod::from_action(action.as_ref()))
            .collect::<Result<BTreeSet<_>, _>>()?
            .into_iter()
            .map(|method| method.as_str().to_owned())
            .collect::<Vec<_>>();
        let members = members
            .iter()
            .map(|member| member.as_ref().trim())
            .filter(|member| !member.is_empty())
            .map(str::to_owned)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        Ok(Self {
            resource: resource.to_owned(),
            actions,
            members,
        })
    }

    /// Return a new instance for a single action.
    pub fn with_method<M: AsRef<str>>(
        resource: &str,
        method: HttpMethod,
        members: &[M],
    ) -> Result<Self, PolicyError> {
        Self::new(resource, &[method.as_str()], members)
    }

    /// The protected resource. E.g. `/humanresources/us`.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Sorted canonical HTTP method names.
    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    /// Sorted principals (roles, groups or identities) granted the actions.
    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// The first action.
    ///
    /// Stores identify a row by the resource and a single action, so this is
    /// the only action used in keys.
    pub fn first_action(&self) -> &str {
        // Construction guarantees at least one action.
        &self.actions[0]
    }

    /// The first action as [HttpMethod].
    pub fn first_method(&self) -> HttpMethod {
        // Actions are stored in canonical form and always parse.
        HttpMethod::from_action(self.first_action()).unwrap_or(HttpMethod::Get)
    }

    /// The key used to match policies across documents and stores.
    pub fn mapping_key(&self) -> String {
        Self::mapping_key_for(self.first_action(), &self.resource)
    }

    /// The key used to match policies across documents and stores.
    ///
    /// `action` may carry the `http:` prefix.
    pub fn mapping_key_for(action: &str, resource: &str) -> String {
        HttpMethod::strip_action_prefix(action).to_ascii_uppercase() + resource.trim()
    }

    /// Return `true` if both instances grant exactly the same members.
    pub fn has_same_members(&self, other: &Self) -> bool {
        self.members == other.members
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_actions() {
        let rar = ResourceActionRoles::new("/a", &["POST", "get", "  get "], &["x"]).unwrap();
        assert_eq!(rar.actions(), ["GET", "POST"]);
        assert_eq!(rar.first_action(), "GET");
        assert_eq!(rar.first_method(), HttpMethod::Get);
        assert_eq!(rar.mapping_key(), "GET/a");
    }

    #[test]
    fn canonical_members() {
        let rar = ResourceActionRoles::new(
            " /hr/us ",
            &["http:GET"],
            &["roleB", " roleA", "", "   ", "roleB"],
        )
        .unwrap();
        assert_eq!(rar.resource(), "/hr/us");
        assert_eq!(rar.members(), ["roleA", "roleB"]);
        let same = ResourceActionRoles::new("/hr/us", &["GET"], &["roleA", "roleB"]).unwrap();
        assert_eq!(rar, same);
        assert!(rar.has_same_members(&same));
    }

    #[test]
    fn no_members_is_allowed() {
        let rar = ResourceActionRoles::new::<_, &str>("/a", &["GET"], &[]).unwrap();
        assert!(rar.members().is_empty());
    }

    #[test]
    fn rejects_malformed() {
        let e = ResourceActionRoles::new("  ", &["GET"], &["a"]).unwrap_err();
        assert!(e.to_string().contains("empty resource"));
        let e = ResourceActionRoles::new::<&str, _>("/a", &[], &["a"]).unwrap_err();
        assert!(e.to_string().contains("nil actionUri"));
        let e = ResourceActionRoles::new("/a", &["http:SOMETHING"], &["a"]).unwrap_err();
        assert!(e.to_string().contains("Invalid http method"));
    }

    #[test]
    fn mapping_key_strips_prefix() {
        assert_eq!(
            ResourceActionRoles::mapping_key_for("http:GET", "/hr"),
            ResourceActionRoles::mapping_key_for("GET", "/hr")
        );
    }
}
