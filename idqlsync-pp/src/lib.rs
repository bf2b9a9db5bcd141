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

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

pub mod pp;
pub mod policy {
    //! Canonical policy objects.

    mod http_method;
    mod idql;
    mod idql_mapper;
    mod policy_error;
    mod resource_action_roles;
    mod update_calculator;

    pub use self::http_method::HttpMethod;
    pub use self::idql::*;
    pub use self::idql_mapper::*;
    pub use self::policy_error::PolicyError;
    pub use self::policy_error::PolicyErrorKind;
    pub use self::resource_action_roles::ResourceActionRoles;
    pub use self::update_calculator::*;
}
pub mod util {
    //! Utilities

    mod long_running_operation;

    pub use self::long_running_operation::*;
}
