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

//! Encoding of a policy's resource and action as a Named Value name.

use idqlsync_pp::policy::HttpMethod;
use idqlsync_pp::policy::ResourceActionRoles;
use std::fmt;
use std::str::FromStr;

/// Why a Named Value name is not a policy key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamedValueKeyError {
    /// Fewer than three `-` separated parts.
    TooFewParts,
    /// The first part is not `resrol`.
    UnknownPrefix(String),
    /// The second part is not `http{method}`.
    UnknownMethod(String),
}

impl fmt::Display for NamedValueKeyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::TooFewParts => write!(f, "fewer than 3 '-' separated parts"),
            Self::UnknownPrefix(prefix) => write!(f, "unknown prefix '{prefix}'"),
            Self::UnknownMethod(token) => write!(f, "unrecognized method token '{token}'"),
        }
    }
}

/** Resource and method of a policy as encoded in a Named Value name.

Grammar: `resrol-http{lower case method}-{resource with '/' replaced by '-'}`.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedValueKey {
    resource: String,
    method: HttpMethod,
}

impl NamedValueKey {
    const PREFIX: &'static str = "resrol";
    const METHOD_PREFIX: &'static str = "http";
    const SEPARATOR: char = '-';
    /// Characters Azure does not allow in Named Value names.
    const FORBIDDEN_CHARS: [char; 7] = ['*', '#', '&', '+', ':', '<', '>'];
    const MAX_LEN: usize = 256;

    /// Return a new instance.
    pub fn new(resource: &str, method: HttpMethod) -> Self {
        Self {
            resource: resource.to_owned(),
            method,
        }
    }

    /// Key of the resource and first action of `rar`.
    ///
    /// Returns `None` if the key can't be expressed as a valid Named Value
    /// name that decodes back into the same resource and method.
    pub fn from_rar(rar: &ResourceActionRoles) -> Option<Self> {
        let key = Self::new(rar.resource(), rar.first_method());
        let name = key.to_string();
        let valid = name.len() <= Self::MAX_LEN
            && !name.contains(Self::FORBIDDEN_CHARS)
            && !name.contains('?')
            && Self::from_str(&name).is_ok_and(|decoded| decoded == key);
        valid.then_some(key)
    }

    /// The resource.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// The HTTP method.
    pub fn method(&self) -> HttpMethod {
        self.method
    }
}

impl fmt::Display for NamedValueKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}{sep}{}{}{sep}{}",
            Self::PREFIX,
            Self::METHOD_PREFIX,
            self.method.as_str().to_lowercase(),
            self.resource.replace('/', "-"),
            sep = Self::SEPARATOR,
        )
    }
}

impl FromStr for NamedValueKey {
    type Err = NamedValueKeyError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let mut parts = name.splitn(3, Self::SEPARATOR);
        let (Some(prefix), Some(method_token), Some(resource)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(NamedValueKeyError::TooFewParts);
        };
        if prefix != Self::PREFIX {
            return Err(NamedValueKeyError::UnknownPrefix(prefix.to_owned()));
        }
        let method = method_token
            .strip_prefix(Self::METHOD_PREFIX)
            .and_then(|method| HttpMethod::from_str(method).ok())
            .ok_or_else(|| NamedValueKeyError::UnknownMethod(method_token.to_owned()))?;
        Ok(Self {
            resource: resource.replace(Self::SEPARATOR, "/"),
            method,
        })
    }
}
