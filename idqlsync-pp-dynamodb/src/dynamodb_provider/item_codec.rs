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

//! Conversion of DynamoDB items into JSON values.

use aws_sdk_dynamodb::types::AttributeValue;
use idqlsync_pp::policy::PolicyError;
use idqlsync_pp::policy::PolicyErrorKind;
use serde_json::Map;
use serde_json::Number;
use serde_json::Value;
use std::collections::HashMap;

/// Converts DynamoDB items into [serde_json::Value] for typed deserialization.
pub struct ItemCodec {}

impl ItemCodec {
    /// Convert a whole item into a JSON object.
    pub fn item_to_json(item: &HashMap<String, AttributeValue>) -> Result<Value, PolicyError> {
        item.iter()
            .map(|(name, value)| Ok((name.to_owned(), Self::attribute_to_json(name, value)?)))
            .collect::<Result<Map<_, _>, PolicyError>>()
            .map(Value::Object)
    }

    /// Convert a single attribute value.
    pub fn attribute_to_json(name: &str, value: &AttributeValue) -> Result<Value, PolicyError> {
        Ok(match value {
            AttributeValue::S(s) => Value::String(s.to_owned()),
            AttributeValue::N(n) => Value::Number(Self::parse_number(name, n)?),
            AttributeValue::Bool(b) => Value::Bool(*b),
            AttributeValue::Null(_) => Value::Null,
            AttributeValue::Ss(ss) => Value::Array(ss.iter().cloned().map(Value::String).collect()),
            AttributeValue::Ns(ns) => Value::Array(
                ns.iter()
                    .map(|n| Self::parse_number(name, n).map(Value::Number))
                    .collect::<Result<_, _>>()?,
            ),
            AttributeValue::L(list) => Value::Array(
                list.iter()
                    .map(|value| Self::attribute_to_json(name, value))
                    .collect::<Result<_, _>>()?,
            ),
            AttributeValue::M(map) => Self::item_to_json(map)?,
            other => Err(PolicyErrorKind::DecodeFailure.error_with_msg(format!(
                "Attribute '{name}' has unsupported type: {other:?}"
            )))?,
        })
    }

    fn parse_number(name: &str, n: &str) -> Result<Number, PolicyError> {
        if let Ok(i) = n.parse::<i64>() {
            return Ok(Number::from(i));
        }
        n.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .ok_or_else(|| {
                PolicyErrorKind::DecodeFailure
                    .error_with_msg(format!("Attribute '{name}' has malformed number '{n}'."))
            })
    }

    /// Follow a path of nested attributes.
    pub fn lookup<'a>(value: &'a Value, path: &[String]) -> Option<&'a Value> {
        path.iter()
            .try_fold(value, |current, segment| current.get(segment.as_str()))
    }
}
