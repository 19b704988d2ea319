// Copyright 2024 SAP SE
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::ffi::OsString;

use serde::de::{DeserializeOwned, Error as _, Unexpected};
use serde_json::Value;

const LONG_FLAGS: [&str; 2] = ["conf", "http"];

/// Expands the `:port` shorthand to all IPv4 interfaces. Anything else is
/// passed through for the socket layer to resolve.
pub fn listen_addr(addr: &str) -> String {
    if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr.to_string()
    }
}

/// Rewrites `-conf`, `-http` and their `-flag=value` forms to the double-dash
/// spelling, so single-dash invocations keep working.
pub fn long_flags<I: IntoIterator<Item = OsString>>(args: I) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some(flag) if is_single_dash_long(flag) => OsString::from(format!("-{flag}")),
            _ => arg,
        })
        .collect()
}

fn is_single_dash_long(arg: &str) -> bool {
    let Some(flag) = arg.strip_prefix('-') else {
        return false;
    };
    let name = flag.split_once('=').map_or(flag, |(name, _)| name);
    LONG_FLAGS.contains(&name)
}

/// Decodes `value` into `T` only if it is an object. Derived struct impls
/// would also take an array of field values.
pub fn from_object<T: DeserializeOwned>(value: Value) -> Result<Option<T>, serde_json::Error> {
    match value {
        Value::Null => Ok(None),
        Value::Object(map) => serde_json::from_value(Value::Object(map)).map(Some),
        other => Err(serde_json::Error::invalid_type(unexpected(&other), &"a JSON object")),
    }
}

fn unexpected(value: &Value) -> Unexpected<'_> {
    match value {
        Value::Null => Unexpected::Unit,
        Value::Bool(b) => Unexpected::Bool(*b),
        Value::Number(_) => Unexpected::Other("number"),
        Value::String(s) => Unexpected::Str(s),
        Value::Array(_) => Unexpected::Seq,
        Value::Object(_) => Unexpected::Map,
    }
}
