// Copyright 2025 The Shelf Authors.
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

//! Environment variable interpolation for configuration files.
//!
//! POSIX-style references are substituted before the file is parsed:
//! `${VAR_NAME}` requires the variable to be set and non-empty,
//! `${VAR_NAME:-default}` falls back to `default` otherwise. There is no
//! recursive expansion: a substituted value is taken literally.

use std::env;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Variable names follow POSIX rules; group 3 captures the default text.
    static ref ENV_VAR_PATTERN: Regex =
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(:-([^}]*))?\}").expect("invalid regex pattern");
}

#[derive(Debug, thiserror::Error)]
pub enum InterpolationError {
    #[error("environment variable '{name}' is not set and has no default value")]
    MissingVariable { name: String },
}

/// Replace every `${...}` reference in `input` with its environment value.
pub fn interpolate(input: &str) -> Result<String, InterpolationError> {
    let mut output = String::with_capacity(input.len());
    let mut cursor = 0;

    for caps in ENV_VAR_PATTERN.captures_iter(input) {
        let whole = caps.get(0).expect("capture 0 always present");
        let name = &caps[1];
        let default = caps.get(3).map(|m| m.as_str());

        output.push_str(&input[cursor..whole.start()]);
        match env::var(name) {
            Ok(value) if !value.is_empty() => output.push_str(&value),
            _ => match default {
                Some(value) => output.push_str(value),
                None => {
                    return Err(InterpolationError::MissingVariable {
                        name: name.to_string(),
                    })
                }
            },
        }
        cursor = whole.end();
    }

    output.push_str(&input[cursor..]);
    Ok(output)
}
