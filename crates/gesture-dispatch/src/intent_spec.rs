//! Parser for `intent:` launch target URIs.
//!
//! Users can bind a gesture to a shortcut instead of a package. Shortcuts are
//! stored in the intent URI form:
//!
//! ```text
//! intent:<data>#Intent;action=...;category=...;component=pkg/.Cls;S.key=value;end
//! ```
//!
//! Values are percent-encoded. Unknown keys are ignored.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::IntentSpecError;

const SCHEME_PREFIX: &str = "intent:";
const FRAGMENT_MARKER: &str = "#Intent;";
const TERMINATOR: &str = "end";

/// Typed intent extra.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtraValue {
    Str(String),
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Short(i16),
    Byte(i8),
    Char(char),
}

/// A parsed launch intent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntentSpec {
    pub action: Option<String>,
    pub categories: Vec<String>,
    pub data: Option<String>,
    pub mime_type: Option<String>,
    pub package: Option<String>,
    /// Fully qualified `package/class`.
    pub component: Option<String>,
    pub launch_flags: u32,
    pub extras: BTreeMap<String, ExtraValue>,
}

impl IntentSpec {
    /// Whether `target` uses the intent URI form.
    pub fn is_intent_uri(target: &str) -> bool {
        target.starts_with(SCHEME_PREFIX)
    }

    /// Parse an `intent:` URI.
    pub fn parse(uri: &str) -> Result<Self, IntentSpecError> {
        let rest = uri
            .strip_prefix(SCHEME_PREFIX)
            .ok_or(IntentSpecError::MissingScheme)?;
        let marker = rest
            .find(FRAGMENT_MARKER)
            .ok_or(IntentSpecError::MissingFragment)?;
        let data_part = &rest[..marker];
        let fragment = &rest[marker + FRAGMENT_MARKER.len()..];

        let mut spec = IntentSpec::default();
        let mut scheme: Option<String> = None;
        let mut terminated = false;

        for token in fragment.split(';') {
            if token == TERMINATOR {
                terminated = true;
                break;
            }
            if token.is_empty() {
                continue;
            }

            let (key, raw) = token
                .split_once('=')
                .ok_or_else(|| IntentSpecError::MalformedToken(token.to_string()))?;
            let value = percent_decode(raw);

            match key {
                "action" => spec.action = Some(value),
                "category" => spec.categories.push(value),
                "type" => spec.mime_type = Some(value),
                "package" => spec.package = Some(value),
                "component" => spec.component = Some(expand_component(&value)),
                "scheme" => scheme = Some(value),
                "launchFlags" => spec.launch_flags = parse_flags(&value)?,
                _ => match parse_extra(key, value)? {
                    Some((name, extra)) => {
                        spec.extras.insert(name, extra);
                    }
                    None => tracing::trace!(key, "Ignoring unknown intent URI key"),
                },
            }
        }

        if !terminated {
            return Err(IntentSpecError::Unterminated);
        }

        if !data_part.is_empty() {
            spec.data = Some(match scheme {
                Some(s) if data_part.starts_with("//") => format!("{}:{}", s, data_part),
                _ => data_part.to_string(),
            });
        }

        Ok(spec)
    }
}

impl fmt::Display for IntentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(component) = &self.component {
            write!(f, "{}", component)
        } else if let Some(package) = &self.package {
            write!(f, "{}", package)
        } else if let Some(action) = &self.action {
            write!(f, "{}", action)
        } else {
            write!(f, "<implicit>")
        }
    }
}

/// `pkg/.Cls` is shorthand for `pkg/pkg.Cls`.
fn expand_component(value: &str) -> String {
    match value.split_once('/') {
        Some((pkg, cls)) if cls.starts_with('.') => format!("{}/{}{}", pkg, pkg, cls),
        _ => value.to_string(),
    }
}

fn parse_flags(value: &str) -> Result<u32, IntentSpecError> {
    let parsed = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => value.parse::<u32>(),
    };
    parsed.map_err(|_| IntentSpecError::InvalidFlags(value.to_string()))
}

fn parse_extra(key: &str, value: String) -> Result<Option<(String, ExtraValue)>, IntentSpecError> {
    let Some((prefix, name)) = key.split_once('.') else {
        return Ok(None);
    };
    let invalid = |value: &str| IntentSpecError::InvalidExtra {
        key: key.to_string(),
        value: value.to_string(),
    };

    let extra = match prefix {
        "S" => ExtraValue::Str(value),
        "B" => ExtraValue::Bool(value.eq_ignore_ascii_case("true")),
        "i" => ExtraValue::Int(value.parse().map_err(|_| invalid(&value))?),
        "l" => ExtraValue::Long(value.parse().map_err(|_| invalid(&value))?),
        "f" => ExtraValue::Float(value.parse().map_err(|_| invalid(&value))?),
        "d" => ExtraValue::Double(value.parse().map_err(|_| invalid(&value))?),
        "s" => ExtraValue::Short(value.parse().map_err(|_| invalid(&value))?),
        "b" => ExtraValue::Byte(value.parse().map_err(|_| invalid(&value))?),
        "c" => {
            let mut chars = value.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => ExtraValue::Char(c),
                _ => return Err(invalid(&value)),
            }
        }
        _ => return Ok(None),
    };

    Ok(Some((name.to_string(), extra)))
}

/// Decode `%XX` escapes. Malformed escapes are kept verbatim.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hi = (bytes[i + 1] as char).to_digit(16);
            let lo = (bytes[i + 2] as char).to_digit(16);
            if let (Some(hi), Some(lo)) = (hi, lo) {
                out.push((hi * 16 + lo) as u8);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
