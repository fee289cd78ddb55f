//! Parsers for single-value `/sys` attributes and SELinux/tracefs state.

use serde::Serialize;

/// Parses a thermal zone `temp` value into degrees Celsius.
///
/// Kernels disagree on scale: most report millidegrees, some report whole
/// degrees. A magnitude above 1000 is read as millidegrees, anything else
/// as degrees. Like `strtol`, the leading integer is used and trailing text
/// is ignored.
pub fn parse_temperature(content: &str) -> Option<f64> {
    let raw = leading_integer(content.trim_start())?;
    if raw.unsigned_abs() > 1000 {
        Some(raw as f64 / 1000.0)
    } else {
        Some(raw as f64)
    }
}

fn leading_integer(s: &str) -> Option<i64> {
    let sign_len = usize::from(s.starts_with(['-', '+']));
    let digits = s[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return None;
    }
    s[..sign_len + digits].parse().ok()
}

/// First line of a single-value attribute, trimmed. `None` when blank.
pub fn parse_first_line(content: &str) -> Option<String> {
    let line = content.lines().next()?.trim();
    (!line.is_empty()).then(|| line.to_string())
}

/// Thermal zone `type`: free text, first line only.
pub fn parse_zone_type(content: &str) -> Option<String> {
    parse_first_line(content)
}

/// SELinux enforcement state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SelinuxMode {
    Enforcing,
    Permissive,
    Disabled,
}

impl SelinuxMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enforcing => "Enforcing",
            Self::Permissive => "Permissive",
            Self::Disabled => "Disabled",
        }
    }
}

/// Parses either the selinuxfs `enforce` file (`0`/`1`) or `getenforce`
/// output (`Enforcing`/`Permissive`/`Disabled`).
pub fn parse_selinux_mode(content: &str) -> Option<SelinuxMode> {
    match content.trim() {
        "1" | "Enforcing" => Some(SelinuxMode::Enforcing),
        "0" | "Permissive" => Some(SelinuxMode::Permissive),
        "Disabled" => Some(SelinuxMode::Disabled),
        _ => None,
    }
}

/// Picks the active clock from `trace_clock`, where it is bracketed:
/// `local global [boot] mono`.
pub fn parse_trace_clock(content: &str) -> Option<String> {
    content
        .split_whitespace()
        .find_map(|tok| tok.strip_prefix('[')?.strip_suffix(']'))
        .filter(|clock| !clock.is_empty())
        .map(str::to_string)
}
