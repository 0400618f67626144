//! Sentinel marker grammar.

use std::sync::OnceLock;

use regex::Regex;

/// A recognized sentinel line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// `@!@!@STARTMSG <code>[:<sub_code>] @!@!@`
    Start { code: u32, sub_code: Option<u32> },
    /// `@!@!@ENDMSG <code> @!@!@`
    End { code: u32 },
}

fn start_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^@!@!@STARTMSG (\d+)(?::(\d+))? @!@!@$").expect("valid start marker regex")
    })
}

fn end_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^@!@!@ENDMSG\s*(\d+)\s*@!@!@$").expect("valid end marker regex"))
}

fn any_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"@!@!@(?:STARTMSG \d+(?::\d+)? |ENDMSG\s*\d+\s*)@!@!@").expect("valid marker regex")
    })
}

/// Recognize a whole line as a sentinel marker.
///
/// Trailing whitespace (including `\r`) is ignored. Codes that overflow
/// `u32` are not markers.
#[must_use]
pub fn parse_marker(line: &str) -> Option<Marker> {
    let line = line.trim_end();
    if let Some(caps) = start_re().captures(line) {
        let code = caps[1].parse().ok()?;
        let sub_code = match caps.get(2) {
            Some(m) => Some(m.as_str().parse().ok()?),
            None => None,
        };
        return Some(Marker::Start { code, sub_code });
    }
    let caps = end_re().captures(line)?;
    Some(Marker::End {
        code: caps[1].parse().ok()?,
    })
}

/// Remove every marker from a line for display.
///
/// Returns `None` when the line consisted only of markers; an originally
/// empty line is kept.
#[must_use]
pub fn strip_markers(line: &str) -> Option<String> {
    if line.is_empty() {
        return Some(String::new());
    }
    let clean = any_marker_re().replace_all(line, "");
    if clean.is_empty() {
        None
    } else {
        Some(clean.into_owned())
    }
}
