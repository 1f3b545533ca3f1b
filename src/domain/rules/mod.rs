// Domain rules - Parsing of probe output and clip policies

use std::fmt;
use std::str::FromStr;

use crate::domain::errors::*;
use crate::domain::model::*;

/// Parsers for the line-oriented output of the probing tool
pub struct ProbeOutputParser;

impl ProbeOutputParser {
    /// Parse a stream duration in seconds
    ///
    /// Anything that is not a finite number (`N/A`, empty output, garbage)
    /// yields `None` rather than a zero duration.
    pub fn duration(output: &str) -> Option<f64> {
        let value = first_value(output)?;
        value.parse::<f64>().ok().filter(|d| d.is_finite())
    }

    /// Parse an average frame rate
    ///
    /// Accepts decimals (`29.97`) and rationals (`30000/1001`). `N/A` and a
    /// zero denominator are reported by ffprobe for streams without timing
    /// and map to `0.0`.
    pub fn frame_rate(output: &str) -> Option<f64> {
        let value = first_value(output)?;
        if value.eq_ignore_ascii_case("N/A") {
            return Some(0.0);
        }
        if let Ok(rate) = value.parse::<f64>() {
            return Some(rate).filter(|r| r.is_finite());
        }

        let (num, den) = value.split_once('/')?;
        let num = num.trim().parse::<f64>().ok()?;
        let den = den.trim().parse::<f64>().ok()?;
        if den == 0.0 {
            Some(0.0)
        } else {
            Some(num / den)
        }
    }

    /// Parse `width=`/`height=` tokens, in any order, into `(width, height)`
    pub fn resolution(output: &str) -> Option<(u32, u32)> {
        let mut width = None;
        let mut height = None;
        for token in output.split(|c: char| c.is_whitespace() || c == ',') {
            if let Some(value) = token.strip_prefix("width=") {
                width = value.parse::<u32>().ok();
            } else if let Some(value) = token.strip_prefix("height=") {
                height = value.parse::<u32>().ok();
            }
        }
        Some((width?, height?))
    }

    /// Parse the number of decoded frames
    pub fn frame_count(output: &str) -> Option<u64> {
        first_value(output)?.parse::<u64>().ok()
    }
}

/// First non-empty trimmed line of tool output
fn first_value(output: &str) -> Option<&str> {
    output.lines().map(str::trim).find(|line| !line.is_empty())
}

/// Last non-empty line of tool output, used as the failure message
pub fn last_message_line(output: &str) -> String {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .unwrap_or("no output from tool")
        .to_string()
}

/// How manifest time bounds turn into a [`ClipOperation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClipPolicy {
    /// Trim to `[start, end)` when an end is given, keep the clip otherwise
    #[default]
    Window,
    /// Re-encode every clip at the normalized resolution
    Normalize,
    /// Never trim
    Keep,
    /// End-time sentinels: `0` keeps, negative normalizes, positive trims
    Legacy,
}

impl ClipPolicy {
    /// Parse policy from string
    pub fn parse(policy: &str) -> Result<Self, DomainError> {
        match policy.trim().to_lowercase().as_str() {
            "window" => Ok(ClipPolicy::Window),
            "normalize" => Ok(ClipPolicy::Normalize),
            "keep" => Ok(ClipPolicy::Keep),
            "legacy" => Ok(ClipPolicy::Legacy),
            other => Err(DomainError::Config(format!(
                "Invalid clip policy: {}. Valid policies: window, normalize, keep, legacy",
                other
            ))),
        }
    }

    /// Decide the clip operation for one row's bounds
    pub fn operation_for(
        &self,
        start: Option<f64>,
        end: Option<f64>,
    ) -> Result<ClipOperation, DomainError> {
        match self {
            ClipPolicy::Normalize => Ok(ClipOperation::Normalize),
            ClipPolicy::Keep => Ok(ClipOperation::NoTrim),
            ClipPolicy::Window => match end {
                None => match start {
                    None => Ok(ClipOperation::NoTrim),
                    Some(s) => Err(DomainError::InvalidRow(format!(
                        "start time {} given without an end time",
                        s
                    ))),
                },
                Some(e) => window(start.unwrap_or(0.0), e),
            },
            ClipPolicy::Legacy => match end {
                None => Ok(ClipOperation::NoTrim),
                Some(e) if e == 0.0 => Ok(ClipOperation::NoTrim),
                Some(e) if e < 0.0 => Ok(ClipOperation::Normalize),
                Some(e) => window(start.unwrap_or(0.0), e),
            },
        }
    }
}

fn window(start: f64, end: f64) -> Result<ClipOperation, DomainError> {
    if start < 0.0 || end <= start {
        return Err(DomainError::InvalidRow(format!(
            "invalid time window [{}, {})",
            start, end
        )));
    }
    Ok(ClipOperation::TrimWindow { start, end })
}

impl FromStr for ClipPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ClipPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClipPolicy::Window => "window",
            ClipPolicy::Normalize => "normalize",
            ClipPolicy::Keep => "keep",
            ClipPolicy::Legacy => "legacy",
        };
        f.write_str(name)
    }
}

/// Rules for remote video identifiers
pub struct VideoIdRules;

impl VideoIdRules {
    /// Length of a YouTube video identifier
    pub const ID_LEN: usize = 11;

    /// Check identifier shape before any network traffic is spent on it
    pub fn validate(identifier: &str) -> Result<(), DomainError> {
        let valid_chars = identifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if identifier.chars().count() != Self::ID_LEN || !valid_chars {
            return Err(DomainError::InvalidRow(format!(
                "video identifier must be {} characters of [A-Za-z0-9_-]: {:?}",
                Self::ID_LEN,
                identifier
            )));
        }
        Ok(())
    }

    /// Render a clip file name from a `{}` template
    pub fn render_name(template: &str, identifier: &str) -> String {
        template.replace("{}", identifier)
    }
}
