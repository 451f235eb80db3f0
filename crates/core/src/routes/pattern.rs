//! Path pattern matching
//!
//! Patterns are absolute paths whose segments are either literal text or a
//! `:name` parameter:
//! - `/todo` - exact match
//! - `/schedules/details/:scheduleId` - single parameter
//! - `/schedules/:projectId/create` - parameter between literals
//!
//! Literal segments match case-insensitively and one trailing slash is
//! tolerated. Parameter values are percent-decoded.

use crate::error::PatternError;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use regex::{Regex, RegexBuilder};
use std::collections::BTreeMap;
use std::fmt;

/// Characters escaped when a parameter value is written back into a path
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A compiled route path pattern
#[derive(Debug, Clone)]
pub struct PathPattern {
    pattern: String,
    segments: Vec<Segment>,
    regex: Regex,
    param_names: Vec<String>,
}

impl PathPattern {
    /// Compile a pattern string
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        if !pattern.starts_with('/') {
            return Err(PatternError::NotAbsolute {
                pattern: pattern.to_string(),
            });
        }

        let segments = Self::parse_segments(pattern)?;
        let param_names: Vec<String> = segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Param(name) => Some(name.clone()),
                Segment::Literal(_) => None,
            })
            .collect();

        let mut regex_str = String::from("^");
        for segment in &segments {
            regex_str.push('/');
            match segment {
                Segment::Literal(text) => regex_str.push_str(&regex::escape(text)),
                Segment::Param(_) => regex_str.push_str("([^/]+)"),
            }
        }
        regex_str.push_str("/?$");

        let regex = RegexBuilder::new(&regex_str)
            .case_insensitive(true)
            .build()
            .map_err(|e| PatternError::Regex {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            pattern: pattern.to_string(),
            segments,
            regex,
            param_names,
        })
    }

    fn parse_segments(pattern: &str) -> Result<Vec<Segment>, PatternError> {
        let mut segments = Vec::new();
        let mut seen: Vec<&str> = Vec::new();

        // "/" has no segments at all; "/a/" has the same segments as "/a"
        for raw in pattern.trim_end_matches('/').split('/').skip(1) {
            let Some(name) = raw.strip_prefix(':') else {
                segments.push(Segment::Literal(raw.to_string()));
                continue;
            };

            let valid = !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !valid {
                return Err(PatternError::InvalidParameter {
                    pattern: pattern.to_string(),
                    name: name.to_string(),
                });
            }
            if seen.contains(&name) {
                return Err(PatternError::DuplicateParameter {
                    pattern: pattern.to_string(),
                    name: name.to_string(),
                });
            }
            seen.push(name);
            segments.push(Segment::Param(name.to_string()));
        }

        Ok(segments)
    }

    /// Returns the uncompiled pattern string
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Parameter names in declaration order
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// True when the pattern has no parameters
    pub fn is_static(&self) -> bool {
        self.param_names.is_empty()
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Match a path, returning the decoded parameters on success
    pub fn matches(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let caps = self.regex.captures(path)?;
        let params = self
            .param_names
            .iter()
            .enumerate()
            .filter_map(|(index, name)| {
                caps.get(index + 1).map(|m| {
                    let value = percent_decode_str(m.as_str()).decode_utf8_lossy();
                    (name.clone(), value.into_owned())
                })
            })
            .collect();
        Some(params)
    }

    /// Build a concrete path from parameter values
    pub fn reverse(&self, params: &BTreeMap<String, String>) -> Result<String, PatternError> {
        if self.segments.is_empty() {
            return Ok("/".to_string());
        }

        let mut path = String::new();
        for segment in &self.segments {
            path.push('/');
            match segment {
                Segment::Literal(text) => path.push_str(text),
                Segment::Param(name) => {
                    let value = params.get(name).ok_or_else(|| PatternError::MissingParameter {
                        pattern: self.pattern.clone(),
                        name: name.clone(),
                    })?;
                    path.extend(utf8_percent_encode(value, SEGMENT));
                }
            }
        }
        Ok(path)
    }
}

impl PartialEq for PathPattern {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Eq for PathPattern {}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_exact_pattern() {
        let pattern = PathPattern::new("/todo").unwrap();
        assert!(pattern.is_static());
        assert!(pattern.is_match("/todo"));
        assert!(!pattern.is_match("/todo/1"));
        assert!(!pattern.is_match("/todos"));
    }

    #[test]
    fn test_trailing_slash_and_case_are_tolerated() {
        let pattern = PathPattern::new("/project-member").unwrap();
        assert!(pattern.is_match("/project-member/"));
        assert!(pattern.is_match("/Project-Member"));
        assert!(!pattern.is_match("/project-member//"));
    }

    #[test]
    fn test_root_pattern() {
        let pattern = PathPattern::new("/").unwrap();
        assert!(pattern.is_match("/"));
        assert!(!pattern.is_match("/todo"));
        assert_eq!(pattern.reverse(&BTreeMap::new()).unwrap(), "/");
    }

    #[test]
    fn test_single_param() {
        let pattern = PathPattern::new("/schedules/details/:scheduleId").unwrap();
        let matched = pattern.matches("/schedules/details/42").unwrap();
        assert_eq!(matched.get("scheduleId").map(String::as_str), Some("42"));
        assert!(pattern.matches("/schedules/details/").is_none());
        assert!(pattern.matches("/schedules/details/4/2").is_none());
    }

    #[test]
    fn test_param_between_literals() {
        let pattern = PathPattern::new("/schedules/:projectId/create").unwrap();
        assert_eq!(pattern.param_names(), &["projectId".to_string()]);
        let matched = pattern.matches("/schedules/7/create").unwrap();
        assert_eq!(matched, params(&[("projectId", "7")]));
        assert!(!pattern.is_match("/schedules/calendar"));
    }

    #[test]
    fn test_param_values_are_percent_decoded() {
        let pattern = PathPattern::new("/schedules/details/:scheduleId").unwrap();
        let matched = pattern.matches("/schedules/details/a%20b").unwrap();
        assert_eq!(matched["scheduleId"], "a b");
    }

    #[test]
    fn test_literal_regex_chars_are_escaped() {
        let pattern = PathPattern::new("/api/v1.0").unwrap();
        assert!(pattern.is_match("/api/v1.0"));
        assert!(!pattern.is_match("/api/v1x0"));
    }

    #[test]
    fn test_reverse_encodes_values() {
        let pattern = PathPattern::new("/schedules/:projectId/create").unwrap();
        let path = pattern.reverse(&params(&[("projectId", "a/b")])).unwrap();
        assert_eq!(path, "/schedules/a%2Fb/create");
        assert_eq!(pattern.matches(&path).unwrap()["projectId"], "a/b");
    }

    #[test]
    fn test_reverse_missing_param() {
        let pattern = PathPattern::new("/schedules/details/:scheduleId").unwrap();
        assert!(matches!(
            pattern.reverse(&BTreeMap::new()),
            Err(PatternError::MissingParameter { name, .. }) if name == "scheduleId"
        ));
    }

    #[test]
    fn test_invalid_patterns_are_rejected() {
        assert!(matches!(
            PathPattern::new("todo"),
            Err(PatternError::NotAbsolute { .. })
        ));
        assert!(matches!(
            PathPattern::new("/a/:"),
            Err(PatternError::InvalidParameter { .. })
        ));
        assert!(matches!(
            PathPattern::new("/a/:id/b/:id"),
            Err(PatternError::DuplicateParameter { .. })
        ));
    }

    #[test]
    fn test_pattern_display_and_equality() {
        let p1 = PathPattern::new("/schedules/:projectId/create").unwrap();
        let p2 = PathPattern::new("/schedules/:projectId/create").unwrap();
        assert_eq!(p1, p2);
        assert_eq!(p1.to_string(), "/schedules/:projectId/create");
    }
}
