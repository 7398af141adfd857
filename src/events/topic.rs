//! # Topic validation and pattern matching.
//!
//! Topics are slash-delimited paths such as `orders/items/added`. Segments are
//! opaque and compared case-sensitively.
//!
//! A [`TopicPattern`] is either an exact segment sequence or a prefix followed by a
//! trailing `**`, which matches the prefix itself and any deeper path:
//!
//! ```text
//! pattern "orders/**"      topic "orders"              → match (zero extra segments)
//!                          topic "orders/created"      → match
//!                          topic "orders/items/added"  → match
//!                          topic "ordersx/created"     → no match (segment-exact)
//! pattern "orders/created" topic "orders/created"      → match
//!                          topic "orders/created/x"    → no match
//! ```
//!
//! ## Example
//! ```rust
//! use mpf_rules::TopicPattern;
//!
//! let p = TopicPattern::parse("orders/**").unwrap();
//! assert!(p.matches("orders"));
//! assert!(p.matches("orders/items/added"));
//! assert!(!p.matches("customers/created"));
//! ```

use std::fmt;

use crate::error::BusError;

/// Segment separator.
pub const SEPARATOR: char = '/';

/// Multi-level wildcard segment.
pub const WILDCARD: &str = "**";

/// Parsed subscription pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopicPattern {
    raw: String,
    segments: Vec<String>,
    wildcard: bool,
}

impl TopicPattern {
    /// Parses and validates a subscription pattern.
    ///
    /// Fails with [`BusError::InvalidPattern`] when the pattern is empty, has an
    /// empty segment, or uses `**` anywhere but as the whole last segment.
    pub fn parse(pattern: &str) -> Result<Self, BusError> {
        let invalid = |reason| BusError::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };

        if pattern.is_empty() {
            return Err(invalid("pattern is empty"));
        }

        let parts: Vec<&str> = pattern.split(SEPARATOR).collect();
        let last = parts.len() - 1;
        let mut segments = Vec::with_capacity(parts.len());
        let mut wildcard = false;

        for (i, part) in parts.iter().enumerate() {
            if part.is_empty() {
                return Err(invalid("empty segment"));
            }
            if *part == WILDCARD {
                if i != last {
                    return Err(invalid("wildcard must be the last segment"));
                }
                wildcard = true;
                continue;
            }
            if part.contains(WILDCARD) {
                return Err(invalid("wildcard must be a whole segment"));
            }
            segments.push((*part).to_string());
        }

        Ok(Self {
            raw: pattern.to_string(),
            segments,
            wildcard,
        })
    }

    /// Returns the pattern as it was subscribed.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True if the pattern ends with `**`.
    #[inline]
    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    /// Decides whether a concrete topic matches this pattern.
    pub fn matches(&self, topic: &str) -> bool {
        let mut topic_segments = topic.split(SEPARATOR);

        for expected in &self.segments {
            match topic_segments.next() {
                Some(seg) if seg == expected => {}
                _ => return false,
            }
        }

        self.wildcard || topic_segments.next().is_none()
    }
}

impl fmt::Display for TopicPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Validates a concrete (publishable) topic.
///
/// Concrete topics are non-empty, have no empty segments and never contain `**`.
pub fn validate_topic(topic: &str) -> Result<(), BusError> {
    let invalid = |reason| BusError::InvalidTopic {
        topic: topic.to_string(),
        reason,
    };

    if topic.is_empty() {
        return Err(invalid("topic is empty"));
    }
    for seg in topic.split(SEPARATOR) {
        if seg.is_empty() {
            return Err(invalid("empty segment"));
        }
        if seg.contains(WILDCARD) {
            return Err(invalid("wildcards are not allowed in published topics"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, topic: &str) -> bool {
        TopicPattern::parse(pattern).unwrap().matches(topic)
    }

    #[test]
    fn test_exact_pattern_matches_only_identical_topic() {
        assert!(matches("orders/created", "orders/created"));
        assert!(!matches("orders/created", "orders/created/x"));
        assert!(!matches("orders/created", "orders"));
        assert!(!matches("orders/created", "orders/Created"));
        assert!(!matches("orders/created", "orders/updated"));
    }

    #[test]
    fn test_wildcard_matches_prefix_and_deeper_paths() {
        assert!(matches("orders/**", "orders"));
        assert!(matches("orders/**", "orders/created"));
        assert!(matches("orders/**", "orders/items/added"));
        assert!(!matches("orders/**", "ordersx"));
        assert!(!matches("orders/**", "ordersx/created"));
        assert!(!matches("orders/**", "customers/orders"));
    }

    #[test]
    fn test_bare_wildcard_matches_everything() {
        assert!(matches("**", "orders"));
        assert!(matches("**", "a/b/c/d"));
    }

    #[test]
    fn test_nested_wildcard_prefix() {
        assert!(matches("orders/items/**", "orders/items"));
        assert!(matches("orders/items/**", "orders/items/added"));
        assert!(!matches("orders/items/**", "orders/created"));
    }

    #[test]
    fn test_single_star_is_an_opaque_segment() {
        assert!(matches("orders/*", "orders/*"));
        assert!(!matches("orders/*", "orders/created"));
    }

    #[test]
    fn test_invalid_patterns() {
        for bad in ["", "orders/**/created", "**/x", "orders//x", "/orders", "orders/", "orders/a**", "x**y"] {
            let err = TopicPattern::parse(bad).unwrap_err();
            assert_eq!(err.as_label(), "bus_invalid_pattern", "pattern {bad:?}");
        }
    }

    #[test]
    fn test_validate_topic() {
        assert!(validate_topic("orders/created").is_ok());
        assert!(validate_topic("orders").is_ok());
        assert!(validate_topic("").is_err());
        assert!(validate_topic("orders/**").is_err());
        assert!(validate_topic("orders//created").is_err());
        assert!(validate_topic("orders/").is_err());
    }

    #[test]
    fn test_display_keeps_raw_pattern() {
        let p = TopicPattern::parse("orders/**").unwrap();
        assert_eq!(p.to_string(), "orders/**");
        assert!(p.is_wildcard());
        assert_eq!(p.as_str(), "orders/**");
    }
}
