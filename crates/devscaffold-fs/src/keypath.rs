//! Dotted key-paths into a key-mapping tree
//!
//! # Path Syntax
//!
//! - Dot-separated keys: `includes.nightwatch`
//! - Array indexing: `web_environment[0]`
//! - Wildcard: `includes.*` matches every key (or index) of the container
//!   found at `includes`
//!
//! Wildcards are concretized against one tree with [`KeyPath::expand`] and
//! the resulting concrete paths are then resolved in any number of trees.

use serde_json::Value;

/// A segment of a key-path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeySegment {
    Key(String),
    Index(usize),
    /// Every child of the container at this position
    Wildcard,
}

/// A parsed key-path such as `includes.*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct KeyPath {
    segments: Vec<KeySegment>,
}

impl KeyPath {
    /// Parse a key-path string.
    ///
    /// Malformed index brackets are dropped rather than rejected, so
    /// `items[x]` parses as `items`.
    pub fn parse(path: &str) -> Self {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut chars = path.chars();

        let flush = |current: &mut String, segments: &mut Vec<KeySegment>| {
            if current.is_empty() {
                return;
            }
            if current == "*" {
                segments.push(KeySegment::Wildcard);
            } else {
                segments.push(KeySegment::Key(current.clone()));
            }
            current.clear();
        };

        while let Some(ch) = chars.next() {
            match ch {
                '.' => flush(&mut current, &mut segments),
                '[' => {
                    flush(&mut current, &mut segments);
                    let mut index = String::new();
                    for ch in chars.by_ref() {
                        if ch == ']' {
                            break;
                        }
                        index.push(ch);
                    }
                    if index == "*" {
                        segments.push(KeySegment::Wildcard);
                    } else if let Ok(index) = index.parse::<usize>() {
                        segments.push(KeySegment::Index(index));
                    }
                }
                _ => current.push(ch),
            }
        }
        flush(&mut current, &mut segments);

        Self { segments }
    }

    pub fn from_segments(segments: Vec<KeySegment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[KeySegment] {
        &self.segments
    }

    pub fn is_concrete(&self) -> bool {
        !self.segments.contains(&KeySegment::Wildcard)
    }

    /// Resolve a concrete path in `tree`.
    ///
    /// Returns `None` if any segment is missing, or if the path still
    /// contains a wildcard.
    pub fn resolve<'a>(&self, tree: &'a Value) -> Option<&'a Value> {
        let mut current = tree;
        for segment in &self.segments {
            current = match (segment, current) {
                (KeySegment::Key(key), Value::Object(map)) => map.get(key)?,
                (KeySegment::Index(index), Value::Array(items)) => items.get(*index)?,
                // Numeric keys also address arrays, as in `items.1`
                (KeySegment::Key(key), Value::Array(items)) => items.get(key.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Concretize every wildcard against the containers found in `tree`.
    ///
    /// Paths without wildcards are returned unchanged. When a wildcard's
    /// parent is missing or is not a container, the prefix before the
    /// wildcard is returned instead so the caller still compares the whole
    /// parent value. An empty container expands to no paths.
    pub fn expand(&self, tree: &Value) -> Vec<KeyPath> {
        let mut out = Vec::new();
        expand_into(&self.segments, tree, Vec::new(), &mut out);
        out
    }
}

fn expand_into(
    remaining: &[KeySegment],
    node: &Value,
    prefix: Vec<KeySegment>,
    out: &mut Vec<KeyPath>,
) {
    let Some((head, tail)) = remaining.split_first() else {
        out.push(KeyPath::from_segments(prefix));
        return;
    };

    match head {
        KeySegment::Wildcard => match node {
            Value::Object(map) => {
                for (key, child) in map {
                    let mut next = prefix.clone();
                    next.push(KeySegment::Key(key.clone()));
                    expand_into(tail, child, next, out);
                }
            }
            Value::Array(items) => {
                for (index, child) in items.iter().enumerate() {
                    let mut next = prefix.clone();
                    next.push(KeySegment::Index(index));
                    expand_into(tail, child, next, out);
                }
            }
            _ => out.push(KeyPath::from_segments(prefix)),
        },
        concrete => {
            let child = KeyPath::from_segments(vec![concrete.clone()]).resolve(node);
            let mut next = prefix;
            next.push(concrete.clone());
            match child {
                Some(child) => expand_into(tail, child, next, out),
                None if tail.contains(&KeySegment::Wildcard) => {
                    // Cannot see past a missing node; compare at this depth
                    out.push(KeyPath::from_segments(next));
                }
                None => {
                    let mut full = next;
                    full.extend(tail.iter().cloned());
                    out.push(KeyPath::from_segments(full));
                }
            }
        }
    }
}

impl std::fmt::Display for KeyPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for segment in &self.segments {
            match segment {
                KeySegment::Key(key) => {
                    if !first {
                        f.write_str(".")?;
                    }
                    f.write_str(key)?;
                }
                KeySegment::Index(index) => write!(f, "[{}]", index)?,
                KeySegment::Wildcard => {
                    if !first {
                        f.write_str(".")?;
                    }
                    f.write_str("*")?;
                }
            }
            first = false;
        }
        Ok(())
    }
}

impl From<&str> for KeyPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parse_mixed_syntax() {
        let path = KeyPath::parse("services.selenium.ports[0]");
        assert_eq!(
            path.segments(),
            &[
                KeySegment::Key("services".into()),
                KeySegment::Key("selenium".into()),
                KeySegment::Key("ports".into()),
                KeySegment::Index(0),
            ]
        );
    }

    #[test]
    fn parse_wildcard() {
        let path = KeyPath::parse("includes.*");
        assert_eq!(
            path.segments(),
            &[KeySegment::Key("includes".into()), KeySegment::Wildcard]
        );
        assert!(!path.is_concrete());
    }

    #[test]
    fn resolve_nested_and_numeric_key() {
        let tree = json!({"web_environment": ["A=1", "B=2"], "a": {"b": "deep"}});
        assert_eq!(KeyPath::parse("a.b").resolve(&tree), Some(&json!("deep")));
        assert_eq!(KeyPath::parse("web_environment.1").resolve(&tree), Some(&json!("B=2")));
        assert_eq!(KeyPath::parse("web_environment[1]").resolve(&tree), Some(&json!("B=2")));
        assert_eq!(KeyPath::parse("a.missing").resolve(&tree), None);
    }

    #[test]
    fn expand_wildcard_over_mapping_keys_in_order() {
        let tree = json!({"includes": {"drainpipe": "./a.yml", "nightwatch": "./b.yml"}});
        let expanded: Vec<String> = KeyPath::parse("includes.*")
            .expand(&tree)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(expanded, vec!["includes.drainpipe", "includes.nightwatch"]);
    }

    #[test]
    fn expand_wildcard_on_scalar_falls_back_to_prefix() {
        let tree = json!({"includes": "not-a-mapping"});
        let expanded = KeyPath::parse("includes.*").expand(&tree);
        assert_eq!(expanded, vec![KeyPath::parse("includes")]);
    }

    #[test]
    fn expand_wildcard_on_empty_container_yields_nothing() {
        let path = KeyPath::parse("includes.*");
        assert!(path.expand(&json!({"includes": {}})).is_empty());
        assert!(path.expand(&json!({"includes": []})).is_empty());
        assert_eq!(path.expand(&json!({"includes": null})), vec![KeyPath::parse("includes")]);
    }

    #[test]
    fn expand_concrete_path_is_identity() {
        let tree = json!({});
        let expanded = KeyPath::parse("version").expand(&tree);
        assert_eq!(expanded, vec![KeyPath::parse("version")]);
    }

    #[test]
    fn display_round_trips_syntax() {
        assert_eq!(KeyPath::parse("a.b[2].c").to_string(), "a.b[2].c");
        assert_eq!(KeyPath::parse("includes.*").to_string(), "includes.*");
    }
}
