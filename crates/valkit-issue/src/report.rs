use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::issue::Issue;
use crate::path::{Path, PathSegment};

/// Messages split into root-level and first-segment buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlattenedError {
    pub form_errors: Vec<String>,
    pub field_errors: IndexMap<String, Vec<String>>,
}

pub(crate) fn flatten(issues: &[Issue]) -> FlattenedError {
    let mut out = FlattenedError::default();
    for issue in issues {
        match issue.path.first() {
            Some(segment) => out
                .field_errors
                .entry(segment.to_string())
                .or_default()
                .push(issue.message.clone()),
            None => out.form_errors.push(issue.message.clone()),
        }
    }
    out
}

/// Messages arranged in a tree that mirrors the input shape.
///
/// Serialises as `{"_errors": [...], "<key>": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormattedError {
    pub errors: Vec<String>,
    pub children: IndexMap<String, FormattedError>,
}

impl FormattedError {
    /// The subtree for one key or index.
    pub fn get(&self, segment: impl Into<PathSegment>) -> Option<&FormattedError> {
        self.children.get(&segment.into().to_string())
    }

    /// The subtree at a nested path.
    pub fn at(&self, path: &[PathSegment]) -> Option<&FormattedError> {
        path.iter()
            .try_fold(self, |node, segment| node.children.get(&segment.to_string()))
    }

    fn insert(&mut self, path: &[PathSegment], message: &str) {
        let mut node = self;
        for segment in path {
            node = node.children.entry(segment.to_string()).or_default();
        }
        node.errors.push(message.to_owned());
    }
}

impl Serialize for FormattedError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.children.len() + 1))?;
        map.serialize_entry("_errors", &self.errors)?;
        for (key, child) in &self.children {
            map.serialize_entry(key, child)?;
        }
        map.end()
    }
}

pub(crate) fn format(issues: &[Issue]) -> FormattedError {
    let mut root = FormattedError::default();
    collect(&mut root, issues, &Path::new());
    root
}

fn collect(root: &mut FormattedError, issues: &[Issue], prefix: &Path) {
    for issue in issues {
        let full = prefix.join(&issue.path);
        let nested = issue.kind.nested();
        if nested.is_empty() {
            root.insert(full.segments(), &issue.message);
        } else {
            for group in nested {
                collect(root, group, &full);
            }
        }
    }
}

/// Human-readable rendering: one `✖ message` line per issue with an
/// `→ at path` line beneath when the issue is not at the root.
pub fn prettify(issues: &[Issue]) -> String {
    let mut sorted: Vec<&Issue> = issues.iter().collect();
    sorted.sort_by_key(|issue| issue.path.len());
    let mut lines = Vec::with_capacity(sorted.len() * 2);
    for issue in sorted {
        lines.push(format!("✖ {}", issue.message));
        if !issue.path.is_empty() {
            lines.push(format!("  → at {}", issue.path));
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use valkit_value::Value;

    use super::*;
    use crate::issue::IssueKind;

    fn issue(path: Vec<PathSegment>, message: &str) -> Issue {
        let mut issue = Issue::new(IssueKind::custom(), path.into(), Value::Nil);
        issue.message = message.to_owned();
        issue
    }

    #[test]
    fn flatten_buckets_by_first_segment() {
        let issues = vec![
            issue(vec![], "root"),
            issue(vec!["name".into()], "name bad"),
            issue(vec!["tags".into(), 0usize.into()], "tag bad"),
            issue(vec!["name".into()], "name short"),
        ];
        let flat = flatten(&issues);
        assert_eq!(flat.form_errors, vec!["root"]);
        assert_eq!(flat.field_errors["name"], vec!["name bad", "name short"]);
        assert_eq!(flat.field_errors["tags"], vec!["tag bad"]);
    }

    #[test]
    fn format_mirrors_input_shape() {
        let issues = vec![
            issue(vec!["user".into(), "email".into()], "bad email"),
            issue(vec![], "root"),
        ];
        let tree = format(&issues);
        assert_eq!(
            serde_json::to_value(&tree).unwrap(),
            json!({"_errors": ["root"], "user": {"_errors": [], "email": {"_errors": ["bad email"]}}})
        );
        assert_eq!(
            tree.at(&["user".into(), "email".into()]).unwrap().errors,
            vec!["bad email"]
        );
    }

    #[test]
    fn format_descends_into_nested_issues() {
        let element = Issue::new(
            IssueKind::InvalidElement {
                origin: crate::issue::Origin::Record,
                key: Value::from("k"),
                issues: vec![issue(vec!["inner".into()], "deep")],
            },
            vec![PathSegment::from("k")].into(),
            Value::Nil,
        );
        let tree = format(&[element]);
        assert_eq!(
            tree.at(&["k".into(), "inner".into()]).unwrap().errors,
            vec!["deep"]
        );
    }

    #[test]
    fn prettify_lists_root_issues_first() {
        let issues = vec![issue(vec!["a".into()], "field"), issue(vec![], "root")];
        assert_eq!(prettify(&issues), "✖ root\n✖ field\n  → at a");
    }
}
