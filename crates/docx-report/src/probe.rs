//! Declarative path probing over untyped workflow output.
//!
//! Each [`Rule`] names one target field and lists the dotted paths it may be
//! found at, most specific first. [`first_match`] returns the first path that
//! resolves to a non-null value.

use serde_json::Value;

/// Ordered fallback paths for one target field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub name: &'static str,
    pub paths: &'static [&'static str],
}

/// Object holding `experiments` and optionally `chapter`.
pub const EXPERIMENT_CONTAINER: Rule = Rule {
    name: "experiment_container",
    paths: &[
        "experiment",
        "output.experiment",
        "result.experiment",
        "result_json.experiment",
    ],
};

/// The experiment list itself.
pub const EXPERIMENT_LIST: Rule = Rule {
    name: "experiment_list",
    paths: &[
        "experiments",
        "experiment.experiments",
        "output.experiments",
        "result.experiments",
        "result_json.experiments",
    ],
};

/// A single experiment object standing in for the list.
pub const SINGLE_EXPERIMENT: Rule = Rule {
    name: "single_experiment",
    paths: &["experiment", "output.experiment", "result.experiment"],
};

pub const CHAPTER: Rule = Rule {
    name: "chapter",
    paths: &["experiment.chapter", "chapter", "output.chapter", "result.chapter"],
};

pub const CONSIDERATION: Rule = Rule {
    name: "consideration",
    paths: &[
        "consideration",
        "experiment.consideration",
        "output.consideration",
        "result.consideration",
        "result_json.consideration",
        "considerations",
    ],
};

pub const SUMMARY: Rule = Rule {
    name: "summary",
    paths: &[
        "summary",
        "consideration.summary",
        "experiment.summary",
        "output.summary",
        "result.summary",
    ],
};

/// Resolve a dotted path against object keys.
pub fn get_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(root, |value, key| value.as_object()?.get(key))
}

/// First non-null value matched by `rule`.
pub fn first_match<'a>(rule: &Rule, root: &'a Value) -> Option<&'a Value> {
    first_match_where(rule, root, |_| true)
}

/// First non-null value matched by `rule` that also satisfies `accept`.
pub fn first_match_where<'a, F>(rule: &Rule, root: &'a Value, accept: F) -> Option<&'a Value>
where
    F: Fn(&Value) -> bool,
{
    rule.paths
        .iter()
        .filter_map(|path| get_path(root, path))
        .find(|value| !value.is_null() && accept(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_path_nested() {
        let root = json!({"output": {"experiment": {"chapter": 3}}});
        assert_eq!(get_path(&root, "output.experiment.chapter"), Some(&json!(3)));
        assert_eq!(get_path(&root, "output.missing"), None);
    }

    #[test]
    fn test_get_path_does_not_index_arrays() {
        let root = json!({"experiments": [{"name": "a"}]});
        assert_eq!(get_path(&root, "experiments.0"), None);
    }

    #[test]
    fn test_first_match_respects_rule_order() {
        let root = json!({"chapter": 2, "experiment": {"chapter": 5}});
        assert_eq!(first_match(&CHAPTER, &root), Some(&json!(5)));
    }

    #[test]
    fn test_first_match_skips_null() {
        let root = json!({"summary": null, "output": {"summary": "done"}});
        assert_eq!(first_match(&SUMMARY, &root), Some(&json!("done")));
    }

    #[test]
    fn test_first_match_where_filters() {
        let root = json!({"consideration": "text", "considerations": {"units": []}});
        let found = first_match_where(&CONSIDERATION, &root, Value::is_object);
        assert_eq!(found, Some(&json!({"units": []})));
    }

    #[test]
    fn test_non_object_root_matches_nothing() {
        assert_eq!(first_match(&EXPERIMENT_LIST, &json!([1, 2])), None);
        assert_eq!(first_match(&SUMMARY, &json!("summary")), None);
    }
}
