//! Normalizes untyped workflow output into [`DocTemplateData`].
//!
//! The workflow's JSON shape is not contractually fixed, so every lookup goes
//! through a named [`probe`](crate::probe) rule and every field falls back to
//! an empty default. [`build_doc_template_data`] never fails.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::figure::FigureImage;
use crate::probe::{
    self, CHAPTER, CONSIDERATION, EXPERIMENT_CONTAINER, EXPERIMENT_LIST, SINGLE_EXPERIMENT, SUMMARY,
};

/// Renderer-ready report content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocTemplateData {
    pub chapter: Option<i64>,
    pub chapter_plus_1: Option<i64>,
    pub chapter_plus_2: Option<i64>,
    pub experiments: Vec<Experiment>,
    pub consideration: Consideration,
    /// Flattened consideration units, in source order
    pub considerations: Vec<ConsiderationUnit>,
    pub summary: String,
    pub references: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub index: i64,
    pub subindex: Option<String>,
    pub name: String,
    pub description_brief: String,
    pub quant_comment: String,
    pub tables: Vec<Table>,
    pub figures: Vec<Figure>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub label: String,
    pub caption: String,
    pub rows: Option<Vec<Vec<String>>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub label: String,
    pub caption: String,
    /// Attached by the renderer
    #[serde(skip)]
    pub image: Option<FigureImage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Consideration {
    pub units: Vec<ConsiderationUnit>,
    pub reference_list_formatted: Vec<String>,
    pub references: Vec<ReferenceEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsiderationUnit {
    pub index: String,
    #[serde(rename = "discussionActive")]
    pub discussion_active: String,
    pub answer: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub id: String,
    pub title: String,
    pub year: String,
}

impl ReferenceEntry {
    /// `[id] title year`, year omitted when blank.
    pub fn formatted(&self) -> String {
        if self.year.is_empty() {
            format!("[{}] {}", self.id, self.title)
        } else {
            format!("[{}] {} {}", self.id, self.title, self.year)
        }
    }
}

/// Build template data from raw workflow output.
pub fn build_doc_template_data(raw: &Value) -> DocTemplateData {
    // A bare array is read as the experiment list.
    let wrapped;
    let root = if raw.is_array() {
        let mut map = Map::new();
        map.insert("experiments".to_string(), raw.clone());
        wrapped = Value::Object(map);
        &wrapped
    } else {
        raw
    };

    let container =
        probe::first_match_where(&EXPERIMENT_CONTAINER, root, |v| v.get("experiments").is_some());
    let list_value = match container {
        Some(container) => container.get("experiments"),
        None => probe::first_match(&EXPERIMENT_LIST, root).or_else(|| {
            probe::first_match_where(&SINGLE_EXPERIMENT, root, looks_like_experiment)
        }),
    };
    let entries = as_sequence(list_value);
    let carriers: Vec<&Value> = entries.iter().copied().filter(|v| is_carrier(v)).collect();

    let experiments = normalize_experiments(&entries);

    let chapter = container
        .and_then(|c| c.get("chapter"))
        .and_then(to_integer)
        .or_else(|| probe::first_match(&CHAPTER, root).and_then(to_integer));

    let consideration_source = probe::first_match_where(&CONSIDERATION, root, Value::is_object)
        .or_else(|| {
            carriers
                .iter()
                .copied()
                .find(|v| v.get("units").map_or(false, Value::is_array))
        });

    let mut consideration = consideration_source
        .map(normalize_consideration)
        .unwrap_or_default();

    // Units sent as a bare array instead of a `{units: [...]}` object.
    if consideration.units.is_empty() {
        if let Some(Value::Array(units)) =
            probe::first_match_where(&CONSIDERATION, root, Value::is_array)
        {
            consideration.units = units.iter().filter_map(normalize_unit).collect();
        }
    }

    let mut references = format_references(&consideration);
    if references.is_empty() {
        // Fall back to reference fields placed at the top level.
        let top_level = normalize_consideration(root);
        references = format_references(&top_level);
    }
    if consideration.reference_list_formatted.is_empty() {
        consideration.reference_list_formatted = references.clone();
    }

    let summary = probe::first_match(&SUMMARY, root)
        .map(to_text)
        .filter(|s| !s.is_empty())
        .or_else(|| {
            carriers
                .iter()
                .filter_map(|v| v.get("summary"))
                .map(to_text)
                .find(|s| !s.is_empty())
        })
        .unwrap_or_default();

    DocTemplateData {
        chapter,
        chapter_plus_1: chapter.map(|c| c.saturating_add(1)),
        chapter_plus_2: chapter.map(|c| c.saturating_add(2)),
        experiments,
        considerations: consideration.units.clone(),
        consideration,
        summary,
        references,
    }
}

fn normalize_experiments(entries: &[&Value]) -> Vec<Experiment> {
    let mut experiments = Vec::with_capacity(entries.len());
    for entry in entries {
        if is_carrier(entry) {
            continue;
        }
        let position = experiments.len() as i64 + 1;
        match entry {
            Value::Null | Value::Array(_) => {}
            Value::Object(map) => experiments.push(normalize_experiment(map, position)),
            scalar => experiments.push(Experiment {
                index: position,
                name: to_text(scalar),
                ..Experiment::default()
            }),
        }
    }
    experiments
}

fn normalize_experiment(map: &Map<String, Value>, position: i64) -> Experiment {
    let index = field(map, &["idx", "index"])
        .and_then(to_integer)
        .unwrap_or(position);

    let tables = as_sequence(map.get("tables"))
        .into_iter()
        .filter_map(Value::as_object)
        .map(|table| Table {
            label: text_field(table, &["label"]),
            caption: text_field(table, &["caption"]),
            rows: table.get("rows").and_then(Value::as_array).map(|rows| {
                rows.iter()
                    .filter_map(Value::as_array)
                    .map(|row| row.iter().map(to_text).collect())
                    .collect()
            }),
        })
        .collect();

    let figures = as_sequence(map.get("figures"))
        .into_iter()
        .filter_map(Value::as_object)
        .map(|figure| Figure {
            label: text_field(figure, &["label"]),
            caption: text_field(figure, &["caption"]),
            image: None,
        })
        .collect();

    Experiment {
        index,
        subindex: non_blank(text_field(map, &["subidx", "subindex"])),
        name: text_field(map, &["name", "title"]),
        description_brief: text_field(map, &["description_brief", "description"]),
        quant_comment: text_field(map, &["quant_comment"]),
        tables,
        figures,
    }
}

fn normalize_consideration(source: &Value) -> Consideration {
    let units = as_sequence(source.get("units"))
        .into_iter()
        .filter_map(normalize_unit)
        .collect();

    let reference_list_formatted = as_sequence(source.get("reference_list_formatted"))
        .into_iter()
        .map(to_text)
        .filter(|s| !s.is_empty())
        .collect();

    let references = as_sequence(source.get("references"))
        .into_iter()
        .filter_map(Value::as_object)
        .filter_map(|reference| {
            let id = text_field(reference, &["id"]);
            let title = text_field(reference, &["title"]);
            if id.is_empty() && title.is_empty() {
                return None;
            }
            let year = non_blank(text_field(reference, &["year"]))
                .unwrap_or_else(|| text_field(reference, &["date"]));
            Some(ReferenceEntry { id, title, year })
        })
        .collect();

    Consideration {
        units,
        reference_list_formatted,
        references,
    }
}

fn normalize_unit(unit: &Value) -> Option<ConsiderationUnit> {
    let unit = unit.as_object()?;
    let index = text_field(unit, &["index", "idx"]);
    let discussion_active = text_field(unit, &["discussion_active", "discussionActive"]);
    let answer = non_blank(text_field(unit, &["answer"]));
    if index.is_empty() && discussion_active.is_empty() && answer.is_none() {
        return None;
    }
    Some(ConsiderationUnit {
        index,
        discussion_active,
        answer,
    })
}

fn format_references(consideration: &Consideration) -> Vec<String> {
    if !consideration.reference_list_formatted.is_empty() {
        return consideration.reference_list_formatted.clone();
    }
    consideration
        .references
        .iter()
        .map(ReferenceEntry::formatted)
        .collect()
}

/// An object with at least one experiment field. A container holding only
/// `chapter` or consideration data is not an experiment.
fn looks_like_experiment(value: &Value) -> bool {
    value.as_object().map_or(false, |map| {
        ["name", "title", "idx", "index", "tables", "figures"]
            .iter()
            .any(|key| map.get(*key).map_or(false, |v| !v.is_null()))
    })
}

/// An element of the experiment list that carries consideration units or
/// the summary rather than an experiment.
fn is_carrier(value: &Value) -> bool {
    let Some(map) = value.as_object() else {
        return false;
    };
    let carries = map.get("units").map_or(false, Value::is_array) || map.contains_key("summary");
    carries && !map.contains_key("name") && !map.contains_key("idx")
}

/// Single object or array, normalized to an ordered sequence.
fn as_sequence(value: Option<&Value>) -> Vec<&Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(other) => vec![other],
    }
}

fn field<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| map.get(*key))
        .find(|v| !v.is_null())
}

fn text_field(map: &Map<String, Value>, keys: &[&str]) -> String {
    field(map, keys).map(to_text).unwrap_or_default()
}

/// Strings pass through, numbers and booleans stringify, the rest is empty.
fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn to_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })
        }
        _ => None,
    }
}

fn non_blank(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
