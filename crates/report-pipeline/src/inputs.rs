//! Gathering run inputs from uploaded experiment files.
//!
//! Figure and table loading is best effort: a file that cannot be downloaded
//! or decoded is logged and skipped, never fatal to the run.

use std::io::Cursor;

use docx_report::FigureImage;
use report_state::{ArtifactStore, ExperimentFileDescriptor, FileType};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

/// Largest display width of an embedded figure
pub const FIGURE_MAX_WIDTH: u32 = 520;
/// Largest display height of an embedded figure
pub const FIGURE_MAX_HEIGHT: u32 = 380;
/// Display size used when the image dimensions cannot be read
pub const FIGURE_DEFAULT_SIZE: (u32, u32) = (480, 320);

/// Workflow input key carrying the source document
pub const DOCUMENT_INPUT_KEY: &str = "pdf_manual";

/// Earliest uploaded source document (document type or `.pdf` name).
pub fn select_source_document(
    files: &[ExperimentFileDescriptor],
) -> Option<&ExperimentFileDescriptor> {
    files
        .iter()
        .filter(|f| f.is_source_document())
        .min_by_key(|f| f.upload_order())
}

/// Files of one type, oldest upload first; ties keep registration order.
fn files_of_type(
    files: &[ExperimentFileDescriptor],
    file_type: FileType,
) -> Vec<&ExperimentFileDescriptor> {
    let mut selected: Vec<_> = files.iter().filter(|f| f.file_type == file_type).collect();
    selected.sort_by_key(|f| f.upload_order());
    selected
}

/// Scale down to fit 520x380 keeping the aspect ratio, never up.
pub fn fit_figure_size(dimensions: Option<(u32, u32)>) -> (u32, u32) {
    match dimensions {
        Some((width, height)) if width > 0 && height > 0 => {
            let scale = (FIGURE_MAX_WIDTH as f64 / width as f64)
                .min(FIGURE_MAX_HEIGHT as f64 / height as f64)
                .min(1.0);
            let fit = |v: u32| ((v as f64 * scale).round() as u32).max(1);
            (fit(width), fit(height))
        }
        _ => FIGURE_DEFAULT_SIZE,
    }
}

/// Pixel dimensions read from the image header.
pub fn image_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

/// Download `image` files in upload order and size them for embedding.
pub async fn load_figure_images(
    store: &dyn ArtifactStore,
    files: &[ExperimentFileDescriptor],
) -> Vec<FigureImage> {
    let mut images = Vec::new();
    for file in files_of_type(files, FileType::Image) {
        let bytes = match store.download(&file.file_url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(file = %file.file_name, error = %e, "Figure download failed, skipping");
                continue;
            }
        };

        let dimensions = image_dimensions(&bytes);
        if dimensions.is_none() {
            warn!(file = %file.file_name, "Could not read figure dimensions, using default size");
        }
        let (width, height) = fit_figure_size(dimensions);

        match FigureImage::new(bytes, width as f64, height as f64) {
            Ok(image) => images.push(image),
            Err(e) => warn!(file = %file.file_name, error = %e, "Unusable figure, skipping"),
        }
    }
    debug!(count = images.len(), "Loaded figure images");
    images
}

/// Download `excel` files in upload order and read their `{"rows": [...]}`
/// payloads. Each returned value is one table's `rows` array.
pub async fn load_table_rows(
    store: &dyn ArtifactStore,
    files: &[ExperimentFileDescriptor],
) -> Vec<Value> {
    let mut tables = Vec::new();
    for file in files_of_type(files, FileType::Excel) {
        let bytes = match store.download(&file.file_url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(file = %file.file_name, error = %e, "Table download failed, skipping");
                continue;
            }
        };
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(mut payload)) => match payload.remove("rows") {
                Some(rows @ Value::Array(_)) => tables.push(rows),
                _ => warn!(file = %file.file_name, "Table payload has no rows array, skipping"),
            },
            Ok(_) => warn!(file = %file.file_name, "Table payload is not an object, skipping"),
            Err(e) => warn!(file = %file.file_name, error = %e, "Table payload is not JSON, skipping"),
        }
    }
    debug!(count = tables.len(), "Loaded table rows");
    tables
}

/// Inject uploaded table rows into the experiments, one table per
/// experiment in order.
///
/// The first table of an experiment receives the rows; an experiment without
/// tables gets a new one. Outputs without an experiment list are untouched.
pub fn apply_table_rows(result_json: &mut Value, tables: &[Value]) {
    if tables.is_empty() {
        return;
    }
    let chapter = result_json.get("chapter").and_then(Value::as_i64);

    let experiments = match result_json {
        Value::Object(root) if root.get("experiments").map_or(false, Value::is_array) => {
            root.get_mut("experiments")
        }
        Value::Object(root) => root
            .get_mut("experiment")
            .and_then(|e| e.get_mut("experiments"))
            .filter(|e| e.is_array()),
        _ => None,
    };
    let Some(Value::Array(experiments)) = experiments else {
        return;
    };

    for (position, (experiment, rows)) in experiments.iter_mut().zip(tables).enumerate() {
        let Value::Object(experiment) = experiment else {
            continue;
        };
        let filled = match experiment.get_mut("tables") {
            Some(Value::Array(existing)) if !existing.is_empty() => {
                set_rows(&mut existing[0], rows);
                true
            }
            Some(single @ Value::Object(_)) => {
                set_rows(single, rows);
                true
            }
            _ => false,
        };
        if !filled {
            let chapter = chapter.unwrap_or(position as i64 + 1);
            experiment.insert(
                "tables".to_string(),
                json!([{
                    "label": format!("{}.{}", chapter, position + 1),
                    "caption": "Uploaded table",
                    "rows": rows,
                }]),
            );
        }
    }
}

fn set_rows(table: &mut Value, rows: &Value) {
    match table {
        Value::Object(map) => {
            map.insert("rows".to_string(), rows.clone());
        }
        other => *other = json!({"label": "", "caption": "", "rows": rows}),
    }
}

/// Workflow inputs referencing the source document by URL.
pub fn workflow_inputs(document: &ExperimentFileDescriptor, url: &str) -> Map<String, Value> {
    let mut inputs = Map::new();
    inputs.insert(
        DOCUMENT_INPUT_KEY.to_string(),
        json!({
            "type": "document",
            "transfer_method": "remote_url",
            "name": document.file_name,
            "url": url,
        }),
    );
    inputs
}

#[cfg(test)]
mod tests {
    use super::*;
    use report_state::FileRef;

    fn file(name: &str, file_type: FileType, millis: Option<i64>) -> ExperimentFileDescriptor {
        ExperimentFileDescriptor {
            file_name: name.to_string(),
            file_type,
            file_url: FileRef(format!("u/{}", name)),
            uploaded_at: millis.and_then(chrono_from_millis),
        }
    }

    fn chrono_from_millis(millis: i64) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp_millis(millis)
    }

    #[test]
    fn test_fit_scales_down_keeping_aspect() {
        assert_eq!(fit_figure_size(Some((1040, 380))), (520, 190));
        assert_eq!(fit_figure_size(Some((400, 760))), (200, 380));
    }

    #[test]
    fn test_fit_never_scales_up() {
        assert_eq!(fit_figure_size(Some((100, 50))), (100, 50));
    }

    #[test]
    fn test_fit_defaults_without_dimensions() {
        assert_eq!(fit_figure_size(None), (480, 320));
        assert_eq!(fit_figure_size(Some((0, 10))), (480, 320));
    }

    #[test]
    fn test_source_document_prefers_earliest() {
        let files = vec![
            file("late.pdf", FileType::Code, Some(2_000)),
            file("photo.png", FileType::Image, Some(0)),
            file("manual.docx", FileType::Document, Some(1_000)),
        ];
        assert_eq!(
            select_source_document(&files).map(|f| f.file_name.as_str()),
            Some("manual.docx")
        );
        assert!(select_source_document(&files[1..2]).is_none());
    }

    #[test]
    fn test_apply_rows_to_existing_and_new_tables() {
        let mut result = json!({"experiments": [
            {"name": "a", "tables": [{"label": "1-1", "caption": "c"}, {"label": "1-2"}]},
            {"name": "b"},
            {"name": "c"}
        ]});
        apply_table_rows(&mut result, &[json!([["x"]]), json!([["y"]])]);

        assert_eq!(result["experiments"][0]["tables"][0]["rows"], json!([["x"]]));
        assert_eq!(result["experiments"][0]["tables"][0]["label"], json!("1-1"));
        assert!(result["experiments"][0]["tables"][1].get("rows").is_none());
        assert_eq!(result["experiments"][1]["tables"][0]["rows"], json!([["y"]]));
        assert_eq!(result["experiments"][1]["tables"][0]["label"], json!("2.2"));
        assert!(result["experiments"][2].get("tables").is_none());
    }

    #[test]
    fn test_apply_rows_inside_container_uses_chapter() {
        let mut result = json!({"chapter": 3, "experiment": {"experiments": [{"name": "a"}]}});
        apply_table_rows(&mut result, &[json!([["1", "2"]])]);
        assert_eq!(
            result["experiment"]["experiments"][0]["tables"][0]["label"],
            json!("3.1")
        );
    }

    #[test]
    fn test_apply_rows_without_experiments_is_noop() {
        let mut result = json!({"summary": "s"});
        let before = result.clone();
        apply_table_rows(&mut result, &[json!([["x"]])]);
        assert_eq!(result, before);
    }

    #[test]
    fn test_workflow_inputs_shape() {
        let document = file("manual.pdf", FileType::Document, None);
        let inputs = workflow_inputs(&document, "https://files/manual.pdf");
        assert_eq!(
            Value::Object(inputs),
            json!({"pdf_manual": {
                "type": "document",
                "transfer_method": "remote_url",
                "name": "manual.pdf",
                "url": "https://files/manual.pdf"
            }})
        );
    }
}
