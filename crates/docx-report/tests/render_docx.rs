//! Rendering tests that read the produced DOCX package back.

use std::io::{Cursor, Read};

use docx_report::{
    generate_report, DocTemplateData, DocxRenderer, FigureImage, GenerateReportInput, RenderError,
    RenderLimits, MAX_DIMENSION,
};
use serde_json::{json, Value};

fn document_xml(bytes: &[u8]) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name("word/document.xml").unwrap();
    let mut xml = String::new();
    file.read_to_string(&mut xml).unwrap();
    xml
}

fn media_entries(bytes: &[u8]) -> usize {
    let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    archive
        .file_names()
        .filter(|name| name.contains("media/"))
        .count()
}

/// XML 1.0 `Char` production, restricted to what a Rust `char` can hold.
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}')
}

fn sample_output() -> Value {
    json!({
        "experiment": {
            "chapter": 2,
            "experiments": [
                {
                    "idx": 1,
                    "name": "Titration",
                    "description_brief": "Acid <b>base</b> titration",
                    "tables": [{"label": "2-1", "caption": "Volumes", "rows": [["trial", "mL"], ["1", "12.4"]]}],
                    "figures": [{"label": "2-1", "caption": "Titration curve"}]
                },
                {"idx": 2, "name": "Calorimetry"}
            ]
        },
        "consideration": {
            "units": [
                {"index": 1, "discussion_active": "Endpoint detection", "answer": "Indicator change"},
                {"index": 2, "discussion_active": "Heat loss"}
            ],
            "reference_list_formatted": ["Atkins Physical Chemistry 2018"]
        },
        "summary": "Both experiments matched expectations."
    })
}

#[test]
fn test_every_section_appears_in_document() {
    let output = sample_output();
    let input = GenerateReportInput {
        title: "Lab Report 2",
        dify_output: &output,
        figure_images: &[],
    };

    let bytes = generate_report(&input).unwrap();
    let xml = document_xml(&bytes);

    for expected in [
        "Lab Report 2",
        "2.1 Titration",
        "2.2 Calorimetry",
        "Acid base titration",
        "Table 2-1 Volumes",
        "12.4",
        "Figure 2-1 Titration curve",
        "Endpoint detection",
        "Indicator change",
        "Heat loss",
        "Both experiments matched expectations.",
        "Atkins Physical Chemistry 2018",
    ] {
        assert!(xml.contains(expected), "missing {:?}", expected);
    }
}

#[test]
fn test_table_precedes_figure_within_experiment() {
    let output = sample_output();
    let input = GenerateReportInput {
        title: "Order",
        dify_output: &output,
        figure_images: &[],
    };

    let xml = document_xml(&generate_report(&input).unwrap());

    let table = xml.find("Table 2-1 Volumes").unwrap();
    let figure = xml.find("Figure 2-1 Titration curve").unwrap();
    let next_experiment = xml.find("2.2 Calorimetry").unwrap();
    assert!(table < figure);
    assert!(figure < next_experiment);
}

#[test]
fn test_figure_image_is_embedded() {
    let output = sample_output();
    let images = vec![FigureImage::new(vec![0x89, b'P', b'N', b'G', 0, 1, 2, 3], 0.0, -5.0).unwrap()];
    let input = GenerateReportInput {
        title: "Images",
        dify_output: &output,
        figure_images: &images,
    };

    let bytes = generate_report(&input).unwrap();

    assert!(media_entries(&bytes) >= 1);
}

#[test]
fn test_surplus_images_are_not_embedded() {
    let output = json!({"experiments": [{"name": "No figures"}]});
    let images = vec![FigureImage::new(vec![1, 2, 3], 10.0, 10.0).unwrap()];
    let input = GenerateReportInput {
        title: "Surplus",
        dify_output: &output,
        figure_images: &images,
    };

    let bytes = generate_report(&input).unwrap();

    assert_eq!(media_entries(&bytes), 0);
    assert!(document_xml(&bytes).contains("No figures"));
}

#[test]
fn test_empty_output_still_renders_placeholders() {
    let output = json!(null);
    let input = GenerateReportInput {
        title: "Empty",
        dify_output: &output,
        figure_images: &[],
    };

    let xml = document_xml(&generate_report(&input).unwrap());

    assert!(xml.contains("Chapter 1 Experiments"));
    assert!(xml.contains("No summary was provided."));
    assert!(xml.contains("No references were listed."));
}

#[test]
fn test_section_limit_is_an_error() {
    let experiments: Vec<Value> = (0..4).map(|i| json!({"name": format!("e{}", i)})).collect();
    let output = json!({"experiments": experiments});
    let renderer = DocxRenderer::with_limits(RenderLimits {
        max_experiments: 3,
        ..RenderLimits::default()
    });
    let input = GenerateReportInput {
        title: "Too many",
        dify_output: &output,
        figure_images: &[],
    };

    let err = renderer.render(&input).unwrap_err();

    match err {
        RenderError::SectionLimitExceeded {
            section,
            count,
            limit,
        } => {
            assert_eq!(section, "experiments");
            assert_eq!(count, 4);
            assert_eq!(limit, 3);
        }
        other => panic!("expected limit error, got {:?}", other),
    }
}

#[test]
fn test_output_is_a_zip_package() {
    let output = sample_output();
    let input = GenerateReportInput {
        title: "Package",
        dify_output: &output,
        figure_images: &[],
    };

    let bytes = generate_report(&input).unwrap();

    assert_eq!(&bytes[..2], b"PK");
    let archive = zip::ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
    assert!(archive.file_names().any(|name| name == "[Content_Types].xml"));
}

#[test]
fn test_control_characters_never_reach_document() {
    let output = json!({
        "experiments": [{"name": "Buffer\u{0001} prep\u{FFFF}", "figures": [{"label": "1-1", "caption": "\u{000C}Curve"}]}],
        "consideration": {"units": [{"index": 1, "discussion_active": "Drift\u{001B}"}]},
        "summary": "pH\u{0001} 7"
    });
    let input = GenerateReportInput {
        title: "Week\u{0008} 5",
        dify_output: &output,
        figure_images: &[],
    };

    let xml = document_xml(&generate_report(&input).unwrap());

    assert!(xml.chars().all(is_xml_char));
    assert!(xml.contains("pH 7"));
    assert!(xml.contains("Buffer prep"));
    assert!(xml.contains("Week 5"));
}

#[test]
fn test_render_data_strips_control_characters() {
    let data = DocTemplateData {
        summary: "raw\u{0002}text".to_string(),
        ..DocTemplateData::default()
    };

    let bytes = DocxRenderer::new().render_data("T\u{0003}", &data).unwrap();
    let xml = document_xml(&bytes);

    assert!(xml.chars().all(is_xml_char));
    assert!(xml.contains("rawtext"));
}

#[test]
fn test_oversized_figure_is_clamped_and_renders() {
    let output = json!({"experiments": [{"name": "Wide", "figures": [{"label": "1-1", "caption": "Panorama"}]}]});
    let images = vec![FigureImage::new(vec![1, 2, 3], 500_000.0, 10.0).unwrap()];
    assert_eq!(images[0].width(), MAX_DIMENSION);
    let input = GenerateReportInput {
        title: "Wide",
        dify_output: &output,
        figure_images: &images,
    };

    let bytes = generate_report(&input).unwrap();

    assert!(media_entries(&bytes) >= 1);
}
