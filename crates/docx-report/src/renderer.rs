//! DOCX rendering of template data.

use std::io::Cursor;

use docx_rs::{
    AlignmentType, Docx, Paragraph, Pic, Run, Style, StyleType, Table as DocxTable, TableCell,
    TableRow,
};
use serde_json::Value;
use tracing::debug;

use crate::error::{RenderError, Result};
use crate::figure::FigureImage;
use crate::layout::{attach_figure_images, interleave_blocks, Block, RenderLimits};
use crate::sanitize::{sanitize_text, sanitize_value, strip_invalid_xml};
use crate::template_data::{build_doc_template_data, DocTemplateData, Experiment, Figure, Table};

/// MIME type of the produced artifact
pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const SUMMARY_PLACEHOLDER: &str = "No summary was provided.";
const REFERENCES_PLACEHOLDER: &str = "No references were listed.";

/// Input to one render call. Images are borrowed for the call only.
#[derive(Debug, Clone, Copy)]
pub struct GenerateReportInput<'a> {
    pub title: &'a str,
    pub dify_output: &'a Value,
    pub figure_images: &'a [FigureImage],
}

/// Render with the default limits.
pub fn generate_report(input: &GenerateReportInput<'_>) -> Result<Vec<u8>> {
    DocxRenderer::new().render(input)
}

/// Stateless renderer; safe to share between concurrent runs.
#[derive(Debug, Clone, Default)]
pub struct DocxRenderer {
    limits: RenderLimits,
}

impl DocxRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: RenderLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> RenderLimits {
        self.limits
    }

    /// Sanitize, build, check limits and attach images.
    pub fn prepare(&self, input: &GenerateReportInput<'_>) -> Result<DocTemplateData> {
        let sanitized = sanitize_value(input.dify_output);
        let mut data = build_doc_template_data(&sanitized);
        self.limits.check(&data)?;
        attach_figure_images(&mut data, input.figure_images);
        Ok(data)
    }

    pub fn render(&self, input: &GenerateReportInput<'_>) -> Result<Vec<u8>> {
        let data = self.prepare(input)?;
        self.render_data(&sanitize_text(input.title), &data)
    }

    /// Write already-built template data as a DOCX package.
    pub fn render_data(&self, title: &str, data: &DocTemplateData) -> Result<Vec<u8>> {
        self.limits.check(data)?;
        let chapter = data.chapter.unwrap_or(1);

        let mut docx = Docx::new()
            .add_style(heading_style("Heading1", "heading 1", 32))
            .add_style(heading_style("Heading2", "heading 2", 26))
            .add_paragraph(
                Paragraph::new()
                    .align(AlignmentType::Center)
                    .add_run(Run::new().add_text(strip_invalid_xml(title)).bold().size(36)),
            );

        docx = docx.add_paragraph(heading(1, format!("Chapter {} Experiments", chapter)));
        for experiment in &data.experiments {
            docx = write_experiment(docx, chapter, experiment);
        }

        docx = docx.add_paragraph(heading(
            1,
            format!("Chapter {} Discussion", chapter.saturating_add(1)),
        ));
        for unit in &data.considerations {
            let label = if unit.index.is_empty() {
                unit.discussion_active.clone()
            } else {
                format!("{}. {}", unit.index, unit.discussion_active)
            };
            docx = docx.add_paragraph(bold_text(label));
            if let Some(answer) = &unit.answer {
                docx = docx.add_paragraph(text(answer));
            }
        }

        docx = docx.add_paragraph(heading(
            1,
            format!("Chapter {} Summary", chapter.saturating_add(2)),
        ));
        let summary = if data.summary.is_empty() {
            SUMMARY_PLACEHOLDER
        } else {
            data.summary.as_str()
        };
        docx = docx.add_paragraph(text(summary));

        docx = docx.add_paragraph(heading(1, "References"));
        if data.references.is_empty() {
            docx = docx.add_paragraph(text(REFERENCES_PLACEHOLDER));
        }
        for reference in &data.references {
            docx = docx.add_paragraph(text(reference));
        }

        let mut cursor = Cursor::new(Vec::new());
        docx.build()
            .pack(&mut cursor)
            .map_err(|e| RenderError::Pack(e.to_string()))?;
        let bytes = cursor.into_inner();

        debug!(
            experiments = data.experiments.len(),
            considerations = data.considerations.len(),
            bytes = bytes.len(),
            "Rendered report document"
        );
        Ok(bytes)
    }
}

fn write_experiment(mut docx: Docx, chapter: i64, experiment: &Experiment) -> Docx {
    let number = match &experiment.subindex {
        Some(sub) => format!("{}.{}.{}", chapter, experiment.index, sub),
        None => format!("{}.{}", chapter, experiment.index),
    };
    docx = docx.add_paragraph(heading(2, format!("{} {}", number, experiment.name)));

    if !experiment.description_brief.is_empty() {
        docx = docx.add_paragraph(text(&experiment.description_brief));
    }

    for block in interleave_blocks(experiment) {
        docx = match block {
            Block::Table(table) => write_table(docx, table),
            Block::Figure(figure) => write_figure(docx, figure),
        };
    }

    if !experiment.quant_comment.is_empty() {
        docx = docx.add_paragraph(text(&experiment.quant_comment));
    }
    docx
}

fn write_table(mut docx: Docx, table: &Table) -> Docx {
    docx = docx.add_paragraph(caption("Table", &table.label, &table.caption));
    let rows: Vec<TableRow> = table
        .rows
        .iter()
        .flatten()
        .filter(|row| !row.is_empty())
        .map(|row| {
            TableRow::new(
                row.iter()
                    .map(|cell| TableCell::new().add_paragraph(text(cell)))
                    .collect(),
            )
        })
        .collect();
    if !rows.is_empty() {
        docx = docx.add_table(DocxTable::new(rows));
    }
    docx
}

fn write_figure(mut docx: Docx, figure: &Figure) -> Docx {
    if let Some(image) = &figure.image {
        let pic = Pic::new_with_dimensions(image.buffer().to_vec(), image.width(), image.height());
        docx = docx.add_paragraph(
            Paragraph::new()
                .align(AlignmentType::Center)
                .add_run(Run::new().add_image(pic)),
        );
    }
    docx.add_paragraph(caption("Figure", &figure.label, &figure.caption))
}

fn heading_style(id: &str, name: &str, size: usize) -> Style {
    Style::new(id, StyleType::Paragraph).name(name).size(size).bold()
}

fn heading(level: u8, content: impl AsRef<str>) -> Paragraph {
    Paragraph::new()
        .style(&format!("Heading{}", level))
        .add_run(Run::new().add_text(strip_invalid_xml(content.as_ref())))
}

fn caption(kind: &str, label: &str, caption: &str) -> Paragraph {
    let line = format!("{} {} {}", kind, label, caption);
    Paragraph::new()
        .align(AlignmentType::Center)
        .add_run(Run::new().add_text(strip_invalid_xml(
            &line.split_whitespace().collect::<Vec<_>>().join(" "),
        )))
}

// `render_data` input may not have been sanitized, so every run is stripped.
fn text(content: impl AsRef<str>) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(strip_invalid_xml(content.as_ref())))
}

fn bold_text(content: impl AsRef<str>) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(strip_invalid_xml(content.as_ref())).bold())
}
