//! Section limits, positional image matching and block interleaving.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{RenderError, Result};
use crate::figure::FigureImage;
use crate::template_data::{DocTemplateData, Experiment, Figure, Table};

/// Upper bounds on rendered sections. Exceeding one is an error, never a
/// silent truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderLimits {
    pub max_experiments: usize,
    pub max_figures_per_experiment: usize,
    pub max_considerations: usize,
}

impl Default for RenderLimits {
    fn default() -> Self {
        Self {
            max_experiments: 100,
            max_figures_per_experiment: 50,
            max_considerations: 200,
        }
    }
}

impl RenderLimits {
    pub fn check(&self, data: &DocTemplateData) -> Result<()> {
        exceeds("experiments", data.experiments.len(), self.max_experiments)?;
        for experiment in &data.experiments {
            exceeds(
                &format!("experiment {} figures", experiment.index),
                experiment.figures.len(),
                self.max_figures_per_experiment,
            )?;
        }
        exceeds(
            "considerations",
            data.considerations.len(),
            self.max_considerations,
        )
    }
}

fn exceeds(section: &str, count: usize, limit: usize) -> Result<()> {
    if count > limit {
        return Err(RenderError::SectionLimitExceeded {
            section: section.to_string(),
            count,
            limit,
        });
    }
    Ok(())
}

/// One body element of an experiment section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Block<'a> {
    Table(&'a Table),
    Figure(&'a Figure),
}

/// Table *i* followed by figure *i*, for every position either list has.
pub fn interleave_blocks(experiment: &Experiment) -> Vec<Block<'_>> {
    let len = experiment.tables.len().max(experiment.figures.len());
    let mut blocks = Vec::with_capacity(experiment.tables.len() + experiment.figures.len());
    for i in 0..len {
        if let Some(table) = experiment.tables.get(i) {
            blocks.push(Block::Table(table));
        }
        if let Some(figure) = experiment.figures.get(i) {
            blocks.push(Block::Figure(figure));
        }
    }
    blocks
}

/// Attach images to figures strictly by order across all experiments.
///
/// Returns the number of surplus images that had no figure to attach to.
pub fn attach_figure_images(data: &mut DocTemplateData, images: &[FigureImage]) -> usize {
    let mut remaining = images.iter();
    for figure in data
        .experiments
        .iter_mut()
        .flat_map(|experiment| experiment.figures.iter_mut())
    {
        match remaining.next() {
            Some(image) => figure.image = Some(image.clone()),
            None => return 0,
        }
    }

    let surplus = remaining.count();
    if surplus > 0 {
        warn!(
            surplus,
            supplied = images.len(),
            "More figure images than figures; surplus images are not embedded"
        );
    }
    surplus
}
