//! Data layer of the plug data explorer.
//!
//! The explorer shows a cross plot of two plug properties and a well-log
//! plot of core gamma against depth. Selecting plugs in the cross plot
//! highlights the same plugs in the log plot; everything here is a pure
//! function of the two loaded datasets and the current selection.

pub mod figures;
pub mod records;

use std::collections::HashSet;

use serde::Deserialize;

pub use figures::{cross_plot, well_log, Axis, AxisType};
pub use records::{load_gamma, load_samples, GammaRecord, SampleRecord};

/// Plotly `selectedData` payload. Only `customdata` (the sample number) is read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectedData {
    #[serde(default)]
    pub points: Vec<SelectedPoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectedPoint {
    pub customdata: Option<usize>,
}

/// Both datasets, loaded once and shared read-only.
#[derive(Debug, Clone)]
pub struct Datasets {
    pub samples: Vec<SampleRecord>,
    pub gamma: Vec<GammaRecord>,
}

/// Indices into `samples` that remain visible for a selection.
///
/// With a non-empty selection this is the intersection of all sample numbers
/// with the selected ones, in dataset order. With no selection, or an empty
/// one, every sample is kept.
pub fn filter_selection(samples: &[SampleRecord], selection: Option<&SelectedData>) -> Vec<usize> {
    let selected: HashSet<usize> = selection
        .map(|s| s.points.iter().filter_map(|p| p.customdata).collect())
        .unwrap_or_default();

    let no_selection = selection.map(|s| s.points.is_empty()).unwrap_or(true);
    if no_selection {
        return (0..samples.len()).collect();
    }

    samples
        .iter()
        .enumerate()
        .filter(|(_, s)| selected.contains(&s.sample_number))
        .map(|(i, _)| i)
        .collect()
}
