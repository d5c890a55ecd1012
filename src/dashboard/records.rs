use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::error::DatasetError;

/// One core plug measurement. `sample_number` is the 0-based row index in
/// the source file, assigned at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord {
    pub sample_number: usize,
    pub kinf: f64,
    pub porosity: f64,
    pub gdensity: f64,
    pub depth: f64,
}

/// One reading from the continuous core-gamma log.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GammaRecord {
    #[serde(rename = "Depth")]
    pub depth: f64,
    #[serde(rename = "Gamma")]
    pub gamma: f64,
}

/// Row shape of `PorePermDensity.csv`; other columns are ignored.
#[derive(Debug, Deserialize)]
struct SampleRow {
    #[serde(rename = "Kinf")]
    kinf: f64,
    #[serde(rename = "Porosity")]
    porosity: f64,
    #[serde(rename = "Gdensity")]
    gdensity: f64,
    #[serde(rename = "Depth")]
    depth: f64,
}

pub fn load_samples(path: impl AsRef<Path>) -> Result<Vec<SampleRecord>, DatasetError> {
    let path = path.as_ref();
    let file = open(path)?;
    read_samples(file).map_err(|source| DatasetError::Csv { path: path.display().to_string(), source })
}

pub fn load_gamma(path: impl AsRef<Path>) -> Result<Vec<GammaRecord>, DatasetError> {
    let path = path.as_ref();
    let file = open(path)?;
    read_gamma(file).map_err(|source| DatasetError::Csv { path: path.display().to_string(), source })
}

/// Parses sample rows from any reader, numbering them in file order.
pub fn read_samples<R: Read>(reader: R) -> Result<Vec<SampleRecord>, csv::Error> {
    csv::Reader::from_reader(reader)
        .deserialize::<SampleRow>()
        .enumerate()
        .map(|(i, row)| {
            row.map(|r| SampleRecord {
                sample_number: i,
                kinf: r.kinf,
                porosity: r.porosity,
                gdensity: r.gdensity,
                depth: r.depth,
            })
        })
        .collect()
}

pub fn read_gamma<R: Read>(reader: R) -> Result<Vec<GammaRecord>, csv::Error> {
    csv::Reader::from_reader(reader).deserialize().collect()
}

fn open(path: &Path) -> Result<std::fs::File, DatasetError> {
    std::fs::File::open(path).map_err(|source| DatasetError::Io { path: path.display().to_string(), source })
}
