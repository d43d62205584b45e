use serde::Serialize;

use crate::asset_graph::ObjectId;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ExportFailure {
    pub object: ObjectId,
    pub class: String,
    pub error: String,
}

/// Summary of one export session, printed after `export`.
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub generated_at: String,
    pub out_dir: String,
    pub objects_exported: usize,
    pub materials_exported: usize,
    pub files: Vec<String>,
    pub failures: Vec<ExportFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassifyOutput {
    pub name: String,
    pub category: Option<String>,
}
