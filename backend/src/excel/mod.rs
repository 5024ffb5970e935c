//! Workbook builders for the import/export endpoints.

pub mod customers;
pub mod quotation;

/// MIME type for generated `.xlsx` payloads.
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
