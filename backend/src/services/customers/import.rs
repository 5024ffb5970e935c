//! Customer import: template download, multipart CSV upload and the
//! background job that validates and inserts the rows.
//!
//! The upload is streamed to a temp file while an md5 digest runs over the
//! bytes; a file already imported once is short-circuited. The header must
//! match the template columns exactly, then a background job re-validates the
//! rows in parallel chunks and inserts them, reporting progress through the
//! shared job map.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path as StdPath, PathBuf};

use actix_multipart::Multipart;
use actix_web::http::header::ContentDisposition;
use actix_web::web::{Data, Path};
use actix_web::HttpResponse;
use common::jobs::JobStatus;
use common::model::customer::CustomerCreate;
use common::response::ApiResponse;
use futures_util::StreamExt;
use rayon::prelude::*;
use tempfile::NamedTempFile;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::db::Db;
use crate::error::ApiError;
use crate::excel::customers::{build_import_template, IMPORT_COLUMNS};
use crate::excel::XLSX_CONTENT_TYPE;
use crate::job_controller::state::{ImportJobs, JobUpdate};

/// `GET /api/customers/import-template`.
pub(super) async fn template() -> Result<HttpResponse, ApiError> {
    let bytes = build_import_template()?;
    Ok(HttpResponse::Ok()
        .content_type(XLSX_CONTENT_TYPE)
        .insert_header(ContentDisposition::attachment("mau-nhap-khach-hang.xlsx"))
        .body(bytes))
}

/// `POST /api/customers/import` - multipart upload of the filled CSV.
pub(super) async fn upload(
    db: Data<Db>,
    jobs: Data<ImportJobs>,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let mut staged: Option<(NamedTempFile, String)> = None;
    let mut hasher = md5::Context::new();

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| ApiError::Validation(format!("Tệp tải lên không hợp lệ: {e}")))?;
        let part_name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));
        if part_name.as_deref() != Some("file") {
            continue;
        }

        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
            .unwrap_or_default();
        if !file_name.to_lowercase().ends_with(".csv") {
            return Err(ApiError::Validation(
                "Tệp nhập phải có định dạng .csv".into(),
            ));
        }

        let mut tmp = NamedTempFile::new().map_err(ApiError::internal)?;
        while let Some(chunk) = field.next().await {
            let chunk =
                chunk.map_err(|e| ApiError::Validation(format!("Lỗi khi nhận tệp: {e}")))?;
            hasher.consume(&chunk);
            tmp.write_all(&chunk).map_err(ApiError::internal)?;
        }
        tmp.flush().map_err(ApiError::internal)?;
        staged = Some((tmp, file_name));
    }

    let (tmp, file_name) = staged.ok_or_else(|| ApiError::Validation("Thiếu tệp tải lên".into()))?;
    let md5sum = format!("{:x}", hasher.finalize());

    if db.has_import_file(&md5sum)? {
        return Ok(HttpResponse::Ok().json(ApiResponse::message("Tệp này đã được nhập trước đó")));
    }

    let delimiter = validate_header(tmp.path())?;

    // Keep the temp file alive for the background job; it is removed when the
    // job finishes either way.
    let (_file, path) = tmp.keep().map_err(ApiError::internal)?;
    let job_id =
        schedule_import_job(db.get_ref().clone(), &jobs, path, delimiter, md5sum, file_name).await;

    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        job_id,
        "Đã tiếp nhận tệp, đang xử lý",
    )))
}

/// `GET /api/customers/import/status/{job_id}`.
pub(super) async fn status(
    job_id: Path<String>,
    state: Data<ImportJobs>,
) -> Result<HttpResponse, ApiError> {
    let jobs = state.jobs.read().await;
    match jobs.get(job_id.as_str()) {
        Some(status) => Ok(HttpResponse::Ok().json(ApiResponse::ok(status.clone()))),
        None => Err(ApiError::NotFound(
            "Không tìm thấy công việc nhập liệu".into(),
        )),
    }
}

fn normalize_cell(cell: &str) -> String {
    let s = cell.trim_start_matches('\u{feff}').trim();
    let s = s
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(s);
    s.replace('\u{00A0}', " ").trim().to_string()
}

/// Check the first line against the template columns; returns the detected
/// delimiter for the CSV reader.
fn validate_header(path: &StdPath) -> Result<u8, ApiError> {
    let file = File::open(path).map_err(ApiError::internal)?;
    let mut reader = BufReader::new(file);
    let mut header_line = String::new();
    reader
        .read_line(&mut header_line)
        .map_err(|_| ApiError::Validation("Tệp không phải văn bản UTF-8".into()))?;
    let header_line = header_line.trim_end_matches(&['\n', '\r'][..]);
    if header_line.trim().is_empty() {
        return Err(ApiError::Validation("Tệp CSV trống".into()));
    }

    let delimiter = [b',', b';', b'\t']
        .into_iter()
        .max_by_key(|&d| header_line.matches(d as char).count())
        .unwrap_or(b',');

    let cells: Vec<String> = header_line
        .split(delimiter as char)
        .map(normalize_cell)
        .collect();
    let matches = cells.len() == IMPORT_COLUMNS.len()
        && cells
            .iter()
            .zip(IMPORT_COLUMNS.iter())
            .all(|(cell, expected)| cell == expected);
    if !matches {
        return Err(ApiError::Validation(format!(
            "Tiêu đề cột không đúng mẫu, cần: {}",
            IMPORT_COLUMNS.join(", ")
        )));
    }
    Ok(delimiter)
}

async fn schedule_import_job(
    db: Db,
    jobs: &ImportJobs,
    path: PathBuf,
    delimiter: u8,
    md5sum: String,
    file_name: String,
) -> String {
    let job_id = Uuid::new_v4().to_string();
    jobs.jobs
        .write()
        .await
        .insert(job_id.clone(), JobStatus::Pending);

    let tx = jobs.tx.clone();
    let tx_final = tx.clone();
    let job_for_worker = job_id.clone();
    let job_final = job_id.clone();
    let path_for_cleanup = path.clone();

    tokio::spawn(async move {
        let result = tokio::task::spawn_blocking(move || {
            import_customers_blocking(db, tx, job_for_worker, path, delimiter, md5sum, file_name)
        })
        .await;

        let status = match result {
            Ok(Ok(count)) => JobStatus::Completed(format!("Đã nhập {count} khách hàng")),
            Ok(Err(message)) => JobStatus::Failed(message),
            Err(join_err) => JobStatus::Failed(format!("Lỗi xử lý nền: {join_err}")),
        };
        let _ = tx_final.send(JobUpdate::new(job_final, status)).await;
        let _ = std::fs::remove_file(&path_for_cleanup);
    });

    job_id
}

struct ColumnMap {
    name: usize,
    phone: usize,
    email: usize,
    address: usize,
    province: usize,
    source: usize,
    notes: usize,
}

impl ColumnMap {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, String> {
        let find = |title: &str| -> Result<usize, String> {
            headers
                .iter()
                .position(|h| normalize_cell(h) == title)
                .ok_or_else(|| format!("Tệp thiếu cột '{}'", title))
        };
        Ok(Self {
            name: find(IMPORT_COLUMNS[0])?,
            phone: find(IMPORT_COLUMNS[1])?,
            email: find(IMPORT_COLUMNS[2])?,
            address: find(IMPORT_COLUMNS[3])?,
            province: find(IMPORT_COLUMNS[4])?,
            source: find(IMPORT_COLUMNS[5])?,
            notes: find(IMPORT_COLUMNS[6])?,
        })
    }
}

fn cell<'r>(record: &'r csv::StringRecord, idx: usize) -> &'r str {
    record.get(idx).unwrap_or("").trim()
}

fn opt_cell(record: &csv::StringRecord, idx: usize) -> Option<String> {
    let value = cell(record, idx);
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Name of the first offending column, if the row is unusable.
fn row_error(record: &csv::StringRecord, cols: &ColumnMap) -> Option<&'static str> {
    if cell(record, cols.name).is_empty() {
        return Some(IMPORT_COLUMNS[0]);
    }
    let phone = cell(record, cols.phone);
    if !phone.is_empty() {
        let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
        if !(8..=15).contains(&digits) {
            return Some(IMPORT_COLUMNS[1]);
        }
    }
    let email = cell(record, cols.email);
    if !email.is_empty() && (!email.contains('@') || !email.contains('.')) {
        return Some(IMPORT_COLUMNS[2]);
    }
    None
}

/// First invalid row in the chunk as (1-based file row, column title).
fn find_first_invalid(
    base: usize,
    chunk: &[csv::StringRecord],
    cols: &ColumnMap,
) -> Option<(usize, &'static str)> {
    chunk.par_iter().enumerate().find_map_any(|(i, record)| {
        // +2: one for the header line, one for 1-based numbering.
        row_error(record, cols).map(|column| (base + i + 2, column))
    })
}

const CHUNK_SIZE: usize = 500;

fn import_customers_blocking(
    db: Db,
    tx: mpsc::Sender<JobUpdate>,
    job_id: String,
    path: PathBuf,
    delimiter: u8,
    md5sum: String,
    file_name: String,
) -> Result<u32, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(&path)
        .map_err(|e| format!("Không đọc được tệp CSV: {e}"))?;

    let headers = reader
        .headers()
        .map_err(|e| format!("Không đọc được tiêu đề cột: {e}"))?
        .clone();
    let cols = ColumnMap::from_headers(&headers)?;

    let records: Vec<csv::StringRecord> = reader
        .records()
        .collect::<Result<_, _>>()
        .map_err(|e| format!("Tệp CSV hỏng: {e}"))?;

    // Validation pass first so a bad row rejects the whole file before any
    // insert happens.
    for (chunk_index, chunk) in records.chunks(CHUNK_SIZE).enumerate() {
        if let Some((row, column)) = find_first_invalid(chunk_index * CHUNK_SIZE, chunk, &cols) {
            return Err(format!("Dòng {} cột '{}' không hợp lệ", row, column));
        }
    }

    let mut imported: u32 = 0;
    for chunk in records.chunks(CHUNK_SIZE) {
        for (i, record) in chunk.iter().enumerate() {
            db.insert_customer(CustomerCreate {
                name: cell(record, cols.name).to_string(),
                phone: opt_cell(record, cols.phone),
                email: opt_cell(record, cols.email),
                address: opt_cell(record, cols.address),
                province: opt_cell(record, cols.province),
                source: opt_cell(record, cols.source),
                notes: opt_cell(record, cols.notes),
                latitude: None,
                longitude: None,
            })
            .map_err(|e| format!("Dòng {}: {}", imported as usize + i + 2, e))?;
        }
        imported += chunk.len() as u32;
        let _ = tx.blocking_send(JobUpdate::new(
            job_id.clone(),
            JobStatus::InProgress(imported),
        ));
    }

    db.record_import_file(&md5sum, &file_name)
        .map_err(|e| format!("Không ghi được lịch sử nhập: {e}"))?;
    Ok(imported)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_csv(contents: &str) -> NamedTempFile {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(contents.as_bytes()).unwrap();
        tmp.flush().unwrap();
        tmp
    }

    const HEADER: &str = "Tên khách hàng,Số điện thoại,Email,Địa chỉ,Tỉnh/Thành phố,Nguồn,Ghi chú";

    #[test]
    fn header_validation_accepts_template_and_detects_delimiter() {
        let tmp = write_csv(&format!("{HEADER}\n"));
        assert_eq!(validate_header(tmp.path()).unwrap(), b',');

        let semicolons = HEADER.replace(',', ";");
        let tmp = write_csv(&format!("{semicolons}\n"));
        assert_eq!(validate_header(tmp.path()).unwrap(), b';');
    }

    #[test]
    fn header_validation_rejects_wrong_columns() {
        let tmp = write_csv("Tên,SĐT\nA,1\n");
        assert!(validate_header(tmp.path()).is_err());

        let tmp = write_csv("");
        assert!(validate_header(tmp.path()).is_err());
    }

    #[test]
    fn quoted_and_bom_headers_are_normalized() {
        let quoted = "\u{feff}\"Tên khách hàng\",\"Số điện thoại\",Email,Địa chỉ,Tỉnh/Thành phố,Nguồn,Ghi chú";
        let tmp = write_csv(&format!("{quoted}\n"));
        assert_eq!(validate_header(tmp.path()).unwrap(), b',');
    }

    #[test]
    fn blocking_import_inserts_valid_rows() {
        let db = Db::open_in_memory().unwrap();
        let (tx, mut rx) = mpsc::channel(100);
        let tmp = write_csv(&format!(
            "{HEADER}\nNguyễn Văn A,0901234567,a@example.com,,Hà Nội,Zalo,\nTrần Thị B,,,,,,\n"
        ));
        let (_file, path) = tmp.keep().unwrap();

        let count = import_customers_blocking(
            db.clone(),
            tx,
            "job-1".into(),
            path.clone(),
            b',',
            "md5sum".into(),
            "khach-hang.csv".into(),
        )
        .unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(count, 2);
        assert!(db.has_import_file("md5sum").unwrap());
        let (rows, total) = db
            .list_customers(
                &common::requests::ListQuery::default(),
                crate::db::Page { page: 1, limit: 20 },
            )
            .unwrap();
        assert_eq!(total, 2);
        assert!(rows.iter().any(|c| c.name == "Nguyễn Văn A"));

        // Progress updates were reported.
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn blocking_import_rejects_file_on_first_bad_row() {
        let db = Db::open_in_memory().unwrap();
        let (tx, _rx) = mpsc::channel(100);
        let tmp = write_csv(&format!(
            "{HEADER}\nNguyễn Văn A,0901234567,,,,,\n,khong-ten,,,,,\n"
        ));
        let (_file, path) = tmp.keep().unwrap();

        let err = import_customers_blocking(
            db.clone(),
            tx,
            "job-2".into(),
            path.clone(),
            b',',
            "md5x".into(),
            "x.csv".into(),
        )
        .unwrap_err();
        std::fs::remove_file(&path).unwrap();

        assert!(err.contains("Dòng 3"), "unexpected error: {err}");
        // Nothing was inserted and the file hash was not recorded.
        let (_, total) = db
            .list_customers(
                &common::requests::ListQuery::default(),
                crate::db::Page { page: 1, limit: 20 },
            )
            .unwrap();
        assert_eq!(total, 0);
        assert!(!db.has_import_file("md5x").unwrap());
    }
}
