//! Bulk import and dry-run validation over multipart uploads.

use super::{ApiError, AppState, CurrentUser, run_blocking};
use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use partsdesk_core::csv_data::{CsvReport, check_csv};
use partsdesk_core::import::{ImportOptions, ImportSummary, import_files, table_key};
use partsdesk_core::RoleName;
use std::collections::BTreeMap;
use tracing::{info, warn};

fn bad_upload(err: MultipartError) -> ApiError {
    ApiError::bad_request(err.body_text())
}

/// `truncate`, `updateExisting` and any number of file parts whose field
/// name is `<table>.csv`. The uploaded file's own name is ignored.
///
/// A flag counts as set only when its value is `true`; an absent
/// `updateExisting` therefore means insert-or-skip.
pub(super) async fn import(
    State(state): State<AppState>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<ImportSummary>, ApiError> {
    user.require(&[RoleName::Manager])?;

    let mut files = BTreeMap::new();
    let mut options = ImportOptions {
        truncate: false,
        update_existing: false,
    };

    while let Some(field) = multipart.next_field().await.map_err(bad_upload)? {
        let name = field.name().unwrap_or_default().to_string();
        let value = field.text().await.map_err(bad_upload)?;

        match name.as_str() {
            "truncate" => options.truncate = value == "true",
            "updateExisting" => options.update_existing = value == "true",
            table_file if table_file.ends_with(".csv") => {
                files.insert(table_key(table_file).to_string(), value);
            }
            _ => {}
        }
    }

    if files.is_empty() {
        return Err(ApiError::bad_request("No CSV files were provided"));
    }

    info!(
        files = files.len(),
        truncate = options.truncate,
        update_existing = options.update_existing,
        by = %user.0.username,
        "import started"
    );
    let summary =
        run_blocking(&state, move |store| Ok(import_files(store, &files, options))).await?;
    log_summary(&summary);
    Ok(Json(summary))
}

fn log_summary(summary: &ImportSummary) {
    for result in &summary.results {
        if result.success {
            info!(table = %result.table, rows = result.rows_imported, "table imported");
        } else {
            warn!(
                table = %result.table,
                error = result.error.as_deref().unwrap_or_default(),
                "table import failed"
            );
        }
    }
    info!(
        success = summary.success,
        total_rows = summary.total_rows_imported,
        "import finished"
    );
}

/// `file` (CSV text) and `tableName`.
pub(super) async fn validate_csv(
    user: CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<CsvReport>, ApiError> {
    user.require(&[RoleName::Manager])?;

    let mut content = None;
    let mut table_name = None;
    while let Some(field) = multipart.next_field().await.map_err(bad_upload)? {
        let name = field.name().unwrap_or_default().to_string();
        let value = field.text().await.map_err(bad_upload)?;
        match name.as_str() {
            "file" => content = Some(value),
            "tableName" => table_name = Some(value),
            _ => {}
        }
    }

    let (Some(content), Some(table_name)) = (content, table_name) else {
        return Err(ApiError::bad_request("File and table name are required"));
    };
    Ok(Json(check_csv(table_name.trim(), &content)))
}
