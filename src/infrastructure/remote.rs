use super::errors::InfrastructureResult;
use super::persistence::FileRepository;
use crate::domain::Row;
use log::info;

/// Fetches rows from a URL serving a JSON array of objects.
pub fn fetch_rows(url: &str) -> InfrastructureResult<Vec<Row>> {
    info!("Fetching rows from {}", url);
    let body = reqwest::blocking::get(url)?.error_for_status()?.text()?;
    let rows = FileRepository::parse_rows_json(&body)?;
    info!("Fetched {} rows", rows.len());
    Ok(rows)
}
