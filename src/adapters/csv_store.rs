//! CSV tables on top of a [`Storage`].
//!
//! Tables are written as UTF-8 with a byte order mark so that spreadsheet
//! tools pick the right encoding for the Korean text; readers strip it again.

use crate::core::Storage;
use crate::domain::model::{CollectedData, Dataset, Record};
use crate::utils::error::{AccessError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub fn to_csv_bytes<T: Serialize>(rows: &[T]) -> Result<Vec<u8>> {
    let mut buffer = UTF8_BOM.to_vec();
    {
        let mut writer = csv::Writer::from_writer(&mut buffer);
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }
    Ok(buffer)
}

pub fn from_csv_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_reader(strip_bom(bytes));
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Untyped rows of a downloaded standard-data export, keyed by header.
pub fn raw_records(bytes: &[u8]) -> Result<Vec<Record>> {
    if std::str::from_utf8(strip_bom(bytes)).is_err() {
        return Err(AccessError::processing(
            "local CSV is not valid UTF-8; re-save the export as UTF-8",
        ));
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(strip_bom(bytes));
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        records.push(Record::from_pairs(
            headers
                .iter()
                .zip(row.iter())
                .map(|(h, v)| (h.clone(), v.trim().to_string())),
        ));
    }
    Ok(records)
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

pub async fn write_table<S: Storage, T: Serialize>(
    storage: &S,
    file_name: &str,
    rows: &[T],
) -> Result<()> {
    let bytes = to_csv_bytes(rows)?;
    tracing::debug!("Writing {} ({} rows, {} bytes)", file_name, rows.len(), bytes.len());
    storage.write_file(file_name, &bytes).await
}

pub async fn read_table<S: Storage, T: DeserializeOwned>(storage: &S, file_name: &str) -> Result<Vec<T>> {
    let bytes = storage.read_file(file_name).await?;
    from_csv_bytes(&bytes)
}

/// Reads the collected tables. Stations and walkways must exist; the facility
/// table is only written when the portal returned any.
pub async fn load_collected<S: Storage>(storage: &S) -> Result<CollectedData> {
    for dataset in [Dataset::ChargingStation, Dataset::Walkway] {
        if !storage.exists(dataset.file_name()).await {
            return Err(AccessError::processing(format!(
                "{} not found in the data directory; run the collect stage first",
                dataset.file_name()
            )));
        }
    }

    let facilities = if storage.exists(Dataset::DisabilityFacilities.file_name()).await {
        read_table(storage, Dataset::DisabilityFacilities.file_name()).await?
    } else {
        Vec::new()
    };

    Ok(CollectedData {
        charging_stations: read_table(storage, Dataset::ChargingStation.file_name()).await?,
        walkways: read_table(storage, Dataset::Walkway.file_name()).await?,
        facilities,
    })
}
