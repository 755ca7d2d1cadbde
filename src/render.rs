use crate::models::{QrKind, RequestRow};
use crate::payload::InstantTransferQr;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct RenderedQr {
    pub row: usize,
    pub kind: QrKind,
    pub summary: String,
    pub payload: String,
}

pub fn read_requests(path: &Path) -> Result<Vec<RequestRow>, String> {
    let mut reader = csv::Reader::from_path(path).map_err(|err| err.to_string())?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        let row: RequestRow = row.map_err(|err| err.to_string())?;
        rows.push(row);
    }
    Ok(rows)
}

pub fn build_payloads(rows: Vec<RequestRow>) -> Result<Vec<RenderedQr>, String> {
    let mut rendered = Vec::with_capacity(rows.len());
    for (idx, row) in rows.into_iter().enumerate() {
        let row_number = idx + 1;
        let (kind, details) = row.into_parts();
        let qr = InstantTransferQr::new(kind, details)
            .map_err(|err| format!("row {}: {}", row_number, err))?;
        let payload = qr
            .payload()
            .map_err(|err| format!("row {}: {}", row_number, err))?;
        rendered.push(RenderedQr {
            row: row_number,
            kind,
            summary: qr.to_string(),
            payload,
        });
    }
    Ok(rendered)
}

pub fn build_payloads_from_csv(input: &Path) -> Result<Vec<RenderedQr>, String> {
    let rows = read_requests(input)?;
    if rows.is_empty() {
        return Err("no requests found in input CSV".to_string());
    }
    build_payloads(rows)
}

pub fn write_payloads(rendered: &[RenderedQr], output_dir: &Path) -> Result<Vec<PathBuf>, String> {
    std::fs::create_dir_all(output_dir).map_err(|err| err.to_string())?;
    let mut outputs = Vec::with_capacity(rendered.len());

    for qr in rendered {
        let path = output_dir.join(format!("qr_{:04}_{}.txt", qr.row, qr.kind));
        std::fs::write(&path, &qr.payload).map_err(|err| err.to_string())?;
        log::debug!("wrote {} to {}", qr.summary, path.display());
        outputs.push(path);
    }

    Ok(outputs)
}
