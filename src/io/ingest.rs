//! CSV ingest of well rows and monotherapy curve fits.
//!
//! This module turns the normalized rows produced upstream into per-matrix
//! groups keyed by `(plate, drug_set, matrix_index)`.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic grouping** (`BTreeMap`, so matrices come out sorted by key)
//! - **Separation of concerns**: no scoring logic here

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use serde::Serialize;

use crate::domain::{CurveParams, DoseLevel, DrugRole, MatrixKey, WellRow};
use crate::error::AppError;

const KEY_COLUMNS: [&str; 3] = ["plate", "drug_set", "matrix_index"];
const WELL_COLUMNS: [&str; 5] = ["dose_a", "dose_b", "conc_a", "conc_b", "viability"];
const CURVE_COLUMNS: [&str; 5] = ["role", "maxc", "xmid", "scal", "rmse"];

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, Serialize)]
pub struct RowError {
    pub source: &'static str,
    pub line: usize,
    pub message: String,
}

/// Well rows grouped by matrix.
#[derive(Debug, Clone)]
pub struct IngestedWells {
    pub matrices: BTreeMap<MatrixKey, Vec<WellRow>>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

/// One monotherapy curve row.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveRow {
    pub drug: Option<String>,
    pub params: CurveParams,
}

/// The (up to) two monotherapy curves of one matrix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurveRows {
    pub a: Option<CurveRow>,
    pub b: Option<CurveRow>,
}

/// Curve rows grouped by matrix.
#[derive(Debug, Clone, Default)]
pub struct IngestedCurves {
    pub curves: BTreeMap<MatrixKey, CurveRows>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Load and group well rows from a CSV file.
pub fn load_well_rows(path: &Path) -> Result<IngestedWells, AppError> {
    let file = open(path, "wells")?;
    let wells = parse_well_rows(file)?;
    tracing::info!(
        path = %path.display(),
        rows_read = wells.rows_read,
        rows_used = wells.rows_used,
        matrices = wells.matrices.len(),
        "loaded well rows"
    );
    if !wells.row_errors.is_empty() {
        tracing::warn!(count = wells.row_errors.len(), "skipped invalid well rows");
    }
    Ok(wells)
}

/// Load and group monotherapy curve rows from a CSV file.
pub fn load_curve_rows(path: &Path) -> Result<IngestedCurves, AppError> {
    let file = open(path, "curves")?;
    let curves = parse_curve_rows(file)?;
    tracing::info!(
        path = %path.display(),
        rows_read = curves.rows_read,
        matrices = curves.curves.len(),
        "loaded curve rows"
    );
    if !curves.row_errors.is_empty() {
        tracing::warn!(count = curves.row_errors.len(), "skipped invalid curve rows");
    }
    Ok(curves)
}

/// Parse well rows from any CSV source.
pub fn parse_well_rows<R: Read>(source: R) -> Result<IngestedWells, AppError> {
    let (mut reader, header_map) = csv_reader(source, "wells")?;
    ensure_columns(&header_map, "wells", KEY_COLUMNS.iter().chain(WELL_COLUMNS.iter()))?;

    let mut matrices: BTreeMap<MatrixKey, Vec<WellRow>> = BTreeMap::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;
    let mut rows_used = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records start after the header, and lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let parsed = result
            .map_err(|e| format!("CSV parse error: {e}"))
            .and_then(|record| {
                let key = parse_key(&record, &header_map)?;
                let row = parse_well(&record, &header_map)?;
                Ok((key, row))
            });

        match parsed {
            Ok((key, row)) => {
                matrices.entry(key).or_default().push(row);
                rows_used += 1;
            }
            Err(message) => row_errors.push(RowError {
                source: "wells",
                line,
                message,
            }),
        }
    }

    if rows_used == 0 {
        return Err(AppError::new(3, "No valid well rows found."));
    }

    Ok(IngestedWells {
        matrices,
        row_errors,
        rows_read,
        rows_used,
    })
}

/// Parse monotherapy curve rows from any CSV source.
pub fn parse_curve_rows<R: Read>(source: R) -> Result<IngestedCurves, AppError> {
    let (mut reader, header_map) = csv_reader(source, "curves")?;
    ensure_columns(&header_map, "curves", KEY_COLUMNS.iter().chain(CURVE_COLUMNS.iter()))?;

    let mut out = IngestedCurves::default();

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        out.rows_read += 1;

        let parsed = result
            .map_err(|e| format!("CSV parse error: {e}"))
            .and_then(|record| {
                let key = parse_key(&record, &header_map)?;
                let (role, row) = parse_curve(&record, &header_map)?;
                Ok((key, role, row))
            });

        let (key, role, row) = match parsed {
            Ok(v) => v,
            Err(message) => {
                out.row_errors.push(RowError {
                    source: "curves",
                    line,
                    message,
                });
                continue;
            }
        };

        let entry = out.curves.entry(key).or_default();
        let slot = match role {
            DrugRole::A => &mut entry.a,
            DrugRole::B => &mut entry.b,
        };
        if slot.is_some() {
            out.row_errors.push(RowError {
                source: "curves",
                line,
                message: format!("Duplicate curve for role `{role:?}`; keeping the first."),
            });
            continue;
        }
        *slot = Some(row);
    }

    Ok(out)
}

fn open(path: &Path, what: &str) -> Result<File, AppError> {
    File::open(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to open {what} CSV '{}': {e}", path.display()),
        )
    })
}

fn csv_reader<R: Read>(
    source: R,
    what: &str,
) -> Result<(csv::Reader<R>, HashMap<String, usize>), AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read {what} CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    Ok((reader, header_map))
}

fn ensure_columns<'a>(
    header_map: &HashMap<String, usize>,
    what: &str,
    required: impl Iterator<Item = &'a &'static str>,
) -> Result<(), AppError> {
    for name in required {
        if !header_map.contains_key(*name) {
            return Err(AppError::new(
                2,
                format!("Missing required column in {what} CSV: `{name}`"),
            ));
        }
    }
    Ok(())
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_key(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<MatrixKey, String> {
    let plate = get_required(record, header_map, "plate")?.to_string();
    let drug_set = get_required(record, header_map, "drug_set")?.to_string();
    let raw = get_required(record, header_map, "matrix_index")?;
    let matrix_index = raw
        .parse::<u32>()
        .map_err(|_| format!("Invalid `matrix_index` '{raw}' (expected a non-negative integer)."))?;
    Ok(MatrixKey {
        plate,
        drug_set,
        matrix_index,
    })
}

fn parse_well(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<WellRow, String> {
    let dose_a = parse_dose(get_required(record, header_map, "dose_a")?, "dose_a")?;
    let dose_b = parse_dose(get_required(record, header_map, "dose_b")?, "dose_b")?;
    let conc_a = parse_f64(get_required(record, header_map, "conc_a")?, "conc_a")?;
    let conc_b = parse_f64(get_required(record, header_map, "conc_b")?, "conc_b")?;
    let viability = parse_f64(get_required(record, header_map, "viability")?, "viability")?;

    if conc_a < 0.0 || conc_b < 0.0 {
        return Err("Concentrations must be >= 0.".to_string());
    }

    let hsa = get_optional(record, header_map, "hsa")
        .map(|s| parse_f64(s, "hsa"))
        .transpose()?;
    let bliss = get_optional(record, header_map, "bliss")
        .map(|s| parse_f64(s, "bliss"))
        .transpose()?;

    Ok(WellRow {
        dose_a,
        dose_b,
        conc_a,
        conc_b,
        viability,
        hsa,
        bliss,
    })
}

fn parse_curve(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
) -> Result<(DrugRole, CurveRow), String> {
    let raw_role = get_required(record, header_map, "role")?;
    let role = DrugRole::parse(raw_role)
        .ok_or_else(|| format!("Invalid `role` '{raw_role}' (expected `a` or `b`)."))?;

    let params = CurveParams {
        maxc: parse_f64(get_required(record, header_map, "maxc")?, "maxc")?,
        xmid: parse_f64(get_required(record, header_map, "xmid")?, "xmid")?,
        scal: parse_f64(get_required(record, header_map, "scal")?, "scal")?,
        rmse: parse_f64(get_required(record, header_map, "rmse")?, "rmse")?,
    };
    let drug = get_optional(record, header_map, "drug").map(str::to_string);

    Ok((role, CurveRow { drug, params }))
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn get_optional<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_dose(s: &str, name: &str) -> Result<DoseLevel, String> {
    match s.parse::<u32>() {
        Ok(v) if v >= 1 => Ok(DoseLevel(v)),
        _ => Err(format!("Invalid `{name}` '{s}' (expected an integer >= 1).")),
    }
}

fn parse_f64(s: &str, name: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("Invalid `{name}` '{s}' (expected a finite number).")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELLS: &str = "\u{feff}Plate,Drug_Set,Matrix_Index,Dose_A,Dose_B,Conc_A,Conc_B,Viability
P1,AxB,0,1,1,1.0,2.0,0.2
P1,AxB,0,1,2,1.0,1.0,0.3
P1,AxB,1,1,1,1.0,2.0,0.4
P1,AxB,0,0,2,1.0,1.0,0.3
P1,AxB,0,2,2,1.0,1.0,abc
";

    #[test]
    fn groups_rows_by_matrix_and_reports_bad_lines() {
        let wells = parse_well_rows(WELLS.as_bytes()).unwrap();
        assert_eq!(wells.rows_read, 5);
        assert_eq!(wells.rows_used, 3);
        assert_eq!(wells.matrices.len(), 2);

        let key = MatrixKey {
            plate: "P1".to_string(),
            drug_set: "AxB".to_string(),
            matrix_index: 0,
        };
        assert_eq!(wells.matrices[&key].len(), 2);

        let lines: Vec<usize> = wells.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![5, 6]);
        assert!(wells.row_errors[0].message.contains("dose_a"));
    }

    #[test]
    fn optional_reference_columns_are_read() {
        let csv = "plate,drug_set,matrix_index,dose_a,dose_b,conc_a,conc_b,viability,hsa,bliss
P1,AxB,0,1,1,1.0,2.0,0.2,0.5,0.6
P1,AxB,0,1,2,1.0,1.0,0.3,,
";
        let wells = parse_well_rows(csv.as_bytes()).unwrap();
        let rows = wells.matrices.values().next().unwrap();
        assert_eq!(rows[0].hsa, Some(0.5));
        assert_eq!(rows[0].bliss, Some(0.6));
        assert_eq!(rows[1].hsa, None);
    }

    #[test]
    fn missing_required_column_is_fatal() {
        let csv = "plate,drug_set,matrix_index,dose_a,dose_b,conc_a,viability\n";
        let err = parse_well_rows(csv.as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("conc_b"));
    }

    #[test]
    fn curves_are_keyed_by_role_and_duplicates_flagged() {
        let csv = "plate,drug_set,matrix_index,role,drug,maxc,xmid,scal,rmse
P1,AxB,0,a,DrugA,1e7,6.5,1.2,0.05
P1,AxB,0,B,DrugB,1e7,5.0,0.8,0.31
P1,AxB,0,a,DrugA,1e7,1.0,1.0,0.05
P1,AxB,0,c,DrugC,1e7,1.0,1.0,0.05
";
        let curves = parse_curve_rows(csv.as_bytes()).unwrap();
        assert_eq!(curves.rows_read, 4);
        assert_eq!(curves.row_errors.len(), 2);
        let pair = curves.curves.values().next().unwrap();
        let a = pair.a.as_ref().unwrap();
        assert_eq!(a.drug.as_deref(), Some("DrugA"));
        assert_eq!(a.params.xmid, 6.5);
        assert_eq!(pair.b.as_ref().unwrap().params.rmse, 0.31);
    }
}
