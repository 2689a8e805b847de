// salesflow-core/src/infrastructure/sales_csv.rs
//
// CSV boundary: raw input rows in, aggregated / enriched / extracted rows out.
// Every write goes through `atomic_write_with`, so a failed run leaves no partial file.

use csv::{ByteRecord, ReaderBuilder, StringRecord, WriterBuilder};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{debug, instrument, warn};

use crate::domain::error::InputSchemaError;
use crate::domain::sales::record::{AggregatedRecord, EnrichedRecord, RawSaleRecord, SourceRow};
use crate::domain::sales::schema::{self, ENRICHED_COLUMNS, INPUT_COLUMNS, OUTPUT_COLUMNS};
use crate::domain::transform::money::{format_money, format_rate};
use crate::error::SalesflowError;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::fs::atomic_write_with;
use crate::ports::connector::TextRow;

/// A CSV file read without interpretation: lower-cased header plus text cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<TextRow>,
}

impl CsvTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

fn normalized_headers(record: &StringRecord) -> StringRecord {
    record
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_lowercase())
        .collect()
}

fn unreadable(path: &Path, err: csv::Error) -> SalesflowError {
    InputSchemaError::Unreadable(format!("{}: {}", path.display(), err)).into()
}

/// Reads a raw sales file. The header is checked before any row is parsed:
/// a missing required column fails the whole read.
///
/// Past the header, only I/O errors are fatal. A row with the wrong number of
/// fields or a cell that is not UTF-8 is still returned, marked defective, so
/// cleaning rejects and counts it like any other bad row.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_sales_csv(path: &Path) -> Result<Vec<RawSaleRecord>, SalesflowError> {
    let file = File::open(path).map_err(InfrastructureError::Io)?;
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(file);

    let headers = normalized_headers(reader.headers().map_err(|e| unreadable(path, e))?);
    let names: Vec<&str> = headers.iter().collect();
    schema::check_header(&names)?;

    let positions: Vec<Option<usize>> = INPUT_COLUMNS
        .iter()
        .map(|column| names.iter().position(|name| name == column))
        .collect();

    let mut records = Vec::new();
    let mut defective = 0usize;
    let mut record = ByteRecord::new();
    while reader
        .read_byte_record(&mut record)
        .map_err(|e| unreadable(path, e))?
    {
        let raw = decode_row(&record, &positions, names.len());
        defective += usize::from(raw.defect.is_some());
        records.push(raw);
    }

    if defective > 0 {
        warn!(records = records.len(), defective, "Sales file has malformed rows");
    } else {
        debug!(records = records.len(), "Sales file read");
    }
    Ok(records)
}

/// Maps one byte row onto the input columns. `positions[i]` is the file
/// column holding `INPUT_COLUMNS[i]`; fields past the end of a short row read as null.
fn decode_row(record: &ByteRecord, positions: &[Option<usize>], width: usize) -> RawSaleRecord {
    let mut defects = Vec::new();
    if record.len() != width {
        defects.push(format!("row has {} fields, header has {}", record.len(), width));
    }

    let mut field = |column: usize| -> Option<String> {
        let bytes = positions.get(column).copied().flatten().and_then(|i| record.get(i))?;
        match std::str::from_utf8(bytes) {
            Ok(text) => Some(text.to_string()),
            Err(_) => {
                defects.push(format!("invalid UTF-8 in {}", INPUT_COLUMNS[column]));
                Some(String::from_utf8_lossy(bytes).into_owned())
            }
        }
    };

    let row = SourceRow {
        sale_id: field(0),
        sale_date: field(1),
        product_name: field(2),
        category: field(3),
        region: field(4),
        quantity: field(5),
        unit_price: field(6),
        discount: field(7),
    };

    let raw = RawSaleRecord::from(row);
    if defects.is_empty() {
        raw
    } else {
        raw.with_defect(defects.join("; "))
    }
}

/// Reads any CSV into text cells, header lower-cased.
pub fn read_table_csv(path: &Path) -> Result<CsvTable, SalesflowError> {
    let file = File::open(path).map_err(InfrastructureError::Io)?;
    let mut reader = ReaderBuilder::new().from_reader(file);

    let headers: Vec<String> = normalized_headers(reader.headers().map_err(|e| unreadable(path, e))?)
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| unreadable(path, e))?;
        rows.push(
            record
                .iter()
                .map(|v| if v.is_empty() { None } else { Some(v.to_string()) })
                .collect(),
        );
    }

    Ok(CsvTable { headers, rows })
}

/// Writes the header, then one serialized row per item. The header is always
/// written, so an empty slice yields a header-only file.
fn write_csv<T: Serialize>(
    path: &Path,
    header: &[&str],
    rows: impl IntoIterator<Item = T>,
) -> Result<(), SalesflowError> {
    atomic_write_with(path, |out: &mut dyn Write| {
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(out);
        writer.write_record(header)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    })?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct AggregatedRow<'a> {
    sale_date: String,
    product_name: &'a str,
    category: &'a str,
    region: &'a str,
    total_quantity: i64,
    avg_unit_price: String,
    avg_discount: String,
    transaction_count: u64,
    total_gross_revenue: String,
    total_net_revenue: String,
}

impl<'a> From<&'a AggregatedRecord> for AggregatedRow<'a> {
    fn from(r: &'a AggregatedRecord) -> Self {
        Self {
            sale_date: r.sale_date.format("%Y-%m-%d").to_string(),
            product_name: &r.product_name,
            category: &r.category,
            region: &r.region,
            total_quantity: r.total_quantity,
            avg_unit_price: format_money(r.avg_unit_price),
            avg_discount: format_rate(r.avg_discount),
            transaction_count: r.transaction_count,
            total_gross_revenue: format_money(r.total_gross_revenue),
            total_net_revenue: format_money(r.total_net_revenue),
        }
    }
}

#[instrument(skip_all, fields(path = %path.display(), rows = records.len()))]
pub fn write_aggregated_csv(path: &Path, records: &[AggregatedRecord]) -> Result<(), SalesflowError> {
    write_csv(path, &OUTPUT_COLUMNS, records.iter().map(AggregatedRow::from))
}

#[derive(Debug, Serialize)]
struct EnrichedRow<'a> {
    sale_id: &'a str,
    sale_date: String,
    product_name: &'a str,
    category: &'a str,
    region: &'a str,
    quantity: i64,
    unit_price: String,
    discount: String,
    year: i32,
    month: u32,
    day: u32,
    quarter: u32,
    day_of_week: u32,
    day_name: &'a str,
    gross_revenue: String,
    discount_amount: String,
    net_revenue: String,
    margin: String,
    has_discount: bool,
    is_high_value: bool,
    sale_category: &'a str,
}

impl<'a> From<&'a EnrichedRecord> for EnrichedRow<'a> {
    fn from(r: &'a EnrichedRecord) -> Self {
        Self {
            sale_id: r.sale_id.as_deref().unwrap_or(""),
            sale_date: r.sale_date.format("%Y-%m-%d").to_string(),
            product_name: &r.product_name,
            category: &r.category,
            region: &r.region,
            quantity: r.quantity,
            unit_price: r.unit_price.normalize().to_string(),
            discount: r.discount.normalize().to_string(),
            year: r.year,
            month: r.month,
            day: r.day,
            quarter: r.quarter,
            day_of_week: r.day_of_week,
            day_name: r.day_name,
            gross_revenue: format_money(r.gross_revenue),
            discount_amount: format_money(r.discount_amount),
            net_revenue: format_money(r.net_revenue),
            margin: format_money(r.margin),
            has_discount: r.has_discount,
            is_high_value: r.is_high_value,
            sale_category: r.sale_category.as_str(),
        }
    }
}

#[instrument(skip_all, fields(path = %path.display(), rows = records.len()))]
pub fn write_enriched_csv(path: &Path, records: &[EnrichedRecord]) -> Result<(), SalesflowError> {
    write_csv(path, &ENRICHED_COLUMNS, records.iter().map(EnrichedRow::from))
}

/// Extracted source rows, in the fixed input column order. NULL becomes an empty field.
#[instrument(skip_all, fields(path = %path.display(), rows = rows.len()))]
pub fn write_extracted_csv(path: &Path, rows: &[TextRow]) -> Result<(), SalesflowError> {
    let cells = rows.iter().map(|row| {
        row.iter()
            .map(|v| v.as_deref().unwrap_or(""))
            .collect::<Vec<&str>>()
    });
    write_csv(path, &INPUT_COLUMNS, cells)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::transform::{TransformConfig, transform};
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    const SAMPLE: &str = "\
sale_id,sale_date,product_name,category,region,quantity,unit_price,discount
1,2023-05-01,Widget,Tools,North,2,10.00,
2,2023-05-01, widget ,Tools,North,3,10.00,0
";

    #[test]
    fn test_read_then_write_aggregated() -> Result<()> {
        let dir = tempdir()?;
        let input = dir.path().join("in.csv");
        fs::write(&input, SAMPLE)?;

        let raw = read_sales_csv(&input)?;
        assert_eq!(raw.len(), 2);

        let out = transform(&raw, &TransformConfig::default())?;
        let output = dir.path().join("out.csv");
        write_aggregated_csv(&output, &out.aggregated)?;

        insta::assert_snapshot!(fs::read_to_string(&output)?, @r"
        sale_date,product_name,category,region,total_quantity,avg_unit_price,avg_discount,transaction_count,total_gross_revenue,total_net_revenue
        2023-05-01,Widget,Tools,North,5,10.00,0.0000,2,50.00,50.00
        ");
        Ok(())
    }

    #[test]
    fn test_missing_unit_price_column_is_schema_error() -> Result<()> {
        let dir = tempdir()?;
        let input = dir.path().join("in.csv");
        fs::write(
            &input,
            "sale_id,sale_date,product_name,category,region,quantity\n1,2023-05-01,Widget,Tools,North,2\n",
        )?;

        let err = read_sales_csv(&input).unwrap_err();
        assert!(matches!(
            err,
            SalesflowError::Domain(crate::domain::error::DomainError::Transform(
                crate::domain::error::TransformError::InputSchema(InputSchemaError::MissingColumns(_))
            ))
        ));
        Ok(())
    }

    #[test]
    fn test_header_case_and_extra_columns_tolerated() -> Result<()> {
        let dir = tempdir()?;
        let input = dir.path().join("in.csv");
        fs::write(
            &input,
            "Sale_Date,Product_Name,Category,Region,Quantity,Unit_Price,customer_segment\n2023-05-01,Widget,Tools,North,2,10,retail\n",
        )?;

        let raw = read_sales_csv(&input)?;
        assert_eq!(raw.len(), 1);
        assert!(raw[0].discount.is_null());
        assert!(raw[0].sale_id.is_null());
        Ok(())
    }

    #[test]
    fn test_ragged_rows_are_kept_as_defective() -> Result<()> {
        let dir = tempdir()?;
        let input = dir.path().join("in.csv");
        fs::write(
            &input,
            "sale_id,sale_date,product_name,category,region,quantity,unit_price,discount\n\
             1,2023-05-01,Widget,Tools,North,2,10.00,0\n\
             2,2023-05-01,Widget\n\
             3,2023-05-01,Widget,Tools,North,2,10.00,0,surplus\n\
             4,2023-05-02,Gadget,Tools,South,1,5.00,0\n",
        )?;

        let raw = read_sales_csv(&input)?;
        assert_eq!(raw.len(), 4);
        assert!(raw[0].defect.is_none());
        assert_eq!(raw[1].defect.as_deref(), Some("row has 3 fields, header has 8"));
        assert!(raw[1].region.is_null());
        assert_eq!(raw[2].defect.as_deref(), Some("row has 9 fields, header has 8"));
        assert!(raw[3].defect.is_none());
        Ok(())
    }

    #[test]
    fn test_non_utf8_cell_marks_row_defective() -> Result<()> {
        let dir = tempdir()?;
        let input = dir.path().join("in.csv");
        let mut bytes =
            b"sale_id,sale_date,product_name,category,region,quantity,unit_price\n1,2023-05-01,Caf".to_vec();
        bytes.extend_from_slice(&[0xE9, 0xFF]);
        bytes.extend_from_slice(b",Food,North,2,3.50\n2,2023-05-01,Tea,Food,North,1,2.00\n");
        fs::write(&input, bytes)?;

        let raw = read_sales_csv(&input)?;
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0].defect.as_deref(), Some("invalid UTF-8 in product_name"));
        assert_eq!(raw[0].label(), "1");
        assert!(raw[1].defect.is_none());
        Ok(())
    }

    #[test]
    fn test_empty_aggregate_writes_header_only() -> Result<()> {
        let dir = tempdir()?;
        let output = dir.path().join("out.csv");
        write_aggregated_csv(&output, &[])?;
        assert_eq!(fs::read_to_string(&output)?.trim_end(), OUTPUT_COLUMNS.join(","));
        Ok(())
    }

    #[test]
    fn test_extracted_rows_round_trip_through_table_reader() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("extracted.csv");
        let rows = vec![vec![
            Some("7".into()),
            Some("2023-01-02".into()),
            Some("Laptop".into()),
            Some("Computers".into()),
            Some("East".into()),
            Some("1".into()),
            Some("999.99".into()),
            None,
        ]];
        write_extracted_csv(&path, &rows)?;

        let table = read_table_csv(&path)?;
        assert_eq!(table.headers, INPUT_COLUMNS.to_vec());
        assert_eq!(table.rows, rows);
        assert_eq!(table.column_index("region"), Some(4));
        Ok(())
    }
}
