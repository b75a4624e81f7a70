use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use thiserror::Error;

use super::model::{IpoDataset, IpoRecord};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Fatal failure to produce a dataset from a source.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("data file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV is missing required column '{0}'")]
    MissingColumn(String),
}

/// A single cell that could not be coerced; the row it belongs to is dropped.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("row {row}, column '{column}': cannot parse '{value}'")]
pub struct ParseError {
    /// 1-based data row (the header is not counted).
    pub row: usize,
    pub column: String,
    pub value: String,
}

// ---------------------------------------------------------------------------
// Column layout
// ---------------------------------------------------------------------------

const COL_NAME: &str = "IPOName";
const COL_DATE: &str = "Date";
const COL_YEAR: &str = "Year";
const COL_ISSUE_PRICE: &str = "Issue_Price";
const COL_ISSUE_SIZE: &str = "Issue_Size";
const COL_GAIN: &str = "Listing_Gains_Percent";
const COL_QIB: &str = "Subscription_QIB";
const COL_HNI: &str = "Subscription_HNI";
const COL_RII: &str = "Subscription_RII";
const COL_TOTAL: &str = "Subscription_Total";

/// Header positions resolved once per file.
struct Columns {
    name: usize,
    date: Option<usize>,
    year: Option<usize>,
    issue_price: usize,
    issue_size: usize,
    gain: usize,
    qib: usize,
    hni: Option<usize>,
    rii: usize,
    total: Option<usize>,
}

impl Columns {
    fn resolve(headers: &csv::StringRecord) -> Result<Self, LoadError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require = |name: &str| find(name).ok_or_else(|| LoadError::MissingColumn(name.to_string()));

        let date = find(COL_DATE);
        let year = find(COL_YEAR);
        if date.is_none() && year.is_none() {
            return Err(LoadError::MissingColumn(COL_DATE.to_string()));
        }

        Ok(Columns {
            name: require(COL_NAME)?,
            date,
            year,
            issue_price: require(COL_ISSUE_PRICE)?,
            issue_size: require(COL_ISSUE_SIZE)?,
            gain: require(COL_GAIN)?,
            qib: require(COL_QIB)?,
            hni: find(COL_HNI),
            rii: require(COL_RII)?,
            total: find(COL_TOTAL),
        })
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load the IPO table from a CSV file on disk.
pub fn load_file(path: &Path) -> Result<IpoDataset, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let dataset = load_reader(file)?;
    log::info!(
        "Loaded {} IPO records from {} ({} rows skipped)",
        dataset.len(),
        path.display(),
        dataset.skipped.len()
    );
    Ok(dataset)
}

/// Load the IPO table from any CSV byte source.
///
/// Rows whose required fields fail to parse are dropped and reported in
/// [`IpoDataset::skipped`]; blank or malformed optional fields become `None`.
pub fn load_reader<R: Read>(reader: R) -> Result<IpoDataset, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let columns = Columns::resolve(&headers)?;

    let mut records = Vec::new();
    let mut skipped = Vec::new();

    // Byte records so that a mis-encoded cell only costs its own row.
    for (i, result) in reader.byte_records().enumerate() {
        let row_no = i + 1;
        let parsed = match csv::StringRecord::from_byte_record(result?) {
            Ok(row) => parse_row(&row, &columns, row_no),
            Err(e) => Err(utf8_error(&headers, row_no, e)),
        };
        match parsed {
            Ok(record) => records.push(record),
            Err(e) => {
                log::warn!("Skipping IPO row: {e}");
                skipped.push(e);
            }
        }
    }

    Ok(IpoDataset::from_records(records, skipped))
}

// ---------------------------------------------------------------------------
// Row parsing
// ---------------------------------------------------------------------------

fn utf8_error(headers: &csv::StringRecord, row_no: usize, err: csv::FromUtf8Error) -> ParseError {
    let field = err.utf8_error().field();
    let value = err
        .into_byte_record()
        .get(field)
        .map(|raw| String::from_utf8_lossy(raw).into_owned())
        .unwrap_or_default();
    ParseError {
        row: row_no,
        column: headers.get(field).unwrap_or_default().to_string(),
        value,
    }
}

fn parse_row(row: &csv::StringRecord, cols: &Columns, row_no: usize) -> Result<IpoRecord, ParseError> {
    let cell = |idx: usize| row.get(idx).unwrap_or("");
    let fail = |column: &str, value: &str| ParseError {
        row: row_no,
        column: column.to_string(),
        value: value.to_string(),
    };
    let required = |idx: usize, column: &str| {
        let raw = cell(idx);
        parse_display_number(raw).ok_or_else(|| fail(column, raw))
    };
    let optional = |idx: Option<usize>| idx.and_then(|i| parse_display_number(cell(i)));

    let company_name = cell(cols.name);
    if company_name.is_empty() {
        return Err(fail(COL_NAME, company_name));
    }

    let listing_date = cols.date.and_then(|i| parse_date(cell(i)));
    let (listing_year, year_column, year_idx) = match (listing_date, cols.date, cols.year) {
        (Some(date), Some(i), _) => (date.year(), COL_DATE, i),
        (None, _, Some(i)) => {
            let year = cell(i).parse::<i32>().map_err(|_| fail(COL_YEAR, cell(i)))?;
            (year, COL_YEAR, i)
        }
        _ => return Err(fail(COL_DATE, cols.date.map(cell).unwrap_or(""))),
    };
    if !(1000..=9999).contains(&listing_year) {
        return Err(fail(year_column, cell(year_idx)));
    }

    Ok(IpoRecord {
        company_name: company_name.to_string(),
        listing_date,
        listing_year,
        issue_price: required(cols.issue_price, COL_ISSUE_PRICE)?,
        issue_size: required(cols.issue_size, COL_ISSUE_SIZE)?,
        listing_gain_percent: required(cols.gain, COL_GAIN)?,
        qib_subscription: required(cols.qib, COL_QIB)?,
        hni_subscription: optional(cols.hni),
        rii_subscription: required(cols.rii, COL_RII)?,
        total_subscription: optional(cols.total),
    })
}

/// Parse the listing date. Two-digit years are tried first so that
/// `03/02/10` is read as 2010 rather than year 10.
fn parse_date(s: &str) -> Option<NaiveDate> {
    const FORMATS: [&str; 4] = ["%d/%m/%y", "%d/%m/%Y", "%Y-%m-%d", "%d-%m-%Y"];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Coerce a display-formatted amount (`₹1,234.5`, `12.3%`, `45.2x`,
/// `(3.1)`, `500 Cr`) to a number.
pub fn parse_display_number(s: &str) -> Option<f64> {
    let mut s = s.trim();
    let mut negative = false;

    if let Some(inner) = s.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        negative = true;
        s = inner.trim();
    }
    if let Some(rest) = s.strip_prefix('-') {
        negative = !negative;
        s = rest.trim_start();
    }

    for prefix in ["₹", "$", "Rs.", "Rs", "INR"] {
        if let Some(rest) = s.strip_prefix(prefix) {
            s = rest.trim_start();
            break;
        }
    }
    for suffix in ["%", "x", "X", "Cr.", "Cr", "cr"] {
        if let Some(rest) = s.strip_suffix(suffix) {
            s = rest.trim_end();
            break;
        }
    }

    let cleaned: String = s.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return None;
    }
    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "Date,IPOName,Issue_Size,Subscription_QIB,Subscription_HNI,Subscription_RII,Subscription_Total,Issue_Price,Listing_Gains_Percent";

    fn write_csv(body: &str) -> NamedTempFile {
        let mut tmp = NamedTempFile::new().expect("temp file");
        write!(tmp, "{body}").expect("write csv");
        tmp.flush().expect("flush");
        tmp
    }

    #[test]
    fn loads_every_data_line() {
        let csv = format!(
            "{HEADER}\n\
             03/02/10,Infinite Comp,189.8,48.44,106.02,11.08,43.22,165,11.82\n\
             08/02/10,Jubilant Food,328.7,59.39,51.95,3.79,31.11,145,-84.21\n\
             15/02/10,Syncom Health,56.25,0.99,16.6,6.25,5.17,75,17.13\n"
        );
        let tmp = write_csv(&csv);
        let ds = load_file(tmp.path()).expect("load");

        assert_eq!(ds.len(), 3);
        assert!(ds.skipped.is_empty());
        let first = &ds.records[0];
        assert_eq!(first.company_name, "Infinite Comp");
        assert_eq!(first.listing_date, NaiveDate::from_ymd_opt(2010, 2, 3));
        assert_eq!(first.listing_year, 2010);
        assert_eq!(first.issue_price, 165.0);
        assert_eq!(first.hni_subscription, Some(106.02));
        assert_eq!(ds.records[1].listing_gain_percent, -84.21);
    }

    #[test]
    fn strips_display_formatting() {
        let csv = format!(
            "{HEADER}\n\
             12/05/21,Alpha Ltd,\"₹1,250.5 Cr\",12.5x,3x,4.25x,8x,₹520,12.5%\n"
        );
        let ds = load_reader(csv.as_bytes()).expect("load");
        let r = &ds.records[0];
        assert_eq!(r.issue_size, 1250.5);
        assert_eq!(r.qib_subscription, 12.5);
        assert_eq!(r.rii_subscription, 4.25);
        assert_eq!(r.issue_price, 520.0);
        assert_eq!(r.listing_gain_percent, 12.5);
    }

    #[test]
    fn display_number_variants() {
        assert_eq!(parse_display_number("(3.5%)"), Some(-3.5));
        assert_eq!(parse_display_number("-₹ 1,000"), Some(-1000.0));
        assert_eq!(parse_display_number("Rs. 99"), Some(99.0));
        assert_eq!(parse_display_number("  "), None);
        assert_eq!(parse_display_number("n/a"), None);
        assert_eq!(parse_display_number("NaN"), None);
    }

    #[test]
    fn drops_rows_with_unparseable_required_fields() {
        let csv = format!(
            "{HEADER}\n\
             03/02/10,Good One,189.8,48.44,106.02,11.08,43.22,165,11.82\n\
             08/02/10,Bad Gain,328.7,59.39,51.95,3.79,31.11,145,n/a\n\
             not-a-date,Bad Date,56.25,0.99,16.6,6.25,5.17,75,17.13\n\
             15/02/10,Blank Hni,56.25,0.99,,6.25,,75,17.13\n"
        );
        let ds = load_reader(csv.as_bytes()).expect("load");

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.skipped.len(), 2);
        assert_eq!(
            ds.skipped[0],
            ParseError {
                row: 2,
                column: COL_GAIN.to_string(),
                value: "n/a".to_string(),
            }
        );
        assert_eq!(ds.skipped[1].column, COL_DATE);

        let blank = &ds.records[1];
        assert_eq!(blank.company_name, "Blank Hni");
        assert_eq!(blank.hni_subscription, None);
        assert_eq!(blank.total_subscription, None);
    }

    #[test]
    fn mis_encoded_row_is_skipped_not_fatal() {
        let mut bytes = format!(
            "{HEADER}\n03/02/10,Good,189.8,48.44,106.02,11.08,43.22,165,11.82\n04/02/10,Caf"
        )
        .into_bytes();
        // Latin-1 'é' is not valid UTF-8.
        bytes.push(0xE9);
        bytes.extend_from_slice(
            b" Ltd,100,2,3,4,5,50,1.0\n05/02/10,Also Good,56.25,0.99,16.6,6.25,5.17,75,17.13\n",
        );

        let ds = load_reader(bytes.as_slice()).expect("load");
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[1].company_name, "Also Good");
        assert_eq!(ds.skipped.len(), 1);
        let bad = &ds.skipped[0];
        assert_eq!(bad.row, 2);
        assert_eq!(bad.column, COL_NAME);
        assert_eq!(bad.value, "Caf\u{FFFD} Ltd");
    }

    #[test]
    fn out_of_range_year_reports_its_own_cell() {
        let csv = format!("{HEADER}\n03/02/0999,Ancient,1,1,1,1,1,1,1\n");
        let ds = load_reader(csv.as_bytes()).expect("load");
        assert!(ds.is_empty());
        assert_eq!(ds.skipped[0].column, COL_DATE);
        assert_eq!(ds.skipped[0].value, "03/02/0999");
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let err = load_file(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn missing_required_column_is_a_load_error() {
        let csv = "Date,IPOName,Issue_Size,Subscription_QIB,Subscription_RII,Issue_Price\n\
                   03/02/10,X,1,1,1,1\n";
        let err = load_reader(csv.as_bytes()).unwrap_err();
        match err {
            LoadError::MissingColumn(col) => assert_eq!(col, COL_GAIN),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn year_column_replaces_date_and_headers_are_trimmed() {
        let csv = " Year , IPOName ,Issue_Size,Subscription_QIB,Subscription_RII,Issue_Price,Listing_Gains_Percent\n\
                   2022,Delta,100,2,3,50,-1.5\n\
                   22,Short Year,100,2,3,50,1.0\n";
        let ds = load_reader(csv.as_bytes()).expect("load");
        assert_eq!(ds.len(), 1);
        let r = &ds.records[0];
        assert_eq!(r.listing_year, 2022);
        assert_eq!(r.listing_date, None);
        assert_eq!(r.hni_subscription, None);
        assert_eq!(ds.skipped[0].column, COL_YEAR);
    }

    #[test]
    fn neither_date_nor_year_column() {
        let csv = "IPOName,Issue_Size,Subscription_QIB,Subscription_RII,Issue_Price,Listing_Gains_Percent\n";
        let err = load_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn(c) if c == COL_DATE));
    }
}
