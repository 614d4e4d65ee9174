//! HTML table extraction into fixed-schema records.
//!
//! The directory renders one school per page as a two-column table:
//! field name in the first cell, value in the second. Extraction walks
//! the first table in the document and assigns recognized keys into a
//! [`SchoolRecord`], normalizing each value on the way in.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::trace;

use crate::normalize::{FieldRole, normalize};
use crate::record::SchoolRecord;

static TABLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| parse_selector("table"));
static ROW_SELECTOR: LazyLock<Selector> = LazyLock::new(|| parse_selector("tr"));
static CELL_SELECTOR: LazyLock<Selector> = LazyLock::new(|| parse_selector("td"));

#[allow(clippy::expect_used)]
fn parse_selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector must parse")
}

/// Extracts a [`SchoolRecord`] from one raw page body.
///
/// The record always carries `affno` as its affiliation number and a
/// salutation derived from `Sex`. A page with no table, or no rows
/// matching a known field name, yields an otherwise-empty record; that
/// is a valid "no data found" result, not an error. Rows whose key is
/// not a known field name are ignored.
#[must_use]
pub fn extract_record(body: &str, affno: u32) -> SchoolRecord {
    let mut record = SchoolRecord::for_affno(affno);

    let document = Html::parse_document(body);
    if let Some(table) = document.select(&TABLE_SELECTOR).next() {
        for row in table.select(&ROW_SELECTOR) {
            let mut cells = row.select(&CELL_SELECTOR);
            let (Some(key_cell), Some(value_cell)) = (cells.next(), cells.next()) else {
                continue;
            };
            let key = collapse_whitespace(&cell_text(key_cell)).to_lowercase();
            let value = cell_text(value_cell);
            apply_field(&mut record, &key, value.trim());
        }
    } else {
        trace!(affno, "page has no table");
    }

    // The salutation is derived, never read from the page; recompute it
    // from whatever Sex value the record ended up with (possibly none).
    record.derive_salutation();
    record
}

/// Assigns a raw key/value pair into the record, if the key is one of
/// the known field names (already lowercased by the caller).
fn apply_field(record: &mut SchoolRecord, key: &str, value: &str) {
    match key {
        "name of institution" => record.name = normalize(FieldRole::General, value),
        // The affiliation number is the request identifier; the page copy
        // never overrides it.
        "affiliation number" => {}
        "state" => record.state = normalize(FieldRole::General, value),
        "district" => record.district = normalize(FieldRole::General, value),
        "postal address" => record.postal_address = normalize(FieldRole::General, value),
        "pin code" => record.pin_code = normalize(FieldRole::General, value),
        "office" => record.office_phone = normalize_multiline(value),
        "residence" => record.residence_phone = normalize_multiline(value),
        "fax no" => record.fax_no = normalize(FieldRole::General, value),
        "email" => record.email = normalize(FieldRole::Email, value),
        "website" => record.website = normalize(FieldRole::Website, value),
        "year of foundation" => {
            record.year_of_foundation = normalize(FieldRole::General, value);
        }
        "date of first opening of school" => {
            record.date_of_first_opening = normalize(FieldRole::General, value);
        }
        "name of principal/ head of institution" => {
            record.principal_name = normalize(FieldRole::General, value);
        }
        "sex" => record.sex = normalize(FieldRole::General, value),
        "principal's educational/professional qualifications" => {
            record.principal_qualifications = normalize(FieldRole::General, value);
        }
        "no of experience (in years) administrative" => {
            record.experience_administrative = normalize(FieldRole::General, value);
        }
        "no of experience (in years) teaching" => {
            record.experience_teaching = normalize(FieldRole::General, value);
        }
        "status of the school" => record.school_status = normalize(FieldRole::General, value),
        "type of affiliation" => record.affiliation_type = normalize(FieldRole::General, value),
        "affiliation period from" => {
            record.affiliation_period_from = normalize(FieldRole::General, value);
        }
        "affiliation period to" => {
            record.affiliation_period_to = normalize(FieldRole::General, value);
        }
        "name of trust/ society/ managing committee" => {
            record.trust_name = normalize(FieldRole::General, value);
        }
        _ => trace!(key, "ignoring unrecognized table row"),
    }
}

/// Office/Residence phone cells can hold several numbers separated by
/// line breaks. Each segment is normalized independently and the blank
/// ones are dropped.
fn normalize_multiline(value: &str) -> String {
    value
        .lines()
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| normalize(FieldRole::General, segment))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Collects a cell's text content. Text nodes are joined with newlines
/// so that `<br>`-separated values survive as separate lines.
fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
