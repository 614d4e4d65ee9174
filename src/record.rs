//! Fixed-schema record for one school page, plus the canonical column order.
//!
//! Every exported row carries exactly these 24 columns, in this order,
//! regardless of which fields the source page actually populated. The
//! `Sir/Mam` column is never read from the page; it is derived from `Sex`.

/// Number of columns in the canonical export schema.
pub const COLUMN_COUNT: usize = 24;

/// Canonical column names, in export order.
///
/// These double as the table-row keys recognized during extraction
/// (matched case-insensitively), except for `Sir/Mam`, which is derived.
pub const COLUMNS: [&str; COLUMN_COUNT] = [
    "Name of Institution",
    "Affiliation Number",
    "State",
    "District",
    "Postal Address",
    "Pin Code",
    "Office",
    "Residence",
    "FAX No",
    "Email",
    "Website",
    "Year of Foundation",
    "Date of First Opening of School",
    "Name of Principal/ Head of Institution",
    "Sex",
    "Sir/Mam",
    "Principal's Educational/Professional Qualifications",
    "No of Experience (in Years) Administrative",
    "No of Experience (in Years) Teaching",
    "Status of The School",
    "Type of affiliation",
    "Affiliation Period From",
    "Affiliation Period To",
    "Name of Trust/ Society/ Managing Committee",
];

/// One extracted school record. Empty string means the field was absent
/// from the source page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchoolRecord {
    pub name: String,
    pub affiliation_number: String,
    pub state: String,
    pub district: String,
    pub postal_address: String,
    pub pin_code: String,
    pub office_phone: String,
    pub residence_phone: String,
    pub fax_no: String,
    pub email: String,
    pub website: String,
    pub year_of_foundation: String,
    pub date_of_first_opening: String,
    pub principal_name: String,
    pub sex: String,
    pub sir_mam: String,
    pub principal_qualifications: String,
    pub experience_administrative: String,
    pub experience_teaching: String,
    pub school_status: String,
    pub affiliation_type: String,
    pub affiliation_period_from: String,
    pub affiliation_period_to: String,
    pub trust_name: String,
}

impl SchoolRecord {
    /// Creates an all-empty record carrying the given affiliation number.
    #[must_use]
    pub fn for_affno(affno: u32) -> Self {
        Self {
            affiliation_number: affno.to_string(),
            ..Self::default()
        }
    }

    /// Recomputes the `Sir/Mam` salutation from the current `Sex` value.
    ///
    /// `Male` maps to `Sir`, `Female` to `Mam` (case-insensitive); any
    /// other value, including empty, maps to the neutral `Sir/Mam`.
    pub fn derive_salutation(&mut self) {
        self.sir_mam = if self.sex.eq_ignore_ascii_case("male") {
            "Sir".to_string()
        } else if self.sex.eq_ignore_ascii_case("female") {
            "Mam".to_string()
        } else {
            "Sir/Mam".to_string()
        };
    }

    /// Returns the record's fields in canonical column order.
    #[must_use]
    pub fn as_row(&self) -> [&str; COLUMN_COUNT] {
        [
            &self.name,
            &self.affiliation_number,
            &self.state,
            &self.district,
            &self.postal_address,
            &self.pin_code,
            &self.office_phone,
            &self.residence_phone,
            &self.fax_no,
            &self.email,
            &self.website,
            &self.year_of_foundation,
            &self.date_of_first_opening,
            &self.principal_name,
            &self.sex,
            &self.sir_mam,
            &self.principal_qualifications,
            &self.experience_administrative,
            &self.experience_teaching,
            &self.school_status,
            &self.affiliation_type,
            &self.affiliation_period_from,
            &self.affiliation_period_to,
            &self.trust_name,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_affno_sets_identifier_only() {
        let record = SchoolRecord::for_affno(1030005);
        assert_eq!(record.affiliation_number, "1030005");
        assert_eq!(record.name, "");
        assert_eq!(record.sir_mam, "");
    }

    #[test]
    fn test_columns_count_matches_row_width() {
        let record = SchoolRecord::default();
        assert_eq!(record.as_row().len(), COLUMNS.len());
        assert_eq!(COLUMNS.len(), COLUMN_COUNT);
    }

    #[test]
    fn test_sir_mam_immediately_after_sex() {
        let sex_index = COLUMNS.iter().position(|c| *c == "Sex").unwrap();
        assert_eq!(COLUMNS[sex_index + 1], "Sir/Mam");
    }

    #[test]
    fn test_derive_salutation_male() {
        let mut record = SchoolRecord {
            sex: "Male".to_string(),
            ..SchoolRecord::default()
        };
        record.derive_salutation();
        assert_eq!(record.sir_mam, "Sir");
    }

    #[test]
    fn test_derive_salutation_female_case_insensitive() {
        let mut record = SchoolRecord {
            sex: "FEMALE".to_string(),
            ..SchoolRecord::default()
        };
        record.derive_salutation();
        assert_eq!(record.sir_mam, "Mam");
    }

    #[test]
    fn test_derive_salutation_unknown_and_empty() {
        let mut record = SchoolRecord::default();
        record.derive_salutation();
        assert_eq!(record.sir_mam, "Sir/Mam");

        record.sex = "N/A".to_string();
        record.derive_salutation();
        assert_eq!(record.sir_mam, "Sir/Mam");
    }

    #[test]
    fn test_as_row_follows_column_order() {
        let record = SchoolRecord {
            name: "Test School".to_string(),
            sex: "Male".to_string(),
            sir_mam: "Sir".to_string(),
            trust_name: "Test Trust".to_string(),
            ..SchoolRecord::default()
        };
        let row = record.as_row();
        assert_eq!(row[0], "Test School");
        assert_eq!(row[14], "Male");
        assert_eq!(row[15], "Sir");
        assert_eq!(row[23], "Test Trust");
    }
}
