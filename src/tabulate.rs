//! Splits raw CSV text into a header row and data rows.
//!
//! Fields are produced by a naive split on `,`: quoted fields and escaped
//! commas are not supported. Lines that are empty or whitespace-only are
//! discarded before anything else happens, so they never count as data rows.

/// Tabulated view of one CSV file. A pure function of the input text.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Splits `text` into a header and data rows.
///
/// The first surviving line is the header; its fields are trimmed but their
/// uniqueness is not enforced. Data-row field counts are not validated
/// against the header: short and long rows are tolerated silently, and a
/// missing trailing field simply yields nothing when sampled.
pub fn tabulate(text: &str) -> CsvTable {
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());

    let headers = match lines.next() {
        Some(header_line) => header_line
            .split(',')
            .map(|field| field.trim().to_string())
            .collect(),
        None => Vec::new(),
    };

    let rows = lines
        .map(|line| line.split(',').map(str::to_string).collect())
        .collect();

    CsvTable { headers, rows }
}

impl CsvTable {
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Collects up to `limit` non-empty trimmed values for the column at
    /// `index`, in row order. Rows too short to reach `index` contribute
    /// nothing.
    pub fn column_samples(&self, index: usize, limit: usize) -> Vec<String> {
        self.rows
            .iter()
            .filter_map(|row| row.get(index))
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .take(limit)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_header_and_data_rows() {
        let table = tabulate("name,age\nAlice,30\nBob,25\n");

        assert_eq!(table.headers(), &["name", "age"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_count(), 2);
    }

    #[test]
    fn discards_blank_and_whitespace_lines() {
        let table = tabulate("a,b\n1,2\n\n   \n3,4\n");

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows()[1], vec!["3", "4"]);
    }

    #[test]
    fn trims_header_fields_only() {
        let table = tabulate(" name , age \n Alice ,30\n");

        assert_eq!(table.headers(), &["name", "age"]);
        assert_eq!(table.rows()[0][0], " Alice ");
    }

    #[test]
    fn empty_input_yields_empty_table() {
        let table = tabulate("");

        assert!(table.headers().is_empty());
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn duplicate_header_names_are_preserved_in_order() {
        let table = tabulate("id,value,id\n1,2,3\n");

        assert_eq!(table.headers(), &["id", "value", "id"]);
    }

    #[test]
    fn column_samples_skip_blank_cells_and_respect_the_limit() {
        let table = tabulate("v\n1\n\n \n2\n3\n4\n5\n6\n7\n");

        assert_eq!(table.column_samples(0, 5), vec!["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn short_rows_contribute_nothing_for_missing_trailing_columns() {
        let table = tabulate("a,b\n1\n2,3\n");

        assert_eq!(table.column_samples(1, 5), vec!["3"]);
    }

    #[test]
    fn same_input_always_yields_the_same_output() {
        let input = "x,y\n1,2\n3,4\n";

        assert_eq!(tabulate(input), tabulate(input));
    }
}
