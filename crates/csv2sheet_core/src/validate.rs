//! File name checks for uploaded objects.

/// Extension of files we act on.
pub const CSV_EXTENSION: &str = ".csv";

/// Check if an object name refers to a csv file.
///
/// Case sensitive, "DATA.CSV" is not considered a csv file.
pub fn is_csv_file(name: &str) -> bool {
    name.ends_with(CSV_EXTENSION)
}

/// Get the name of the sheet to create for an uploaded file.
///
/// This is the object name with the trailing ".csv" removed. Any directory
/// prefix is kept as part of the name.
pub fn sheet_name_for(name: &str) -> Option<&str> {
    name.strip_suffix(CSV_EXTENSION)
}
