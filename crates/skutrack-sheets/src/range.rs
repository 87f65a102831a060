/// Builds an A1-notation range such as `Data!A:E`.
///
/// Sheet names made only of ASCII letters, digits and underscores are used
/// bare; anything else is single-quoted with embedded quotes doubled, as the
/// Sheets API requires.
#[must_use]
pub fn a1_range(sheet: &str, cells: &str) -> String {
    let bare = !sheet.is_empty()
        && sheet
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if bare {
        format!("{sheet}!{cells}")
    } else {
        format!("'{}'!{cells}", sheet.replace('\'', "''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_sheet_name_is_not_quoted() {
        assert_eq!(a1_range("Data", "A:E"), "Data!A:E");
        assert_eq!(a1_range("Sheet_1", "A:A"), "Sheet_1!A:A");
    }

    #[test]
    fn spaces_and_unicode_are_quoted() {
        assert_eq!(a1_range("Daily Data", "A:E"), "'Daily Data'!A:E");
        assert_eq!(a1_range("Артикулы", "A:A"), "'Артикулы'!A:A");
    }

    #[test]
    fn embedded_quote_is_doubled() {
        assert_eq!(a1_range("Bob's", "A:A"), "'Bob''s'!A:A");
    }
}
