use super::*;

fn client(base: &str) -> SheetsClient {
    SheetsClient::with_base_url(base, "sheet-123", "token", 5, "skutrack-test").unwrap()
}

#[test]
fn spreadsheet_url_root() {
    let c = client("https://sheets.googleapis.com/v4");
    assert_eq!(
        c.spreadsheet_url(&[]).as_str(),
        "https://sheets.googleapis.com/v4/spreadsheets/sheet-123"
    );
}

#[test]
fn spreadsheet_url_trailing_slash_on_base() {
    let c = client("https://sheets.googleapis.com/v4/");
    assert_eq!(
        c.spreadsheet_url(&["values", "Data!A:A"]).as_str(),
        "https://sheets.googleapis.com/v4/spreadsheets/sheet-123/values/Data!A:A"
    );
}

#[test]
fn spreadsheet_url_escapes_spaces_in_range() {
    let c = client("http://127.0.0.1:9999");
    let url = c.spreadsheet_url(&["values", "'Daily Data'!A:E"]);
    assert_eq!(
        url.path(),
        "/spreadsheets/sheet-123/values/'Daily%20Data'!A:E"
    );
}

#[test]
fn spreadsheet_url_escapes_slash_in_range() {
    let c = client("http://127.0.0.1:9999");
    let url = c.spreadsheet_url(&["values", "'a/b'!A:A"]);
    assert!(url.path().ends_with("/values/'a%2Fb'!A:A"), "got {url}");
}

#[test]
fn invalid_base_url_is_rejected() {
    let result = SheetsClient::with_base_url("not a url", "id", "t", 5, "ua");
    assert!(
        matches!(result, Err(SheetsError::InvalidBaseUrl { .. })),
        "expected InvalidBaseUrl"
    );
}

#[test]
fn cannot_be_a_base_url_is_rejected() {
    let result = SheetsClient::with_base_url("mailto:ops@example.com", "id", "t", 5, "ua");
    assert!(matches!(result, Err(SheetsError::InvalidBaseUrl { .. })));
}

#[test]
fn spreadsheet_id_accessor() {
    assert_eq!(client("https://example.com").spreadsheet_id(), "sheet-123");
}
