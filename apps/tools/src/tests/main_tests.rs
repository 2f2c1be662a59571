use super::*;

#[test]
fn hex_dump_rows_have_offsets_and_ascii() {
    let dump = hex_dump(b"\x1b@RFID ATM DEMO\n\x1dVA\x03");
    let lines: Vec<&str> = dump.lines().collect();

    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("00000000  1b 40 52 46"));
    assert!(lines[0].ends_with("|.@RFID ATM DEMO.|"));
    assert!(lines[1].starts_with("00000010  1d 56 41 03"));
}

#[test]
fn user_lines_are_sorted_by_uid() {
    let store = UserStore::builtin().expect("builtin store");
    let lines = user_lines(&store);

    assert_eq!(lines.len(), store.len());
    assert!(lines[0].starts_with("0A1B2C3D"));
    assert!(lines
        .iter()
        .any(|line| line.contains("Juan Dela Cruz") && line.contains("₱15,420.50")));
}

#[test]
fn issued_at_accepts_minutes_precision() {
    let at = parse_issued_at(Some("2024-03-01 08:30")).expect("valid");
    assert_eq!(at.to_string(), "2024-03-01 08:30:00");
    assert!(parse_issued_at(Some("yesterday")).is_err());
}
