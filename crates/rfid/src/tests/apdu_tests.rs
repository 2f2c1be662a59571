use super::*;

#[test]
fn decodes_uid_before_success_status() {
    let uid = uid_from_response(&[0xA1, 0xB2, 0xC3, 0xD4, 0x90, 0x00]).expect("uid");
    assert_eq!(uid.as_str(), "A1B2C3D4");
}

#[test]
fn rejects_error_status_words() {
    let err = uid_from_response(&[0x6A, 0x81]).expect_err("unsupported");
    assert_eq!(
        err,
        ReaderError::ReadFailed("reader returned status 6A81".to_string())
    );
}

#[test]
fn rejects_short_and_empty_replies() {
    assert!(uid_from_response(&[0x90]).is_err());
    assert!(uid_from_response(&[0x90, 0x00]).is_err());
}
