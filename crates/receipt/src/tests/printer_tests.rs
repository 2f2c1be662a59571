use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::*;
use crate::{format, render_bytes, ReceiptSnapshot};

fn segments() -> Vec<Segment> {
    format(&ReceiptSnapshot {
        name: Some("Juan Dela Cruz".to_string()),
        card_number: Some("4532 8812 0045 3456".to_string()),
        account_type: Some("Savings".to_string()),
        balance: Some(Decimal::new(1542050, 2)),
        issued_at: NaiveDate::from_ymd_opt(2024, 3, 1)
            .and_then(|d| d.and_hms_opt(8, 30, 0))
            .expect("timestamp"),
    })
}

#[tokio::test]
async fn full_receipt_reaches_the_printer_in_order() {
    let printer = MemoryPrinter::new();
    let segments = segments();

    let written = print_receipt(&printer, &segments).await.expect("print");
    let expected = render_bytes(&segments);
    assert_eq!(written, expected.len());
    assert_eq!(printer.bytes(), expected);
}

#[tokio::test]
async fn write_failure_aborts_the_remaining_segments() {
    let printer = MemoryPrinter::failing_after(3);
    let segments = segments();

    let err = print_receipt(&printer, &segments)
        .await
        .expect_err("should abort");
    assert!(matches!(err, PrintError::PrintFailed { segment: 3, .. }));

    let partial: Vec<u8> = segments[..3].iter().flat_map(Segment::to_bytes).collect();
    assert_eq!(printer.bytes(), partial);
}

#[test]
fn opening_a_missing_serial_device_reports_unavailable() {
    let result = SerialPrinter::open("/dev/does-not-exist-printer", 9600);
    assert!(matches!(result, Err(PrintError::HardwareUnavailable(_))));
}
