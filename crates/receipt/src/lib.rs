pub mod escpos;
mod format;
mod printer;

pub use format::{format, render_bytes, ReceiptSnapshot, Segment, LINE_WIDTH};
pub use printer::{print_receipt, MemoryPrinter, PrintError, ReceiptPrinter, SerialPrinter};
