use shared::domain::Uid;

use crate::ReaderError;

/// PC/SC pseudo-APDU that asks a contactless reader for the card UID.
pub const GET_UID: [u8; 5] = [0xFF, 0xCA, 0x00, 0x00, 0x00];

const SW_SUCCESS: [u8; 2] = [0x90, 0x00];

/// Strips the trailing status word from a GET DATA reply and hex-encodes the UID.
pub fn uid_from_response(reply: &[u8]) -> Result<Uid, ReaderError> {
    let Some((data, status)) = reply.split_last_chunk::<2>() else {
        return Err(ReaderError::ReadFailed(format!(
            "short UID response ({} bytes)",
            reply.len()
        )));
    };
    if *status != SW_SUCCESS {
        return Err(ReaderError::ReadFailed(format!(
            "reader returned status {:02X}{:02X}",
            status[0], status[1]
        )));
    }
    if data.is_empty() {
        return Err(ReaderError::ReadFailed("empty UID".to_string()));
    }
    Ok(Uid::from_bytes(data))
}

#[cfg(test)]
#[path = "tests/apdu_tests.rs"]
mod tests;
