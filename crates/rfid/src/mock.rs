use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use shared::domain::Uid;

use crate::{CardReader, ReaderError, ReaderKind};

/// UIDs the demo rotation cycles through; all exist in the built-in store.
pub const DEMO_ROTATION: [&str; 3] = ["A1B2C3D4", "E5F6A7B8", "C9D0E1F2"];

/// Replays a fixed sequence of reads, wrapping around at the end.
#[derive(Debug)]
pub struct MockCardReader {
    rotation: Vec<Option<Uid>>,
    cursor: AtomicUsize,
}

impl MockCardReader {
    pub fn new(uids: impl IntoIterator<Item = Uid>) -> Self {
        Self::scripted(uids.into_iter().map(Some).collect())
    }

    /// `None` entries simulate an empty reader on that tick.
    pub fn scripted(rotation: Vec<Option<Uid>>) -> Self {
        Self {
            rotation,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn demo() -> Self {
        Self::new(DEMO_ROTATION.iter().copied().map(Uid::from))
    }
}

#[async_trait]
impl CardReader for MockCardReader {
    fn kind(&self) -> ReaderKind {
        ReaderKind::Mock
    }

    async fn read_once(&self) -> Result<Option<Uid>, ReaderError> {
        if self.rotation.is_empty() {
            return Ok(None);
        }
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % self.rotation.len();
        Ok(self.rotation[idx].clone())
    }
}

#[cfg(test)]
#[path = "tests/mock_tests.rs"]
mod tests;
