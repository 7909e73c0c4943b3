//! Asynchronous CSV reader with batch interface
//!
//! Streams transfer rows from a CSV source and hands them out in batches, so a
//! replay holds at most one batch of requests in memory.
//!
//! ```text
//! CSV source → AsyncReader → Batches of TransferRequests
//!                  ↓
//!           csv_format module
//!           (CsvTransferRecord, convert_csv_record)
//! ```

use crate::io::csv_format::{convert_csv_record, CsvTransferRecord};
use crate::types::TransferRequest;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;

/// Asynchronous transfer CSV reader
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    skipped: u64,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            skipped: 0,
        }
    }

    /// Read up to `batch_size` transfer requests
    ///
    /// Malformed rows are logged and skipped. An empty batch means the end of
    /// the input.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<TransferRequest> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut skipped = 0;
        let mut records = self.csv_reader.deserialize::<CsvTransferRecord>();

        while batch.len() < batch_size {
            match records.next().await {
                Some(Ok(record)) => match convert_csv_record(record) {
                    Ok(request) => batch.push(request),
                    Err(e) => {
                        skipped += 1;
                        tracing::warn!(error = %e, "skipping transfer row");
                    }
                },
                Some(Err(e)) => {
                    skipped += 1;
                    tracing::warn!(error = %e, "skipping malformed CSV row");
                }
                None => break,
            }
        }

        self.skipped += skipped;
        batch
    }

    /// Rows dropped so far because they could not be parsed
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}
