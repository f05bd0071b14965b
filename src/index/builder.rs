use super::{buffer::KeyBuffer, error::ScanError};
use crate::{
    key::RowKey,
    option::CollectionRef,
    store::{Record, ScanRequest, StoreClient, StoreError},
};

/// Stream the primary keys of `collection` into `sink`.
///
/// The scan projects only `key_column`. Each visited record has its key
/// appended as soon as it arrives, so memory use does not grow with the
/// collection. Returns the number of keys written.
///
/// On failure the sink keeps whatever was appended before the error.
pub fn build_index<K, C>(
    client: &mut C,
    collection: &CollectionRef,
    key_column: &str,
    sink: &mut KeyBuffer,
) -> Result<u64, ScanError>
where
    K: RowKey,
    C: StoreClient + ?Sized,
{
    let request =
        ScanRequest::new(&collection.namespace, &collection.set_name).select([key_column]);
    let mut written = 0u64;
    let mut failure = None;

    let outcome = client.scan(&request, &mut |record: Record| {
        let Some(key) = K::from_record(&record, key_column) else {
            failure = Some(ScanError::MissingKey { position: written });
            return Err(StoreError::Aborted("record without primary key".to_string()));
        };
        if let Err(err) = sink.append(&key) {
            failure = Some(ScanError::Buffer(err));
            return Err(StoreError::Aborted("key buffer write failed".to_string()));
        }
        written += 1;
        Ok(())
    });

    if let Some(err) = failure {
        return Err(err);
    }
    outcome.map_err(ScanError::Store)?;
    Ok(written)
}
