use std::io::BufRead;

use super::{
    buffer::SealedKeyBuffer,
    error::{IndexCorruptError, MaterializeError},
    RowIndex,
};
use crate::key::{KeyDecodeError, RowKey};

/// Read a sealed key buffer back into an ordered index.
///
/// Keys come back in file order, which is scan-delivery order. Every call
/// starts from the first line, so repeated calls on the same buffer agree.
/// A truncated buffer (left by a failed scan) reads as a shorter index.
pub fn materialize<K: RowKey>(
    buffer: &mut SealedKeyBuffer,
) -> Result<RowIndex<K>, MaterializeError> {
    let capacity = usize::try_from(buffer.len()).unwrap_or(0);
    let reader = buffer.reader()?;
    decode_lines(reader, capacity)
}

/// Decode every line of `reader` as a key.
pub(crate) fn decode_lines<K, R>(
    mut reader: R,
    capacity: usize,
) -> Result<RowIndex<K>, MaterializeError>
where
    K: RowKey,
    R: BufRead,
{
    let mut keys = Vec::with_capacity(capacity);
    let mut raw = Vec::new();
    let mut line_no = 0;
    loop {
        raw.clear();
        if reader.read_until(b'\n', &mut raw)? == 0 {
            break;
        }
        line_no += 1;
        let line = trim_line_end(&raw);
        let decoded = std::str::from_utf8(line)
            .map_err(KeyDecodeError::from)
            .and_then(K::decode_line);
        match decoded {
            Ok(key) => keys.push(key),
            Err(reason) => {
                return Err(IndexCorruptError {
                    line: line_no,
                    content: String::from_utf8_lossy(line).into_owned(),
                    reason,
                }
                .into())
            }
        }
    }
    Ok(RowIndex::new(keys))
}

fn trim_line_end(raw: &[u8]) -> &[u8] {
    let line = raw.strip_suffix(b"\n").unwrap_or(raw);
    line.strip_suffix(b"\r").unwrap_or(line)
}
