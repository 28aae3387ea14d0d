//! Chunk encoding
//!
//! A chunk is a batch of records serialized as JSON lines: one record per
//! line, newline-terminated. The format is self-delimiting, so a chunk can
//! be decoded without any out-of-band length table.

use mesh_core::Record;

use crate::error::PipelineResult;

/// Serialize a batch of records into chunk bytes
pub fn encode_chunk(records: &[Record]) -> PipelineResult<Vec<u8>> {
    let mut bytes = Vec::new();
    for record in records {
        serde_json::to_writer(&mut bytes, record)?;
        bytes.push(b'\n');
    }
    Ok(bytes)
}

/// Decode chunk bytes back into records
pub fn decode_chunk(bytes: &[u8]) -> PipelineResult<Vec<Record>> {
    let mut records = Vec::new();
    for line in bytes.split(|&b| b == b'\n') {
        if line.is_empty() {
            continue;
        }
        records.push(serde_json::from_slice(line)?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_core::RecordSource;

    fn record(uri: &str) -> Record {
        Record::new(
            uri,
            RecordSource::Portal,
            Some("3 bed house".to_string()),
            b"payload".to_vec(),
            chrono::Utc::now(),
        )
    }

    #[test]
    fn test_chunk_roundtrip() {
        let records = vec![record("listing/1"), record("listing/2")];
        let bytes = encode_chunk(&records).unwrap();
        let decoded = decode_chunk(&bytes).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].uri, "listing/1");
        assert_eq!(decoded[1].uri, "listing/2");
    }

    #[test]
    fn test_empty_chunk() {
        let bytes = encode_chunk(&[]).unwrap();
        assert!(bytes.is_empty());
        assert!(decode_chunk(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(decode_chunk(b"not json\n").is_err());
    }
}
