//! Length-delimited export of extended descriptions.

use std::io::Write;

use prost::Message;
use tracing::info;

use crate::error::TerminologyResult;
use crate::svc::TerminologySvc;

impl TerminologySvc {
    /// Streams every extended description to `writer` as length-delimited
    /// protobuf frames (varint frame length, then the encoded message).
    ///
    /// Returns the number of frames written.
    pub fn export<W: Write>(&self, writer: &mut W) -> TerminologyResult<usize> {
        let mut count = 0;
        let mut buf = Vec::new();

        let mut failure: Option<crate::TerminologyError> = None;
        let walked = self.store.iterate_concepts(|concept| {
            let extended = match self.extended_descriptions_for(&concept) {
                Ok(extended) => extended,
                Err(e) => {
                    failure = Some(e);
                    return Err(sct_store::StoreError::Io(std::io::Error::other(
                        "export aborted",
                    )));
                }
            };
            for frame in extended {
                buf.clear();
                frame
                    .encode_length_delimited(&mut buf)
                    .expect("vec write is infallible");
                if let Err(e) = writer.write_all(&buf) {
                    failure = Some(crate::TerminologyError::Store(e.into()));
                    return Err(sct_store::StoreError::Io(std::io::Error::other(
                        "export aborted",
                    )));
                }
                count += 1;
            }
            Ok(())
        });

        // A stashed failure is the real cause; the marker error that stopped
        // the walk only exists to carry it out.
        if let Some(e) = failure {
            return Err(e);
        }
        walked?;
        info!(frames = count, "export complete");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use prost::Message;
    use sct_types::ExtendedDescription;

    #[test]
    fn test_length_delimited_roundtrip() {
        let frame = ExtendedDescription {
            recursive_parent_ids: vec![138875005],
            ..Default::default()
        };
        let mut buf = Vec::new();
        frame.encode_length_delimited(&mut buf).unwrap();

        let decoded = ExtendedDescription::decode_length_delimited(buf.as_slice()).unwrap();
        assert_eq!(decoded, frame);
    }
}
