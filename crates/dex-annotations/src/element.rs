//! Element lookup inside an encoded annotation body

use crate::codec::skip_value;
use crate::error::DecodeError;
use crate::reader::EncodedReader;
use crate::resolver::{string_data, StringTable};
use crate::types::StringIndex;

/// Find the element called `name` in an annotation body.
///
/// Returns the offset of the element's value header within `body`.
/// Elements are scanned in stored order and the first match wins.
pub fn find_element<S: StringTable + ?Sized>(
    strings: &S,
    body: &[u8],
    name: &str,
) -> Result<Option<usize>, DecodeError> {
    let mut reader = EncodedReader::new(body);
    find_element_in(strings, &mut reader, name)
}

/// Like [`find_element`], for a body starting at the reader's position.
/// On a match the reader is left at the value header.
pub fn find_element_in<S: StringTable + ?Sized>(
    strings: &S,
    reader: &mut EncodedReader<'_>,
    name: &str,
) -> Result<Option<usize>, DecodeError> {
    reader.read_uleb128()?; // type index
    let count = reader.read_uleb128()?;
    for _ in 0..count {
        let name_index = StringIndex(reader.read_uleb128()?);
        if string_data(strings, name_index)? == name {
            return Ok(Some(reader.position()));
        }
        skip_value(reader)?;
    }
    Ok(None)
}
