//! Encoded value codec: decode mode and skip mode
//!
//! [`decode_value`] and [`skip_value`] consume exactly the same bytes for
//! any input. Both read the header through [`ValueHeader::read`] and then
//! dispatch on the same [`PayloadShape`]; they differ only in whether the
//! payload is turned into a [`RawValue`].

use crate::error::DecodeError;
use crate::reader::EncodedReader;
use crate::types::{StringIndex, TypeIndex};
use crate::value::{PayloadShape, Primitive, RawAnnotation, RawValue, ValueHeader, ValueType};

/// Decode one value, recursing into arrays and annotations
pub fn decode_value(reader: &mut EncodedReader<'_>) -> Result<RawValue, DecodeError> {
    let header = ValueHeader::read(reader)?;
    decode_payload(header, reader)
}

/// Decode the payload of a value whose header was already read
pub fn decode_payload(
    header: ValueHeader,
    reader: &mut EncodedReader<'_>,
) -> Result<RawValue, DecodeError> {
    match header.value_type.shape() {
        PayloadShape::Sized | PayloadShape::Empty => decode_scalar(header, reader),
        PayloadShape::Array => {
            let size = reader.read_uleb128()?;
            let mut values = Vec::with_capacity(bounded_capacity(size, reader));
            for _ in 0..size {
                values.push(decode_value(reader)?);
            }
            Ok(RawValue::Array(values))
        }
        PayloadShape::Annotation => Ok(RawValue::Annotation(decode_annotation(reader)?)),
    }
}

/// Advance past one value without materializing it
pub fn skip_value(reader: &mut EncodedReader<'_>) -> Result<(), DecodeError> {
    let header = ValueHeader::read(reader)?;
    skip_payload(header, reader)
}

/// Advance past the payload of a value whose header was already read
pub fn skip_payload(header: ValueHeader, reader: &mut EncodedReader<'_>) -> Result<(), DecodeError> {
    match header.value_type.shape() {
        PayloadShape::Sized => reader.skip(header.width()),
        PayloadShape::Empty => Ok(()),
        PayloadShape::Array => {
            let size = reader.read_uleb128()?;
            skip_values(size, reader)
        }
        PayloadShape::Annotation => {
            reader.read_uleb128()?; // type index
            let count = reader.read_uleb128()?;
            skip_elements(count, reader)
        }
    }
}

/// Skip `count` consecutive values (the remainder of an array)
pub fn skip_values(count: u32, reader: &mut EncodedReader<'_>) -> Result<(), DecodeError> {
    for _ in 0..count {
        skip_value(reader)?;
    }
    Ok(())
}

/// Skip `count` consecutive (name, value) pairs
pub fn skip_elements(count: u32, reader: &mut EncodedReader<'_>) -> Result<(), DecodeError> {
    for _ in 0..count {
        reader.read_uleb128()?; // name index
        skip_value(reader)?;
    }
    Ok(())
}

/// Decode an annotation body: type index, element count, (name, value) pairs
pub fn decode_annotation(reader: &mut EncodedReader<'_>) -> Result<RawAnnotation, DecodeError> {
    let type_index = TypeIndex(reader.read_uleb128()?);
    let count = reader.read_uleb128()?;
    let mut elements = Vec::with_capacity(bounded_capacity(count, reader));
    for _ in 0..count {
        let name = StringIndex(reader.read_uleb128()?);
        elements.push((name, decode_value(reader)?));
    }
    Ok(RawAnnotation {
        type_index,
        elements,
    })
}

/// Decode the payload of a sized or empty value. Array and annotation
/// headers fall through to [`decode_payload`].
pub(crate) fn decode_scalar(
    header: ValueHeader,
    reader: &mut EncodedReader<'_>,
) -> Result<RawValue, DecodeError> {
    let width = header.width();
    let value = match header.value_type {
        ValueType::Byte => RawValue::Primitive(Primitive::Byte(reader.read_signed(width)? as i8)),
        ValueType::Short => {
            RawValue::Primitive(Primitive::Short(reader.read_signed(width)? as i16))
        }
        ValueType::Char => {
            RawValue::Primitive(Primitive::Char(reader.read_unsigned(width)? as u16))
        }
        ValueType::Int => RawValue::Primitive(Primitive::Int(reader.read_signed(width)? as i32)),
        ValueType::Long => RawValue::Primitive(Primitive::Long(reader.read_signed(width)?)),
        ValueType::Float => {
            let bits = reader.read_right_justified(width, 4)? as u32;
            RawValue::Primitive(Primitive::Float(f32::from_bits(bits)))
        }
        ValueType::Double => {
            let bits = reader.read_right_justified(width, 8)?;
            RawValue::Primitive(Primitive::Double(f64::from_bits(bits)))
        }
        ValueType::Boolean => RawValue::Primitive(Primitive::Boolean(header.arg != 0)),
        ValueType::Null => RawValue::Null,
        ValueType::String
        | ValueType::Type
        | ValueType::Field
        | ValueType::Method
        | ValueType::Enum => RawValue::Reference {
            value_type: header.value_type,
            index: reader.read_unsigned(width)? as u32,
        },
        ValueType::Array | ValueType::Annotation => decode_payload(header, reader)?,
    };
    Ok(value)
}

/// Capacity hint for a decoded sequence: never more than one slot per
/// remaining byte, since every value takes at least one byte.
pub(crate) fn bounded_capacity(count: u32, reader: &EncodedReader<'_>) -> usize {
    (count as usize).min(reader.remaining())
}


#[cfg(test)]
mod parity {
    //! Skip/decode byte parity over generated values

    use super::*;
    use crate::testing::ValueWriter;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Gen {
        Byte(i8),
        Short(i16),
        Char(u16),
        Int(i32),
        Long(i64),
        Float(f32),
        Double(f64),
        Boolean(bool),
        Null,
        Reference(u8, u32),
        Array(Vec<Gen>),
        Annotation(u32, Vec<(u32, Gen)>),
    }

    fn write(gen: &Gen, w: &mut ValueWriter) {
        match gen {
            Gen::Byte(v) => w.byte(*v),
            Gen::Short(v) => w.short(*v),
            Gen::Char(v) => w.char(*v),
            Gen::Int(v) => w.int(*v),
            Gen::Long(v) => w.long(*v),
            Gen::Float(v) => w.float(*v),
            Gen::Double(v) => w.double(*v),
            Gen::Boolean(v) => w.boolean(*v),
            Gen::Null => w.null(),
            Gen::Reference(tag, index) => {
                let value_type = match tag % 5 {
                    0 => ValueType::String,
                    1 => ValueType::Type,
                    2 => ValueType::Field,
                    3 => ValueType::Method,
                    _ => ValueType::Enum,
                };
                w.reference(value_type, *index);
            }
            Gen::Array(items) => w.array(items.len() as u32, |w| {
                for item in items {
                    write(item, w);
                }
            }),
            Gen::Annotation(type_index, elements) => {
                w.annotation(*type_index, elements.len() as u32, |w| {
                    for (name, value) in elements {
                        w.element(*name, |w| write(value, w));
                    }
                })
            }
        }
    }

    fn arb_gen() -> impl Strategy<Value = Gen> {
        let leaf = prop_oneof![
            any::<i8>().prop_map(Gen::Byte),
            any::<i16>().prop_map(Gen::Short),
            any::<u16>().prop_map(Gen::Char),
            any::<i32>().prop_map(Gen::Int),
            any::<i64>().prop_map(Gen::Long),
            any::<f32>().prop_map(Gen::Float),
            any::<f64>().prop_map(Gen::Double),
            any::<bool>().prop_map(Gen::Boolean),
            Just(Gen::Null),
            (any::<u8>(), any::<u32>()).prop_map(|(t, i)| Gen::Reference(t, i)),
        ];
        leaf.prop_recursive(4, 48, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Gen::Array),
                (
                    any::<u32>(),
                    prop::collection::vec((any::<u32>(), inner), 0..6)
                )
                    .prop_map(|(t, e)| Gen::Annotation(t, e)),
            ]
        })
    }

    proptest! {
        #[test]
        fn skip_consumes_same_bytes_as_decode(gen in arb_gen(), trailer in any::<u8>()) {
            let mut w = ValueWriter::new();
            write(&gen, &mut w);
            let encoded_len = w.bytes().len();
            let mut bytes = w.into_bytes();
            bytes.push(trailer);

            let mut decoder = EncodedReader::new(&bytes);
            decode_value(&mut decoder).unwrap();
            let mut skipper = EncodedReader::new(&bytes);
            skip_value(&mut skipper).unwrap();

            prop_assert_eq!(decoder.position(), encoded_len);
            prop_assert_eq!(skipper.position(), encoded_len);
        }

        #[test]
        fn decode_and_skip_agree_on_garbage(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
            let mut decoder = EncodedReader::new(&bytes);
            let decoded = decode_value(&mut decoder);
            let mut skipper = EncodedReader::new(&bytes);
            let skipped = skip_value(&mut skipper);
            match (decoded, skipped) {
                (Ok(_), Ok(())) => prop_assert_eq!(decoder.position(), skipper.position()),
                (Err(a), Err(b)) => prop_assert_eq!(a, b),
                (a, b) => prop_assert!(false, "decode {:?} vs skip {:?}", a, b),
            }
        }
    }
}
