use std::str::FromStr;

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::{Address, B256, U256, hex};
use serde_json::Value;

use crate::error::{ArgumentError, Rejection};

const ADDRESS_LEN: usize = 20;

/// Converts resolved constructor arguments into ABI values, one per
/// parameter and in parameter order.
///
/// Extra arguments are ignored; a missing one is an error.
pub(crate) fn canonicalize(
    types: &[DynSolType],
    arguments: &[Value],
) -> Result<Vec<DynSolValue>, ArgumentError> {
    types
        .iter()
        .enumerate()
        .map(|(index, ty)| {
            let value = arguments.get(index).ok_or_else(|| ArgumentError::Missing {
                index,
                ty: ty.sol_type_name().into_owned(),
            })?;
            canonicalize_value(ty, value).map_err(|reason| ArgumentError::Invalid {
                index,
                ty: ty.sol_type_name().into_owned(),
                value: value.clone(),
                reason,
            })
        })
        .collect()
}

fn canonicalize_value(ty: &DynSolType, value: &Value) -> Result<DynSolValue, Rejection> {
    match ty {
        DynSolType::Address => {
            let bytes = decode_hex(value)?;
            if bytes.len() != ADDRESS_LEN {
                return Err(Rejection::Length {
                    expected: ADDRESS_LEN,
                    actual: bytes.len(),
                });
            }
            Ok(DynSolValue::Address(Address::from_slice(&bytes)))
        }
        DynSolType::Bytes => Ok(DynSolValue::Bytes(decode_hex(value)?)),
        DynSolType::FixedBytes(size) => {
            let bytes = decode_hex(value)?;
            if bytes.len() > *size {
                return Err(Rejection::Length {
                    expected: *size,
                    actual: bytes.len(),
                });
            }
            // Short input is left-padded within the N-byte value.
            let mut word = B256::ZERO;
            word[*size - bytes.len()..*size].copy_from_slice(&bytes);
            Ok(DynSolValue::FixedBytes(word, *size))
        }
        DynSolType::Uint(bits) => {
            let number = parse_uint(value)?;
            if number.bit_len() > *bits {
                return Err(Rejection::OutOfRange { bits: *bits });
            }
            Ok(DynSolValue::Uint(number, *bits))
        }
        _ => {
            let coerced = match value {
                Value::String(text) => ty.coerce_str(text),
                other => ty.coerce_str(&other.to_string()),
            };
            Ok(coerced?)
        }
    }
}

fn decode_hex(value: &Value) -> Result<Vec<u8>, Rejection> {
    let Value::String(text) = value else {
        return Err(Rejection::NotAString);
    };
    Ok(hex::decode(text.trim())?)
}

/// Reads an unsigned integer from a JSON number or a decimal (or `0x` hex)
/// string. Fractional parts of numbers are discarded.
fn parse_uint(value: &Value) -> Result<U256, Rejection> {
    let text = match value {
        Value::Number(number) => {
            if let Some(integer) = number.as_u64() {
                return Ok(U256::from(integer));
            }
            let float = number.as_f64().ok_or(Rejection::NotUnsigned)?;
            format!("{}", float.trunc())
        }
        Value::String(text) => text.trim().to_owned(),
        _ => return Err(Rejection::NotUnsigned),
    };
    U256::from_str(&text).map_err(|_| Rejection::NotUnsigned)
}
