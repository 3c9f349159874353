//! A minimal Recursive Length Prefix (RLP) codec.
//!
//! No crate in this codebase's dependency lineage pulls in an `rlp`
//! implementation, so nodes are encoded and decoded by hand. Only the
//! subset needed to represent byte strings and (possibly nested) lists
//! of byte strings is implemented — exactly what trie nodes need.

use crate::error::TrieError;

/// An RLP value: either a byte string or a list of RLP values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RlpItem {
    Bytes(Vec<u8>),
    List(Vec<RlpItem>),
}

impl RlpItem {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            RlpItem::Bytes(b) => encode_bytes(b),
            RlpItem::List(items) => {
                let mut payload = Vec::new();
                for item in items {
                    payload.extend(item.encode());
                }
                encode_list_payload(&payload)
            }
        }
    }

    /// Decode a single RLP item from the front of `data`, returning the
    /// item and the number of bytes consumed.
    pub fn decode(data: &[u8]) -> Result<(RlpItem, usize), TrieError> {
        if data.is_empty() {
            return Err(TrieError::DecodeError("empty RLP input".into()));
        }
        let prefix = data[0];
        match prefix {
            0x00..=0x7F => Ok((RlpItem::Bytes(vec![prefix]), 1)),
            0x80..=0xB7 => {
                let len = (prefix - 0x80) as usize;
                let body = slice(data, 1, len)?;
                Ok((RlpItem::Bytes(body.to_vec()), 1 + len))
            }
            0xB8..=0xBF => {
                let len_of_len = (prefix - 0xB7) as usize;
                let len = decode_length(data, 1, len_of_len)?;
                let start = 1 + len_of_len;
                let body = slice(data, start, len)?;
                Ok((RlpItem::Bytes(body.to_vec()), start + len))
            }
            0xC0..=0xF7 => {
                let len = (prefix - 0xC0) as usize;
                let body = slice(data, 1, len)?;
                let items = decode_list_items(body)?;
                Ok((RlpItem::List(items), 1 + len))
            }
            0xF8..=0xFF => {
                let len_of_len = (prefix - 0xF7) as usize;
                let len = decode_length(data, 1, len_of_len)?;
                let start = 1 + len_of_len;
                let body = slice(data, start, len)?;
                let items = decode_list_items(body)?;
                Ok((RlpItem::List(items), start + len))
            }
        }
    }

    /// Decode a buffer that must contain exactly one RLP item.
    pub fn decode_exact(data: &[u8]) -> Result<RlpItem, TrieError> {
        let (item, consumed) = RlpItem::decode(data)?;
        if consumed != data.len() {
            return Err(TrieError::DecodeError(
                "trailing bytes after RLP item".into(),
            ));
        }
        Ok(item)
    }

    pub fn as_bytes(&self) -> Result<&[u8], TrieError> {
        match self {
            RlpItem::Bytes(b) => Ok(b),
            RlpItem::List(_) => Err(TrieError::DecodeError(
                "expected RLP byte string, found list".into(),
            )),
        }
    }

    pub fn as_list(&self) -> Result<&[RlpItem], TrieError> {
        match self {
            RlpItem::List(items) => Ok(items),
            RlpItem::Bytes(_) => Err(TrieError::DecodeError(
                "expected RLP list, found byte string".into(),
            )),
        }
    }
}

fn encode_bytes(b: &[u8]) -> Vec<u8> {
    if b.len() == 1 && b[0] < 0x80 {
        return vec![b[0]];
    }
    if b.len() <= 55 {
        let mut out = Vec::with_capacity(1 + b.len());
        out.push(0x80 + b.len() as u8);
        out.extend_from_slice(b);
        out
    } else {
        let len_bytes = be_bytes(b.len());
        let mut out = Vec::with_capacity(1 + len_bytes.len() + b.len());
        out.push(0xB7 + len_bytes.len() as u8);
        out.extend_from_slice(&len_bytes);
        out.extend_from_slice(b);
        out
    }
}

fn encode_list_payload(payload: &[u8]) -> Vec<u8> {
    if payload.len() <= 55 {
        let mut out = Vec::with_capacity(1 + payload.len());
        out.push(0xC0 + payload.len() as u8);
        out.extend_from_slice(payload);
        out
    } else {
        let len_bytes = be_bytes(payload.len());
        let mut out = Vec::with_capacity(1 + len_bytes.len() + payload.len());
        out.push(0xF7 + len_bytes.len() as u8);
        out.extend_from_slice(&len_bytes);
        out.extend_from_slice(payload);
        out
    }
}

fn be_bytes(mut n: usize) -> Vec<u8> {
    if n == 0 {
        return vec![0];
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push((n & 0xFF) as u8);
        n >>= 8;
    }
    out.reverse();
    out
}

fn decode_length(data: &[u8], start: usize, len_of_len: usize) -> Result<usize, TrieError> {
    let bytes = slice(data, start, len_of_len)?;
    let mut len: usize = 0;
    for &b in bytes {
        len = (len << 8) | b as usize;
    }
    Ok(len)
}

fn slice(data: &[u8], start: usize, len: usize) -> Result<&[u8], TrieError> {
    data.get(start..start + len)
        .ok_or_else(|| TrieError::DecodeError("RLP length exceeds input".into()))
}

fn decode_list_items(mut body: &[u8]) -> Result<Vec<RlpItem>, TrieError> {
    let mut items = Vec::new();
    while !body.is_empty() {
        let (item, consumed) = RlpItem::decode(body)?;
        items.push(item);
        body = &body[consumed..];
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_empty_string_and_single_small_byte() {
        assert_eq!(RlpItem::Bytes(vec![]).encode(), vec![0x80]);
        assert_eq!(RlpItem::Bytes(vec![0x00]).encode(), vec![0x00]);
        assert_eq!(RlpItem::Bytes(vec![0x7F]).encode(), vec![0x7F]);
    }

    #[test]
    fn encodes_short_and_long_strings() {
        assert_eq!(RlpItem::Bytes(vec![0x61]).encode(), vec![0x81, 0x61]);
        let long = vec![b'a'; 56];
        let encoded = RlpItem::Bytes(long.clone()).encode();
        assert_eq!(encoded[0], 0xB8);
        assert_eq!(encoded[1], 56);
        assert_eq!(&encoded[2..], &long[..]);
    }

    #[test]
    fn roundtrips_nested_lists() {
        let item = RlpItem::List(vec![
            RlpItem::Bytes(b"cat".to_vec()),
            RlpItem::List(vec![RlpItem::Bytes(b"dog".to_vec())]),
        ]);
        let encoded = item.encode();
        let decoded = RlpItem::decode_exact(&encoded).unwrap();
        assert_eq!(item, decoded);
    }

    #[test]
    fn rejects_trailing_bytes() {
        let mut encoded = RlpItem::Bytes(b"cat".to_vec()).encode();
        encoded.push(0xFF);
        assert!(RlpItem::decode_exact(&encoded).is_err());
    }
}
