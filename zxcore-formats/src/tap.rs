/*
    This file is part of zxcore. For the full copyright notice, see the lib.rs file.
*/
/*! **TAP** file block iterator.

No inter-block timing is implied by anything here: a *TAP* file only
records block boundaries and content, never the pulse-level pause between
them, so this module hands back blocks one at a time and leaves pacing to
whatever drives the tape deck.

A **TAP** file is a sequence of *chunks*, each a 2-byte little-endian length
followed by that many content bytes. The first content byte is a flag (`0x00`
for a header block, `0xFF` for a data block, anything else for a block a
real Spectrum ROM loader wouldn't recognize); the last content byte is a
checksum over every preceding byte including the flag, chosen so that
XORing them all together yields zero.

The 17-byte header layout inside a header block's content (after the flag,
before the checksum):

| offset | size | description                      |
|--------|------|-----------------------------------|
|    0   |    1 | block type (0=Program,1=Number array,2=Character array,3=Code) |
|    1   |   10 | filename, space-padded            |
|   11   |    2 | length of the following data block |
|   13   |    2 | parameter 1                        |
|   15   |    2 | parameter 2                        |
*/
use core::fmt;

use crate::error::{FormatError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockType {
    Program,
    NumberArray,
    CharArray,
    Code,
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", match self {
            BlockType::Program => "Program",
            BlockType::NumberArray => "Number array",
            BlockType::CharArray => "Character array",
            BlockType::Code => "Bytes",
        })
    }
}

/// A parsed 17-byte *TAP* header (decoded from a header block's content).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub block_type: BlockType,
    pub name: [u8; 10],
    /// Length, in bytes, of the data block this header describes.
    pub length: u16,
    pub par1: u16,
    pub par2: u16,
}

impl Header {
    pub fn name_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }

    fn parse(b: &[u8]) -> Result<Self> {
        if b.len() != 17 {
            return Err(FormatError::Corrupt("TAP header block must be 17 bytes"));
        }
        let block_type = match b[0] {
            0 => BlockType::Program,
            1 => BlockType::NumberArray,
            2 => BlockType::CharArray,
            3 => BlockType::Code,
            _ => return Err(FormatError::Corrupt("unrecognized TAP header block type")),
        };
        let mut name = [0u8; 10];
        name.copy_from_slice(&b[1..11]);
        let length = u16::from_le_bytes([b[11], b[12]]);
        let par1 = u16::from_le_bytes([b[13], b[14]]);
        let par2 = u16::from_le_bytes([b[15], b[16]]);
        Ok(Header { block_type, name, length, par1, par2 })
    }
}

/// A single decoded *TAP* chunk: either a header, a data block, or neither.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TapBlock<'a> {
    Header(Header),
    /// A data block's payload, excluding the leading `0xFF` flag and trailing checksum.
    Data(&'a [u8]),
    /// A block whose flag byte was neither `0x00` nor `0xFF`.
    Unknown { flag: u8, content: &'a [u8] },
    /// A zero-length chunk.
    Empty,
}

/// Computes the *TAP* checksum (XOR of every byte, flag included) of a block's content.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc ^ b)
}

/// Iterates the chunks of a *TAP* file, yielding each chunk's content (flag
/// byte through checksum byte, exclusive of the 2-byte length prefix) parsed
/// into a [TapBlock]. Stops, without error, at the first chunk whose length
/// prefix claims more bytes than remain — a common way real recordings end.
pub struct TapChunkIter<'a> {
    data: &'a [u8],
}

impl<'a> TapChunkIter<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        TapChunkIter { data }
    }
}

impl<'a> Iterator for TapChunkIter<'a> {
    type Item = TapBlock<'a>;

    fn next(&mut self) -> Option<TapBlock<'a>> {
        if self.data.len() < 2 {
            return None;
        }
        let len = u16::from_le_bytes([self.data[0], self.data[1]]) as usize;
        if self.data.len() < 2 + len {
            return None;
        }
        let content = &self.data[2..2 + len];
        self.data = &self.data[2 + len..];

        if content.is_empty() {
            return Some(TapBlock::Empty);
        }
        let flag = content[0];
        let body = &content[1..content.len().saturating_sub(1)];
        Some(match flag {
            0x00 => match Header::parse(body) {
                Ok(header) => TapBlock::Header(header),
                Err(_) => TapBlock::Unknown { flag, content: body },
            },
            0xFF => TapBlock::Data(body),
            _ => TapBlock::Unknown { flag, content: body },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(flag: u8, body: &[u8]) -> Vec<u8> {
        let mut content = vec![flag];
        content.extend_from_slice(body);
        let sum = checksum(&content);
        content.push(sum);
        let mut out = (content.len() as u16).to_le_bytes().to_vec();
        out.extend_from_slice(&content);
        out
    }

    #[test]
    fn iterates_header_then_data_block() {
        let mut name = [0x20u8; 10];
        name[0..4].copy_from_slice(b"FOO ");
        let mut header_body = vec![3u8]; // Code
        header_body.extend_from_slice(&name);
        header_body.extend_from_slice(&4u16.to_le_bytes()); // length
        header_body.extend_from_slice(&0x8000u16.to_le_bytes()); // par1: start
        header_body.extend_from_slice(&0x8000u16.to_le_bytes()); // par2

        let mut tape = chunk(0x00, &header_body);
        tape.extend(chunk(0xFF, &[1, 2, 3, 4]));

        let mut it = TapChunkIter::new(&tape);
        match it.next().unwrap() {
            TapBlock::Header(h) => {
                assert_eq!(h.block_type, BlockType::Code);
                assert_eq!(h.length, 4);
                assert_eq!(h.par1, 0x8000);
            }
            other => panic!("expected header, got {:?}", other),
        }
        match it.next().unwrap() {
            TapBlock::Data(d) => assert_eq!(d, &[1, 2, 3, 4]),
            other => panic!("expected data, got {:?}", other),
        }
        assert!(it.next().is_none());
    }

    #[test]
    fn stops_on_truncated_trailing_chunk() {
        let mut tape = chunk(0xFF, &[9, 9]);
        tape.extend_from_slice(&[5, 0, 1, 2]); // length prefix claims 5 bytes, only 2 follow
        let blocks: Vec<_> = TapChunkIter::new(&tape).collect();
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn checksum_of_valid_block_is_zero() {
        let content = chunk(0xFF, &[10, 20, 30]);
        let body = &content[2..];
        assert_eq!(checksum(body), 0);
    }
}
