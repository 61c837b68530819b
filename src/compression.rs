// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Block-oriented decompression of the tail sections (PostScript excluded,
//! it is never compressed). Each of Footer, Metadata and every StripeFooter
//! is a sequence of blocks, each prefixed by a 3 byte little-endian header
//! whose low bit flags the block as stored verbatim ("original") and whose
//! remaining 23 bits give the block's length.

use std::io::Read;

use snafu::ResultExt;

use crate::error::{self, Result};
use crate::proto::{self, CompressionKind};

/// Spec states default is 256KiB.
pub(crate) const DEFAULT_COMPRESSION_BLOCK_SIZE: u64 = 256 * 1024;

const BLOCK_HEADER_SIZE: usize = 3;

#[derive(Clone, Copy, Debug)]
pub struct Compression {
    compression_type: CompressionType,
    /// No compression block will decompress to larger than this size. Used
    /// to size the scratch buffer appropriately.
    max_decompressed_block_size: usize,
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({} byte max block size)",
            self.compression_type, self.max_decompressed_block_size
        )
    }
}

impl Compression {
    pub fn compression_type(&self) -> CompressionType {
        self.compression_type
    }

    pub(crate) fn from_proto(
        kind: proto::CompressionKind,
        compression_block_size: Option<u64>,
    ) -> Option<Self> {
        let max_decompressed_block_size =
            compression_block_size.unwrap_or(DEFAULT_COMPRESSION_BLOCK_SIZE) as usize;
        match kind {
            CompressionKind::None => None,
            CompressionKind::Zlib => Some(Self {
                compression_type: CompressionType::Zlib,
                max_decompressed_block_size,
            }),
            CompressionKind::Snappy => Some(Self {
                compression_type: CompressionType::Snappy,
                max_decompressed_block_size,
            }),
            CompressionKind::Lzo => Some(Self {
                compression_type: CompressionType::Lzo,
                max_decompressed_block_size,
            }),
            CompressionKind::Lz4 => Some(Self {
                compression_type: CompressionType::Lz4,
                max_decompressed_block_size,
            }),
            CompressionKind::Zstd => Some(Self {
                compression_type: CompressionType::Zstd,
                max_decompressed_block_size,
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompressionType {
    Zlib,
    Snappy,
    Lzo,
    Lz4,
    Zstd,
}

impl std::fmt::Display for CompressionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Indicates length of block and whether it's compressed or not.
#[derive(Debug, PartialEq, Eq)]
enum CompressionHeader {
    Original(u32),
    Compressed(u32),
}

/// ORC files are compressed in blocks, with a 3 byte header at the start
/// of these blocks indicating the length of the block and whether it's
/// compressed or not.
fn decode_header(bytes: [u8; 3]) -> CompressionHeader {
    let bytes = [bytes[0], bytes[1], bytes[2], 0];
    let length_and_flag = u32::from_le_bytes(bytes);
    let is_original = length_and_flag & 1 == 1;
    let length = length_and_flag >> 1;
    if is_original {
        CompressionHeader::Original(length)
    } else {
        CompressionHeader::Compressed(length)
    }
}

trait DecompressorVariant {
    fn decompress_block(&self, compressed_bytes: &[u8], scratch: &mut Vec<u8>) -> Result<()>;
}

#[derive(Debug, Clone, Copy)]
struct Zlib;
#[derive(Debug, Clone, Copy)]
struct Zstd;
#[derive(Debug, Clone, Copy)]
struct Snappy;
#[derive(Debug, Clone, Copy)]
struct Lzo;
#[derive(Debug, Clone, Copy)]
struct Lz4 {
    max_decompressed_block_size: usize,
}

impl DecompressorVariant for Zlib {
    fn decompress_block(&self, compressed_bytes: &[u8], scratch: &mut Vec<u8>) -> Result<()> {
        let mut gz = flate2::read::DeflateDecoder::new(compressed_bytes);
        scratch.clear();
        gz.read_to_end(scratch).context(error::DecompressBlockSnafu)?;
        Ok(())
    }
}

impl DecompressorVariant for Zstd {
    fn decompress_block(&self, compressed_bytes: &[u8], scratch: &mut Vec<u8>) -> Result<()> {
        let mut reader =
            zstd::Decoder::new(compressed_bytes).context(error::BuildZstdDecoderSnafu)?;
        scratch.clear();
        reader.read_to_end(scratch).context(error::DecompressBlockSnafu)?;
        Ok(())
    }
}

impl DecompressorVariant for Snappy {
    fn decompress_block(&self, compressed_bytes: &[u8], scratch: &mut Vec<u8>) -> Result<()> {
        let len =
            snap::raw::decompress_len(compressed_bytes).context(error::BuildSnappyDecoderSnafu)?;
        scratch.resize(len, 0);
        let mut decoder = snap::raw::Decoder::new();
        decoder
            .decompress(compressed_bytes, scratch)
            .context(error::BuildSnappyDecoderSnafu)?;
        Ok(())
    }
}

impl DecompressorVariant for Lzo {
    fn decompress_block(&self, compressed_bytes: &[u8], scratch: &mut Vec<u8>) -> Result<()> {
        let decompressed = lzokay_native::decompress_all(compressed_bytes, None)
            .context(error::BuildLzoDecoderSnafu)?;
        scratch.clear();
        scratch.extend(decompressed);
        Ok(())
    }
}

impl DecompressorVariant for Lz4 {
    fn decompress_block(&self, compressed_bytes: &[u8], scratch: &mut Vec<u8>) -> Result<()> {
        let decompressed =
            lz4_flex::block::decompress(compressed_bytes, self.max_decompressed_block_size)
                .context(error::BuildLz4DecoderSnafu)?;
        scratch.clear();
        scratch.extend(decompressed);
        Ok(())
    }
}

fn get_decompressor_variant(
    Compression {
        compression_type,
        max_decompressed_block_size,
    }: Compression,
) -> Box<dyn DecompressorVariant> {
    match compression_type {
        CompressionType::Zlib => Box::new(Zlib),
        CompressionType::Snappy => Box::new(Snappy),
        CompressionType::Lzo => Box::new(Lzo),
        CompressionType::Lz4 => Box::new(Lz4 {
            max_decompressed_block_size,
        }),
        CompressionType::Zstd => Box::new(Zstd),
    }
}

/// Decodes a whole section (Footer, Metadata, or a single StripeFooter) by
/// walking its block stream and concatenating each block's decompressed
/// bytes. Unlike column data streams, these sections are always small enough
/// to materialize in full rather than being read incrementally.
pub fn decompress_all(stream: &[u8], compression: Option<Compression>) -> Result<Vec<u8>> {
    let Some(compression) = compression else {
        return Ok(stream.to_vec());
    };

    let variant = get_decompressor_variant(compression);
    let mut out = Vec::with_capacity(stream.len());
    let mut scratch = Vec::new();
    let mut pos = 0usize;
    while pos < stream.len() {
        snafu::ensure!(
            pos + BLOCK_HEADER_SIZE <= stream.len(),
            error::OutOfSpecSnafu {
                msg: "truncated compression block header",
            }
        );
        let header = [stream[pos], stream[pos + 1], stream[pos + 2]];
        pos += BLOCK_HEADER_SIZE;
        match decode_header(header) {
            CompressionHeader::Original(length) => {
                let length = length as usize;
                snafu::ensure!(
                    pos + length <= stream.len(),
                    error::OutOfSpecSnafu {
                        msg: "truncated compression block",
                    }
                );
                out.extend_from_slice(&stream[pos..pos + length]);
                pos += length;
            }
            CompressionHeader::Compressed(length) => {
                let length = length as usize;
                snafu::ensure!(
                    pos + length <= stream.len(),
                    error::OutOfSpecSnafu {
                        msg: "truncated compression block",
                    }
                );
                variant.decompress_block(&stream[pos..pos + length], &mut scratch)?;
                out.extend_from_slice(&scratch);
                pos += length;
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_uncompressed() {
        // 5 uncompressed = [0x0b, 0x00, 0x00] = [0b1011, 0, 0]
        let bytes = [0b1011, 0, 0];

        let expected = CompressionHeader::Original(5);
        let actual = decode_header(bytes);
        assert_eq!(expected, actual);
    }

    #[test]
    fn decode_compressed() {
        // 100_000 compressed = [0x40, 0x0d, 0x03] = [0b01000000, 0b00001101, 0b00000011]
        let bytes = [0b0100_0000, 0b0000_1101, 0b0000_0011];
        let expected = CompressionHeader::Compressed(100_000);
        let actual = decode_header(bytes);
        assert_eq!(expected, actual);
    }

    #[test]
    fn decompress_all_passes_through_uncompressed_sections() {
        let data = b"a protobuf-ish payload".to_vec();
        let out = decompress_all(&data, None).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn decompress_all_concatenates_multiple_original_blocks() {
        // Two "original" blocks, each carrying 3 bytes of literal payload.
        let mut stream = Vec::new();
        stream.extend_from_slice(&[0b0000_0111, 0, 0]); // length=3, original
        stream.extend_from_slice(b"abc");
        stream.extend_from_slice(&[0b0000_0111, 0, 0]);
        stream.extend_from_slice(b"def");

        let compression = Compression::from_proto(CompressionKind::Zlib, None).unwrap();
        let out = decompress_all(&stream, Some(compression)).unwrap();
        assert_eq!(out, b"abcdef");
    }

    #[test]
    fn decompress_all_rejects_truncated_block() {
        let stream = vec![0b0000_0111, 0, 0, b'a']; // claims length=3, only 1 byte present
        let compression = Compression::from_proto(CompressionKind::Zlib, None).unwrap();
        assert!(decompress_all(&stream, Some(compression)).is_err());
    }
}
