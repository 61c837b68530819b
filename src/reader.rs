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

//! Parses the ORC file tail metadata structures from a file.
//!
//! File tail structure:
//!
//! ```text
//! ------------------
//! |    Metadata    |
//! |                |
//! ------------------
//! |     Footer     |
//! |                |
//! ------------------
//! |  Postscript  |X|
//! ------------------
//! ```
//!
//! Where X is the last byte in the file, indicating the PostScript length in
//! bytes.
//!
//! Footer and Metadata lengths are encoded in the PostScript. The PostScript
//! is never compressed; Footer, Metadata and every StripeFooter may be,
//! depending on the PostScript's compression kind.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use bytes::{Bytes, BytesMut};
use prost::Message;
use snafu::{ensure, IntoError, OptionExt, ResultExt};
use tracing::debug;

use crate::compression::{decompress_all, Compression};
use crate::error::{self, EmptyFileSnafu, OutOfSpecSnafu, Result};
use crate::proto::{self, Footer, Metadata, PostScript, StripeFooter};
use crate::schema::RootDataType;
use crate::statistics::ColumnStatistics;
use crate::stripe::{decode_stripe_footer, StripeMetadata};

const DEFAULT_FOOTER_SIZE: u64 = 16 * 1024;

/// Primary source used for reading the bytes required to decode the tail.
#[allow(clippy::len_without_is_empty)]
pub trait ChunkReader {
    type T: Read;

    /// Total length of the underlying byte source.
    fn len(&self) -> u64;

    /// A reader starting at a specific offset.
    fn get_read(&self, offset_from_start: u64) -> std::io::Result<Self::T>;

    /// Reads `length` bytes starting at `offset_from_start`. `length` comes
    /// from offsets declared in the PostScript/Footer, so a corrupt file can
    /// claim an implausibly large section; reserve fallibly rather than
    /// aborting the process on allocation failure.
    fn get_bytes(&self, offset_from_start: u64, length: u64) -> std::io::Result<Bytes> {
        let mut bytes = Vec::new();
        bytes.try_reserve_exact(length as usize).map_err(|_| {
            std::io::Error::new(std::io::ErrorKind::OutOfMemory, "allocation failed")
        })?;
        bytes.resize(length as usize, 0);
        self.get_read(offset_from_start)?
            .take(length)
            .read_exact(&mut bytes)?;
        Ok(bytes.into())
    }
}

impl ChunkReader for File {
    type T = BufReader<File>;

    fn len(&self) -> u64 {
        self.metadata().map(|m| m.len()).unwrap_or(0u64)
    }

    /// Care needs to be taken when using this simultaneously as the underlying
    /// file descriptor is the same and will be affected by other invocations.
    ///
    /// See [`File::try_clone()`] for more details.
    fn get_read(&self, offset_from_start: u64) -> std::io::Result<Self::T> {
        let mut reader = self.try_clone()?;
        reader.seek(SeekFrom::Start(offset_from_start))?;
        Ok(BufReader::new(reader))
    }
}

impl ChunkReader for Bytes {
    type T = bytes::buf::Reader<Bytes>;

    fn len(&self) -> u64 {
        self.as_ref().len() as u64
    }

    fn get_read(&self, offset_from_start: u64) -> std::io::Result<Self::T> {
        use bytes::Buf;
        Ok(self.slice(offset_from_start as usize..).reader())
    }
}

/// Which optional sections to decode from the file tail.
///
/// `enable_schema` and `enable_file_stats` don't change what's read off
/// disk (the Footer always carries the root type tree and the file-level
/// column statistics; decoding it is unconditional) — they only control
/// whether [`crate::view::MetadataView`] includes them in its projection.
/// `enable_stripe_stats` and `enable_stripes` do change what's read: the
/// former gates decoding the Metadata section (per-stripe statistics), the
/// latter gates reading and decoding every StripeFooter, which costs one
/// extra read per stripe.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOptions {
    pub enable_schema: bool,
    pub enable_file_stats: bool,
    pub enable_stripe_stats: bool,
    pub enable_stripes: bool,
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables every optional section.
    pub fn all() -> Self {
        Self {
            enable_schema: true,
            enable_file_stats: true,
            enable_stripe_stats: true,
            enable_stripes: true,
        }
    }

    pub fn with_schema(mut self, enable: bool) -> Self {
        self.enable_schema = enable;
        self
    }

    pub fn with_file_stats(mut self, enable: bool) -> Self {
        self.enable_file_stats = enable;
        self
    }

    pub fn with_stripe_stats(mut self, enable: bool) -> Self {
        self.enable_stripe_stats = enable;
        self
    }

    pub fn with_stripes(mut self, enable: bool) -> Self {
        self.enable_stripes = enable;
        self
    }
}

/// Version tags for the writer that produced the file, mirroring the
/// milestones historically tracked by the format's own tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterVersion {
    Original,
    Hive8732,
    Hive4243,
    Hive12055,
    Hive13083,
    Orc101,
    Orc135,
    /// A writer version number not recognised by this crate.
    Unknown(u32),
}

impl WriterVersion {
    fn from_u32(value: u32) -> Self {
        match value {
            0 => WriterVersion::Original,
            1 => WriterVersion::Hive8732,
            2 => WriterVersion::Hive4243,
            3 => WriterVersion::Hive12055,
            4 => WriterVersion::Hive13083,
            5 => WriterVersion::Orc101,
            6 => WriterVersion::Orc135,
            other => WriterVersion::Unknown(other),
        }
    }

    fn tag(&self) -> String {
        match self {
            WriterVersion::Original => "original".to_string(),
            WriterVersion::Hive8732 => "HIVE-8732".to_string(),
            WriterVersion::Hive4243 => "HIVE-4243".to_string(),
            WriterVersion::Hive12055 => "HIVE-12055".to_string(),
            WriterVersion::Hive13083 => "HIVE-13083".to_string(),
            WriterVersion::Orc101 => "ORC-101".to_string(),
            WriterVersion::Orc135 => "ORC-135".to_string(),
            WriterVersion::Unknown(n) => format!("unknown({n})"),
        }
    }
}

/// The file's tail metadata: everything describing its shape and contents
/// without reading any row data.
#[derive(Debug, Clone)]
pub struct FileMetadata {
    compression: Option<Compression>,
    /// The PostScript's raw `compressionBlockSize` field, reported exactly
    /// as the original does: 0 when the PostScript omits it, never
    /// substituted with the 256 KiB scratch-sizing default (that default is
    /// applied separately, only to size decompression buffers, in
    /// [`Compression::from_proto`]).
    compression_block_size: u64,
    root_data_type: RootDataType,
    number_of_rows: u64,
    file_format_version: (u32, u32),
    writer_version: WriterVersion,
    /// Statistics of columns across the entire file.
    column_statistics: Vec<ColumnStatistics>,
    stripes: Vec<StripeMetadata>,
    stripe_footers: Vec<Option<StripeFooter>>,
    user_custom_metadata: HashMap<String, Vec<u8>>,
}

impl FileMetadata {
    fn from_proto(
        postscript: &proto::PostScript,
        footer: &proto::Footer,
        metadata: Option<&proto::Metadata>,
        stripe_footers: Vec<Option<StripeFooter>>,
    ) -> Result<Self> {
        let compression =
            Compression::from_proto(postscript.compression(), postscript.compression_block_size);
        let compression_block_size = postscript.compression_block_size.unwrap_or(0);
        let root_data_type = RootDataType::from_proto(&footer.types)?;
        let number_of_rows = footer.number_of_rows();
        let column_statistics = footer
            .statistics
            .iter()
            .map(TryFrom::try_from)
            .collect::<Result<Vec<_>>>()?;

        let stripes = match metadata {
            Some(metadata) if !metadata.stripe_stats.is_empty() => {
                ensure!(
                    metadata.stripe_stats.len() == footer.stripes.len(),
                    OutOfSpecSnafu {
                        msg: "stripe stats length must equal the number of stripes"
                    }
                );
                footer
                    .stripes
                    .iter()
                    .zip(metadata.stripe_stats.iter())
                    .map(TryFrom::try_from)
                    .collect::<Result<Vec<_>>>()?
            }
            _ => footer
                .stripes
                .iter()
                .map(TryFrom::try_from)
                .collect::<Result<Vec<_>>>()?,
        };

        let user_custom_metadata = footer
            .metadata
            .iter()
            .map(|kv| (kv.name().to_owned(), kv.value().to_vec()))
            .collect::<HashMap<_, _>>();

        let file_format_version = (
            postscript.version.first().copied().unwrap_or(0),
            postscript.version.get(1).copied().unwrap_or(0),
        );
        let writer_version = WriterVersion::from_u32(postscript.writer_version());

        Ok(Self {
            compression,
            compression_block_size,
            root_data_type,
            number_of_rows,
            file_format_version,
            writer_version,
            column_statistics,
            stripes,
            stripe_footers,
            user_custom_metadata,
        })
    }

    pub fn number_of_rows(&self) -> u64 {
        self.number_of_rows
    }

    pub fn compression(&self) -> Option<Compression> {
        self.compression
    }

    /// The PostScript's raw `compressionBlockSize` value (0 if the
    /// PostScript omitted it), regardless of whether compression is
    /// actually in effect.
    pub fn compression_block_size(&self) -> u64 {
        self.compression_block_size
    }

    pub fn root_data_type(&self) -> &RootDataType {
        &self.root_data_type
    }

    pub fn column_file_statistics(&self) -> &[ColumnStatistics] {
        &self.column_statistics
    }

    pub fn stripe_metadatas(&self) -> &[StripeMetadata] {
        &self.stripes
    }

    /// The decoded StripeFooter for each stripe, in file order, present only
    /// if [`ReadOptions::enable_stripes`] was set.
    pub fn stripe_footers(&self) -> &[Option<StripeFooter>] {
        &self.stripe_footers
    }

    pub fn user_custom_metadata(&self) -> &HashMap<String, Vec<u8>> {
        &self.user_custom_metadata
    }

    /// The two-component file format version, e.g. `(0, 12)`.
    pub fn file_format_version(&self) -> (u32, u32) {
        self.file_format_version
    }

    pub fn writer_version(&self) -> WriterVersion {
        self.writer_version
    }

    /// Renders the version the same way the format's own tooling has
    /// historically reported it, e.g. `"0.12 with ORC-135"`.
    pub fn version_string(&self) -> String {
        format!(
            "{}.{} with {}",
            self.file_format_version.0,
            self.file_format_version.1,
            self.writer_version.tag()
        )
    }
}

/// Reads `length` bytes at `offset`, translating an allocation failure
/// (rather than a genuine I/O failure) into [`error::OrcError::OutOfMemory`].
fn read_bytes<R: ChunkReader>(reader: &R, offset: u64, length: u64) -> Result<Bytes> {
    reader.get_bytes(offset, length).map_err(|e| {
        if e.kind() == std::io::ErrorKind::OutOfMemory {
            error::OutOfMemorySnafu.build()
        } else {
            error::IoSnafu.into_error(e)
        }
    })
}

/// Reads the tail metadata from an already-open [`ChunkReader`] (a file
/// handle, an in-memory byte buffer, etc.), honoring `options` to decide
/// which optional, costlier-to-decode sections to include.
#[tracing::instrument(level = "debug", skip(reader))]
pub fn read_metadata_from<R: ChunkReader>(
    reader: &mut R,
    options: ReadOptions,
) -> Result<FileMetadata> {
    let file_len = reader.len();
    if file_len == 0 {
        return EmptyFileSnafu.fail();
    }
    debug!(file_len, "starting tail decode");

    // Initial read of the file tail. Use a default size for the first read
    // in hopes of capturing all sections in one go; at worst a second,
    // precisely-sized read is needed.
    let assume_footer_len = file_len.min(DEFAULT_FOOTER_SIZE);
    let mut tail_bytes = read_bytes(reader, file_len - assume_footer_len, assume_footer_len)?;

    // The final byte of the file contains the serialized length of the
    // PostScript, which must be less than 256 bytes.
    let postscript_len = tail_bytes[tail_bytes.len() - 1] as u64;
    tail_bytes.truncate(tail_bytes.len() - 1);

    if tail_bytes.len() < postscript_len as usize {
        return OutOfSpecSnafu {
            msg: "File too small for given postscript length",
        }
        .fail();
    }
    let postscript = PostScript::decode(&tail_bytes[tail_bytes.len() - postscript_len as usize..])
        .context(error::DecodeProtoSnafu)?;
    let compression =
        Compression::from_proto(postscript.compression(), postscript.compression_block_size);
    debug!(compression = ?postscript.compression(), "postscript decoded");
    tail_bytes.truncate(tail_bytes.len() - postscript_len as usize);

    let footer_length = postscript.footer_length.context(OutOfSpecSnafu {
        msg: "Footer length is empty",
    })?;
    let metadata_length = postscript.metadata_length.context(OutOfSpecSnafu {
        msg: "Metadata length is empty",
    })?;

    // Metadata is only needed when per-stripe statistics were asked for.
    let metadata_length_to_read = if options.enable_stripe_stats {
        metadata_length
    } else {
        0
    };

    // SPEC_FULL §8 invariant 2: the footer (and, if read, the metadata
    // section) must fit ahead of the postscript and its length byte.
    // Checked before any offset arithmetic below, since an oversized
    // declared length would otherwise underflow those offsets.
    ensure!(
        1 + postscript_len + footer_length + metadata_length_to_read <= file_len,
        OutOfSpecSnafu {
            msg: "footer/metadata length exceeds file length",
        }
    );

    let mut tail_bytes = if footer_length + metadata_length_to_read > tail_bytes.len() as u64 {
        // -1 is the postscript length byte
        let offset = file_len - 1 - postscript_len - footer_length - metadata_length_to_read;
        let bytes_to_read = (footer_length + metadata_length_to_read) - tail_bytes.len() as u64;
        let prepend_bytes = read_bytes(reader, offset, bytes_to_read)?;
        let mut all_bytes = BytesMut::with_capacity(prepend_bytes.len() + tail_bytes.len());
        all_bytes.extend_from_slice(&prepend_bytes);
        all_bytes.extend_from_slice(&tail_bytes);
        all_bytes.into()
    } else {
        tail_bytes
    };

    let footer = deserialize_footer(
        tail_bytes.slice(tail_bytes.len() - footer_length as usize..),
        compression,
    )?;
    tail_bytes.truncate(tail_bytes.len() - footer_length as usize);

    let metadata = if options.enable_stripe_stats {
        debug!("decoding stripe statistics metadata section");
        Some(deserialize_footer_metadata(
            tail_bytes.slice(tail_bytes.len() - metadata_length as usize..),
            compression,
        )?)
    } else {
        None
    };

    let stripe_footers = if options.enable_stripes {
        let file_length_needed =
            footer_length + metadata_length + footer.content_length() + 1 + postscript_len;
        ensure!(
            file_length_needed <= file_len,
            OutOfSpecSnafu {
                msg: "file too small to contain every stripe described by the footer",
            }
        );
        footer
            .stripes
            .iter()
            .map(|stripe| {
                let offset = stripe.offset() + stripe.index_length() + stripe.data_length();
                let length = stripe.footer_length();
                ensure!(
                    offset + length <= file_len,
                    OutOfSpecSnafu {
                        msg: "stripe footer extends past file length",
                    }
                );
                let bytes = read_bytes(reader, offset, length)?;
                debug!(offset, length, "decoding stripe footer");
                decode_stripe_footer(&bytes, compression).map(Some)
            })
            .collect::<Result<Vec<_>>>()?
    } else {
        vec![None; footer.stripes.len()]
    };

    FileMetadata::from_proto(&postscript, &footer, metadata.as_ref(), stripe_footers)
}

/// Opens the ORC file at `path` and reads its tail metadata, honoring
/// `options` to decide which optional, costlier-to-decode sections to
/// include. A thin convenience wrapper over [`read_metadata_from`] for the
/// common case of reading from a filesystem path rather than an
/// already-open reader.
pub fn read_metadata<P: AsRef<Path>>(path: P, options: ReadOptions) -> Result<FileMetadata> {
    let mut file = File::open(path).context(error::IoSnafu)?;
    read_metadata_from(&mut file, options)
}

fn deserialize_footer(bytes: Bytes, compression: Option<Compression>) -> Result<Footer> {
    let buffer = decompress_all(&bytes, compression)?;
    Footer::decode(buffer.as_slice()).context(error::DecodeProtoSnafu)
}

fn deserialize_footer_metadata(bytes: Bytes, compression: Option<Compression>) -> Result<Metadata> {
    let buffer = decompress_all(&bytes, compression)?;
    Metadata::decode(buffer.as_slice()).context(error::DecodeProtoSnafu)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::{CompressionKind, Type};

    fn encode_tail(postscript: &PostScript, footer: &Footer, metadata: &Metadata) -> Vec<u8> {
        let footer_bytes = footer.encode_to_vec();
        let metadata_bytes = metadata.encode_to_vec();
        let mut postscript = postscript.clone();
        postscript.footer_length = Some(footer_bytes.len() as u64);
        postscript.metadata_length = Some(metadata_bytes.len() as u64);
        let postscript_bytes = postscript.encode_to_vec();

        let mut out = Vec::new();
        out.extend_from_slice(&metadata_bytes);
        out.extend_from_slice(&footer_bytes);
        out.extend_from_slice(&postscript_bytes);
        out.push(postscript_bytes.len() as u8);
        out
    }

    fn minimal_footer() -> Footer {
        Footer {
            header_length: Some(3),
            content_length: Some(0),
            stripes: vec![],
            types: vec![Type {
                kind: Some(proto::r#type::Kind::Struct as i32),
                subtypes: vec![],
                field_names: vec![],
                maximum_length: None,
                precision: None,
                scale: None,
            }],
            metadata: vec![],
            number_of_rows: Some(0),
            statistics: vec![],
            row_index_stride: None,
        }
    }

    fn postscript(writer_version: u32) -> PostScript {
        PostScript {
            footer_length: None,
            compression: Some(CompressionKind::None as i32),
            compression_block_size: None,
            version: vec![0, 12],
            metadata_length: None,
            writer_version: Some(writer_version),
            magic: Some("ORC".to_string()),
        }
    }

    #[test]
    fn reads_minimal_uncompressed_file() {
        let footer = minimal_footer();
        let metadata = Metadata { stripe_stats: vec![] };

        let mut bytes = Bytes::from(encode_tail(&postscript(0), &footer, &metadata));
        let file_metadata = read_metadata_from(&mut bytes, ReadOptions::all()).unwrap();

        assert_eq!(file_metadata.number_of_rows(), 0);
        assert!(file_metadata.compression().is_none());
        assert_eq!(file_metadata.file_format_version(), (0, 12));
        assert_eq!(file_metadata.version_string(), "0.12 with original");
    }

    #[test]
    fn unknown_writer_version_is_reported_verbatim() {
        let footer = minimal_footer();
        let metadata = Metadata { stripe_stats: vec![] };

        let mut bytes = Bytes::from(encode_tail(&postscript(99), &footer, &metadata));
        let file_metadata = read_metadata_from(&mut bytes, ReadOptions::all()).unwrap();
        assert_eq!(file_metadata.version_string(), "0.12 with unknown(99)");
    }

    #[test]
    fn stripe_stats_decode_is_gated_by_read_options() {
        let footer = minimal_footer();
        let metadata = Metadata { stripe_stats: vec![] };

        let mut reader = Bytes::from(encode_tail(&postscript(0), &footer, &metadata));
        let opts = ReadOptions::new(); // everything disabled
        let file_metadata = read_metadata_from(&mut reader, opts).unwrap();
        // File-level schema/stats are always decoded regardless of options.
        assert_eq!(file_metadata.root_data_type().to_string(), "struct<>");
        assert!(file_metadata.stripe_footers().is_empty());
    }

    #[test]
    fn empty_file_is_rejected() {
        let mut bytes = Bytes::new();
        let err = read_metadata_from(&mut bytes, ReadOptions::all()).unwrap_err();
        assert!(matches!(err, error::OrcError::EmptyFile { .. }));
    }
}
