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

//! Projects the decoded tail trees ([`crate::reader::FileMetadata`] and its
//! [`crate::stripe::StripeMetadata`]/`StripeFooter` children) into a flat,
//! `serde`-serializable result record, independent of the trees themselves
//! so callers may drop the latter once this view is built.
//!
//! The shape mirrors a keyed record rather than a Rust-idiomatic struct tree
//! because higher-level bindings (the out-of-scope language layer this crate
//! feeds) project it field by field into their own host objects; field names
//! with spaces and capitals (`"has null"`, `"File Statistics"`) are kept
//! verbatim for that reason rather than renamed to `snake_case`.

use serde::Serialize;

use crate::proto::{column_encoding, stream};
use crate::reader::{FileMetadata, ReadOptions};
use crate::statistics::{ColumnStatistics, TypeStatistics};

/// A single min/max/sum value. Which variant appears depends on the
/// column's physical type family; `serde`'s untagged representation renders
/// it as a bare JSON number or string, matching what the source's
/// `Py_BuildValue` format codes (`"i"`, `"d"`, `"s"`) produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatValue {
    Integer(i64),
    Double(f64),
    Text(String),
}

/// Per-column statistics, projected either from the file footer or from a
/// single stripe's entry in the Metadata section. Fields the source type's
/// present-flag did not set are omitted entirely rather than serialized as
/// null.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnStatisticsView {
    pub column: usize,
    #[serde(rename = "has null")]
    pub has_null: bool,
    pub count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<StatValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<StatValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sum: Option<StatValue>,
}

impl ColumnStatisticsView {
    fn project(column: usize, stats: &ColumnStatistics) -> Self {
        let (min, max, sum) = match stats.type_statistics() {
            Some(TypeStatistics::Integer { min, max, sum }) => (
                min.map(StatValue::Integer),
                max.map(StatValue::Integer),
                sum.map(StatValue::Integer),
            ),
            Some(TypeStatistics::Double { min, max, sum }) => (
                min.map(StatValue::Double),
                max.map(StatValue::Double),
                sum.map(StatValue::Double),
            ),
            Some(TypeStatistics::String { min, max, sum }) => (
                Some(StatValue::Text(min.clone())),
                Some(StatValue::Text(max.clone())),
                sum.map(StatValue::Integer),
            ),
            Some(TypeStatistics::Decimal { min, max, sum }) => (
                Some(StatValue::Text(min.clone())),
                Some(StatValue::Text(max.clone())),
                Some(StatValue::Text(sum.clone())),
            ),
            Some(TypeStatistics::Date { min, max }) => (
                min.map(|v| StatValue::Integer(v as i64)),
                max.map(|v| StatValue::Integer(v as i64)),
                None,
            ),
            Some(TypeStatistics::Binary { sum }) => (None, None, sum.map(StatValue::Integer)),
            Some(TypeStatistics::Bucket { .. })
            | Some(TypeStatistics::Timestamp { .. })
            | Some(TypeStatistics::Collection { .. })
            | None => (None, None, None),
        };
        Self {
            column,
            has_null: stats.has_null(),
            count: stats.number_of_values(),
            min,
            max,
            sum,
        }
    }
}

fn project_column_statistics(stats: &[ColumnStatistics]) -> Vec<ColumnStatisticsView> {
    stats
        .iter()
        .enumerate()
        .map(|(i, s)| ColumnStatisticsView::project(i, s))
        .collect()
}

/// One entry of the Metadata section: a stripe index and its per-column
/// statistics.
#[derive(Debug, Clone, Serialize)]
pub struct StripeStatisticsView {
    pub stripe: usize,
    pub statistics: Vec<ColumnStatisticsView>,
}

/// One entry of a StripeFooter's stream list, with `start` synthesized by
/// the running-offset rule in SPEC_FULL §4.7 — it is not stored in the file.
#[derive(Debug, Clone, Serialize)]
pub struct StreamView {
    pub section: &'static str,
    pub column: u32,
    pub start: u64,
    pub length: u64,
}

fn stream_kind_name(kind: stream::Kind) -> &'static str {
    match kind {
        stream::Kind::Present => "PRESENT",
        stream::Kind::Data => "DATA",
        stream::Kind::Length => "LENGTH",
        stream::Kind::DictionaryData => "DICTIONARY_DATA",
        stream::Kind::DictionaryCount => "DICTIONARY_COUNT",
        stream::Kind::Secondary => "SECONDARY",
        stream::Kind::RowIndex => "ROW_INDEX",
        stream::Kind::BloomFilter => "BLOOM_FILTER",
        stream::Kind::BloomFilterUtf8 => "BLOOM_FILTER_UTF8",
    }
}

/// One entry of a StripeFooter's column encoding list. Dictionary variants
/// carry the dictionary size in brackets, e.g. `"DICTIONARY[12]"`.
#[derive(Debug, Clone, Serialize)]
pub struct EncodingView {
    pub encoding: String,
    pub column: usize,
}

fn encoding_name(kind: column_encoding::Kind, dictionary_size: u32) -> String {
    match kind {
        column_encoding::Kind::Direct => "DIRECT".to_string(),
        column_encoding::Kind::Dictionary => format!("DICTIONARY[{dictionary_size}]"),
        column_encoding::Kind::DirectV2 => "DIRECT_V2".to_string(),
        column_encoding::Kind::DictionaryV2 => format!("DICTIONARY_V2[{dictionary_size}]"),
    }
}

/// A single stripe's directory entry: its layout offsets plus its stream
/// and encoding listings. Only built when [`ReadOptions::enable_stripes`]
/// was set, since the streams/encodings come from the StripeFooter.
#[derive(Debug, Clone, Serialize)]
pub struct StripeView {
    pub stripe: usize,
    pub offset: u64,
    pub data: u64,
    pub rows: u64,
    pub tail: u64,
    pub index: u64,
    #[serde(rename = "Streams")]
    pub streams: Vec<StreamView>,
    #[serde(rename = "Encodings")]
    pub encodings: Vec<EncodingView>,
}

/// The flag-gated, language-neutral result record described by SPEC_FULL
/// §3/§4.7/§6 — what [`crate::reader::read_metadata_from`]'s typed trees are
/// ultimately projected into for a caller that just wants to inspect a file.
#[derive(Debug, Clone, Serialize)]
pub struct MetadataView {
    pub rows: u64,
    pub compression: String,
    pub version: String,
    pub compression_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(rename = "File Statistics", skip_serializing_if = "Option::is_none")]
    pub file_statistics: Option<Vec<ColumnStatisticsView>>,
    #[serde(rename = "Stripe Statistics", skip_serializing_if = "Option::is_none")]
    pub stripe_statistics: Option<Vec<StripeStatisticsView>>,
    #[serde(rename = "Stripes", skip_serializing_if = "Option::is_none")]
    pub stripes: Option<Vec<StripeView>>,
}

impl MetadataView {
    /// Builds the result record from a fully decoded [`FileMetadata`],
    /// gating each optional section by the same [`ReadOptions`] the decode
    /// itself was run with.
    pub fn project(metadata: &FileMetadata, options: ReadOptions) -> Self {
        let compression = match metadata.compression() {
            None => "NONE".to_string(),
            Some(c) => c.compression_type().to_string().to_uppercase(),
        };

        let schema = options
            .enable_schema
            .then(|| metadata.root_data_type().to_string());

        let file_statistics = options
            .enable_file_stats
            .then(|| project_column_statistics(metadata.column_file_statistics()));

        let stripe_statistics = options.enable_stripe_stats.then(|| {
            metadata
                .stripe_metadatas()
                .iter()
                .enumerate()
                .map(|(i, stripe)| StripeStatisticsView {
                    stripe: i,
                    statistics: project_column_statistics(stripe.column_statistics()),
                })
                .collect()
        });

        let stripes = options.enable_stripes.then(|| {
            metadata
                .stripe_metadatas()
                .iter()
                .zip(metadata.stripe_footers().iter())
                .enumerate()
                .map(|(i, (stripe, footer))| {
                    let mut start = stripe.offset();
                    let streams = footer
                        .as_ref()
                        .map(|f| {
                            f.streams
                                .iter()
                                .map(|s| {
                                    let length = s.length();
                                    let view = StreamView {
                                        section: stream_kind_name(s.kind()),
                                        column: s.column(),
                                        start,
                                        length,
                                    };
                                    start += length;
                                    view
                                })
                                .collect()
                        })
                        .unwrap_or_default();
                    let encodings = footer
                        .as_ref()
                        .map(|f| {
                            f.columns
                                .iter()
                                .enumerate()
                                .map(|(column, e)| EncodingView {
                                    encoding: encoding_name(e.kind(), e.dictionary_size()),
                                    column,
                                })
                                .collect()
                        })
                        .unwrap_or_default();
                    StripeView {
                        stripe: i,
                        offset: stripe.offset(),
                        data: stripe.data_length(),
                        rows: stripe.number_of_rows(),
                        tail: stripe.footer_length(),
                        index: stripe.index_length(),
                        streams,
                        encodings,
                    }
                })
                .collect()
        });

        Self {
            rows: metadata.number_of_rows(),
            compression,
            version: metadata.version_string(),
            compression_size: metadata.compression_block_size(),
            schema,
            file_statistics,
            stripe_statistics,
            stripes,
        }
    }
}
