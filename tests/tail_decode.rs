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

//! End-to-end tail-decode scenarios, built from hand-encoded PostScript/
//! Footer/Metadata/StripeFooter byte streams rather than binary `.orc`
//! fixtures, so each boundary condition is exercised directly.

use bytes::Bytes;
use pretty_assertions::assert_eq;
use prost::Message;

use orc_metadata_rs::error::OrcError;
use orc_metadata_rs::proto::{
    self, ColumnEncoding, ColumnStatistics, CompressionKind, Footer, IntegerStatistics, Metadata,
    PostScript, Stream, StringStatistics, StripeFooter, StripeInformation, StripeStatistics, Type,
};
use orc_metadata_rs::reader::{read_metadata_from, ReadOptions};
use orc_metadata_rs::view::MetadataView;

fn struct_type(subtypes: Vec<u32>, field_names: Vec<&str>) -> Type {
    Type {
        kind: Some(proto::r#type::Kind::Struct as i32),
        subtypes,
        field_names: field_names.into_iter().map(String::from).collect(),
        maximum_length: None,
        precision: None,
        scale: None,
    }
}

fn leaf_type(kind: proto::r#type::Kind) -> Type {
    Type {
        kind: Some(kind as i32),
        subtypes: vec![],
        field_names: vec![],
        maximum_length: None,
        precision: None,
        scale: None,
    }
}

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

fn base_postscript(writer_version: u32, compression: CompressionKind, version: Vec<u32>) -> PostScript {
    PostScript {
        footer_length: None,
        compression: Some(compression as i32),
        compression_block_size: None,
        version,
        metadata_length: None,
        writer_version: Some(writer_version),
        magic: Some("ORC".to_string()),
    }
}

#[test]
fn minimal_uncompressed_file() {
    const STRIPE_OFFSET: u64 = 3;
    const INDEX_LENGTH: u64 = 50;
    const DATA_LENGTH: u64 = 20;

    let stripe_footer = StripeFooter {
        streams: vec![
            Stream {
                kind: Some(proto::stream::Kind::RowIndex as i32),
                column: Some(0),
                length: Some(10),
            },
            Stream {
                kind: Some(proto::stream::Kind::Present as i32),
                column: Some(1),
                length: Some(5),
            },
            Stream {
                kind: Some(proto::stream::Kind::Data as i32),
                column: Some(1),
                length: Some(15),
            },
        ],
        columns: vec![
            ColumnEncoding {
                kind: Some(proto::column_encoding::Kind::DirectV2 as i32),
                dictionary_size: None,
            },
            ColumnEncoding {
                kind: Some(proto::column_encoding::Kind::DirectV2 as i32),
                dictionary_size: None,
            },
        ],
        writer_timezone: None,
    };
    let stripe_footer_bytes = stripe_footer.encode_to_vec();
    let footer_length = stripe_footer_bytes.len() as u64;
    let footer_offset = STRIPE_OFFSET + INDEX_LENGTH + DATA_LENGTH;

    let footer = Footer {
        header_length: Some(3),
        content_length: Some(0),
        stripes: vec![StripeInformation {
            offset: Some(STRIPE_OFFSET),
            index_length: Some(INDEX_LENGTH),
            data_length: Some(DATA_LENGTH),
            footer_length: Some(footer_length),
            number_of_rows: Some(10),
        }],
        types: vec![struct_type(vec![1], vec!["x"]), leaf_type(proto::r#type::Kind::Int)],
        metadata: vec![],
        number_of_rows: Some(10),
        statistics: vec![],
        row_index_stride: None,
    };
    let metadata = Metadata { stripe_stats: vec![] };
    let postscript = base_postscript(0, CompressionKind::None, vec![0, 12]);

    let tail = encode_tail(&postscript, &footer, &metadata);

    // Lay out the stripe region (index + data + footer bytes at their
    // declared offsets) ahead of the tail.
    let mut file = vec![0u8; footer_offset as usize];
    file.extend_from_slice(&stripe_footer_bytes);
    file.extend_from_slice(&tail);

    let mut bytes = Bytes::from(file);
    let metadata = read_metadata_from(&mut bytes, ReadOptions::all()).unwrap();
    let view = MetadataView::project(&metadata, ReadOptions::all());

    assert_eq!(view.rows, 10);
    assert_eq!(view.compression, "NONE");
    assert_eq!(view.schema.as_deref(), Some("struct<x:int>"));

    let stripes = view.stripes.unwrap();
    assert_eq!(stripes.len(), 1);
    let stripe = &stripes[0];
    assert_eq!(stripe.offset, 3);
    assert_eq!(stripe.index, 50);
    assert_eq!(stripe.data, 20);
    assert_eq!(stripe.tail, 30);
    assert_eq!(stripe.streams.len(), 3);
    assert_eq!(stripe.streams[0].section, "ROW_INDEX");
    assert_eq!(stripe.streams[1].section, "PRESENT");
    assert_eq!(stripe.streams[2].section, "DATA");
    // start offsets are a running counter seeded at the stripe's file offset
    assert_eq!(stripe.streams[0].start, 3);
    assert_eq!(stripe.streams[1].start, 13);
    assert_eq!(stripe.streams[2].start, 18);
}

#[test]
fn zlib_with_writer_version_4_reports_hive_13083() {
    let footer = Footer {
        header_length: Some(3),
        content_length: Some(0),
        stripes: vec![],
        types: vec![struct_type(vec![], vec![])],
        metadata: vec![],
        number_of_rows: Some(0),
        statistics: vec![],
        row_index_stride: None,
    };
    let metadata = Metadata { stripe_stats: vec![] };
    let postscript = base_postscript(4, CompressionKind::Zlib, vec![0, 12]);

    let mut bytes = Bytes::from(encode_tail(&postscript, &footer, &metadata));
    let file_metadata = read_metadata_from(&mut bytes, ReadOptions::new()).unwrap();

    assert_eq!(file_metadata.version_string(), "0.12 with HIVE-13083");
}

#[test]
fn nested_schema_renders_hive_style_signature() {
    // index: 0=struct{a,b} 1=array<int> 2=int 3=map<string,double> 4=string 5=double
    let types = vec![
        struct_type(vec![1, 3], vec!["a", "b"]),
        Type {
            kind: Some(proto::r#type::Kind::List as i32),
            subtypes: vec![2],
            field_names: vec![],
            maximum_length: None,
            precision: None,
            scale: None,
        },
        leaf_type(proto::r#type::Kind::Int),
        Type {
            kind: Some(proto::r#type::Kind::Map as i32),
            subtypes: vec![4, 5],
            field_names: vec![],
            maximum_length: None,
            precision: None,
            scale: None,
        },
        leaf_type(proto::r#type::Kind::String),
        leaf_type(proto::r#type::Kind::Double),
    ];
    let footer = Footer {
        header_length: Some(3),
        content_length: Some(0),
        stripes: vec![],
        types,
        metadata: vec![],
        number_of_rows: Some(0),
        statistics: vec![],
        row_index_stride: None,
    };
    let metadata = Metadata { stripe_stats: vec![] };
    let postscript = base_postscript(0, CompressionKind::None, vec![0, 12]);

    let mut bytes = Bytes::from(encode_tail(&postscript, &footer, &metadata));
    let file_metadata = read_metadata_from(&mut bytes, ReadOptions::new()).unwrap();

    assert_eq!(
        file_metadata.root_data_type().to_string(),
        "struct<a:array<int>,b:map<string,double>>"
    );
}

#[test]
fn string_statistics_without_sum_omit_sum_key() {
    let footer = Footer {
        header_length: Some(3),
        content_length: Some(0),
        stripes: vec![],
        types: vec![struct_type(vec![1], vec!["name"])],
        metadata: vec![],
        number_of_rows: Some(0),
        statistics: vec![
            ColumnStatistics {
                number_of_values: Some(0),
                ..Default::default()
            },
            ColumnStatistics {
                number_of_values: Some(2),
                has_null: Some(false),
                string_statistics: Some(StringStatistics {
                    minimum: Some("a".to_string()),
                    maximum: Some("z".to_string()),
                    sum: None,
                }),
                ..Default::default()
            },
        ],
        row_index_stride: None,
    };
    let metadata = Metadata { stripe_stats: vec![] };
    let postscript = base_postscript(0, CompressionKind::None, vec![0, 12]);

    let mut bytes = Bytes::from(encode_tail(&postscript, &footer, &metadata));
    let file_metadata = read_metadata_from(&mut bytes, ReadOptions::new().with_file_stats(true)).unwrap();
    let view = MetadataView::project(
        &file_metadata,
        ReadOptions::new().with_file_stats(true),
    );

    let stats = view.file_statistics.unwrap();
    let name_column = &stats[1];
    assert_eq!(name_column.min.as_ref().unwrap(), &orc_metadata_rs::view::StatValue::Text("a".to_string()));
    assert_eq!(name_column.max.as_ref().unwrap(), &orc_metadata_rs::view::StatValue::Text("z".to_string()));
    assert!(name_column.sum.is_none());

    let json = serde_json::to_value(&view).unwrap();
    let json_stats = &json["File Statistics"][1];
    assert!(json_stats.get("sum").is_none());
    assert_eq!(json_stats["min"], "a");
    assert_eq!(json_stats["max"], "z");
}

#[test]
fn truncated_file_is_rejected() {
    let footer = Footer {
        header_length: Some(3),
        content_length: Some(0),
        stripes: vec![],
        types: vec![struct_type(vec![], vec![])],
        metadata: vec![],
        number_of_rows: Some(0),
        statistics: vec![],
        row_index_stride: None,
    };
    let metadata = Metadata { stripe_stats: vec![] };
    let postscript = base_postscript(0, CompressionKind::None, vec![0, 12]);
    let full = encode_tail(&postscript, &footer, &metadata);

    // Keep only the final length byte plus a couple of bytes: far too few
    // to contain the PostScript the length byte claims.
    let truncated = full[full.len() - 3..].to_vec();
    let mut bytes = Bytes::from(truncated);
    let err = read_metadata_from(&mut bytes, ReadOptions::new()).unwrap_err();
    assert!(matches!(err, OrcError::OutOfSpec { .. }));
}

#[test]
fn unknown_writer_version_formats_as_unknown_n() {
    let footer = Footer {
        header_length: Some(3),
        content_length: Some(0),
        stripes: vec![],
        types: vec![struct_type(vec![], vec![])],
        metadata: vec![],
        number_of_rows: Some(0),
        statistics: vec![],
        row_index_stride: None,
    };
    let metadata = Metadata { stripe_stats: vec![] };
    let postscript = base_postscript(99, CompressionKind::None, vec![0, 12]);

    let mut bytes = Bytes::from(encode_tail(&postscript, &footer, &metadata));
    let file_metadata = read_metadata_from(&mut bytes, ReadOptions::new()).unwrap();

    assert_eq!(file_metadata.version_string(), "0.12 with unknown(99)");
}

#[test]
fn stripe_stats_length_mismatch_is_out_of_spec() {
    let footer = Footer {
        header_length: Some(3),
        content_length: Some(0),
        stripes: vec![StripeInformation {
            offset: Some(3),
            index_length: Some(0),
            data_length: Some(0),
            footer_length: Some(0),
            number_of_rows: Some(1),
        }],
        types: vec![struct_type(vec![], vec![])],
        metadata: vec![],
        number_of_rows: Some(1),
        statistics: vec![],
        row_index_stride: None,
    };
    // Two stripe-stats entries for a footer that declares only one stripe.
    let metadata = Metadata {
        stripe_stats: vec![
            StripeStatistics {
                col_stats: vec![ColumnStatistics {
                    number_of_values: Some(1),
                    int_statistics: Some(IntegerStatistics {
                        minimum: Some(1),
                        maximum: Some(1),
                        sum: Some(1),
                    }),
                    ..Default::default()
                }],
            },
            StripeStatistics { col_stats: vec![] },
        ],
    };
    let postscript = base_postscript(0, CompressionKind::None, vec![0, 12]);

    let mut bytes = Bytes::from(encode_tail(&postscript, &footer, &metadata));
    let err = read_metadata_from(&mut bytes, ReadOptions::new().with_stripe_stats(true)).unwrap_err();
    assert!(matches!(err, OrcError::OutOfSpec { .. }));
}

#[test]
fn empty_file_is_rejected() {
    let mut bytes = Bytes::new();
    let err = read_metadata_from(&mut bytes, ReadOptions::new()).unwrap_err();
    assert!(matches!(err, OrcError::EmptyFile { .. }));
}

#[test]
fn oversized_footer_length_is_rejected_not_panicking() {
    let footer = Footer {
        header_length: Some(3),
        content_length: Some(0),
        stripes: vec![],
        types: vec![struct_type(vec![], vec![])],
        metadata: vec![],
        number_of_rows: Some(0),
        statistics: vec![],
        row_index_stride: None,
    };
    let footer_bytes = footer.encode_to_vec();
    let metadata = Metadata { stripe_stats: vec![] };
    let metadata_bytes = metadata.encode_to_vec();

    // Claim a footer far larger than the bytes actually laid out ahead of
    // the postscript: the declared length alone would otherwise underflow
    // the offset arithmetic in the tail decode.
    let mut postscript = base_postscript(0, CompressionKind::None, vec![0, 12]);
    postscript.footer_length = Some(10_000);
    postscript.metadata_length = Some(metadata_bytes.len() as u64);
    let postscript_bytes = postscript.encode_to_vec();

    let mut out = Vec::new();
    out.extend_from_slice(&metadata_bytes);
    out.extend_from_slice(&footer_bytes);
    out.extend_from_slice(&postscript_bytes);
    out.push(postscript_bytes.len() as u8);

    let mut bytes = Bytes::from(out);
    let err = read_metadata_from(&mut bytes, ReadOptions::new()).unwrap_err();
    assert!(matches!(err, OrcError::OutOfSpec { .. }));
}

#[test]
fn stripe_footer_beyond_file_length_is_rejected_not_panicking() {
    // The footer's own `content_length` (0) lets the aggregate stripe-region
    // check pass even though this stripe's offset reaches far past the end
    // of the file; only a per-stripe bound check catches it before the
    // `Bytes` reader's slice would panic.
    let footer = Footer {
        header_length: Some(3),
        content_length: Some(0),
        stripes: vec![StripeInformation {
            offset: Some(1_000_000),
            index_length: Some(0),
            data_length: Some(0),
            footer_length: Some(5),
            number_of_rows: Some(1),
        }],
        types: vec![struct_type(vec![], vec![])],
        metadata: vec![],
        number_of_rows: Some(1),
        statistics: vec![],
        row_index_stride: None,
    };
    let metadata = Metadata { stripe_stats: vec![] };
    let postscript = base_postscript(0, CompressionKind::None, vec![0, 12]);

    let mut bytes = Bytes::from(encode_tail(&postscript, &footer, &metadata));
    let err = read_metadata_from(&mut bytes, ReadOptions::new().with_stripes(true)).unwrap_err();
    assert!(matches!(err, OrcError::OutOfSpec { .. }));
}

#[test]
fn compression_block_size_reports_raw_postscript_value() {
    let footer = Footer {
        header_length: Some(3),
        content_length: Some(0),
        stripes: vec![],
        types: vec![struct_type(vec![], vec![])],
        metadata: vec![],
        number_of_rows: Some(0),
        statistics: vec![],
        row_index_stride: None,
    };
    let metadata = Metadata { stripe_stats: vec![] };
    let mut postscript = base_postscript(0, CompressionKind::None, vec![0, 12]);
    postscript.compression_block_size = None;

    let mut bytes = Bytes::from(encode_tail(&postscript, &footer, &metadata));
    let file_metadata = read_metadata_from(&mut bytes, ReadOptions::new()).unwrap();

    // 0, not the 256 KiB scratch-sizing default, matching the original's
    // unconditional report of the raw proto field.
    assert_eq!(file_metadata.compression_block_size(), 0);
    let view = MetadataView::project(&file_metadata, ReadOptions::new());
    assert_eq!(view.compression_size, 0);
}
