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

//! Reads the tail metadata of an Apache ORC file — the PostScript, File
//! Footer, optional Metadata, and per-stripe Footers — without touching any
//! row or column data.
//!
//! ```no_run
//! use orc_metadata_rs::reader::{read_metadata, ReadOptions};
//! use orc_metadata_rs::view::MetadataView;
//!
//! let options = ReadOptions::new().with_schema(true).with_stripe_stats(true);
//! let metadata = read_metadata("example.orc", options)?;
//! let view = MetadataView::project(&metadata, options);
//! println!("{} rows, compression {}", view.rows, view.compression);
//! # Ok::<(), orc_metadata_rs::error::OrcError>(())
//! ```
//!
//! Row-group and column-data decoding (RLE, bit-packed integers, dictionary
//! reconstruction) is out of scope for this crate.

pub mod buffer;
pub mod compression;
pub mod error;
pub mod proto;
pub mod reader;
pub mod schema;
pub mod statistics;
pub mod stripe;
pub mod view;
