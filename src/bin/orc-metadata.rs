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

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use orc_metadata_rs::reader::{read_metadata, ReadOptions};
use orc_metadata_rs::view::MetadataView;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// ORC file path
    file: PathBuf,

    /// Include the schema in the output
    #[arg(long)]
    schema: bool,

    /// Include per-column file-level statistics
    #[arg(long)]
    file_stats: bool,

    /// Include per-stripe statistics
    #[arg(long)]
    stripe_stats: bool,

    /// Include per-stripe stream and encoding listings
    #[arg(long)]
    stripes: bool,

    /// Include every optional section, shorthand for the four flags above
    #[arg(long)]
    all: bool,

    /// Print the result as JSON instead of the default human-readable form
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let options = if cli.all {
        ReadOptions::all()
    } else {
        ReadOptions::new()
            .with_schema(cli.schema)
            .with_file_stats(cli.file_stats)
            .with_stripe_stats(cli.stripe_stats)
            .with_stripes(cli.stripes)
    };

    let metadata = read_metadata(&cli.file, options)
        .with_context(|| format!("failed to read ORC tail metadata from {}", cli.file.display()))?;
    let view = MetadataView::project(&metadata, options);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print_human_readable(&view);
    }

    Ok(())
}

fn print_human_readable(view: &MetadataView) {
    println!("rows: {}", view.rows);
    println!("compression: {}", view.compression);
    println!("compression block size: {}", view.compression_size);
    println!("version: {}", view.version);

    if let Some(schema) = &view.schema {
        println!("schema: {schema}");
    }

    if let Some(file_statistics) = &view.file_statistics {
        println!("\n=== File Statistics ===");
        for stats in file_statistics {
            println!("{stats:?}");
        }
    }

    if let Some(stripe_statistics) = &view.stripe_statistics {
        println!("\n=== Stripe Statistics ===");
        for stripe in stripe_statistics {
            println!("stripe {}: {:?}", stripe.stripe, stripe.statistics);
        }
    }

    if let Some(stripes) = &view.stripes {
        println!("\n=== Stripes ===");
        for stripe in stripes {
            println!(
                "stripe {}: offset={} index={} data={} tail={} rows={}",
                stripe.stripe, stripe.offset, stripe.index, stripe.data, stripe.tail, stripe.rows
            );
            for stream in &stripe.streams {
                println!(
                    "  stream column={} kind={} start={} length={}",
                    stream.column, stream.section, stream.start, stream.length
                );
            }
            for encoding in &stripe.encodings {
                println!("  column {} encoding {}", encoding.column, encoding.encoding);
            }
        }
    }
}
