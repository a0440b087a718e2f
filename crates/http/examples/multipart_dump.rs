//! Lists the parts of a captured multipart upload, or streams a file as Base64.
//!
//! ```text
//! cargo run --example multipart_dump -- parts 'multipart/form-data; boundary=X' upload.bin
//! cargo run --example multipart_dump -- base64 firmware.tar > firmware.b64
//! ```

use bmc_http::multipart::Multipart;
use bmc_http::protocol::body::{BodyWriter, EncodingType, HttpBody};
use std::error::Error;
use std::io::Write;
use std::{env, fs, io, process};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

const MAX_CHUNK_SIZE: usize = 16 * 1024;

fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).with_writer(io::stderr).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let args: Vec<String> = env::args().skip(1).collect();
    let result = match args.as_slice() {
        [command, content_type, path] if command == "parts" => dump_parts(content_type, path),
        [command, path] if command == "base64" => stream_base64(path),
        _ => {
            eprintln!("usage: multipart_dump parts <content-type> <body-file>");
            eprintln!("       multipart_dump base64 <file>");
            process::exit(2);
        }
    };

    if let Err(e) = result {
        error!(cause = %e, "multipart_dump failed");
        process::exit(1);
    }
}

fn dump_parts(content_type: &str, path: &str) -> Result<(), Box<dyn Error>> {
    let body = fs::read(path)?;
    let multipart = match Multipart::parse(content_type, &body) {
        Ok(multipart) => multipart,
        Err(e) => {
            error!(status = %e.status_code(), "rejecting upload");
            return Err(e.into());
        }
    };

    info!(parts = multipart.len(), "parsed upload");
    for (index, part) in multipart.parts().iter().enumerate() {
        println!("part {index}: {} bytes", part.content().len());
        for (name, value) in part.headers() {
            println!("  {name}: {}", value.to_str().unwrap_or("<binary>"));
        }
    }
    Ok(())
}

fn stream_base64(path: &str) -> Result<(), Box<dyn Error>> {
    let mut body = HttpBody::with_encoding(EncodingType::Base64);
    body.open(path)?;
    info!(size = ?body.payload_size(), "streaming file as base64");

    let mut writer = BodyWriter::new(body);
    writer.init()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    loop {
        let (chunk, has_more) = writer.get_with_max_size(MAX_CHUNK_SIZE)?;
        out.write_all(chunk)?;
        if !has_more {
            break;
        }
    }
    out.write_all(b"\n")?;
    Ok(())
}
