use bmc_http::codec::{decode_base64, encoded_size};
use bmc_http::protocol::body::{BodyWriter, DEFAULT_READ_BUF_SIZE, EncodingType, HttpBody};
use bmc_http::protocol::PayloadSize;
use bytes::BytesMut;
use std::io::Write;

const FILE_SIZE: usize = 10 * 1024 * 1024;

fn ten_megabytes() -> Vec<u8> {
    (0..FILE_SIZE).map(|i| (i * 31 % 251) as u8).collect()
}

#[test]
fn test_ten_megabyte_file_as_base64() {
    let content = ten_megabytes();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&content).unwrap();

    let mut body = HttpBody::with_encoding(EncodingType::Base64);
    body.open(file.path()).unwrap();
    assert_eq!(body.payload_size(), Some(encoded_size(FILE_SIZE as u64)));
    assert_eq!(body.transfer_size(), PayloadSize::Length(13_981_016));

    let mut writer = BodyWriter::with_buffer_size(body, DEFAULT_READ_BUF_SIZE);
    writer.init().unwrap();

    let mut encoded = BytesMut::with_capacity(encoded_size(FILE_SIZE as u64) as usize);
    let mut chunks = Vec::new();
    loop {
        let (chunk, has_more) = writer.get_with_max_size(1000).unwrap();
        encoded.extend_from_slice(chunk);
        chunks.push((chunk.len(), has_more));
        if !has_more {
            break;
        }
    }

    // only the last chunk reports that nothing follows
    let (last, rest) = chunks.split_last().unwrap();
    assert!(!last.1);
    assert!(rest.iter().all(|(_, has_more)| *has_more));

    // every read takes at most 1000 source bytes, so at most 1336 encoded bytes come out
    assert!(chunks.iter().all(|(len, _)| *len <= 1336));

    assert_eq!(encoded.len() as u64, encoded_size(FILE_SIZE as u64));
    assert_eq!(encoded.iter().filter(|b| **b == b'=').count(), 2);

    let mut decoded = BytesMut::with_capacity(FILE_SIZE);
    decode_base64(&encoded, &mut decoded).unwrap();
    assert_eq!(decoded.len(), FILE_SIZE);
    assert!(decoded[..] == content[..]);

    // an exhausted producer stays exhausted
    assert_eq!(writer.get_with_max_size(1000).unwrap(), (&b""[..], false));
}

#[test]
fn test_raw_and_base64_agree() {
    let content: Vec<u8> = (0..100_003u32).map(|i| (i % 256) as u8).collect();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&content).unwrap();

    let mut raw = HttpBody::new();
    raw.open(file.path()).unwrap();
    let mut raw_writer = BodyWriter::new(raw);
    let mut raw_out = Vec::new();
    loop {
        let (chunk, has_more) = raw_writer.get_with_max_size(777).unwrap();
        raw_out.extend_from_slice(chunk);
        if !has_more {
            break;
        }
    }
    assert_eq!(raw_out, content);

    let mut b64 = HttpBody::with_encoding(EncodingType::Base64);
    b64.open(file.path()).unwrap();
    let mut b64_writer = BodyWriter::with_buffer_size(b64, 100);
    let mut b64_out = BytesMut::new();
    loop {
        let (chunk, has_more) = b64_writer.get().unwrap();
        b64_out.extend_from_slice(chunk);
        if !has_more {
            break;
        }
    }

    let mut decoded = BytesMut::new();
    decode_base64(&b64_out, &mut decoded).unwrap();
    assert_eq!(&decoded[..], &raw_out[..]);
}
