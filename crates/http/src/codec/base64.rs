//! Streaming Base64 encoding (RFC 4648, standard alphabet, `=` padding).
//!
//! The encoder keeps at most two input bytes between calls, so a payload of any
//! size can be encoded chunk by chunk with memory bounded by the chunk size.
//! Feeding the same input split at arbitrary points produces exactly the same
//! output as feeding it in one call.

use crate::protocol::{ParseError, PayloadItem, SendError};
use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::Encoder;

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

const PAD: u8 = b'=';

/// Marks bytes outside the alphabet in [`DECODE_TABLE`].
const INVALID: u8 = 0xff;

const DECODE_TABLE: [u8; 256] = {
    let mut table = [INVALID; 256];
    let mut i = 0;
    while i < ALPHABET.len() {
        table[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
};

/// Returns the exact length of the Base64 encoding of `size` input bytes.
#[inline]
pub const fn encoded_size(size: u64) -> u64 {
    size.div_ceil(3) * 4
}

/// A Base64 encoder that can be fed one chunk at a time.
///
/// Input that does not fill a whole 3-byte group is carried over to the next call
/// of [`encode`](Self::encode); [`finalize`](Self::finalize) emits the carried bytes
/// with padding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Base64Encoder {
    pending: [u8; 2],
    pending_len: usize,
}

impl Base64Encoder {
    pub const fn new() -> Self {
        Self { pending: [0; 2], pending_len: 0 }
    }

    /// Input bytes carried over from the previous call, waiting for a complete group.
    pub fn pending(&self) -> &[u8] {
        &self.pending[..self.pending_len]
    }

    /// Encodes `src`, appending only complete 4-character groups to `dst`.
    pub fn encode(&mut self, mut src: &[u8], dst: &mut BytesMut) {
        if src.is_empty() {
            return;
        }

        let total = self.pending_len + src.len();
        dst.reserve(total / 3 * 4);

        if self.pending_len > 0 {
            let need = 3 - self.pending_len;
            if src.len() < need {
                self.pending[self.pending_len..self.pending_len + src.len()].copy_from_slice(src);
                self.pending_len += src.len();
                return;
            }

            let mut group = [0u8; 3];
            group[..self.pending_len].copy_from_slice(&self.pending[..self.pending_len]);
            group[self.pending_len..].copy_from_slice(&src[..need]);
            put_group(dst, group);
            src = &src[need..];
            self.pending_len = 0;
        }

        let mut groups = src.chunks_exact(3);
        for group in &mut groups {
            put_group(dst, [group[0], group[1], group[2]]);
        }

        let rest = groups.remainder();
        self.pending[..rest.len()].copy_from_slice(rest);
        self.pending_len = rest.len();
    }

    /// Flushes the carried-over bytes with `=` padding and resets the encoder.
    pub fn finalize(&mut self, dst: &mut BytesMut) {
        match self.pending_len {
            1 => {
                let b0 = self.pending[0];
                dst.put_slice(&[
                    ALPHABET[(b0 >> 2) as usize],
                    ALPHABET[((b0 & 0x03) << 4) as usize],
                    PAD,
                    PAD,
                ]);
            }
            2 => {
                let [b0, b1] = self.pending;
                dst.put_slice(&[
                    ALPHABET[(b0 >> 2) as usize],
                    ALPHABET[(((b0 & 0x03) << 4) | (b1 >> 4)) as usize],
                    ALPHABET[((b1 & 0x0f) << 2) as usize],
                    PAD,
                ]);
            }
            _ => {}
        }
        self.pending_len = 0;
    }
}

#[inline]
fn put_group(dst: &mut BytesMut, [b0, b1, b2]: [u8; 3]) {
    dst.put_slice(&[
        ALPHABET[(b0 >> 2) as usize],
        ALPHABET[(((b0 & 0x03) << 4) | (b1 >> 4)) as usize],
        ALPHABET[(((b1 & 0x0f) << 2) | (b2 >> 6)) as usize],
        ALPHABET[(b2 & 0x3f) as usize],
    ]);
}

/// Encodes a payload stream: chunks are encoded as they come, `Eof` flushes the padding.
impl<D: Buf> Encoder<PayloadItem<D>> for Base64Encoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            PayloadItem::Chunk(mut bytes) => {
                while bytes.has_remaining() {
                    let chunk = bytes.chunk();
                    let len = chunk.len();
                    Base64Encoder::encode(self, chunk, dst);
                    bytes.advance(len);
                }
                Ok(())
            }
            PayloadItem::Eof => {
                self.finalize(dst);
                Ok(())
            }
        }
    }
}

/// Decodes standard, padded Base64 from `src` into `dst`.
///
/// The input length must be a multiple of four and `=` may only appear in the
/// last group.
pub fn decode_base64(src: &[u8], dst: &mut BytesMut) -> Result<(), ParseError> {
    if src.len() % 4 != 0 {
        return Err(ParseError::InvalidBase64 { position: src.len() });
    }

    dst.reserve(src.len() / 4 * 3);

    let groups = src.len() / 4;
    for (group_idx, group) in src.chunks_exact(4).enumerate() {
        let offset = group_idx * 4;
        let is_last = group_idx + 1 == groups;

        let padding = match group {
            [_, _, PAD, PAD] if is_last => 2,
            [_, _, _, PAD] if is_last => 1,
            _ => 0,
        };

        let mut sextets = [0u8; 4];
        for (i, &c) in group[..4 - padding].iter().enumerate() {
            let value = DECODE_TABLE[c as usize];
            if value == INVALID {
                return Err(ParseError::InvalidBase64 { position: offset + i });
            }
            sextets[i] = value;
        }

        let [s0, s1, s2, s3] = sextets;
        dst.put_u8((s0 << 2) | (s1 >> 4));
        if padding < 2 {
            dst.put_u8((s1 << 4) | (s2 >> 2));
        }
        if padding < 1 {
            dst.put_u8((s2 << 6) | s3);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn encode_once(input: &[u8]) -> BytesMut {
        let mut dst = BytesMut::new();
        let mut encoder = Base64Encoder::new();
        encoder.encode(input, &mut dst);
        encoder.finalize(&mut dst);
        dst
    }

    fn round_trip(input: &[u8]) -> String {
        let encoded = encode_once(input);
        let mut decoded = BytesMut::new();
        decode_base64(&encoded, &mut decoded).unwrap();
        assert_eq!(&decoded[..], input);
        String::from_utf8(encoded.to_vec()).unwrap()
    }

    fn big_data() -> Vec<u8> {
        "sample text".repeat(1000).into_bytes()
    }

    #[test]
    fn test_small_strings() {
        assert_eq!(round_trip(b""), "");
        assert_eq!(round_trip(b"sample text"), "c2FtcGxlIHRleHQ=");
        assert_eq!(round_trip(b"a"), "YQ==");
        assert_eq!(round_trip(b"ab"), "YWI=");
        assert_eq!(round_trip(b"abc"), "YWJj");
        assert_eq!(round_trip(b"abcd"), "YWJjZA==");
        assert_eq!(round_trip(b"124"), "MTI0");
        assert_eq!(round_trip(b"1245"), "MTI0NQ==");
        assert_eq!(round_trip(b"&-?"), "Ji0/");
        assert_eq!(round_trip(b"&-?="), "Ji0/PQ==");
        assert_eq!(round_trip(b"&-?=="), "Ji0/PT0=");
    }

    #[test]
    fn test_binary_round_trip() {
        let input: Vec<u8> = (0..=255u8).cycle().take(4099).collect();
        round_trip(&input);
        round_trip(&[0xff, 0xfe]);
        round_trip(&[0x00]);
    }

    #[test]
    fn test_chunked_encoding_matches_single_call() {
        let mut input = big_data();
        for extra in [&b""[..], b"a", b"b", b"c"] {
            input.extend_from_slice(extra);
            let expected = encode_once(&input);

            for chunk_size in [1, 2, 3, 4, 7, 100, 4096] {
                let mut dst = BytesMut::new();
                let mut encoder = Base64Encoder::new();
                for chunk in input.chunks(chunk_size) {
                    encoder.encode(chunk, &mut dst);
                    assert!(encoder.pending().len() < 3);
                }
                encoder.finalize(&mut dst);
                assert_eq!(dst, expected, "chunk size {chunk_size}");
            }
        }
    }

    #[test]
    fn test_encode_emits_only_whole_groups() {
        let mut dst = BytesMut::new();
        let mut encoder = Base64Encoder::new();

        encoder.encode(b"ab", &mut dst);
        assert!(dst.is_empty());
        assert_eq!(encoder.pending(), b"ab");

        encoder.encode(b"cd", &mut dst);
        assert_eq!(&dst[..], b"YWJj");
        assert_eq!(encoder.pending(), b"d");

        encoder.finalize(&mut dst);
        assert_eq!(&dst[..], b"YWJjZA==");
        assert!(encoder.pending().is_empty());
    }

    #[test]
    fn test_encoded_size() {
        for n in 0..64u64 {
            let input = vec![0x5a; n as usize];
            assert_eq!(encoded_size(n), n.div_ceil(3) * 4);
            assert_eq!(encode_once(&input).len() as u64, encoded_size(n));
        }
        assert_eq!(encoded_size(10 * 1024 * 1024), 13_981_016);
    }

    #[test]
    fn test_payload_item_encoder() {
        let mut encoder = Base64Encoder::new();
        let mut dst = BytesMut::new();

        Encoder::encode(&mut encoder, PayloadItem::Chunk(Bytes::from_static(b"sample")), &mut dst).unwrap();
        Encoder::encode(&mut encoder, PayloadItem::Chunk(Bytes::from_static(b" text")), &mut dst).unwrap();
        Encoder::encode(&mut encoder, PayloadItem::<Bytes>::Eof, &mut dst).unwrap();

        assert_eq!(&dst[..], b"c2FtcGxlIHRleHQ=");
    }

    #[test]
    fn test_payload_item_encoder_with_chained_buf() {
        let mut encoder = Base64Encoder::new();
        let mut dst = BytesMut::new();

        let chained = Buf::chain(&b"sam"[..], &b"ple text"[..]);
        Encoder::encode(&mut encoder, PayloadItem::Chunk(chained), &mut dst).unwrap();
        Encoder::encode(&mut encoder, PayloadItem::<&[u8]>::Eof, &mut dst).unwrap();

        assert_eq!(&dst[..], b"c2FtcGxlIHRleHQ=");
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        let mut dst = BytesMut::new();
        assert!(matches!(decode_base64(b"YWJ", &mut dst), Err(ParseError::InvalidBase64 { position: 3 })));
        assert!(matches!(decode_base64(b"YW*j", &mut dst), Err(ParseError::InvalidBase64 { position: 2 })));
        assert!(matches!(decode_base64(b"YQ==YWJj", &mut dst), Err(ParseError::InvalidBase64 { position: 2 })));
    }
}
