//! Byte stages of the interchange format: UTF-8 JSON, LZ, then zlib.

use super::{CodecError, CodecResult};
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use std::io::{Read, Write};

/// `zlib_deflate(lz_compress(utf8(json)))`.
pub fn pack(json: &str) -> CodecResult<Vec<u8>> {
    // LZ works on 16-bit units; each UTF-8 byte becomes one unit.
    let wide: Vec<u16> = json.bytes().map(u16::from).collect();
    let lz = lz_str::compress_to_uint8_array(wide.as_slice());

    let mut encoder = ZlibEncoder::new(Vec::with_capacity(lz.len() / 2), Compression::default());
    encoder
        .write_all(&lz)
        .map_err(|e| CodecError::Encode(format!("zlib: {e}")))?;
    let packed = encoder
        .finish()
        .map_err(|e| CodecError::Encode(format!("zlib: {e}")))?;
    log::debug!("Packed {} bytes of JSON into {} bytes", json.len(), packed.len());
    Ok(packed)
}

/// Inverse of [`pack`]. Any stage failing is a [`CodecError::CorruptPayload`].
pub fn unpack(bytes: &[u8]) -> CodecResult<String> {
    let mut lz = Vec::new();
    ZlibDecoder::new(bytes)
        .read_to_end(&mut lz)
        .map_err(|e| CodecError::CorruptPayload(format!("zlib: {e}")))?;

    let wide = lz_str::decompress_from_uint8_array(&lz)
        .ok_or_else(|| CodecError::CorruptPayload("lz: invalid stream".to_string()))?;
    let utf8 = wide
        .into_iter()
        .map(u8::try_from)
        .collect::<Result<Vec<u8>, _>>()
        .map_err(|_| CodecError::CorruptPayload("lz: unit outside byte range".to_string()))?;
    String::from_utf8(utf8).map_err(|e| CodecError::CorruptPayload(format!("utf-8: {e}")))
}
