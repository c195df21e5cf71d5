//! Minimal BMP decoder: uncompressed 24-bit images only.
//!
//! Two header fields are commonly left zeroed by sloppy encoders and get
//! default values instead of failing:
//! - image size `0` becomes `width * height * 3`;
//! - pixel data offset `0` becomes [`HEADER_LEN`] (data right after the header).

use std::{
    fs::File,
    io::{self, BufReader, Cursor, Read, Seek, SeekFrom},
    path::Path,
};

use crate::{
    error::{DecodeError, DecodeResult},
    raster::RasterImage,
};

/// Size of the file header plus the BITMAPINFOHEADER.
pub const HEADER_LEN: usize = 54;

const SIGNATURE: [u8; 2] = *b"BM";

const OFFSET_DATA_POS: usize = 0x0A;
const OFFSET_WIDTH: usize = 0x12;
const OFFSET_HEIGHT: usize = 0x16;
const OFFSET_BITS_PER_PIXEL: usize = 0x1C;
const OFFSET_COMPRESSION: usize = 0x1E;
const OFFSET_IMAGE_SIZE: usize = 0x22;

/// Header fields after default substitution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BmpHeader {
    pub data_offset: u32,
    pub image_size: u32,
    pub width: u32,
    pub height: u32,
}

impl BmpHeader {
    pub fn parse(header: &[u8; HEADER_LEN]) -> DecodeResult<Self> {
        let signature = [header[0], header[1]];
        if signature != SIGNATURE {
            return Err(DecodeError::InvalidMagic { found: signature });
        }

        let compression = le_u32(header, OFFSET_COMPRESSION);
        if compression != 0 {
            return Err(DecodeError::UnsupportedFormat(format!(
                "compression mode {compression}"
            )));
        }
        let bits_per_pixel = u16::from_le_bytes([
            header[OFFSET_BITS_PER_PIXEL],
            header[OFFSET_BITS_PER_PIXEL + 1],
        ]);
        if bits_per_pixel != 24 {
            return Err(DecodeError::UnsupportedFormat(format!(
                "{bits_per_pixel} bits per pixel"
            )));
        }

        let width = le_i32(header, OFFSET_WIDTH);
        let height = le_i32(header, OFFSET_HEIGHT);
        if width <= 0 || height <= 0 {
            return Err(DecodeError::UnsupportedFormat(format!(
                "dimensions {width}x{height}"
            )));
        }
        let (width, height) = (width as u32, height as u32);

        let mut image_size = le_u32(header, OFFSET_IMAGE_SIZE);
        if image_size == 0 {
            image_size = u32::try_from(packed_len(width, height)?).map_err(|_| {
                DecodeError::UnsupportedFormat(format!("dimensions {width}x{height}"))
            })?;
        }
        let mut data_offset = le_u32(header, OFFSET_DATA_POS);
        if data_offset == 0 {
            data_offset = HEADER_LEN as u32;
        }

        Ok(Self {
            data_offset,
            image_size,
            width,
            height,
        })
    }

    /// Bytes per stored row. Rows are taken as 4-byte aligned only when the
    /// declared image size covers the padding; otherwise they are tightly packed.
    pub fn row_stride(&self) -> usize {
        let packed = self.width as usize * RasterImage::BYTES_PER_PIXEL;
        let padded = (packed + 3) & !3;
        if padded != packed && self.image_size as usize >= padded * self.height as usize {
            padded
        } else {
            packed
        }
    }
}

/// Decode a BMP file from disk.
pub fn decode(path: impl AsRef<Path>) -> DecodeResult<RasterImage> {
    let path = path.as_ref();
    log::info!("Reading image {}", path.display());

    let file = File::open(path).map_err(|source| DecodeError::NotFound {
        path: path.to_path_buf(),
        source,
    })?;
    decode_from_reader(BufReader::new(file))
}

/// Decode a BMP held in memory.
pub fn decode_bytes(bytes: &[u8]) -> DecodeResult<RasterImage> {
    decode_from_reader(Cursor::new(bytes))
}

/// Decode a BMP from any seekable reader positioned at the signature.
pub fn decode_from_reader<R: Read + Seek>(mut reader: R) -> DecodeResult<RasterImage> {
    let mut raw = [0u8; HEADER_LEN];
    let found = read_up_to(&mut reader, &mut raw)?;
    if found < HEADER_LEN {
        return Err(DecodeError::Truncated {
            needed: HEADER_LEN,
            found,
        });
    }
    let header = BmpHeader::parse(&raw)?;

    let packed_row = header.width as usize * RasterImage::BYTES_PER_PIXEL;
    let stride = header.row_stride();
    let needed = packed_len(header.width, header.height)?;
    if (header.image_size as usize) < needed {
        return Err(DecodeError::Truncated {
            needed,
            found: header.image_size as usize,
        });
    }

    reader.seek(SeekFrom::Start(u64::from(header.data_offset)))?;

    let stored = stride * header.height as usize;
    let mut data = vec![0u8; stored];
    let found = read_up_to(&mut reader, &mut data)?;
    if found < stored {
        return Err(DecodeError::Truncated {
            needed: stored,
            found,
        });
    }

    if stride != packed_row {
        data = data
            .chunks_exact(stride)
            .flat_map(|row| &row[..packed_row])
            .copied()
            .collect();
    }

    log::debug!(
        "Decoded BMP {}x{} (offset {}, stride {})",
        header.width,
        header.height,
        header.data_offset,
        stride
    );

    RasterImage::from_bgr8(header.width, header.height, data).ok_or_else(|| {
        DecodeError::UnsupportedFormat(format!(
            "dimensions {}x{}",
            header.width, header.height
        ))
    })
}

fn packed_len(width: u32, height: u32) -> DecodeResult<usize> {
    RasterImage::byte_len(width, height)
        .ok_or_else(|| DecodeError::UnsupportedFormat(format!("dimensions {width}x{height}")))
}

/// Fill as much of `buf` as the reader can provide; returns the byte count.
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[inline]
fn le_u32(header: &[u8; HEADER_LEN], offset: usize) -> u32 {
    u32::from_le_bytes([
        header[offset],
        header[offset + 1],
        header[offset + 2],
        header[offset + 3],
    ])
}

#[inline]
fn le_i32(header: &[u8; HEADER_LEN], offset: usize) -> i32 {
    le_u32(header, offset) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a 24-bit BMP with tightly packed rows.
    fn bitmap(width: i32, height: i32, pixels: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; HEADER_LEN];
        out[0] = b'B';
        out[1] = b'M';
        let file_size = (HEADER_LEN + pixels.len()) as u32;
        out[0x02..0x06].copy_from_slice(&file_size.to_le_bytes());
        out[0x0A..0x0E].copy_from_slice(&(HEADER_LEN as u32).to_le_bytes());
        out[0x0E..0x12].copy_from_slice(&40u32.to_le_bytes());
        out[0x12..0x16].copy_from_slice(&width.to_le_bytes());
        out[0x16..0x1A].copy_from_slice(&height.to_le_bytes());
        out[0x1A..0x1C].copy_from_slice(&1u16.to_le_bytes());
        out[0x1C..0x1E].copy_from_slice(&24u16.to_le_bytes());
        out[0x22..0x26].copy_from_slice(&(pixels.len() as u32).to_le_bytes());
        out.extend_from_slice(pixels);
        out
    }

    fn patch_u32(bytes: &mut [u8], offset: usize, value: u32) {
        bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    const PIXELS_2X2: [u8; 12] = [
        10, 20, 30, 11, 21, 31, // bottom row
        12, 22, 32, 13, 23, 33, // top row
    ];

    #[test]
    fn decodes_24bit_bitmap_in_bgr_order() {
        let img = decode_bytes(&bitmap(2, 2, &PIXELS_2X2)).expect("decode");
        assert_eq!(img.width(), 2);
        assert_eq!(img.height(), 2);
        assert_eq!(img.pixels().len(), 2 * 2 * 3);
        assert_eq!(img.pixels(), &PIXELS_2X2);
        assert_eq!(img.pixel(1, 0), Some([11, 21, 31]));
    }

    #[test]
    fn zero_image_size_is_recomputed() {
        let mut bytes = bitmap(2, 2, &PIXELS_2X2);
        patch_u32(&mut bytes, OFFSET_IMAGE_SIZE, 0);
        let img = decode_bytes(&bytes).expect("decode");
        assert_eq!(img.pixels(), &PIXELS_2X2);
    }

    #[test]
    fn zero_data_offset_defaults_to_header_end() {
        let mut bytes = bitmap(2, 2, &PIXELS_2X2);
        patch_u32(&mut bytes, OFFSET_DATA_POS, 0);
        let img = decode_bytes(&bytes).expect("decode");
        assert_eq!(img.pixels(), &PIXELS_2X2);
    }

    #[test]
    fn honours_data_offset_past_header() {
        let mut bytes = bitmap(2, 2, &[]);
        patch_u32(&mut bytes, OFFSET_DATA_POS, (HEADER_LEN + 4) as u32);
        patch_u32(&mut bytes, OFFSET_IMAGE_SIZE, 12);
        bytes.extend_from_slice(&[0xAA; 4]);
        bytes.extend_from_slice(&PIXELS_2X2);
        let img = decode_bytes(&bytes).expect("decode");
        assert_eq!(img.pixels(), &PIXELS_2X2);
    }

    #[test]
    fn missing_signature_is_invalid_magic() {
        let mut bytes = bitmap(2, 2, &PIXELS_2X2);
        bytes[0] = b'P';
        bytes[1] = b'K';
        match decode_bytes(&bytes) {
            Err(DecodeError::InvalidMagic { found }) => assert_eq!(&found, b"PK"),
            other => panic!("expected InvalidMagic, got {other:?}"),
        }
    }

    #[test]
    fn short_header_is_truncated() {
        let bytes = bitmap(2, 2, &PIXELS_2X2);
        match decode_bytes(&bytes[..40]) {
            Err(DecodeError::Truncated { needed, found }) => {
                assert_eq!(needed, HEADER_LEN);
                assert_eq!(found, 40);
            }
            other => panic!("expected Truncated, got {other:?}"),
        }
    }

    #[test]
    fn short_pixel_data_is_truncated() {
        let bytes = bitmap(2, 2, &PIXELS_2X2);
        assert!(matches!(
            decode_bytes(&bytes[..bytes.len() - 1]),
            Err(DecodeError::Truncated { needed: 12, found: 11 })
        ));
    }

    #[test]
    fn rejects_compressed_and_non_24bit() {
        let mut compressed = bitmap(2, 2, &PIXELS_2X2);
        patch_u32(&mut compressed, OFFSET_COMPRESSION, 1);
        assert!(matches!(
            decode_bytes(&compressed),
            Err(DecodeError::UnsupportedFormat(_))
        ));

        let mut bits32 = bitmap(2, 2, &PIXELS_2X2);
        bits32[OFFSET_BITS_PER_PIXEL] = 32;
        assert!(matches!(
            decode_bytes(&bits32),
            Err(DecodeError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn rejects_non_positive_dimensions() {
        assert!(matches!(
            decode_bytes(&bitmap(2, -2, &PIXELS_2X2)),
            Err(DecodeError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn strips_row_padding_when_declared() {
        // 1x2 image: 3 bytes of pixels + 1 byte padding per row.
        let stored = [1, 2, 3, 0, 4, 5, 6, 0];
        let img = decode_bytes(&bitmap(1, 2, &stored)).expect("decode");
        assert_eq!(img.pixels(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn missing_file_is_not_found() {
        let path = std::env::temp_dir().join("terrascape-bmp-does-not-exist.bmp");
        assert!(matches!(decode(&path), Err(DecodeError::NotFound { .. })));
    }

    #[test]
    fn decodes_from_disk() {
        let path = std::env::temp_dir().join(format!(
            "terrascape-bmp-{}-{:?}.bmp",
            std::process::id(),
            std::thread::current().id()
        ));
        std::fs::write(&path, bitmap(2, 2, &PIXELS_2X2)).expect("write fixture");
        let img = decode(&path);
        let _ = std::fs::remove_file(&path);
        assert_eq!(img.expect("decode").pixels(), &PIXELS_2X2);
    }

    #[test]
    fn agrees_with_image_crate_encoder() {
        use image::{ExtendedColorType, codecs::bmp::BmpEncoder};

        let (w, h) = (3u32, 2u32);
        let rgb: Vec<u8> = (0..(w * h * 3) as u8).map(|v| v.wrapping_mul(7)).collect();
        let mut encoded = Vec::new();
        BmpEncoder::new(&mut encoded)
            .encode(&rgb, w, h, ExtendedColorType::Rgb8)
            .expect("encode");

        let img = decode_bytes(&encoded).expect("decode");
        assert_eq!((img.width(), img.height()), (w, h));
        for y in 0..h {
            for x in 0..w {
                // Source rows are top-down RGB; decoded rows are bottom-up BGR.
                let i = ((h - 1 - y) * w + x) as usize * 3;
                let expected = [rgb[i + 2], rgb[i + 1], rgb[i]];
                assert_eq!(img.pixel(x, y), Some(expected), "pixel ({x}, {y})");
            }
        }
    }
}
