//! Run-length encoding for color image transfers, plus image loading.
//!
//! The board's decoder expects plain (value, count) byte pairs with no
//! escapes. A count never exceeds 255, so a longer run is split across
//! several pairs.

use std::path::Path;

use image::{GrayImage, RgbImage};
use log::{debug, warn};

use crate::error::{BoardError, Result};
use crate::proto::command::Resolution;

pub const MAX_RUN: usize = 255;

pub fn rle_encode(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len().min(4096));
    let mut i = 0;
    while i < input.len() {
        let v = input[i];
        let run = input[i..]
            .iter()
            .take(MAX_RUN)
            .take_while(|&&b| b == v)
            .count();
        out.push(v);
        out.push(run as u8);
        i += run;
    }
    out
}

/// Encode R, G and B planes separately.
///
/// Layout: three 4-byte big-endian encoded lengths, then the three encoded
/// streams, all in R, G, B order.
pub fn color_image_to_rle_bytes(img: &RgbImage) -> Vec<u8> {
    let channels: Vec<Vec<u8>> = (0..3)
        .map(|ch| {
            let plane: Vec<u8> = img.pixels().map(|p| p.0[ch]).collect();
            rle_encode(&plane)
        })
        .collect();

    let total: usize = channels.iter().map(Vec::len).sum();
    let mut out = Vec::with_capacity(12 + total);
    for ch in &channels {
        out.extend_from_slice(&(ch.len() as u32).to_be_bytes());
    }
    for ch in &channels {
        out.extend_from_slice(ch);
    }
    debug!(
        "rle: {}x{} -> {} bytes ({} / {} / {})",
        img.width(),
        img.height(),
        out.len(),
        channels[0].len(),
        channels[1].len(),
        channels[2].len()
    );
    out
}

fn open(path: &Path) -> Result<image::DynamicImage> {
    if !path.exists() {
        return Err(BoardError::MissingResource(path.to_path_buf()));
    }
    Ok(image::open(path)?)
}

/// Cap every sample at `clip` (clip, not scale).
fn clip_samples(samples: &mut [u8], clip: Option<u8>) {
    if let Some(max) = clip {
        for s in samples.iter_mut() {
            *s = (*s).min(max);
        }
    }
}

pub fn load_rgb(path: &Path, clip: Option<u8>) -> Result<RgbImage> {
    let mut img = open(path)?.to_rgb8();
    clip_samples(&mut img, clip);
    Ok(img)
}

pub fn load_luma(path: &Path, clip: Option<u8>) -> Result<GrayImage> {
    let mut img = open(path)?.to_luma8();
    clip_samples(&mut img, clip);
    Ok(img)
}

/// Reject an image that cannot fill the configured panel.
///
/// With no known resolution the transfer proceeds; the board refuses
/// malformed payloads itself.
pub fn check_geometry(width: u32, height: u32, resolution: Option<Resolution>) -> Result<()> {
    match resolution {
        Some(res) => {
            let (want_w, want_h) = res.size();
            if (width, height) != (want_w, want_h) {
                return Err(BoardError::DimensionMismatch {
                    got_w: width,
                    got_h: height,
                    want_w,
                    want_h,
                });
            }
            Ok(())
        }
        None => {
            warn!("Writing image with unknown resolution settings.");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn pairs(encoded: &[u8]) -> Vec<(u8, u8)> {
        encoded.chunks(2).map(|p| (p[0], p[1])).collect()
    }

    #[test]
    fn run_of_exactly_256_splits() {
        let data = vec![7u8; 256];
        assert_eq!(pairs(&rle_encode(&data)), vec![(7, 255), (7, 1)]);
    }

    #[test]
    fn run_of_255_fits_one_pair() {
        let data = vec![9u8; 255];
        assert_eq!(pairs(&rle_encode(&data)), vec![(9, 255)]);
    }

    #[test]
    fn long_run_then_distinct_tail() {
        let mut data = vec![0x42u8; 300];
        data.extend_from_slice(&[1, 2, 3, 4, 5]);
        assert_eq!(
            pairs(&rle_encode(&data)),
            vec![(0x42, 255), (0x42, 45), (1, 1), (2, 1), (3, 1), (4, 1), (5, 1)]
        );
    }

    #[test]
    fn final_short_run_is_counted_whole() {
        assert_eq!(pairs(&rle_encode(&[3, 5, 5, 5])), vec![(3, 1), (5, 3)]);
        assert!(rle_encode(&[]).is_empty());
        assert_eq!(rle_encode(&[8]), vec![8, 1]);
    }

    #[test]
    fn decoded_runs_restore_input() {
        let mut data = Vec::new();
        for (v, n) in [(0u8, 600usize), (255, 3), (17, 256), (0, 1)] {
            data.extend(std::iter::repeat_n(v, n));
        }
        let decoded: Vec<u8> = pairs(&rle_encode(&data))
            .into_iter()
            .flat_map(|(v, n)| std::iter::repeat_n(v, n as usize))
            .collect();
        assert_eq!(decoded, data);
    }

    #[test]
    fn channel_lengths_precede_channel_data() {
        // 2x2: red plane constant, green plane alternating, blue zero
        let img = RgbImage::from_fn(2, 2, |x, _| Rgb([10, if x == 0 { 1 } else { 2 }, 0]));
        let out = color_image_to_rle_bytes(&img);
        let red = [10u8, 4];
        let green = [1u8, 1, 2, 1, 1, 1, 2, 1];
        let blue = [0u8, 4];
        let mut expect = Vec::new();
        expect.extend_from_slice(&2u32.to_be_bytes());
        expect.extend_from_slice(&8u32.to_be_bytes());
        expect.extend_from_slice(&2u32.to_be_bytes());
        expect.extend_from_slice(&red);
        expect.extend_from_slice(&green);
        expect.extend_from_slice(&blue);
        assert_eq!(out, expect);
    }

    #[test]
    fn missing_image_is_resource_error() {
        let err = load_rgb(Path::new("/nonexistent/panel.png"), None).unwrap_err();
        assert!(matches!(err, BoardError::MissingResource(_)));
    }

    #[test]
    fn loads_and_clips_png() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("grad.png");
        RgbImage::from_fn(4, 1, |x, _| Rgb([(x * 80) as u8, 200, 5]))
            .save(&path)
            .unwrap();
        let img = load_rgb(&path, Some(100)).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [0, 100, 5]);
        assert_eq!(img.get_pixel(3, 0).0, [100, 100, 5]);
    }

    #[test]
    fn geometry_check() {
        assert!(check_geometry(640, 480, Some(Resolution::Res640x480)).is_ok());
        assert!(matches!(
            check_geometry(640, 480, Some(Resolution::Res660x504)),
            Err(BoardError::DimensionMismatch { want_w: 660, .. })
        ));
        assert!(check_geometry(1, 1, None).is_ok());
    }
}
