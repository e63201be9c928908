// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Image discovery and chunk-geometry derivation (§3, §4.2).

use crate::platform::{FlashAddr, Platform};
use derive_more::From;

/// Default raw chunk size when the caller passes `0`.
///
/// Chosen because `768 == 3 * 256`: it's already Base64-clean, so asking for
/// Base64 with the default chunk size never triggers the rounding in
/// [`resolve_chunk_size`].
pub const DEFAULT_CHUNK_SIZE: u32 = 768;

static_assertions::const_assert!(DEFAULT_CHUNK_SIZE % 3 == 0);

/// Self-consistent description of a coredump image and its chunk geometry.
///
/// Constructed only by [`get_info`]; every field satisfies the invariants in
/// the data model (§3) by construction, so downstream code never has to
/// re-check them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDescriptor {
    pub flash_addr: FlashAddr,
    pub total_size: u32,
    pub chunk_size: u32,
    pub chunk_count: u32,
    pub last_chunk_size: u32,
    pub use_base64: bool,
    pub b64_chunk_size: u32,
    pub b64_last_chunk_size: u32,
    pub b64_total_size: u32,
}

impl ImageDescriptor {
    /// Raw byte count to read for chunk `index` (zero-based).
    pub fn bytes_to_read(&self, index: u32) -> u32 {
        if index + 1 == self.chunk_count {
            self.last_chunk_size
        } else {
            self.chunk_size
        }
    }

    /// Wire-side byte count for chunk `index`: the Base64-encoded length if
    /// `use_base64`, else the same as [`Self::bytes_to_read`].
    pub fn bytes_to_send(&self, index: u32) -> u32 {
        if !self.use_base64 {
            return self.bytes_to_read(index);
        }
        if index + 1 == self.chunk_count {
            self.b64_last_chunk_size
        } else {
            self.b64_chunk_size
        }
    }
}

/// Errors from locating and sizing the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, From)]
pub enum LocateError<E> {
    /// The platform reports a zero-length (i.e. absent) coredump.
    NoImage,
    /// The underlying image-locate call failed.
    Platform(E),
}

/// `4 * ceil(n/3)`: the Base64-encoded length of an `n`-byte input.
fn b64_encoded_len(n: u32) -> u32 {
    4 * ceil_div(n, 3)
}

fn ceil_div(a: u32, b: u32) -> u32 {
    ((a as u64 + b as u64 - 1) / b as u64) as u32
}

/// Resolves the caller's requested chunk size to the one the upload will
/// actually use (§4.2, §6 "Recognized configuration options").
fn resolve_chunk_size(desired_chunk_size: u32, use_base64: bool) -> u32 {
    let mut chunk_size = if desired_chunk_size == 0 {
        DEFAULT_CHUNK_SIZE
    } else {
        desired_chunk_size
    };

    if use_base64 && chunk_size % 3 != 0 {
        chunk_size -= chunk_size % 3;
        if chunk_size == 0 {
            chunk_size = 3;
        }
    }

    chunk_size
}

/// Locates the coredump image and derives its chunk geometry.
///
/// `desired_chunk_size == 0` selects [`DEFAULT_CHUNK_SIZE`]. See §4.2 for the
/// Base64 rounding rule applied to a nonzero, non-multiple-of-3 request.
pub fn get_info<P: Platform>(
    platform: &P,
    desired_chunk_size: u32,
    use_base64: bool,
) -> Result<ImageDescriptor, LocateError<P::Error>> {
    let (flash_addr, total_size) = platform.coredump_image_locate()?;

    if total_size == 0 {
        return Err(LocateError::NoImage);
    }

    let chunk_size = resolve_chunk_size(desired_chunk_size, use_base64);

    let chunk_count = ceil_div(total_size, chunk_size);
    let remainder = total_size % chunk_size;
    let last_chunk_size = if remainder == 0 { chunk_size } else { remainder };

    let (b64_chunk_size, b64_last_chunk_size, b64_total_size) = if use_base64
    {
        let b64_chunk_size = b64_encoded_len(chunk_size);
        let b64_last_chunk_size = b64_encoded_len(last_chunk_size);
        let b64_total_size = b64_chunk_size * (chunk_count - 1)
            + b64_last_chunk_size;
        (b64_chunk_size, b64_last_chunk_size, b64_total_size)
    } else {
        (0, 0, 0)
    };

    Ok(ImageDescriptor {
        flash_addr,
        total_size,
        chunk_size,
        chunk_count,
        last_chunk_size,
        use_base64,
        b64_chunk_size,
        b64_last_chunk_size,
        b64_total_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakePlatform {
        flash_addr: FlashAddr,
        total_size: u32,
    }

    impl Platform for FakePlatform {
        type Error = core::convert::Infallible;

        fn last_reset_reason(&self) -> crate::platform::ResetCause {
            crate::platform::ResetCause::Unknown
        }

        fn coredump_image_locate(
            &self,
        ) -> Result<(FlashAddr, u32), Self::Error> {
            Ok((self.flash_addr, self.total_size))
        }

        fn flash_read(
            &mut self,
            _addr: FlashAddr,
            _dst: &mut [u8],
        ) -> Result<(), Self::Error> {
            Ok(())
        }

        fn coredump_image_erase(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    fn platform(total_size: u32) -> FakePlatform {
        FakePlatform { flash_addr: 0x3002_0000, total_size }
    }

    #[test]
    fn no_image_when_size_is_zero() {
        let p = platform(0);
        assert_eq!(get_info(&p, 0, false), Err(LocateError::NoImage));
    }

    #[test]
    fn default_chunk_size_is_768() {
        let p = platform(5);
        let d = get_info(&p, 0, false).unwrap();
        assert_eq!(d.chunk_size, 768);
        assert_eq!(d.chunk_count, 1);
        assert_eq!(d.last_chunk_size, 5);
    }

    #[test]
    fn base64_rounds_non_multiple_of_three_down() {
        let p = platform(1000);
        let d = get_info(&p, 2, true).unwrap();
        assert_eq!(d.chunk_size, 3);

        let d = get_info(&p, 1, true).unwrap();
        assert_eq!(d.chunk_size, 3);
    }

    #[test]
    fn scenario_s1_four_chunks_no_base64() {
        let p = platform(1000);
        let d = get_info(&p, 300, false).unwrap();
        assert_eq!(d.chunk_count, 4);
        assert_eq!(d.chunk_size, 300);
        assert_eq!(d.last_chunk_size, 100);
        assert_eq!(d.bytes_to_read(0), 300);
        assert_eq!(d.bytes_to_read(3), 100);
    }

    #[test]
    fn scenario_s2_base64_already_clean_chunk_size() {
        let p = platform(1000);
        let d = get_info(&p, 300, true).unwrap();
        assert_eq!(d.chunk_size, 300); // already a multiple of 3
        assert_eq!(d.b64_chunk_size, 400);
        assert_eq!(d.b64_last_chunk_size, 136);
        assert_eq!(d.bytes_to_send(0), 400);
        assert_eq!(d.bytes_to_send(3), 136);
    }

    #[test]
    fn single_byte_image() {
        let p = platform(1);
        let d = get_info(&p, 300, false).unwrap();
        assert_eq!(d.chunk_count, 1);
        assert_eq!(d.last_chunk_size, 1);
    }

    #[test]
    fn image_exactly_one_chunk() {
        let p = platform(300);
        let d = get_info(&p, 300, false).unwrap();
        assert_eq!(d.chunk_count, 1);
        assert_eq!(d.last_chunk_size, 300);
    }

    #[test]
    fn image_one_byte_over_a_chunk() {
        let p = platform(301);
        let d = get_info(&p, 300, false).unwrap();
        assert_eq!(d.chunk_count, 2);
        assert_eq!(d.last_chunk_size, 1);
    }

    #[test]
    fn invariants_hold_across_a_grid_of_sizes() {
        for total_size in [1u32, 2, 3, 299, 300, 301, 1000, 2305] {
            for chunk_size in [1u32, 2, 3, 7, 300, 768, 4096] {
                let p = platform(total_size);
                let d = get_info(&p, chunk_size, false).unwrap();
                assert_eq!(
                    d.chunk_size * (d.chunk_count - 1) + d.last_chunk_size,
                    d.total_size
                );
                assert!(d.last_chunk_size >= 1 && d.last_chunk_size <= d.chunk_size);
                if d.chunk_count == 1 {
                    assert_eq!(d.last_chunk_size, d.total_size);
                }
            }
        }
    }

    #[test]
    fn get_info_is_pure() {
        let p = platform(1000);
        let a = get_info(&p, 300, true).unwrap();
        let b = get_info(&p, 300, true).unwrap();
        assert_eq!(a, b);
    }
}
