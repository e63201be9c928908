// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The capabilities the host environment must provide to the engine.
//!
//! None of this is transport: it's the narrow sliver of platform access
//! (last-reset cause, coredump partition geometry, flash reads, flash erase)
//! that the engine needs in order to find and retire an image. Everything
//! about how the bytes leave the device is modeled in [`crate::orchestrate`]
//! instead.

/// Byte offset into flash. Matches the platform's native flash-offset width;
/// widen this if a target ever needs more than 32 bits of image address.
pub type FlashAddr = u32;

/// The reason the device's most recent reset occurred.
///
/// `Other` carries the raw platform-specific code for causes the engine
/// doesn't need to distinguish; `Unknown` is for a reason the platform
/// couldn't determine at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetCause {
    PowerOn,
    SoftwareReset,
    DeepSleepWake,
    Panic,
    InterruptWatchdog,
    TaskWatchdog,
    GenericWatchdog,
    Unknown,
    Other(u32),
}

/// Platform collaborators the engine consumes but never owns.
///
/// `Error` is left to the implementor: a platform's flash/image errors are
/// its own business, and the engine only ever wraps them opaquely (see
/// [`crate::locate::LocateError::Platform`] and
/// [`crate::orchestrate::UploadError::Platform`]).
pub trait Platform {
    type Error: core::fmt::Debug;

    /// The platform's last-reset-cause code, decoded to [`ResetCause`].
    fn last_reset_reason(&self) -> ResetCause;

    /// Locates the coredump image, returning `(flash_addr, total_size)`.
    ///
    /// `total_size == 0` is not itself an error at this layer; the Locator
    /// (§4.2) is the one that turns that into [`crate::locate::LocateError::NoImage`].
    fn coredump_image_locate(
        &self,
    ) -> Result<(FlashAddr, u32), Self::Error>;

    /// Reads exactly `dst.len()` bytes starting at `addr`, or fails.
    fn flash_read(
        &mut self,
        addr: FlashAddr,
        dst: &mut [u8],
    ) -> Result<(), Self::Error>;

    /// Erases the coredump image, retiring it so it isn't re-sent next boot.
    fn coredump_image_erase(&mut self) -> Result<(), Self::Error>;
}
