// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Panic-coredump upload engine: decides whether the last reset left a
//! coredump worth sending, sizes it into chunks (optionally Base64), and
//! drives the host-callback upload loop that streams it off and retires the
//! on-flash image.
//!
//! The engine owns no transport and no flash layout knowledge beyond what
//! [`platform::Platform`] hands it; everything else is pure chunk arithmetic
//! and a small state machine over host callbacks.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

mod encode;
mod locate;
mod orchestrate;
mod platform;
mod reset;

pub use encode::{encode, EncodeError};
pub use locate::{get_info, ImageDescriptor, LocateError, DEFAULT_CHUNK_SIZE};
pub use orchestrate::{upload, HostStatus, UploadError, UploaderContract};
pub use platform::{FlashAddr, Platform, ResetCause};
pub use reset::need_upload;
