// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reset-cause classification (§4.1).
//!
//! A single pure function deciding whether the reset that just happened is
//! the kind that plausibly left a coredump behind. Unknown causes are
//! treated as "upload": a silently corrupted reason is cheaper to retry than
//! to suppress.

use crate::platform::ResetCause;

/// Returns `true` if the given reset cause warrants attempting an upload.
///
/// Idempotent and side-effect free; safe to call before any peripheral bring-up.
pub fn need_upload(cause: ResetCause) -> bool {
    match cause {
        ResetCause::Panic
        | ResetCause::InterruptWatchdog
        | ResetCause::TaskWatchdog
        | ResetCause::GenericWatchdog
        | ResetCause::Unknown => true,
        ResetCause::PowerOn
        | ResetCause::SoftwareReset
        | ResetCause::DeepSleepWake
        | ResetCause::Other(_) => false,
    }
}
