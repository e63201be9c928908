// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The upload state machine (§4.4): start -> (read, encode?, write, progress?)
//! x N -> end -> erase, with the commit/rollback policy over the on-flash
//! image.
//!
//! The engine never retries and never partially erases. Every error path
//! still runs `end` (if `start` got that far) and always skips the erase, so
//! a failed upload simply leaves the image in place for the next boot.

use alloc::vec::Vec;

use crate::locate::{self, ImageDescriptor, LocateError};
use crate::platform::Platform;
use ringbuf::{ringbuf, ringbuf_entry};

/// The outcome a host callback reports back to the engine.
///
/// Named for what a callback is actually reporting ("non-OK aborts...")
/// rather than a bare `Result`, since a callback failure isn't a Rust error
/// so much as a cooperative request to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostStatus {
    Ok,
    Abort,
}

/// The four capability slots the host exposes to the engine, plus the
/// opaque context they all operate on (§3 "UploaderContract", §6 "Host
/// callback surface").
///
/// `ctx` is borrowed for the duration of one [`upload`] call; the engine
/// passes it to each callback verbatim and never interprets it itself.
pub struct UploaderContract<'a, Ctx> {
    pub ctx: &'a mut Ctx,
    pub start: Option<fn(&mut Ctx) -> HostStatus>,
    pub write: Option<fn(&mut Ctx, &[u8]) -> HostStatus>,
    pub end: Option<fn(&mut Ctx) -> HostStatus>,
    pub progress: Option<fn(&mut Ctx, &ImageDescriptor, u32, u32) -> HostStatus>,
}

/// Errors an upload attempt can end in (§7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadError<E> {
    InvalidArgument,
    NoImage,
    Platform(E),
    OutOfMemory,
    ReadFailed,
    EncodeFailed,
    StartFailed,
    WriteFailed,
    EndFailed,
    Cancelled,
    EraseFailed,
}

impl<E> From<LocateError<E>> for UploadError<E> {
    fn from(err: LocateError<E>) -> Self {
        match err {
            LocateError::NoImage => UploadError::NoImage,
            LocateError::Platform(e) => UploadError::Platform(e),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trace {
    None,
    Starting,
    Chunk { index: u32, bytes_sent: u32 },
    ReadFailed(u32),
    EncodeFailed(u32),
    WriteFailed(u32),
    Cancelled(u32),
    Ending,
    EndFailedButEarlierErrorWins,
    Erasing,
    EraseFailed,
    Done,
    Aborted,
}

ringbuf!(Trace, 32, Trace::None);

/// Owns the two scoped heap buffers for one upload attempt (§3
/// "UploadSession"). Both buffers are released simply by falling out of
/// scope, on every exit path -- there's no manual free to forget.
struct UploadSession {
    read_buf: Vec<u8>,
    encode_buf: Option<Vec<u8>>,
}

impl UploadSession {
    fn acquire(descriptor: &ImageDescriptor) -> Result<Self, ()> {
        let read_buf = try_alloc(descriptor.chunk_size as usize)?;
        let encode_buf = if descriptor.use_base64 {
            Some(try_alloc(descriptor.b64_chunk_size as usize + 1)?)
        } else {
            None
        };
        Ok(Self { read_buf, encode_buf })
    }
}

fn try_alloc(len: usize) -> Result<Vec<u8>, ()> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| ())?;
    buf.resize(len, 0);
    Ok(buf)
}

/// Drives one upload of the coredump image, start to finish.
///
/// If `descriptor` is `None`, the engine calls [`locate::get_info`] itself
/// with `desired_chunk_size = 0, use_base64 = false`. A missing `write`
/// callback is rejected immediately with [`UploadError::InvalidArgument`],
/// before any buffer is acquired or any flash is touched.
pub fn upload<P: Platform, Ctx>(
    platform: &mut P,
    contract: &mut UploaderContract<'_, Ctx>,
    descriptor: Option<ImageDescriptor>,
) -> Result<(), UploadError<P::Error>> {
    let Some(write) = contract.write else {
        return Err(UploadError::InvalidArgument);
    };

    let descriptor = match descriptor {
        Some(d) => d,
        None => locate::get_info(platform, 0, false)?,
    };

    let mut session =
        UploadSession::acquire(&descriptor).map_err(|_| UploadError::OutOfMemory)?;

    ringbuf_entry!(Trace::Starting);
    if let Some(start) = contract.start {
        if start(contract.ctx) == HostStatus::Abort {
            // INIT -> STARTING -> (abort): no stream loop, no `end`, no erase.
            return Err(UploadError::StartFailed);
        }
    }

    let mut error: Option<UploadError<P::Error>> = None;

    'streaming: for chunk_index in 0..descriptor.chunk_count {
        let bytes_to_read = descriptor.bytes_to_read(chunk_index) as usize;
        let addr = chunk_index
            .checked_mul(descriptor.chunk_size)
            .and_then(|offset| descriptor.flash_addr.checked_add(offset));
        let Some(addr) = addr else {
            ringbuf_entry!(Trace::ReadFailed(chunk_index));
            error = Some(UploadError::ReadFailed);
            break 'streaming;
        };

        if let Err(e) = platform.flash_read(addr, &mut session.read_buf[..bytes_to_read]) {
            ringbuf_entry!(Trace::ReadFailed(chunk_index));
            error = Some(UploadError::Platform(e));
            break 'streaming;
        }

        let (data, bytes_sent) = if descriptor.use_base64 {
            let encode_buf = session.encode_buf.as_mut().expect(
                "encode buffer is always present when use_base64 is set",
            );
            match crate::encode::encode(&session.read_buf[..bytes_to_read], encode_buf) {
                Ok(len) => (&encode_buf[..len], len as u32),
                Err(_) => {
                    ringbuf_entry!(Trace::EncodeFailed(chunk_index));
                    error = Some(UploadError::EncodeFailed);
                    break 'streaming;
                }
            }
        } else {
            (&session.read_buf[..bytes_to_read], bytes_to_read as u32)
        };

        if write(contract.ctx, data) == HostStatus::Abort {
            ringbuf_entry!(Trace::WriteFailed(chunk_index));
            error = Some(UploadError::WriteFailed);
            break 'streaming;
        }

        ringbuf_entry!(Trace::Chunk { index: chunk_index, bytes_sent });

        if let Some(progress) = contract.progress {
            if progress(contract.ctx, &descriptor, chunk_index, bytes_sent) == HostStatus::Abort {
                ringbuf_entry!(Trace::Cancelled(chunk_index));
                error = Some(UploadError::Cancelled);
                break 'streaming;
            }
        }
    }

    ringbuf_entry!(Trace::Ending);
    if let Some(end) = contract.end {
        if end(contract.ctx) == HostStatus::Abort {
            match error {
                None => error = Some(UploadError::EndFailed),
                Some(_) => ringbuf_entry!(Trace::EndFailedButEarlierErrorWins),
            }
        }
    }

    if error.is_none() {
        ringbuf_entry!(Trace::Erasing);
        if let Err(_platform_erase_err) = platform.coredump_image_erase() {
            ringbuf_entry!(Trace::EraseFailed);
            error = Some(UploadError::EraseFailed);
        }
    }

    match error {
        None => {
            ringbuf_entry!(Trace::Done);
            Ok(())
        }
        Some(e) => {
            ringbuf_entry!(Trace::Aborted);
            Err(e)
        }
    }
}
