// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Named auto-reset "non-empty" notification.
//!
//! Backed by an abstract-namespace Unix datagram socket. The consumer binds
//! the name (so at most one consumer can exist per channel), producers send a
//! one-byte datagram per successful push. A full receive queue already means
//! "signaled", so `EAGAIN` on send is success. The consumer resets the
//! notification by draining every pending datagram.

use std::io;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd};

use nix::errno::Errno;
use nix::sys::socket::{
    bind, recv, sendto, socket, AddressFamily, MsgFlags, SockFlag, SockType, UnixAddr,
};

use crate::error::{AttachError, SyncError};

const OBJECT: &str = "notification socket";

/// One end of the non-empty notification.
#[derive(Debug)]
pub struct NonEmptyNotifier {
    name: String,
    addr: UnixAddr,
    fd: OwnedFd,
    listening: bool,
}

impl NonEmptyNotifier {
    fn new_socket(name: &str) -> Result<(OwnedFd, UnixAddr), AttachError> {
        let primitive = |errno: Errno| AttachError::Primitive {
            object: OBJECT,
            name: name.to_string(),
            source: io::Error::from(errno),
        };

        let addr = UnixAddr::new_abstract(name.as_bytes()).map_err(primitive)?;
        let fd = socket(
            AddressFamily::Unix,
            SockType::Datagram,
            SockFlag::SOCK_NONBLOCK | SockFlag::SOCK_CLOEXEC,
            None,
        )
        .map_err(primitive)?;

        Ok((fd, addr))
    }

    /// Bind the notification name. Only the consumer does this.
    pub fn bind(name: &str) -> Result<Self, AttachError> {
        let (fd, addr) = Self::new_socket(name)?;

        match bind(fd.as_raw_fd(), &addr) {
            Ok(()) => {}
            Err(Errno::EADDRINUSE) => {
                return Err(AttachError::ConsumerAlreadyRunning {
                    name: name.to_string(),
                })
            }
            Err(errno) => {
                return Err(AttachError::Primitive {
                    object: OBJECT,
                    name: name.to_string(),
                    source: io::Error::from(errno),
                })
            }
        }

        tracing::debug!(name = %name, "Bound channel notification");

        Ok(Self {
            name: name.to_string(),
            addr,
            fd,
            listening: true,
        })
    }

    /// Create an unbound sender for a producer.
    pub fn connect(name: &str) -> Result<Self, AttachError> {
        let (fd, addr) = Self::new_socket(name)?;

        Ok(Self {
            name: name.to_string(),
            addr,
            fd,
            listening: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the notification. Never blocks.
    pub fn signal(&self) -> Result<(), SyncError> {
        loop {
            match sendto(self.fd.as_raw_fd(), &[1u8], &self.addr, MsgFlags::MSG_DONTWAIT) {
                Ok(_) | Err(Errno::EAGAIN) => return Ok(()),
                Err(Errno::EINTR) => continue,
                Err(errno) => {
                    return Err(SyncError::SignalFailed {
                        name: self.name.clone(),
                        source: io::Error::from(errno),
                    })
                }
            }
        }
    }

    /// Reset the notification by draining every pending datagram.
    ///
    /// Returns how many signals were pending. Only meaningful on the bound end.
    pub fn clear(&self) -> Result<usize, SyncError> {
        if !self.listening {
            return Ok(0);
        }

        let mut buf = [0u8; 16];
        let mut drained = 0;
        loop {
            match recv(self.fd.as_raw_fd(), &mut buf, MsgFlags::MSG_DONTWAIT) {
                Ok(_) => drained += 1,
                Err(Errno::EAGAIN) => return Ok(drained),
                Err(Errno::EINTR) => continue,
                Err(errno) => {
                    return Err(SyncError::WaitFailed {
                        source: io::Error::from(errno),
                    })
                }
            }
        }
    }
}

impl AsFd for NonEmptyNotifier {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}
