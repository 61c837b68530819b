//! Byte cursor used while walking backwards from the end of a file to locate
//! the PostScript and its length prefix.
//!
//! Mirrors a simple head/ptr/size bookkeeping scheme: `head` marks the start
//! of the current window, `ptr` is the cursor, and the window's length is the
//! distance between them. `rewind_shift` is the operation that matters here:
//! it walks the cursor back by `n` bytes and then re-bases the window to
//! start there, which is exactly the "found the length prefix, now point at
//! the start of the thing it describes" move the tail parser needs.

use bytes::{Bytes, BytesMut};

#[derive(Debug)]
enum Storage {
    Owned(BytesMut),
    Borrowed(Bytes),
}

impl Storage {
    fn as_slice(&self) -> &[u8] {
        match self {
            Storage::Owned(b) => b.as_ref(),
            Storage::Borrowed(b) => b.as_ref(),
        }
    }
}

/// A forward/backward cursor over an owned or borrowed byte region.
#[derive(Debug)]
pub struct Buffer {
    storage: Storage,
    window_start: usize,
    pos: usize,
}

impl Buffer {
    /// Allocates a zeroed, owned buffer of `capacity` bytes, cursor at the start.
    pub fn new(capacity: usize) -> Self {
        Buffer {
            storage: Storage::Owned(BytesMut::zeroed(capacity)),
            window_start: 0,
            pos: 0,
        }
    }

    /// Wraps an existing byte region without copying it, cursor at the start.
    pub fn from_stream(data: Bytes) -> Self {
        Buffer {
            storage: Storage::Borrowed(data),
            window_start: 0,
            pos: 0,
        }
    }

    /// Bytes consumed in the current window.
    pub fn size(&self) -> usize {
        self.pos - self.window_start
    }

    /// The current window, from its start up to the cursor.
    pub fn window(&self) -> &[u8] {
        &self.storage.as_slice()[self.window_start..self.pos]
    }

    /// The byte at the cursor, if any remain.
    pub fn peek(&self) -> Option<u8> {
        self.storage.as_slice().get(self.pos).copied()
    }

    /// Advances the cursor by `n` bytes, growing the current window.
    pub fn forward(&mut self, n: usize) {
        self.pos += n;
    }

    /// Moves the cursor back by `n` bytes, shrinking the current window.
    pub fn rewind(&mut self, n: usize) {
        self.pos -= n;
    }

    /// Rewinds by `n` then re-bases the window to start at the new cursor
    /// position, leaving the cursor itself back where it started. After this
    /// call `window()` is exactly the `n` bytes immediately preceding the
    /// cursor's position before the call.
    pub fn rewind_shift(&mut self, n: usize) {
        self.rewind(n);
        self.window_start = self.pos;
        self.forward(n);
    }

    /// Writes `data` into the owned storage at the cursor and advances past
    /// it, growing the window. No-op (debug-asserts) on borrowed storage.
    pub fn append(&mut self, data: &[u8]) {
        match &mut self.storage {
            Storage::Owned(buf) => {
                buf[self.pos..self.pos + data.len()].copy_from_slice(data);
                self.pos += data.len();
            }
            Storage::Borrowed(_) => {
                debug_assert!(false, "append on a borrowed buffer has no effect");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_post_script_from_tail() {
        // A fake tail: some header bytes, a 3-byte "post script", then the
        // length byte (3) as the very last byte of the file.
        let data = Bytes::from_static(b"XXXXXabc\x03");
        let mut buf = Buffer::from_stream(data.clone());

        buf.forward(data.len() - 1);
        let post_script_length = buf.peek().unwrap() as usize;
        assert_eq!(post_script_length, 3);

        buf.rewind_shift(post_script_length);
        assert_eq!(buf.size(), 3);
        assert_eq!(buf.window(), b"abc");
    }

    #[test]
    fn forward_and_rewind_are_inverse() {
        let mut buf = Buffer::from_stream(Bytes::from_static(b"0123456789"));
        buf.forward(5);
        assert_eq!(buf.size(), 5);
        buf.rewind(2);
        assert_eq!(buf.size(), 3);
        assert_eq!(buf.window(), b"012");
    }

    #[test]
    fn append_advances_owned_cursor() {
        let mut buf = Buffer::new(8);
        buf.append(b"ab");
        buf.append(b"cd");
        assert_eq!(buf.window(), b"abcd");
    }
}
