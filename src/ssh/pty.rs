// ABOUTME: Pseudo-terminal out-of-band request payloads.
// ABOUTME: Encodes and decodes "pty-req" and "window-change" in SSH wire format.

use super::error::{Error, Result};
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Terminator of the encoded terminal modes string.
const TTY_OP_END: u8 = 0;
/// Opcodes at or above this value carry no defined argument.
const TTY_OP_INVALID: u8 = 160;

/// Parameters of a pseudo-terminal request for an interactive shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PtyRequest {
    /// TERM environment value, e.g. `xterm-256color`.
    pub term: String,
    pub cols: u32,
    pub rows: u32,
    pub width_px: u32,
    pub height_px: u32,
    /// Terminal modes as (opcode, argument) pairs.
    pub modes: Vec<(u8, u32)>,
}

impl PtyRequest {
    pub const REQUEST_TYPE: &'static str = "pty-req";

    pub fn new(term: impl Into<String>, cols: u32, rows: u32) -> Self {
        Self {
            term: term.into(),
            cols,
            rows,
            width_px: 0,
            height_px: 0,
            modes: Vec::new(),
        }
    }

    pub fn mode(mut self, opcode: u8, value: u32) -> Self {
        self.modes.push((opcode, value));
        self
    }

    /// Encode as the payload of a "pty-req" channel request.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();
        put_string(&mut buf, self.term.as_bytes());
        buf.put_u32(self.cols);
        buf.put_u32(self.rows);
        buf.put_u32(self.width_px);
        buf.put_u32(self.height_px);

        let mut modes = BytesMut::with_capacity(self.modes.len() * 5 + 1);
        for &(opcode, value) in &self.modes {
            modes.put_u8(opcode);
            modes.put_u32(value);
        }
        modes.put_u8(TTY_OP_END);
        put_string(&mut buf, &modes);

        buf.freeze()
    }

    pub fn decode(mut payload: &[u8]) -> Result<Self> {
        const KIND: &str = "pty-req";
        let term = get_string(&mut payload, KIND)?;
        let term = String::from_utf8(term.to_vec()).map_err(|_| Error::MalformedRequest(KIND))?;
        let cols = get_u32(&mut payload, KIND)?;
        let rows = get_u32(&mut payload, KIND)?;
        let width_px = get_u32(&mut payload, KIND)?;
        let height_px = get_u32(&mut payload, KIND)?;
        let mut encoded = get_string(&mut payload, KIND)?;

        let mut modes = Vec::new();
        while encoded.has_remaining() {
            let opcode = encoded.get_u8();
            if opcode == TTY_OP_END || opcode >= TTY_OP_INVALID {
                break;
            }
            modes.push((opcode, get_u32(&mut encoded, KIND)?));
        }

        Ok(Self {
            term,
            cols,
            rows,
            width_px,
            height_px,
            modes,
        })
    }
}

/// Terminal geometry change for a running shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowChange {
    pub cols: u32,
    pub rows: u32,
    pub width_px: u32,
    pub height_px: u32,
}

impl WindowChange {
    pub const REQUEST_TYPE: &'static str = "window-change";

    pub fn new(cols: u32, rows: u32) -> Self {
        Self {
            cols,
            rows,
            width_px: 0,
            height_px: 0,
        }
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(16);
        buf.put_u32(self.cols);
        buf.put_u32(self.rows);
        buf.put_u32(self.width_px);
        buf.put_u32(self.height_px);
        buf.freeze()
    }

    pub fn decode(mut payload: &[u8]) -> Result<Self> {
        const KIND: &str = "window-change";
        Ok(Self {
            cols: get_u32(&mut payload, KIND)?,
            rows: get_u32(&mut payload, KIND)?,
            width_px: get_u32(&mut payload, KIND)?,
            height_px: get_u32(&mut payload, KIND)?,
        })
    }
}

fn put_string(buf: &mut BytesMut, value: &[u8]) {
    buf.put_u32(value.len() as u32);
    buf.put_slice(value);
}

fn get_u32(buf: &mut &[u8], kind: &'static str) -> Result<u32> {
    if buf.remaining() < 4 {
        return Err(Error::MalformedRequest(kind));
    }
    Ok(buf.get_u32())
}

fn get_string<'a>(buf: &mut &'a [u8], kind: &'static str) -> Result<&'a [u8]> {
    let len = get_u32(buf, kind)? as usize;
    if buf.len() < len {
        return Err(Error::MalformedRequest(kind));
    }
    let (value, rest) = buf.split_at(len);
    *buf = rest;
    Ok(value)
}
