use heapless::Vec;

/// Upper bound on one encoded frame; the link payload is small and fixed.
pub const FRAME_MAX: usize = 32;

pub const KEY_EVENT: u32 = 5;
pub const KEY_TIMESTAMP: u32 = 6;
pub const KEY_HEADING: u32 = 7;

/// Value carried under `KEY_EVENT`; the host only checks presence.
pub const EVENT_MARKER: u8 = 1;

const TUPLE_UINT: u8 = 2;
const TUPLE_INT: u8 = 3;
// key (4) + type (1) + length (2)
const ENTRY_HEADER_LEN: usize = 7;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireError {
    Overflow,
}

/// Dictionary frame: leading entry-count byte, then per entry
/// `key: u32 LE, type: u8, length: u16 LE, value LE`. Both ends of the
/// link must agree on this layout and on the value widths.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    buf: Vec<u8, FRAME_MAX>,
}

impl Frame {
    pub fn new() -> Self {
        let mut buf = Vec::new();
        let _ = buf.push(0);
        Self { buf }
    }

    pub fn write_u8(&mut self, key: u32, value: u8) -> Result<(), WireError> {
        self.entry(key, TUPLE_UINT, &value.to_le_bytes())
    }

    pub fn write_u32(&mut self, key: u32, value: u32) -> Result<(), WireError> {
        self.entry(key, TUPLE_UINT, &value.to_le_bytes())
    }

    pub fn write_i16(&mut self, key: u32, value: i16) -> Result<(), WireError> {
        self.entry(key, TUPLE_INT, &value.to_le_bytes())
    }

    fn entry(&mut self, key: u32, kind: u8, value: &[u8]) -> Result<(), WireError> {
        if self.buf.len() + ENTRY_HEADER_LEN + value.len() > FRAME_MAX {
            return Err(WireError::Overflow);
        }

        // Capacity checked above; these pushes cannot fail.
        let _ = self.buf.extend_from_slice(&key.to_le_bytes());
        let _ = self.buf.push(kind);
        let _ = self.buf.extend_from_slice(&(value.len() as u16).to_le_bytes());
        let _ = self.buf.extend_from_slice(value);
        self.buf[0] += 1;
        Ok(())
    }

    pub fn entries(&self) -> u8 {
        self.buf[0]
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

/// Payload for one detected gesture. Built, encoded, and handed to the
/// link within a single dispatch call; never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventRecord {
    Shake {
        epoch_seconds: u32,
    },
    DirectedShake {
        epoch_seconds: u32,
        heading_degrees: i16,
    },
}

impl EventRecord {
    pub fn encode(&self) -> Result<Frame, WireError> {
        let mut frame = Frame::new();
        match *self {
            EventRecord::Shake { epoch_seconds } => {
                frame.write_u8(KEY_EVENT, EVENT_MARKER)?;
                frame.write_u32(KEY_TIMESTAMP, epoch_seconds)?;
            }
            EventRecord::DirectedShake {
                epoch_seconds,
                heading_degrees,
            } => {
                frame.write_i16(KEY_HEADING, heading_degrees)?;
                frame.write_u32(KEY_TIMESTAMP, epoch_seconds)?;
            }
        }
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shake_record_layout_is_stable() {
        let frame = EventRecord::Shake {
            epoch_seconds: 0x0102_0304,
        }
        .encode()
        .unwrap();

        #[rustfmt::skip]
        let expected: &[u8] = &[
            2,
            5, 0, 0, 0, TUPLE_UINT, 1, 0, 1,
            6, 0, 0, 0, TUPLE_UINT, 4, 0, 0x04, 0x03, 0x02, 0x01,
        ];
        assert_eq!(frame.as_bytes(), expected);
        assert_eq!(frame.entries(), 2);
    }

    #[test]
    fn directed_record_replaces_event_marker() {
        let frame = EventRecord::DirectedShake {
            epoch_seconds: 1,
            heading_degrees: 270,
        }
        .encode()
        .unwrap();

        #[rustfmt::skip]
        let expected: &[u8] = &[
            2,
            7, 0, 0, 0, TUPLE_INT, 2, 0, 0x0E, 0x01,
            6, 0, 0, 0, TUPLE_UINT, 4, 0, 1, 0, 0, 0,
        ];
        assert_eq!(frame.as_bytes(), expected);
    }

    #[test]
    fn records_fit_the_fixed_buffer() {
        let plain = EventRecord::Shake {
            epoch_seconds: u32::MAX,
        };
        let directed = EventRecord::DirectedShake {
            epoch_seconds: u32::MAX,
            heading_degrees: 359,
        };
        assert!(plain.encode().unwrap().len() <= FRAME_MAX);
        assert!(directed.encode().unwrap().len() <= FRAME_MAX);
    }

    #[test]
    fn overflow_is_an_error_not_a_panic() {
        let mut frame = Frame::new();
        frame.write_u32(1, 1).unwrap();
        frame.write_u32(2, 2).unwrap();
        assert_eq!(frame.write_u32(3, 3), Err(WireError::Overflow));
        // A failed write leaves the frame untouched.
        assert_eq!(frame.entries(), 2);
        assert_eq!(frame.len(), 23);
    }
}
