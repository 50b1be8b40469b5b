//! Binary reader and `MThd`/`MTrk` chunk decoding.

use crate::smf::{Track, TrackEvent};
use crate::{status, Error, ErrorKind, FormatError, MidiEvent, Result};
use tracing::{debug, trace};

fn out_of_data(context: &'static str) -> Error {
    Error::new(context, ErrorKind::OutOfData)
}

/// Forward-only cursor over an immutable byte buffer.
///
/// Every read fails with [`ErrorKind::OutOfData`] when the buffer ends before it completes.
///
/// [`ErrorKind::OutOfData`]: ../enum.ErrorKind.html#variant.OutOfData
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Reader { data, offset: 0 }
    }

    /// Number of bytes consumed so far.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn peek_byte(&self) -> Result<u8> {
        self.data.get(self.offset).copied().ok_or_else(|| out_of_data("peek byte"))
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        let byte = self.data.get(self.offset).copied().ok_or_else(|| out_of_data("read byte"))?;
        self.offset += 1;
        Ok(byte)
    }

    /// Reads `length` raw bytes, used for the 4 character chunk tags.
    pub fn read_chars(&mut self, length: usize) -> Result<&'a [u8]> {
        let end = self.offset.checked_add(length).filter(|end| *end <= self.data.len());
        let end = end.ok_or_else(|| out_of_data("read chars"))?;
        let chars = &self.data[self.offset..end];
        self.offset = end;
        Ok(chars)
    }

    pub fn read_be_u16(&mut self) -> Result<u16> {
        let bytes = self.read_chars(2).map_err(|_| out_of_data("read u16"))?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_be_u32(&mut self) -> Result<u32> {
        let bytes = self.read_chars(4).map_err(|_| out_of_data("read u32"))?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads a variable-length quantity: 7 bits per byte, most significant group first, high bit
    /// set on every byte but the last.
    pub fn read_vlq(&mut self) -> Result<u32> {
        let mut value: u32 = 0;
        loop {
            let byte = self.read_byte().map_err(|_| out_of_data("read vlq"))?;
            value = (value << 7) | (byte & 0b0111_1111) as u32;
            if byte & 0b1000_0000 == 0 {
                return Ok(value);
            }
        }
    }

    /// Skips `length` bytes.
    pub fn advance(&mut self, length: usize) -> Result<()> {
        self.read_chars(length).map(|_| ()).map_err(|_| out_of_data("advance"))
    }
}

/// Fields of the `MThd` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Raw format word, not interpreted.
    pub format: u16,
    pub tracks: u16,
    /// Pulses per quarter note.
    pub division: u16,
}

pub fn read_header(reader: &mut Reader) -> Result<Header> {
    // validate chunk type
    if reader.read_chars(4)? != b"MThd" {
        return Err(Error::format("MThd", FormatError::MissingHeaderChunk));
    }

    // validate header length
    if reader.read_be_u32()? != 6 {
        return Err(Error::format("MThd", FormatError::BadHeaderLength));
    }

    let format = reader.read_be_u16()?;
    let tracks = reader.read_be_u16()?;
    let division = reader.read_be_u16()?;
    if division & 0x8000 != 0 {
        return Err(Error::format("MThd division", FormatError::SmpteUnsupported));
    }
    if division == 0 {
        return Err(Error::format("MThd division", FormatError::ZeroDivision));
    }

    debug!(format, tracks, division, "read header chunk");
    Ok(Header { format, tracks, division })
}

/// Reads one `MTrk` chunk, keeping channel messages only.
///
/// Meta and sysex events are skipped together with their delta times. Each kept message stores
/// the delta read directly in front of it.
pub fn read_track(reader: &mut Reader) -> Result<Track> {
    // validate chunk type
    if reader.read_chars(4)? != b"MTrk" {
        return Err(Error::format("MTrk", FormatError::MissingTrackChunk));
    }

    let length = reader.read_be_u32()?;
    let chunk_end = reader.offset().saturating_add(length as usize);

    let mut events = Vec::new();
    let mut running_status: Option<u8> = None;
    while reader.offset() < chunk_end {
        let delta = reader.read_vlq()?;

        if reader.peek_byte()? & 0x80 != 0 {
            running_status = Some(reader.read_byte()?);
        }
        let event_type = running_status
            .ok_or_else(|| Error::format("MTrk event", FormatError::MissingRunningStatus))?;

        match event_type {
            status::META => {
                let meta_type = reader.read_byte()?;
                let length = reader.read_vlq()?;
                reader.advance(length as usize)?;
                trace!(meta_type, length, delta, "skipped meta event");
            }
            status::SYSEX => {
                let start = reader.offset();
                while reader.read_byte()? != status::SYSEX_END {}
                trace!(length = reader.offset() - start, delta, "skipped sysex event");
            }
            _ => {
                let data1 = reader.read_byte()?;
                let data2 = if MidiEvent::has_single_data_byte(event_type) {
                    0
                } else {
                    reader.read_byte()?
                };
                events.push(TrackEvent { delta, event: MidiEvent::new(event_type, data1, data2) });
            }
        }
    }

    debug!(events = events.len(), length, "read track chunk");
    Ok(Track::new(events))
}
