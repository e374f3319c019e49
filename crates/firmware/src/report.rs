//! Console reporter
//!
//! Everything the firmware prints goes through here. Console write failures
//! are logged and dropped: the acquisition loop must keep running whether or
//! not anyone is listening on the serial line.

use biss::{format_record, StatusPacket, CSV_HEADER, LINE_TERMINATOR};
use embedded_io::Write;
use platform::config::BANNER;

use crate::error::FatalError;

/// Startup banner.
pub fn banner<W: Write>(out: &mut W) {
    line(out, BANNER);
}

/// CSV header line.
pub fn header<W: Write>(out: &mut W) {
    line(out, CSV_HEADER);
}

/// One decoded record.
pub fn record<W: Write>(out: &mut W, packet: &StatusPacket) {
    emit(out, format_record(packet).as_bytes());
}

/// Raw buffer contents, unframed.
pub fn raw<W: Write>(out: &mut W, bytes: &[u8]) {
    emit(out, bytes);
}

/// Diagnostic for a fatal error.
pub fn fatal<W: Write>(out: &mut W, error: FatalError) {
    if let Err(_e) = write!(out, "{error}{LINE_TERMINATOR}") {
        #[cfg(feature = "defmt")]
        defmt::warn!("console write failed: {}", defmt::Debug2Format(&_e));
    }
}

/// Text followed by the line terminator.
pub fn line<W: Write>(out: &mut W, text: &str) {
    emit(out, text.as_bytes());
    emit(out, LINE_TERMINATOR.as_bytes());
}

fn emit<W: Write>(out: &mut W, bytes: &[u8]) {
    if let Err(_e) = out.write_all(bytes) {
        #[cfg(feature = "defmt")]
        defmt::warn!("console write failed: {}", defmt::Debug2Format(&_e));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::mocks::MockSerial;

    #[test]
    fn record_scenarios() {
        let mut out = MockSerial::new();
        record(&mut out, &StatusPacket::from_word(0x2000_0000));
        record(&mut out, &StatusPacket::from_word(0x8000_0005));
        assert_eq!(out.output(), "0, 0, 0, 1\r\n5, 1, 0, 0\r\n");
    }

    #[test]
    fn header_and_banner_are_crlf_terminated() {
        let mut out = MockSerial::new();
        banner(&mut out);
        header(&mut out);
        assert_eq!(
            out.output(),
            "Starting DMA->UART example\r\nposition, error_bit, warning_bit, crc_failed_bit\r\n"
        );
    }

    #[test]
    fn fatal_prints_diagnostic_line() {
        let mut out = MockSerial::new();
        fatal(&mut out, FatalError::DmaLookup);
        assert_eq!(out.output(), "DMA lookup config failed\r\n");
    }

    #[test]
    fn raw_echo_is_byte_exact() {
        let mut out = MockSerial::new();
        raw(&mut out, &[0x05, 0x00, 0x00, 0x80]);
        assert_eq!(out.bytes(), &[0x05, 0x00, 0x00, 0x80]);
    }

    #[test]
    fn write_failures_are_swallowed() {
        let mut out = MockSerial::new().failing_writes();
        banner(&mut out);
        record(&mut out, &StatusPacket::from_word(1));
        fatal(&mut out, FatalError::DmaInit);
        assert!(out.output().is_empty());
    }
}
