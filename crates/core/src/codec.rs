//! Fixed-layout binary codec for the device-network integration.
//!
//! Two independent transforms:
//!
//! - [`encode_downlink`] packs a record id, a station id, and a signal
//!   strength reading into the 8-byte downlink payload the network expects,
//!   returned as a 16-character lowercase hex string.
//! - [`decode_reading`] unpacks an inbound hex sensor reading into the two
//!   calibrated measurements the sensor firmware encodes in it.
//!
//! The layout and the calibration constants are fixed by the firmware of
//! exactly one device family; this is not a general serialization scheme.

use serde::Serialize;

use crate::error::CoreError;
use crate::types::DbId;

/// Downlink payloads are always exactly 8 bytes.
pub const DOWNLINK_BYTES: usize = 8;

/// Minimum number of hex characters a raw sensor reading must carry:
/// 4 for the fill level plus 5 for the battery level.
pub const MIN_READING_HEX: usize = 9;

// ---------------------------------------------------------------------------
// Downlink encoder
// ---------------------------------------------------------------------------

/// Encode the 8-byte downlink payload as a lowercase hex string.
///
/// Byte layout (big-endian throughout):
///
/// | Offset | Size | Field           | Encoding                       |
/// |--------|------|-----------------|--------------------------------|
/// | 0–1    | 2    | record id       | unsigned                       |
/// | 2–5    | 4    | station id      | unsigned, parsed from hex      |
/// | 6–7    | 2    | signal strength | signed, two's complement       |
///
/// Out-of-range numeric inputs wrap rather than fail: the record id modulo
/// 65536, the station id modulo 2^32, the RSSI by two's-complement
/// truncation to 16 bits. Only a non-hexadecimal `station_hex` is an error.
pub fn encode_downlink(id: DbId, station_hex: &str, rssi: i32) -> Result<String, CoreError> {
    let station = parse_station_hex(station_hex)?;

    let id = id.rem_euclid(1 << 16) as u16;
    let rssi = rssi as i16;

    let mut buf = [0u8; DOWNLINK_BYTES];
    buf[0..2].copy_from_slice(&id.to_be_bytes());
    buf[2..6].copy_from_slice(&station.to_be_bytes());
    buf[6..8].copy_from_slice(&rssi.to_be_bytes());

    Ok(buf.iter().map(|b| format!("{b:02x}")).collect())
}

/// Parse a station id hex string into its unsigned 32-bit value.
///
/// Accumulates digit by digit with wrapping arithmetic so that strings
/// wider than 8 hex digits reduce modulo 2^32 instead of failing, matching
/// the network's own truncation of oversized station ids.
fn parse_station_hex(station_hex: &str) -> Result<u32, CoreError> {
    if station_hex.is_empty() {
        return Err(CoreError::InvalidHex {
            field: "station",
            value: station_hex.to_string(),
        });
    }

    let mut value: u32 = 0;
    for c in station_hex.chars() {
        let digit = c.to_digit(16).ok_or_else(|| CoreError::InvalidHex {
            field: "station",
            value: station_hex.to_string(),
        })?;
        value = value.wrapping_mul(16).wrapping_add(digit);
    }
    Ok(value)
}

// ---------------------------------------------------------------------------
// Uplink reading decoder
// ---------------------------------------------------------------------------

/// A decoded sensor reading.
///
/// The firmware encodes each measurement as a base-16 integer holding
/// `(value + 100) * 100`; decoding reverses that fixed scale and offset.
/// Values are reported outward with exactly two decimal digits, see
/// [`Reading::fill_level_display`] and [`Reading::battery_level_display`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    /// Calibrated fill level.
    #[serde(rename = "fillLevel")]
    pub fill_level: f64,
    /// Calibrated battery level.
    #[serde(rename = "batteryLevel")]
    pub battery_level: f64,
}

impl Reading {
    /// Fill level rendered with two decimal digits (fixed-point display).
    pub fn fill_level_display(&self) -> String {
        format!("{:.2}", self.fill_level)
    }

    /// Battery level rendered with two decimal digits (fixed-point display).
    pub fn battery_level_display(&self) -> String {
        format!("{:.2}", self.battery_level)
    }
}

/// Decode a raw hex sensor reading into its two calibrated measurements.
///
/// Characters `[0,4)` hold the fill level and `[4,9)` the battery level,
/// each a base-16 integer decoded as `raw / 100 - 100`.
///
/// Input shorter than [`MIN_READING_HEX`] characters or containing a
/// non-hex character in the first nine positions is rejected outright;
/// there is no partial parse.
pub fn decode_reading(raw: &str) -> Result<Reading, CoreError> {
    let bytes = raw.as_bytes();
    if bytes.len() < MIN_READING_HEX {
        return Err(CoreError::ReadingTooShort {
            min: MIN_READING_HEX,
            got: bytes.len(),
        });
    }
    if !bytes[..MIN_READING_HEX].iter().all(u8::is_ascii_hexdigit) {
        return Err(CoreError::InvalidHex {
            field: "reading",
            value: raw.to_string(),
        });
    }

    // The first nine bytes are known ASCII hex digits, so both the slicing
    // and the parses below cannot fail.
    let raw_fill = u32::from_str_radix(&raw[0..4], 16).map_err(|_| CoreError::InvalidHex {
        field: "reading",
        value: raw.to_string(),
    })?;
    let raw_battery = u32::from_str_radix(&raw[4..9], 16).map_err(|_| CoreError::InvalidHex {
        field: "reading",
        value: raw.to_string(),
    })?;

    Ok(Reading {
        fill_level: f64::from(raw_fill) / 100.0 - 100.0,
        battery_level: f64::from(raw_battery) / 100.0 - 100.0,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    /// Unpack an encoded payload back into its three fields (2/4/2 bytes,
    /// big-endian, matching signedness). Test-side inverse of the encoder.
    fn unpack(hex: &str) -> (u16, u32, i16) {
        assert_eq!(hex.len(), DOWNLINK_BYTES * 2);
        let bytes: Vec<u8> = (0..DOWNLINK_BYTES)
            .map(|i| u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).unwrap())
            .collect();
        (
            u16::from_be_bytes([bytes[0], bytes[1]]),
            u32::from_be_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]),
            i16::from_be_bytes([bytes[6], bytes[7]]),
        )
    }

    #[test]
    fn encode_known_payload() {
        let hex = encode_downlink(1, "0a0b0c0d", -1).unwrap();
        assert_eq!(hex, "00010a0b0c0dffff");
    }

    #[test]
    fn encoded_payload_is_16_lowercase_hex_chars() {
        let hex = encode_downlink(4095, "1aB", -120).unwrap();
        assert_eq!(hex.len(), 16);
        assert!(hex.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));
    }

    #[test]
    fn id_wraps_modulo_2_pow_16() {
        assert_eq!(encode_downlink(65536, "00000000", 0).unwrap(), "0000000000000000");
        assert_eq!(encode_downlink(65537, "00000000", 0).unwrap(), "0001000000000000");
    }

    #[test]
    fn station_wraps_modulo_2_pow_32() {
        // "1ffffffff" = 2^33 - 1, reduces to 0xffffffff.
        let hex = encode_downlink(0, "1ffffffff", 0).unwrap();
        let (_, station, _) = unpack(&hex);
        assert_eq!(station, 0xffff_ffff);
    }

    #[test]
    fn rssi_is_twos_complement_big_endian() {
        let (_, _, rssi) = unpack(&encode_downlink(0, "0", -32768).unwrap());
        assert_eq!(rssi, -32768);

        // Out of range wraps by truncation: 32768 -> -32768.
        let (_, _, rssi) = unpack(&encode_downlink(0, "0", 32768).unwrap());
        assert_eq!(rssi, -32768);
    }

    #[test]
    fn encode_round_trips_within_field_widths() {
        let cases = [
            (0i64, "0", 0i32),
            (1, "0a0b0c0d", -1),
            (65535, "ffffffff", 32767),
            (12345, "deadbeef", -32768),
            (256, "1", 127),
        ];
        for (id, station, rssi) in cases {
            let hex = encode_downlink(id, station, rssi).unwrap();
            let (got_id, got_station, got_rssi) = unpack(&hex);
            assert_eq!(i64::from(got_id), id);
            assert_eq!(got_station, parse_station_hex(station).unwrap());
            assert_eq!(i32::from(got_rssi), rssi);
            // Re-encoding the recovered triple is stable.
            let again =
                encode_downlink(i64::from(got_id), &format!("{got_station:x}"), i32::from(got_rssi))
                    .unwrap();
            assert_eq!(again, hex);
        }
    }

    #[test]
    fn non_hex_station_is_rejected() {
        assert_matches!(
            encode_downlink(1, "xyz", 0),
            Err(CoreError::InvalidHex { field: "station", .. })
        );
        assert_matches!(
            encode_downlink(1, "", 0),
            Err(CoreError::InvalidHex { field: "station", .. })
        );
    }

    #[test]
    fn decode_known_reading() {
        let reading = decode_reading("000FA0000").unwrap();
        assert_eq!(reading.fill_level, -99.85);
        assert_eq!(reading.battery_level, 6453.60);
        assert_eq!(reading.fill_level_display(), "-99.85");
        assert_eq!(reading.battery_level_display(), "6453.60");
    }

    #[test]
    fn decode_ignores_trailing_characters() {
        // Sigfox data frames may carry more than the nine reading chars.
        let reading = decode_reading("000FA0000cafe").unwrap();
        assert_eq!(reading.fill_level, -99.85);
    }

    #[test]
    fn short_reading_is_rejected() {
        assert_matches!(
            decode_reading("00000"),
            Err(CoreError::ReadingTooShort { min: 9, got: 5 })
        );
        assert_matches!(decode_reading(""), Err(CoreError::ReadingTooShort { got: 0, .. }));
    }

    #[test]
    fn non_hex_reading_is_rejected() {
        assert_matches!(
            decode_reading("zzzzzzzzz"),
            Err(CoreError::InvalidHex { field: "reading", .. })
        );
        // Multi-byte characters must not panic the slicing.
        assert_matches!(
            decode_reading("ééééééééé"),
            Err(CoreError::InvalidHex { field: "reading", .. })
        );
    }

    #[test]
    fn display_always_has_two_decimals() {
        let reading = decode_reading("271027100").unwrap();
        // 0x2710 = 10000 -> 10000/100 - 100 = 0.
        assert_eq!(reading.fill_level_display(), "0.00");
    }
}
