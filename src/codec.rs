//! # TLP Field Coder and Payload Decoders
//!
//! Encoding and decoding of ROC payloads. The general path is the TLP field
//! coder used by the read/write parameter opcodes: each field is a 3-byte
//! TLP address followed by a value whose width is dictated by the positional
//! [`FormatTag`]. The payload carries no per-field length prefix, so decoding
//! is strictly sequential — field N's offset depends on all prior widths.
//!
//! Fixed-layout payloads (pointer table, minute history, daily history) are
//! decoded positionally here as well.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::constants::{
    DAILY_HISTORY_VALUE_OFFSET, MINUTE_HISTORY_SLOTS, POINTER_TABLE_LEN, TLP_LEN,
};
use crate::error::{RocError, RocResult};
use crate::tlp::{FormatTag, RocValue, Tlp};

// ============================================================================
// TLP Field Coder
// ============================================================================

/// Encoded write-TLP field data plus the header bookkeeping the caller
/// back-patches into the frame.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedFields {
    /// Field bytes: per field, 3-byte TLP address then the packed value
    pub bytes: Vec<u8>,
    /// Payload length for the header length slot (field-count byte included)
    pub data_len: u8,
    /// Number of fields for the payload count byte
    pub field_count: u8,
}

/// Encode a TLP field list for a write request.
///
/// For each `(tlp, tag, value)` in positional order: emits the 3-byte TLP
/// address, then the value packed per tag width (numeric fields little-endian,
/// string fields exactly `n` raw bytes). The running total length and field
/// count are returned for the caller to write back into the frame header.
///
/// The tag list is read-only; callers may reuse it across calls.
pub fn encode_tlp_fields(
    tlps: &[Tlp],
    tags: &[FormatTag],
    values: &[RocValue],
) -> RocResult<EncodedFields> {
    if tlps.len() != tags.len() || tlps.len() != values.len() {
        return Err(RocError::invalid_data(format!(
            "TLP/format/value list length mismatch: {} TLPs, {} tags, {} values",
            tlps.len(),
            tags.len(),
            values.len()
        )));
    }

    let mut bytes = Vec::new();
    // The count byte preceding the fields is part of the reported length.
    let mut data_len: usize = 1;

    for (i, ((tlp, tag), value)) in tlps.iter().zip(tags).zip(values).enumerate() {
        bytes.extend_from_slice(&tlp.to_bytes());
        data_len += TLP_LEN;

        match (tag, value) {
            (FormatTag::Float32, RocValue::F32(v)) => bytes.extend_from_slice(&v.to_le_bytes()),
            (FormatTag::Int32, RocValue::I32(v)) => bytes.extend_from_slice(&v.to_le_bytes()),
            (FormatTag::Uint32, RocValue::U32(v)) => bytes.extend_from_slice(&v.to_le_bytes()),
            (FormatTag::Int16, RocValue::I16(v)) => bytes.extend_from_slice(&v.to_le_bytes()),
            (FormatTag::Uint16, RocValue::U16(v)) => bytes.extend_from_slice(&v.to_le_bytes()),
            (FormatTag::Int8, RocValue::I8(v)) => bytes.push(*v as u8),
            (FormatTag::Uint8, RocValue::U8(v)) => bytes.push(*v),
            (FormatTag::FixedString(n), RocValue::Str(s)) => {
                if s.len() != *n {
                    return Err(RocError::invalid_data(format!(
                        "string value for field {} is {} bytes, tag declares {}",
                        i,
                        s.len(),
                        n
                    )));
                }
                bytes.extend_from_slice(s.as_bytes());
            }
            (tag, value) => {
                return Err(RocError::invalid_data(format!(
                    "value type {} does not match format tag {} for field {}",
                    value.type_name(),
                    tag,
                    i
                )));
            }
        }
        data_len += tag.width();
    }

    if data_len > u8::MAX as usize {
        return Err(RocError::invalid_data(format!(
            "encoded field data is {} bytes, exceeds the one-byte length slot",
            data_len
        )));
    }

    Ok(EncodedFields {
        bytes,
        data_len: data_len as u8,
        field_count: tlps.len() as u8,
    })
}

/// Decode the field region of a read-TLP response.
///
/// `fields` starts at the first echoed TLP (the response's leading count byte
/// already stripped). For each expected TLP the echoed 3-byte address must
/// match the request ([`RocError::TlpMismatch`] otherwise), then the
/// tag-determined width is consumed and decoded.
pub fn decode_tlp_fields(
    fields: &[u8],
    tlps: &[Tlp],
    tags: &[FormatTag],
) -> RocResult<Vec<RocValue>> {
    if tlps.len() != tags.len() {
        return Err(RocError::invalid_data(format!(
            "TLP/format list length mismatch: {} TLPs, {} tags",
            tlps.len(),
            tags.len()
        )));
    }

    let mut values = Vec::with_capacity(tlps.len());
    let mut cursor = 0usize;

    for (i, (tlp, tag)) in tlps.iter().zip(tags).enumerate() {
        let field_len = TLP_LEN + tag.width();
        if fields.len() < cursor + field_len {
            return Err(RocError::invalid_data(format!(
                "payload truncated at field {}: need {} bytes, have {}",
                i,
                cursor + field_len,
                fields.len()
            )));
        }

        let echoed = Tlp::from_bytes([fields[cursor], fields[cursor + 1], fields[cursor + 2]]);
        if echoed != *tlp {
            return Err(RocError::TlpMismatch {
                index: i,
                expected: *tlp,
                actual: echoed,
            });
        }
        cursor += TLP_LEN;

        let raw = &fields[cursor..cursor + tag.width()];
        let value = match tag {
            FormatTag::Float32 => {
                RocValue::F32(f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
            }
            FormatTag::Int32 => RocValue::I32(i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]])),
            FormatTag::Uint32 => {
                RocValue::U32(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
            }
            FormatTag::Int16 => RocValue::I16(i16::from_le_bytes([raw[0], raw[1]])),
            FormatTag::Uint16 => RocValue::U16(u16::from_le_bytes([raw[0], raw[1]])),
            FormatTag::Int8 => RocValue::I8(raw[0] as i8),
            FormatTag::Uint8 => RocValue::U8(raw[0]),
            FormatTag::FixedString(_) => RocValue::Str(String::from_utf8_lossy(raw).into_owned()),
        };
        cursor += tag.width();
        values.push(value);
    }

    Ok(values)
}

// ============================================================================
// Fixed-Layout Decoders
// ============================================================================

/// Alarm/event/history pointers reported by opcode 120.
///
/// Decoded positionally from the 26-byte response window: five little-endian
/// 16-bit pointers/indices, two 16-bit log retention counts, then two
/// single-byte day counts. Remaining bytes are reserved by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointerTable {
    /// Current alarm log write pointer
    pub alarm_pointer: u16,
    /// Current event log write pointer
    pub event_pointer: u16,
    /// Current hourly history index
    pub hourly_index: u16,
    /// Current extended history index
    pub extended_index: u16,
    /// Current daily history index
    pub daily_index: u16,
    /// Number of alarm log entries retained
    pub alarm_log_size: u16,
    /// Number of event log entries retained
    pub event_log_size: u16,
    /// Days of hourly history retained
    pub hourly_days: u8,
    /// Days of daily history retained
    pub daily_days: u8,
}

/// Decode the opcode 120 pointer table payload.
pub fn decode_pointer_table(payload: &[u8]) -> RocResult<PointerTable> {
    if payload.len() < POINTER_TABLE_LEN {
        return Err(RocError::invalid_data(format!(
            "pointer table payload is {} bytes, expected at least {}",
            payload.len(),
            POINTER_TABLE_LEN
        )));
    }

    let u16_at = |off: usize| u16::from_le_bytes([payload[off], payload[off + 1]]);

    Ok(PointerTable {
        alarm_pointer: u16_at(0),
        event_pointer: u16_at(2),
        hourly_index: u16_at(4),
        extended_index: u16_at(6),
        daily_index: u16_at(8),
        alarm_log_size: u16_at(10),
        event_log_size: u16_at(12),
        hourly_days: payload[14],
        daily_days: payload[15],
    })
}

// ============================================================================
// History Decoding
// ============================================================================

/// Device real-time clock reading used to timestamp minute history.
///
/// `year` is the device's two-digit year (2000-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceClock {
    pub year: u8,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
}

impl DeviceClock {
    /// The clock reading as a date-time at the top of its hour.
    pub fn hour_start(&self) -> RocResult<NaiveDateTime> {
        NaiveDate::from_ymd_opt(2000 + i32::from(self.year), self.month.into(), self.day.into())
            .and_then(|d| d.and_hms_opt(self.hour.into(), 0, 0))
            .ok_or_else(|| {
                RocError::invalid_data(format!(
                    "device clock out of range: 20{:02}-{:02}-{:02} hour {}",
                    self.year, self.month, self.day, self.hour
                ))
            })
    }
}

/// One decoded history slot: timestamp plus 4-byte float value.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    pub timestamp: NaiveDateTime,
    pub value: f32,
}

/// Decode a minute-history payload into 60 timestamped records.
///
/// Payload layout: point echo, current-minute marker, then a fixed 60-slot
/// array of little-endian floats. The device's minute buffer is circular
/// within the hour: slot `i` holds minute `i` of hour `H` when `i` is before
/// the marker, and minute `i` of hour `H - 1` at or after it.
pub fn decode_minute_history(
    payload: &[u8],
    point: u8,
    clock: &DeviceClock,
) -> RocResult<Vec<HistoryRecord>> {
    let needed = 2 + MINUTE_HISTORY_SLOTS * 4;
    if payload.len() < needed {
        return Err(RocError::invalid_data(format!(
            "minute history payload is {} bytes, expected at least {}",
            payload.len(),
            needed
        )));
    }
    if payload[0] != point {
        return Err(RocError::invalid_data(format!(
            "incorrect point in minute history response: expected {}, got {}",
            point, payload[0]
        )));
    }

    let marker = payload[1] as usize;
    let hour_start = clock.hour_start()?;
    let mut records = Vec::with_capacity(MINUTE_HISTORY_SLOTS);

    for i in 0..MINUTE_HISTORY_SLOTS {
        let off = 2 + i * 4;
        let value = f32::from_le_bytes([
            payload[off],
            payload[off + 1],
            payload[off + 2],
            payload[off + 3],
        ]);

        let mut timestamp = hour_start + Duration::minutes(i as i64);
        if i >= marker {
            timestamp -= Duration::hours(1);
        }
        records.push(HistoryRecord { timestamp, value });
    }

    Ok(records)
}

/// Decode a daily-history payload, validating the echoed month/day.
///
/// The single float value sits at a fixed offset within the response.
pub fn decode_daily_history(payload: &[u8], day: u8, month: u8) -> RocResult<f32> {
    if payload.len() < DAILY_HISTORY_VALUE_OFFSET + 4 {
        return Err(RocError::invalid_data(format!(
            "daily history payload is {} bytes, expected at least {}",
            payload.len(),
            DAILY_HISTORY_VALUE_OFFSET + 4
        )));
    }
    if payload[1] != month || payload[2] != day {
        return Err(RocError::invalid_data(format!(
            "incorrect date in daily history response: expected {:02}/{:02}, got {:02}/{:02}",
            day, month, payload[2], payload[1]
        )));
    }

    let off = DAILY_HISTORY_VALUE_OFFSET;
    Ok(f32::from_le_bytes([
        payload[off],
        payload[off + 1],
        payload[off + 2],
        payload[off + 3],
    ]))
}

// ============================================================================
// Tests
// ============================================================================
