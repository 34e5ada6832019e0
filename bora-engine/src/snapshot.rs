//! Snapshot codec for the engine's durable state.
//!
//! Layout: a fixed binary header framing a serialized payload.
//!
//! ```text
//! [magic "BORA" (4)] [version u16 le] [flags u16 le]
//! [crc32 u32 le] [payload_len u32 le] [payload ...]
//! ```
//!
//! The payload is a JSON document of tagged sections. Each section carries a
//! `required` flag: a reader that does not recognize an optional section
//! skips it; an unknown required section fails the restore. This keeps old
//! readers forward-compatible with additive state.
//!
//! Rolling-window counters are deliberately absent: they are volatile and
//! re-warm from live traffic after a restart.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use bora_core::actions::{ActionFamily, Subject};
use bora_core::catalog::InstrumentCatalog;
use bora_core::dimensions::DimensionKey;
use bora_core::metrics::MetricKind;
use bora_core::types::DayId;
use bora_stats::DailyStats;

use crate::error::SnapshotError;
use crate::sink::LatchBoard;

const MAGIC: [u8; 4] = *b"BORA";
const VERSION: u16 = 1;
const HEADER_LEN: usize = 4 + 2 + 2 + 4 + 4;

const SECTION_CATALOG: &str = "catalog";
const SECTION_DAILY: &str = "daily";
const SECTION_LATCHES: &str = "latches";

/// One daily aggregate entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEntry {
    /// The dimension tuple.
    pub dimensions: DimensionKey,
    /// The UTC day.
    pub day: DayId,
    /// The metric kind.
    pub metric: MetricKind,
    /// The accumulated value.
    pub value: f64,
}

/// One dedup latch entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatchEntry {
    /// The latch subject.
    pub subject: Subject,
    /// The action family.
    pub family: ActionFamily,
    /// True when the subject is currently suspended.
    pub suspended: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct Section {
    name: String,
    required: bool,
    data: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct Payload {
    created_at: String,
    sections: Vec<Section>,
}

/// The decoded durable state of an engine.
#[derive(Debug)]
pub struct SnapshotDoc {
    /// Instrument reference data.
    pub catalog: InstrumentCatalog,
    /// Daily aggregate entries.
    pub daily: Vec<DailyEntry>,
    /// Dedup latch entries.
    pub latches: Vec<LatchEntry>,
}

impl SnapshotDoc {
    /// Captures the current durable state.
    #[must_use]
    pub fn capture(catalog: &InstrumentCatalog, daily: &DailyStats, latches: &LatchBoard) -> Self {
        let mut daily_entries = Vec::with_capacity(daily.len());
        daily.for_each(|dimensions, day, metric, value| {
            daily_entries.push(DailyEntry {
                dimensions: dimensions.clone(),
                day,
                metric,
                value,
            });
        });

        let mut latch_entries = Vec::with_capacity(latches.len());
        latches.for_each(|subject, family, state| {
            latch_entries.push(LatchEntry {
                subject: subject.clone(),
                family,
                suspended: state.is_suspended(),
            });
        });

        Self {
            catalog: catalog.clone(),
            daily: daily_entries,
            latches: latch_entries,
        }
    }
}

/// Encodes a snapshot document into the framed binary layout.
pub fn encode(doc: &SnapshotDoc) -> Result<Vec<u8>, SnapshotError> {
    let payload = Payload {
        created_at: chrono::Utc::now().to_rfc3339(),
        sections: vec![
            Section {
                name: SECTION_CATALOG.to_string(),
                required: true,
                data: serde_json::to_value(&doc.catalog)?,
            },
            Section {
                name: SECTION_DAILY.to_string(),
                required: true,
                data: serde_json::to_value(&doc.daily)?,
            },
            Section {
                name: SECTION_LATCHES.to_string(),
                required: true,
                data: serde_json::to_value(&doc.latches)?,
            },
        ],
    };
    let body = serde_json::to_vec(&payload)?;
    let checksum = crc32fast::hash(&body);

    let mut out = Vec::with_capacity(HEADER_LEN + body.len());
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&VERSION.to_le_bytes());
    out.extend_from_slice(&0_u16.to_le_bytes());
    out.extend_from_slice(&checksum.to_le_bytes());
    #[allow(clippy::cast_possible_truncation)]
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}

/// Decodes a framed snapshot blob.
///
/// Validation is complete before this returns: magic, version, length,
/// checksum, and all required sections.
pub fn decode(bytes: &[u8]) -> Result<SnapshotDoc, SnapshotError> {
    if bytes.len() < HEADER_LEN {
        return Err(SnapshotError::Truncated {
            expected: HEADER_LEN,
            actual: bytes.len(),
        });
    }
    if bytes[0..4] != MAGIC {
        return Err(SnapshotError::BadMagic);
    }
    let version = u16::from_le_bytes([bytes[4], bytes[5]]);
    if version != VERSION {
        return Err(SnapshotError::UnsupportedVersion(version));
    }
    let checksum = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
    let payload_len = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]) as usize;
    let expected = HEADER_LEN + payload_len;
    if bytes.len() < expected {
        return Err(SnapshotError::Truncated {
            expected,
            actual: bytes.len(),
        });
    }
    let body = &bytes[HEADER_LEN..expected];
    let actual = crc32fast::hash(body);
    if actual != checksum {
        return Err(SnapshotError::ChecksumMismatch {
            expected: checksum,
            actual,
        });
    }

    let payload: Payload = serde_json::from_slice(body)?;
    let mut catalog = None;
    let mut daily = None;
    let mut latches = None;
    for section in payload.sections {
        match section.name.as_str() {
            SECTION_CATALOG => catalog = Some(serde_json::from_value(section.data)?),
            SECTION_DAILY => daily = Some(serde_json::from_value(section.data)?),
            SECTION_LATCHES => latches = Some(serde_json::from_value(section.data)?),
            other => {
                if section.required {
                    return Err(SnapshotError::UnknownRequiredSection(other.to_string()));
                }
                debug!(section = other, "skipping unknown optional snapshot section");
            }
        }
    }

    Ok(SnapshotDoc {
        catalog: catalog.ok_or(SnapshotError::MissingSection(SECTION_CATALOG))?,
        daily: daily.ok_or(SnapshotError::MissingSection(SECTION_DAILY))?,
        latches: latches.ok_or(SnapshotError::MissingSection(SECTION_LATCHES))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bora_core::types::{AccountId, Nanos};
    use bora_core::actions::ActionFamily;
    use bora_core::metrics::MetricKind;
    use crate::sink::LatchState;

    fn sample_doc() -> SnapshotDoc {
        let catalog = InstrumentCatalog::builder()
            .product("T2303", "T10Y")
            .exchange("T2303", "CFFEX")
            .build();
        let daily = DailyStats::new(8);
        let key = DimensionKey {
            account: Some(AccountId::new_unchecked("A")),
            ..DimensionKey::empty()
        };
        daily.add(&key, MetricKind::TradeVolume, 1050.0, Nanos::new(1_700_000_000_000_000_000));

        let latches = LatchBoard::new();
        latches.set(
            Subject::Account(AccountId::new_unchecked("A")),
            ActionFamily::AccountTrading,
            LatchState::Suspended,
        );

        SnapshotDoc::capture(&catalog, &daily, &latches)
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let doc = sample_doc();
        let bytes = encode(&doc).unwrap();
        let decoded = decode(&bytes).unwrap();

        assert_eq!(decoded.daily, doc.daily);
        assert_eq!(decoded.latches, doc.latches);
        assert_eq!(decoded.catalog.len(), doc.catalog.len());
    }

    #[test]
    fn test_header_layout() {
        let bytes = encode(&sample_doc()).unwrap();
        assert_eq!(&bytes[0..4], b"BORA");
        assert_eq!(u16::from_le_bytes([bytes[4], bytes[5]]), 1);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = encode(&sample_doc()).unwrap();
        bytes[0] = b'X';
        assert!(matches!(decode(&bytes), Err(SnapshotError::BadMagic)));
    }

    #[test]
    fn test_unsupported_version() {
        let mut bytes = encode(&sample_doc()).unwrap();
        bytes[4] = 99;
        assert!(matches!(
            decode(&bytes),
            Err(SnapshotError::UnsupportedVersion(99))
        ));
    }

    #[test]
    fn test_truncated_blob() {
        let bytes = encode(&sample_doc()).unwrap();
        assert!(matches!(
            decode(&bytes[..bytes.len() - 10]),
            Err(SnapshotError::Truncated { .. })
        ));
        assert!(matches!(
            decode(&bytes[..8]),
            Err(SnapshotError::Truncated { .. })
        ));
    }

    #[test]
    fn test_corrupted_payload_fails_checksum() {
        let mut bytes = encode(&sample_doc()).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        assert!(matches!(
            decode(&bytes),
            Err(SnapshotError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_unknown_optional_section_skipped() {
        let doc = sample_doc();
        let mut payload: Payload = {
            let bytes = encode(&doc).unwrap();
            serde_json::from_slice(&bytes[HEADER_LEN..]).unwrap()
        };
        payload.sections.push(Section {
            name: "future_feature".to_string(),
            required: false,
            data: Value::Null,
        });
        let bytes = reframe(&payload);
        assert!(decode(&bytes).is_ok());
    }

    #[test]
    fn test_unknown_required_section_fails() {
        let doc = sample_doc();
        let mut payload: Payload = {
            let bytes = encode(&doc).unwrap();
            serde_json::from_slice(&bytes[HEADER_LEN..]).unwrap()
        };
        payload.sections.push(Section {
            name: "mandatory_future".to_string(),
            required: true,
            data: Value::Null,
        });
        let bytes = reframe(&payload);
        assert!(matches!(
            decode(&bytes),
            Err(SnapshotError::UnknownRequiredSection(name)) if name == "mandatory_future"
        ));
    }

    #[test]
    fn test_missing_section_fails() {
        let doc = sample_doc();
        let mut payload: Payload = {
            let bytes = encode(&doc).unwrap();
            serde_json::from_slice(&bytes[HEADER_LEN..]).unwrap()
        };
        payload.sections.retain(|s| s.name != SECTION_LATCHES);
        let bytes = reframe(&payload);
        assert!(matches!(
            decode(&bytes),
            Err(SnapshotError::MissingSection(SECTION_LATCHES))
        ));
    }

    fn reframe(payload: &Payload) -> Vec<u8> {
        let body = serde_json::to_vec(payload).unwrap();
        let checksum = crc32fast::hash(&body);
        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&VERSION.to_le_bytes());
        out.extend_from_slice(&0_u16.to_le_bytes());
        out.extend_from_slice(&checksum.to_le_bytes());
        out.extend_from_slice(&u32::try_from(body.len()).unwrap().to_le_bytes());
        out.extend_from_slice(&body);
        out
    }
}
