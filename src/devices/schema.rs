//! Device schema registry
//!
//! For each kind of gateway device: which records it covers, the
//! measurement it is written to, the fields to pull (and how to convert
//! them) and the fields to copy as tags.

use super::record::DeviceRecord;
use crate::error::{Error, Result};
use crate::protocol::FieldValue;

/// How a raw string value is converted into a field value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    Integer,
    Float,
}

impl Coercion {
    pub fn name(&self) -> &'static str {
        match self {
            Coercion::Integer => "integer",
            Coercion::Float => "float",
        }
    }

    /// Convert the raw value of `field`
    pub fn apply(&self, field: &str, raw: &str) -> Result<FieldValue> {
        let text = raw.trim();
        let value = match self {
            Coercion::Integer => text.parse::<i128>().ok().map(FieldValue::Integer),
            Coercion::Float => text
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(FieldValue::Float),
        };
        value.ok_or_else(|| Error::Coercion {
            field: field.to_string(),
            value: raw.to_string(),
            target: self.name(),
        })
    }
}

/// Schema for one kind of device record
#[derive(Debug, Clone, Copy)]
pub struct DeviceSpec {
    /// Key/value pairs a record must carry to match
    pub device_pattern: &'static [(&'static str, &'static str)],
    /// Destination measurement
    pub name: &'static str,
    /// Fields to extract, in output order
    pub measurements: &'static [(&'static str, Coercion)],
    /// Fields copied verbatim as tags
    pub tags: &'static [&'static str],
}

impl DeviceSpec {
    /// True if every pattern pair is present and equal in `record`
    pub fn matches(&self, record: &DeviceRecord) -> bool {
        self.device_pattern
            .iter()
            .all(|(key, expected)| record.has(key, expected))
    }
}

use Coercion::{Float, Integer};

static REGISTRY: &[DeviceSpec] = &[
    DeviceSpec {
        device_pattern: &[("DEVICE_TYPE", "PVS")],
        name: "supervisor",
        measurements: &[
            ("dl_err_count", Integer),
            ("dl_comm_err", Integer),
            ("dl_skipped_scans", Integer),
            ("dl_scan_time", Float),
            ("dl_untransmitted", Integer),
            ("dl_uptime", Float),
            ("dl_cpu_load", Float),
            ("dl_mem_used", Integer),
            ("dl_flash_avail", Integer),
        ],
        tags: &["SERIAL"],
    },
    DeviceSpec {
        device_pattern: &[
            ("DEVICE_TYPE", "Power Meter"),
            ("subtype", "GROSS_PRODUCTION_SITE"),
        ],
        name: "meter_production",
        measurements: &[
            ("ct_scl_fctr", Float),
            ("net_ltea_3phsum_kwh", Float),
            ("p_3phsum_kw", Float),
            ("q_3phsum_kvar", Float),
            ("s_3phsum_kva", Float),
            ("tot_pf_rto", Float),
            ("freq_hz", Float),
            ("i_a", Float),
            ("v12_v", Float),
            ("CAL0", Float),
        ],
        tags: &["SERIAL", "subtype"],
    },
    DeviceSpec {
        device_pattern: &[
            ("DEVICE_TYPE", "Power Meter"),
            ("subtype", "NET_CONSUMPTION_LOADSIDE"),
        ],
        name: "meter_consumption",
        measurements: &[
            ("ct_scl_fctr", Float),
            ("net_ltea_3phsum_kwh", Float),
            ("p_3phsum_kw", Float),
            ("q_3phsum_kvar", Float),
            ("s_3phsum_kva", Float),
            ("tot_pf_rto", Float),
            ("freq_hz", Float),
            ("i1_a", Float),
            ("i2_a", Float),
            ("v1n_v", Float),
            ("v2n_v", Float),
            ("v12_v", Float),
            ("p1_kw", Float),
            ("p2_kw", Float),
            ("neg_ltea_3phsum_kwh", Float),
            ("pos_ltea_3phsum_kwh", Float),
            // calibration constant, 50 or 100
            ("CAL0", Integer),
        ],
        tags: &["SERIAL", "subtype"],
    },
    DeviceSpec {
        device_pattern: &[("DEVICE_TYPE", "Inverter")],
        name: "inverter",
        measurements: &[
            ("ltea_3phsum_kwh", Float),
            ("p_3phsum_kw", Float),
            ("vln_3phavg_v", Float),
            ("i_3phsum_a", Float),
            ("p_mppt1_kw", Float),
            ("v_mppt1_v", Float),
            ("i_mppt1_a", Float),
            ("t_htsnk_degc", Float),
            ("freq_hz", Float),
            ("stat_ind", Float),
        ],
        tags: &["SERIAL"],
    },
];

/// The built-in registry, in evaluation order
pub fn registry() -> &'static [DeviceSpec] {
    REGISTRY
}
