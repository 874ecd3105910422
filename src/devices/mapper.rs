//! Device record mapper
//!
//! Turns gateway device records into points using the schema registry.

use super::record::DeviceRecord;
use super::schema::DeviceSpec;
use crate::error::{Error, Result};
use crate::protocol::{FieldValue, Point};
use crate::timecodec;

/// Build the point for one record under one matching spec
fn build_point(spec: &DeviceSpec, record: &DeviceRecord) -> Result<Point> {
    let fields = spec
        .measurements
        .iter()
        .map(|(key, coercion)| -> Result<(String, FieldValue)> {
            let raw = record.value(key)?;
            Ok((key.to_string(), coercion.apply(key, &raw)?))
        })
        .collect::<Result<Vec<_>>>()?;

    let tags = spec
        .tags
        .iter()
        .map(|key| -> Result<(String, String)> {
            Ok((key.to_string(), record.value(key)?))
        })
        .collect::<Result<Vec<_>>>()?;

    let datatime = record.datatime().ok_or_else(|| Error::MissingField {
        device: record.device_type().unwrap_or("unknown").to_string(),
        field: "DATATIME".to_string(),
    })?;
    let time = timecodec::to_epoch_ns(datatime)?;

    Point::new(spec.name, fields, tags, time)
}

/// Map one record to a point per matching spec, in registry order
///
/// Records that match nothing produce an empty list.
pub fn map_record(record: &DeviceRecord, registry: &[DeviceSpec]) -> Result<Vec<Point>> {
    let mut points = Vec::new();
    for spec in registry.iter().filter(|spec| spec.matches(record)) {
        let point = build_point(spec, record)?;
        tracing::trace!(
            measurement = spec.name,
            serial = record.serial().unwrap_or_default(),
            "mapped device record"
        );
        points.push(point);
    }

    if points.is_empty() {
        tracing::debug!(
            device_type = record.device_type().unwrap_or_default(),
            serial = record.serial().unwrap_or_default(),
            "no schema for device record, skipping"
        );
    }
    Ok(points)
}

/// Map a whole device list, preserving input order
///
/// The first bad record aborts the batch.
pub fn map_devices(records: &[DeviceRecord], registry: &[DeviceSpec]) -> Result<Vec<Point>> {
    let mut points = Vec::with_capacity(records.len());
    for record in records {
        points.extend(map_record(record, registry)?);
    }
    tracing::debug!(
        devices = records.len(),
        points = points.len(),
        "mapped device list"
    );
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::registry;
    use crate::devices::schema::Coercion;
    use crate::protocol::encode;

    const TIME: &str = "2023,01,01,00,00,00";
    const TIME_NS: i64 = 1_672_531_200_000_000_000;

    fn inverter() -> DeviceRecord {
        DeviceRecord::from_pairs([
            ("DEVICE_TYPE", "Inverter"),
            ("SERIAL", "E00123"),
            ("DATATIME", TIME),
            ("ltea_3phsum_kwh", "89.4825"),
            ("p_3phsum_kw", "0.0301"),
            ("vln_3phavg_v", "244.79"),
            ("i_3phsum_a", "0.12"),
            ("p_mppt1_kw", "0.0305"),
            ("v_mppt1_v", "36.7"),
            ("i_mppt1_a", "0.83"),
            ("t_htsnk_degc", "23"),
            ("freq_hz", "60"),
            ("stat_ind", "0"),
        ])
    }

    fn supervisor() -> DeviceRecord {
        DeviceRecord::from_pairs([
            ("DEVICE_TYPE", "PVS"),
            ("SERIAL", "ZT01234"),
            ("DATATIME", TIME),
            ("dl_err_count", "0"),
            ("dl_comm_err", "12"),
            ("dl_skipped_scans", "0"),
            ("dl_scan_time", "1"),
            ("dl_untransmitted", "3"),
            ("dl_uptime", "46514"),
            ("dl_cpu_load", "0.54"),
            ("dl_mem_used", "183244"),
            ("dl_flash_avail", "59424"),
        ])
    }

    fn consumption_meter() -> DeviceRecord {
        DeviceRecord::from_pairs([
            ("DEVICE_TYPE", "Power Meter"),
            ("subtype", "NET_CONSUMPTION_LOADSIDE"),
            ("SERIAL", "PVS5M0001c"),
            ("DATATIME", TIME),
            ("ct_scl_fctr", "100"),
            ("net_ltea_3phsum_kwh", "2194.12"),
            ("p_3phsum_kw", "-3.7339"),
            ("q_3phsum_kvar", "-0.7258"),
            ("s_3phsum_kva", "3.8117"),
            ("tot_pf_rto", "-0.9734"),
            ("freq_hz", "60"),
            ("i1_a", "15.2739"),
            ("i2_a", "15.3827"),
            ("v1n_v", "124.2079"),
            ("v2n_v", "124.4629"),
            ("v12_v", "248.6707"),
            ("p1_kw", "-1.882"),
            ("p2_kw", "-1.8519"),
            ("neg_ltea_3phsum_kwh", "1537.46"),
            ("pos_ltea_3phsum_kwh", "3731.6"),
            ("CAL0", "100"),
        ])
    }

    #[test]
    fn test_inverter_record() {
        let points = map_record(&inverter(), registry()).unwrap();
        assert_eq!(points.len(), 1);

        let point = &points[0];
        assert_eq!(point.measurement(), "inverter");
        assert_eq!(point.tags(), &[("SERIAL".to_string(), "E00123".to_string())]);
        assert_eq!(
            point.field("ltea_3phsum_kwh"),
            Some(&FieldValue::Float(89.4825))
        );
        assert_eq!(point.fields().len(), 10);
        assert_eq!(point.time(), TIME_NS);

        let line = encode(point);
        assert!(line.starts_with("inverter,SERIAL=E00123 ltea_3phsum_kwh=8.94825e+01,"));
        assert!(line.ends_with(" 1672531200000000000\n"));
    }

    #[test]
    fn test_field_order_follows_schema() {
        let points = map_record(&supervisor(), registry()).unwrap();
        let keys: Vec<&str> = points[0].fields().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys[0], "dl_err_count");
        assert_eq!(keys[8], "dl_flash_avail");
        assert_eq!(points[0].field("dl_comm_err"), Some(&FieldValue::Integer(12)));
        assert_eq!(points[0].field("dl_uptime"), Some(&FieldValue::Float(46514.0)));
    }

    #[test]
    fn test_meter_tags_include_subtype() {
        let points = map_record(&consumption_meter(), registry()).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].measurement(), "meter_consumption");
        assert_eq!(points[0].tag("subtype"), Some("NET_CONSUMPTION_LOADSIDE"));
        assert_eq!(points[0].field("CAL0"), Some(&FieldValue::Integer(100)));
    }

    #[test]
    fn test_unknown_device_is_skipped() {
        let record = DeviceRecord::from_pairs([
            ("DEVICE_TYPE", "Gateway"),
            ("SERIAL", "X"),
            ("DATATIME", TIME),
        ]);
        assert!(map_record(&record, registry()).unwrap().is_empty());

        let meter = DeviceRecord::from_pairs([
            ("DEVICE_TYPE", "Power Meter"),
            ("subtype", "SOMETHING_NEW"),
        ]);
        assert!(map_record(&meter, registry()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_field_is_an_error() {
        let mut record = inverter();
        record.remove("freq_hz");
        match map_record(&record, registry()) {
            Err(Error::MissingField { device, field }) => {
                assert_eq!(device, "Inverter");
                assert_eq!(field, "freq_hz");
            }
            other => panic!("expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_tag_is_an_error() {
        let mut record = inverter();
        record.remove("SERIAL");
        assert!(matches!(
            map_record(&record, registry()),
            Err(Error::MissingField { .. })
        ));
    }

    #[test]
    fn test_missing_datatime_is_an_error() {
        let mut record = inverter();
        record.remove("DATATIME");
        assert!(matches!(
            map_record(&record, registry()),
            Err(Error::MissingField { .. })
        ));
    }

    #[test]
    fn test_bad_values_are_errors() {
        let mut record = inverter();
        record.insert("p_3phsum_kw", "");
        assert!(matches!(
            map_record(&record, registry()),
            Err(Error::Coercion { .. })
        ));

        let mut record = inverter();
        record.insert("DATATIME", "2023,01,01");
        assert!(matches!(
            map_record(&record, registry()),
            Err(Error::Format { .. })
        ));
    }

    #[test]
    fn test_record_matching_several_specs() {
        static SPECS: &[DeviceSpec] = &[
            DeviceSpec {
                device_pattern: &[("DEVICE_TYPE", "Power Meter")],
                name: "meter",
                measurements: &[("freq_hz", Coercion::Float)],
                tags: &["SERIAL"],
            },
            DeviceSpec {
                device_pattern: &[
                    ("DEVICE_TYPE", "Power Meter"),
                    ("subtype", "NET_CONSUMPTION_LOADSIDE"),
                ],
                name: "meter_consumption",
                measurements: &[("CAL0", Coercion::Integer)],
                tags: &["subtype"],
            },
        ];

        let points = map_record(&consumption_meter(), SPECS).unwrap();
        let names: Vec<&str> = points.iter().map(|p| p.measurement()).collect();
        assert_eq!(names, vec!["meter", "meter_consumption"]);
    }

    #[test]
    fn test_device_list_order() {
        let unknown = DeviceRecord::from_pairs([("DEVICE_TYPE", "Gateway")]);
        let records = vec![supervisor(), unknown, consumption_meter(), inverter()];

        let points = map_devices(&records, registry()).unwrap();
        let names: Vec<&str> = points.iter().map(|p| p.measurement()).collect();
        assert_eq!(names, vec!["supervisor", "meter_consumption", "inverter"]);

        for point in &points {
            let line = encode(point);
            assert!(line.ends_with('\n'));
            assert_eq!(line.matches('\n').count(), 1);
            assert_eq!(crate::protocol::decode(&line).unwrap().measurement(), point.measurement());
        }
    }

    #[test]
    fn test_one_bad_record_aborts_batch() {
        let mut broken = inverter();
        broken.remove("stat_ind");
        let records = vec![supervisor(), broken];
        assert!(map_devices(&records, registry()).is_err());
    }
}
