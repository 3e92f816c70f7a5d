use std::fs;
use tempfile::tempdir;

use restream_cli::commands::{pack, unpack};
use restream_cli::record::RECORD_OVERHEAD;
use serde_json::json;

fn write_file<P: AsRef<std::path::Path>>(p: P, s: &str) {
    fs::write(p, s.as_bytes()).unwrap();
}

#[test]
fn pack_then_unpack_round_trip() {
    let td = tempdir().unwrap();
    let in_path = td.path().join("in.json");
    let out_path = td.path().join("out.rec");
    let json_path = td.path().join("back.json");

    let input = r#"[
      {"a":1},
      {"b":2},
      "plain text",
      [1,2,3]
    ]"#;
    write_file(&in_path, input);

    let stats = pack::execute(in_path.to_str().unwrap(), out_path.to_str().unwrap(), 64).unwrap();
    assert!(stats.peak_window <= 64 + 16);

    let records = unpack::execute(
        out_path.to_str().unwrap(),
        Some(json_path.to_str().unwrap()),
        64,
    )
    .unwrap();

    let payloads: Vec<_> = records.iter().map(|r| r.payload.clone()).collect();
    assert_eq!(
        payloads,
        vec![json!({"a":1}), json!({"b":2}), json!("plain text"), json!([1, 2, 3])]
    );

    // Offsets follow the record framing exactly
    let mut expected_offset = 0u64;
    for record in &records {
        assert_eq!(record.offset, expected_offset);
        expected_offset += (record.len + RECORD_OVERHEAD) as u64;
    }
    assert_eq!(fs::metadata(&out_path).unwrap().len(), expected_offset);

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(written.as_array().unwrap().len(), 4);
}

#[test]
fn pack_large_file_with_small_window() {
    let td = tempdir().unwrap();
    let in_path = td.path().join("many.json");
    let out_path = td.path().join("many.rec");

    let values: Vec<_> = (0..500).map(|i| json!({ "id": i, "name": format!("item-{}", i) })).collect();
    write_file(&in_path, &serde_json::to_string(&values).unwrap());

    let stats = pack::execute(in_path.to_str().unwrap(), out_path.to_str().unwrap(), 128).unwrap();
    assert!(stats.bytes_evicted > 0);
    assert!(stats.peak_window < 512);

    let records = unpack::execute(out_path.to_str().unwrap(), None, 128).unwrap();
    assert_eq!(records.len(), 500);
    assert_eq!(records[499].payload["id"], json!(499));
}

#[test]
fn pack_fails_when_record_exceeds_cutoff() {
    let td = tempdir().unwrap();
    let in_path = td.path().join("in.json");
    let out_path = td.path().join("out.rec");

    write_file(&in_path, r#"[{"a":1}]"#);

    let err = pack::execute(in_path.to_str().unwrap(), out_path.to_str().unwrap(), 8).unwrap_err();
    assert!(format!("{:#}", err).contains("does not fit the tail cutoff"));
}

#[test]
fn pack_rejects_non_array_input() {
    let td = tempdir().unwrap();
    let in_path = td.path().join("in.json");
    let out_path = td.path().join("out.rec");

    write_file(&in_path, r#"{"not":"an array"}"#);

    assert!(pack::execute(in_path.to_str().unwrap(), out_path.to_str().unwrap(), 64).is_err());
}

#[test]
fn unpack_detects_corruption() {
    let td = tempdir().unwrap();
    let in_path = td.path().join("in.json");
    let out_path = td.path().join("out.rec");

    write_file(&in_path, r#"[{"a":1},{"b":2}]"#);
    pack::execute(in_path.to_str().unwrap(), out_path.to_str().unwrap(), 64).unwrap();

    let mut bytes = fs::read(&out_path).unwrap();
    // First payload byte of the second record
    let second = 4 + 7 + 4;
    bytes[second + 4] ^= 0xFF;
    fs::write(&out_path, &bytes).unwrap();

    let err = unpack::execute(out_path.to_str().unwrap(), None, 64).unwrap_err();
    assert!(format!("{:#}", err).contains("Checksum mismatch"));
}

#[test]
fn unpack_detects_truncation() {
    let td = tempdir().unwrap();
    let in_path = td.path().join("in.json");
    let out_path = td.path().join("out.rec");

    write_file(&in_path, r#"[{"a":1}]"#);
    pack::execute(in_path.to_str().unwrap(), out_path.to_str().unwrap(), 64).unwrap();

    let bytes = fs::read(&out_path).unwrap();
    fs::write(&out_path, &bytes[..bytes.len() - 2]).unwrap();

    let err = unpack::execute(out_path.to_str().unwrap(), None, 64).unwrap_err();
    assert!(format!("{:#}", err).contains("Truncated checksum"));
}

#[test]
fn unpack_empty_file_has_no_records() {
    let td = tempdir().unwrap();
    let path = td.path().join("empty.rec");
    fs::write(&path, b"").unwrap();

    let records = unpack::execute(path.to_str().unwrap(), None, 64).unwrap();
    assert!(records.is_empty());
}
