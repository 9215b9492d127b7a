//! Encode/decode integration tests.

use proptest::prelude::*;
use serde_json::{Value, json};
use tempfile::tempdir;

use trellis_codec::{
    CodecError, DecodeContext, EncodeOptions, FLAT_FILE, PanelExtensions, SCRIPT_FILE,
    WarningKind, decode, decode_artifact, encode, parse_script, read_artifact, write_display,
};
use trellis_model::{
    CogValue, DisplaySchema, MetaDescriptor, PanelLocation, PanelPayload, PanelSource, PanelType,
    Record,
};

const LEVELS: [&str; 3] = ["Algeria", "Denmark", "Germany"];

fn gapminder_schema() -> DisplaySchema {
    DisplaySchema::new(
        "life expectancy",
        vec![
            MetaDescriptor::factor("country", "Country", LEVELS),
            MetaDescriptor::number("mean_lexp", "Mean life expectancy"),
            MetaDescriptor::string("continent", "Continent"),
            MetaDescriptor::panel("panel", PanelType::Img, PanelSource::file("panels")),
        ],
    )
    .with_description("Life expectancy by country")
}

fn gapminder_records() -> Vec<Record> {
    vec![
        Record::new("Algeria")
            .with("country", "Algeria")
            .with("mean_lexp", 59.03)
            .with("continent", "Africa"),
        Record::new("Denmark")
            .with("country", 1_i64)
            .with("mean_lexp", 74.37)
            .with("continent", "Europe"),
        Record::new("Germany")
            .with("country", "Germany")
            .with("mean_lexp", f64::NAN)
            .with("continent", "Europe"),
    ]
}

#[test]
fn factor_level_encodes_one_based_and_decodes_zero_based() {
    let encoded = encode(&gapminder_schema(), &gapminder_records(), &EncodeOptions::default())
        .expect("encode");
    let rows = &encoded.artifact.cog_data;
    assert_eq!(rows[0]["country"], json!(1));
    assert_eq!(rows[1]["country"], json!(2));
    assert_eq!(rows[2]["country"], json!(3));

    let decoded = decode_artifact(&encoded.artifact, &DecodeContext::default()).expect("decode");
    assert_eq!(decoded.records[0].get("country"), &CogValue::factor(0, "Algeria"));
    assert_eq!(decoded.records[1].get("country"), &CogValue::factor(1, "Denmark"));
}

#[test]
fn nan_numbers_are_written_as_null() {
    let encoded = encode(&gapminder_schema(), &gapminder_records(), &EncodeOptions::default())
        .expect("encode");
    assert_eq!(encoded.artifact.cog_data[2]["mean_lexp"], Value::Null);
}

#[test]
fn missing_meta_value_is_schema_mismatch() {
    let records = vec![Record::new("x").with("country", "Algeria")];
    let err = encode(&gapminder_schema(), &records, &EncodeOptions::default()).unwrap_err();
    match err {
        CodecError::SchemaMismatch { panel_key, varname } => {
            assert_eq!(panel_key, "x");
            assert_eq!(varname, "mean_lexp");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn duplicate_panel_keys_are_rejected() {
    let mut records = gapminder_records();
    records[1].panel_key = "Algeria".to_string();
    let err = encode(&gapminder_schema(), &records, &EncodeOptions::default()).unwrap_err();
    assert!(matches!(err, CodecError::DuplicatePanelKey { .. }));
}

#[test]
fn strict_mode_rejects_unknown_levels() {
    let mut records = gapminder_records();
    records[0].insert("country", "France");

    let lenient = encode(&gapminder_schema(), &records, &EncodeOptions::default())
        .expect("lenient encode");
    assert_eq!(lenient.artifact.cog_data[0]["country"], json!("France"));

    let strict = encode(
        &gapminder_schema(),
        &records,
        &EncodeOptions::default().strict(),
    );
    assert!(matches!(strict, Err(CodecError::UnknownLevel { .. })));
}

#[test]
fn panel_column_holds_relative_reference() {
    let mut extensions = PanelExtensions::new();
    extensions.insert("Denmark", "svg");
    let options = EncodeOptions::default().with_panel_extensions(extensions);
    let encoded = encode(&gapminder_schema(), &gapminder_records(), &options).expect("encode");

    assert_eq!(encoded.artifact.cog_data[0]["panel"], json!("Algeria.png"));
    assert_eq!(encoded.artifact.cog_data[1]["panel"], json!("Denmark.svg"));
    assert_eq!(encoded.flat[1]["panel"], json!("panels/Denmark.svg"));

    let interface = encoded.artifact.panel_interface.as_ref().expect("interface");
    assert_eq!(interface.panel_col, "panel");
    assert_eq!(interface.source.base.as_deref(), Some("panels"));
}

#[test]
fn companion_files_match_embedded_rows_except_panel_prefix() {
    let encoded = encode(&gapminder_schema(), &gapminder_records(), &EncodeOptions::default())
        .expect("encode");
    let scripted = parse_script(&encoded.script).expect("parse script");
    assert_eq!(scripted, encoded.flat);

    for (embedded, flat) in encoded.artifact.cog_data.iter().zip(&encoded.flat) {
        assert_eq!(embedded.len(), flat.len());
        for (key, value) in embedded {
            if key == "panel" {
                let reference = value.as_str().expect("panel reference");
                assert_eq!(flat[key], json!(format!("panels/{reference}")));
            } else {
                assert_eq!(&flat[key], value, "field {key}");
            }
        }
    }
}

#[test]
fn written_display_resolves_panels_on_decode() {
    let dir = tempdir().expect("tempdir");
    let encoded = encode(&gapminder_schema(), &gapminder_records(), &EncodeOptions::default())
        .expect("encode");
    write_display(dir.path(), &encoded).expect("write display");

    let panels = dir.path().join("panels");
    std::fs::create_dir_all(&panels).expect("panels dir");
    std::fs::write(panels.join("Algeria.png"), b"png").expect("panel file");

    let artifact = read_artifact(&dir.path().join("displayInfo.json")).expect("read artifact");
    assert_eq!(artifact.name, encoded.artifact.name);
    assert_eq!(artifact.keysig, encoded.artifact.keysig);
    assert_eq!(artifact.cog_data.len(), 3);
    let flat: Value = serde_json::from_slice(
        &std::fs::read(dir.path().join(FLAT_FILE)).expect("read flat file"),
    )
    .expect("parse flat file");
    assert_eq!(flat.as_array().map(Vec::len), Some(3));
    assert!(dir.path().join(SCRIPT_FILE).is_file());

    let decoded =
        decode_artifact(&artifact, &DecodeContext::with_base_dir(dir.path())).expect("decode");
    assert_eq!(decoded.records.len(), 3, "unresolved rows are kept");

    let algeria = decoded.records[0].panel.as_ref().expect("panel ref");
    assert_eq!(
        algeria.location,
        Some(PanelLocation::File(panels.join("Algeria.png")))
    );
    assert_eq!(algeria.payload, PanelPayload::Image);
    assert_eq!(decoded.records[1].panel.as_ref().unwrap().location, None);

    let unresolved: Vec<&str> = decoded
        .warnings
        .iter()
        .filter(|w| matches!(w.kind, WarningKind::UnresolvedPanel { .. }))
        .map(|w| w.panel_key.as_str())
        .collect();
    assert_eq!(unresolved, vec!["Denmark", "Germany"]);
}

#[test]
fn decode_reports_missing_keys_and_unknown_types() {
    let err = decode(r#"{"name": "x", "metas": []}"#, &DecodeContext::default()).unwrap_err();
    assert!(matches!(err, CodecError::InvalidSchema { .. }));

    let err = decode(
        r#"{"name": "x", "cogData": [], "metas": [{"varname": "v", "type": "color"}]}"#,
        &DecodeContext::default(),
    )
    .unwrap_err();
    assert!(matches!(err, CodecError::UnsupportedMetaType { .. }));

    let err = decode(
        r#"{"name": "x", "cogData": [{"v": 1}], "metas": []}"#,
        &DecodeContext::default(),
    )
    .unwrap_err();
    assert!(matches!(err, CodecError::InvalidSchema { .. }));
}

#[test]
fn keysig_and_distributions_are_embedded() {
    let encoded = encode(&gapminder_schema(), &gapminder_records(), &EncodeOptions::default())
        .expect("encode");
    assert_eq!(encoded.artifact.keysig.len(), 64);
    assert_eq!(encoded.artifact.n, 3);
    assert!(encoded.artifact.cog_distns.contains_key("country"));
    assert!(encoded.artifact.cog_distns.contains_key("mean_lexp"));
    assert!(!encoded.artifact.cog_distns.contains_key("continent"));
}

proptest! {
    #[test]
    fn every_level_round_trips(
        levels in prop::collection::btree_set("[A-Za-z][A-Za-z ]{0,11}", 1..12),
        pick in any::<prop::sample::Index>(),
    ) {
        let levels: Vec<String> = levels.into_iter().collect();
        let value = pick.get(&levels).clone();
        let schema = DisplaySchema::new("p", vec![MetaDescriptor::factor("f", "F", levels.clone())]);
        let records = vec![Record::new("k").with("f", value.clone())];

        let encoded = encode(&schema, &records, &EncodeOptions::default().strict()).unwrap();
        let code = encoded.artifact.cog_data[0]["f"].as_u64().unwrap();
        prop_assert!(code >= 1);

        let decoded = decode_artifact(&encoded.artifact, &DecodeContext::default()).unwrap();
        prop_assert_eq!(decoded.records[0].get("f").as_label(), Some(value.as_str()));
    }
}
