//! Producer input through to a queried page, using the library pieces the
//! binary is made of.

use std::fs;

use tempfile::TempDir;

use trellis_cli::expr::{parse_filter, parse_sort};
use trellis_cli::input::{apply_panel_base, read_metas, read_records_file};
use trellis_codec::{EncodeOptions, display_dir, encode, write_display, write_display_list};
use trellis_ingest::load;
use trellis_model::{DisplaySchema, PanelLocation};
use trellis_query::{QueryEngine, QueryOptions, format_value};

const METAS: &str = r#"[
  {"varname": "country", "label": "Country", "type": "factor",
   "levels": ["Algeria", "Denmark", "Germany", "Japan"]},
  {"varname": "lexp", "label": "Life expectancy", "type": "number", "digits": 1},
  {"varname": "continent", "label": "Continent", "type": "string"}
]"#;

const ROWS: &str = "panelKey,country,lexp,continent\n\
                    dz,Algeria,70.25,Africa\n\
                    dk,Denmark,80.9,Europe\n\
                    de,Germany,81.1,Europe\n\
                    jp,Japan,84.3,Asia\n";

#[test]
fn build_then_query_page() {
    let dir = TempDir::new().unwrap();
    let metas_path = dir.path().join("metas.json");
    let rows_path = dir.path().join("rows.csv");
    fs::write(&metas_path, METAS).unwrap();
    fs::write(&rows_path, ROWS).unwrap();

    let mut metas = read_metas(&metas_path).unwrap();
    apply_panel_base(&mut metas, "panels");
    let records = read_records_file(&rows_path, &metas).unwrap();
    let schema = DisplaySchema::new("gap", metas);
    let encoded = encode(&schema, &records, &EncodeOptions::default().strict()).unwrap();

    let app = dir.path().join("app");
    let out = display_dir(&app, "gap");
    write_display(&out, &encoded).unwrap();
    fs::create_dir_all(out.join("panels")).unwrap();
    fs::write(out.join("panels/jp.png"), b"png").unwrap();
    let listing = write_display_list(&app).unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].n, 4);

    let loaded = load(&app).unwrap();
    assert_eq!(loaded.display.warnings.len(), 3, "three panels are missing");

    let mut engine = QueryEngine::from_schema(
        loaded.schema(),
        loaded.records().to_vec(),
        QueryOptions::default(),
    );
    let filter = parse_filter("continent=Europe,Asia", engine.metas()).unwrap();
    engine.set_filter(filter.varname, filter.spec);
    let sort = parse_sort("lexp:desc", engine.metas()).unwrap();
    engine.set_sort(sort.varname, sort.dir);
    engine.set_layout(Some(2), Some(1), None);

    let page = engine.current_page();
    assert_eq!(page.total, 3);
    assert_eq!(page.total_pages, 2);
    let keys: Vec<&str> = page.records.iter().map(|r| r.panel_key.as_str()).collect();
    assert_eq!(keys, vec!["jp", "de"]);

    let lexp = &page.metas[1];
    assert_eq!(format_value(lexp, page.records[0].get("lexp")), "84.3");
    assert!(matches!(
        page.records[0].panel.as_ref().and_then(|p| p.location.as_ref()),
        Some(PanelLocation::File(_))
    ));
}

#[test]
fn strict_build_rejects_unknown_level() {
    let dir = TempDir::new().unwrap();
    let metas_path = dir.path().join("metas.json");
    let rows_path = dir.path().join("rows.csv");
    fs::write(&metas_path, METAS).unwrap();
    fs::write(&rows_path, "panelKey,country,lexp,continent\nfr,France,82.5,Europe\n").unwrap();

    let metas = read_metas(&metas_path).unwrap();
    let records = read_records_file(&rows_path, &metas).unwrap();
    let schema = DisplaySchema::new("gap", metas);
    let err = encode(&schema, &records, &EncodeOptions::default().strict()).unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"value 'France' of record 'fr' is not a level of factor 'country'"
    );
}
