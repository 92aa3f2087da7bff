//! Shared fixtures for integration tests

#![allow(dead_code)]

use shapefile::dbase::{self, FieldValue, Record};
use shapefile::{Point, Polyline};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use trail_ingest::config::{IngestProfile, SourceCatalog};
use trail_ingest::orchestrator::IngestOrchestrator;
use trail_ingest::store::MemoryRouteStore;

/// Initialize tracing for tests
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,trail_ingest=debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Write `<root>/parques_nacionales/<area>/<file>`
pub fn write_park_file(root: &Path, area: &str, file: &str, content: &str) {
    let dir = root.join("parques_nacionales").join(area);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(file), content).unwrap();
}

/// GPX document with one `<trk>` per (name, points) entry; points are (lon, lat)
pub fn gpx(tracks: &[(&str, &[(f64, f64)])]) -> String {
    let mut doc = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<gpx version=\"1.1\" creator=\"fixtures\">\n",
    );
    for (name, points) in tracks {
        doc.push_str("  <trk>\n");
        if !name.is_empty() {
            doc.push_str(&format!("    <name>{}</name>\n", name));
        }
        doc.push_str("    <trkseg>\n");
        for (lon, lat) in points.iter() {
            doc.push_str(&format!("      <trkpt lat=\"{}\" lon=\"{}\"/>\n", lat, lon));
        }
        doc.push_str("    </trkseg>\n  </trk>\n");
    }
    doc.push_str("</gpx>\n");
    doc
}

/// Polyline from (lon, lat) parts
pub fn polyline(parts: &[&[(f64, f64)]]) -> Polyline {
    Polyline::with_parts(
        parts
            .iter()
            .map(|part| part.iter().map(|(lon, lat)| Point::new(*lon, *lat)).collect())
            .collect(),
    )
}

/// Write `.shp`/`.shx`/`.dbf` with `CODIGO`, `NOMBRE` and `LONGITUD` columns
pub fn write_shapefile(path: &Path, features: &[(Polyline, [&str; 3])]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let table = dbase::TableWriterBuilder::new()
        .add_character_field("CODIGO".try_into().unwrap(), 20)
        .add_character_field("NOMBRE".try_into().unwrap(), 80)
        .add_character_field("LONGITUD".try_into().unwrap(), 10);

    let mut writer = shapefile::Writer::from_path(path, table).unwrap();
    for (shape, [code, name, length]) in features {
        let record = Record::from(HashMap::from([
            ("CODIGO".to_string(), FieldValue::Character(Some(code.to_string()))),
            ("NOMBRE".to_string(), FieldValue::Character(Some(name.to_string()))),
            ("LONGITUD".to_string(), FieldValue::Character(Some(length.to_string()))),
        ]));
        writer.write_shape_and_record(shape, &record).unwrap();
    }
}

/// Rewrite the shape type of record `index` to NullShape (0), located through the `.shx`
pub fn null_out_shape(shp: &Path, index: usize) {
    let shx = fs::read(shp.with_extension("shx")).unwrap();
    let entry = 100 + index * 8;
    let offset = i32::from_be_bytes(shx[entry..entry + 4].try_into().unwrap()) as usize * 2;

    let mut bytes = fs::read(shp).unwrap();
    bytes[offset + 8..offset + 12].copy_from_slice(&0i32.to_le_bytes());
    fs::write(shp, bytes).unwrap();
}

/// Profile with the built-in catalog
pub fn builtin_profile() -> IngestProfile {
    IngestProfile {
        sources: SourceCatalog::builtin().sources,
        ..Default::default()
    }
}

pub fn orchestrator(store: Arc<MemoryRouteStore>, root: &Path) -> IngestOrchestrator {
    IngestOrchestrator::from_profile(store, root, &builtin_profile()).unwrap()
}
