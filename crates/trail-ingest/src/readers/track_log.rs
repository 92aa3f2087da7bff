//! GPX track-log reader
//!
//! Layout: `<source dir>/<area>/<file>.gpx`, one area per national park. A
//! file may hold several named tracks; every track with at least two points
//! becomes one record.

use super::{children, file_name, has_extension, require_dir, walk_error, SourceOrigin};
use crate::error::{IngestError, Result};
use crate::extract::track_log_id;
use crate::model::{attr, Coordinate, RawTrailRecord};
use chrono::{DateTime, Utc};
use regex::{Regex, RegexBuilder};
use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use trail_common::types::SourceKind;

pub struct TrackLogReader {
    origin: SourceOrigin,
    dir: PathBuf,
    metadata_name: Regex,
}

impl TrackLogReader {
    pub fn new(origin: SourceOrigin, dir: impl Into<PathBuf>) -> Result<Self> {
        // Tolerates malformed documents that the GPX parser rejects
        let metadata_name = RegexBuilder::new(r"<metadata\b.*?<name>\s*(.*?)\s*</name>")
            .dot_matches_new_line(true)
            .case_insensitive(true)
            .build()
            .map_err(|e| IngestError::Setup(format!("invalid metadata pattern: {}", e)))?;

        Ok(Self {
            origin,
            dir: dir.into(),
            metadata_name,
        })
    }

    /// Start a fresh pass over the source directory
    pub fn records(&self) -> Result<TrackLogRecords> {
        require_dir(&self.origin.source_name, &self.dir)?;

        Ok(TrackLogRecords {
            origin: self.origin.clone(),
            metadata_name: self.metadata_name.clone(),
            areas: children(&self.dir),
            files: None,
            pending: VecDeque::new(),
        })
    }
}

/// Lazy iterator over the tracks of every area
pub struct TrackLogRecords {
    origin: SourceOrigin,
    metadata_name: Regex,
    areas: walkdir::IntoIter,
    /// Area currently being walked and its remaining entries
    files: Option<(String, walkdir::IntoIter)>,
    pending: VecDeque<Result<RawTrailRecord>>,
}

impl Iterator for TrackLogRecords {
    type Item = Result<RawTrailRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Some(item);
            }

            if let Some((area, files)) = self.files.as_mut() {
                match files.next() {
                    Some(Ok(entry)) => {
                        if entry.file_type().is_file() && has_extension(entry.path(), "gpx") {
                            self.pending =
                                read_gpx_file(&self.origin, &self.metadata_name, area, entry.path());
                        }
                    }
                    Some(Err(e)) => return Some(Err(walk_error(&self.origin, area, e))),
                    None => self.files = None,
                }
                continue;
            }

            match self.areas.next()? {
                Ok(entry) if entry.file_type().is_dir() => {
                    let area = file_name(entry.path());
                    debug!(source = %self.origin.source_name, area = %area, "Entering area");
                    self.files = Some((area, children(entry.path())));
                }
                Ok(entry) => {
                    debug!(path = %entry.path().display(), "Ignoring non-directory entry");
                }
                Err(e) => return Some(Err(walk_error(&self.origin, "", e))),
            }
        }
    }
}

/// Parse one file into its track records, or a single error for the file
fn read_gpx_file(
    origin: &SourceOrigin,
    metadata_name: &Regex,
    area: &str,
    path: &Path,
) -> VecDeque<Result<RawTrailRecord>> {
    let file = file_name(path);

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            return VecDeque::from([Err(IngestError::record(
                origin.context(area, &file, 0),
                format!("failed to read file: {}", e),
            ))])
        }
    };

    let document = match gpx::read(content.as_bytes()) {
        Ok(document) => document,
        Err(e) => {
            return VecDeque::from([Err(IngestError::record(
                origin.context(area, &file, 0),
                format!("GPX parse error: {}", e),
            ))])
        }
    };

    let file_title = document
        .metadata
        .as_ref()
        .and_then(|m| m.name.clone())
        .filter(|name| !name.trim().is_empty())
        .or_else(|| scan_metadata_name(metadata_name, &content));
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.clone());

    let mut records = VecDeque::new();
    for (position, track) in document.tracks.iter().enumerate() {
        let points = TrackPoints::collect(track);
        if points.coordinates.len() < 2 {
            warn!(
                source = %origin.source_name,
                area = %area,
                file = %file,
                track = position,
                points = points.coordinates.len(),
                "Skipping track with fewer than 2 points"
            );
            continue;
        }

        let index = records.len();
        let name = track
            .name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .or_else(|| file_title.clone())
            .unwrap_or_else(|| stem.clone());

        let mut attributes = BTreeMap::new();
        attributes.insert(attr::NAME.to_string(), name.trim().to_string());
        attributes.insert(attr::SOURCE_FILE.to_string(), file.clone());

        records.push_back(Ok(RawTrailRecord {
            external_id: track_log_id(area, &file, index),
            declared_duration_min: points.elapsed_minutes(),
            coordinates: points.coordinates,
            elevations: (!points.elevations.is_empty()).then_some(points.elevations),
            attributes,
            kind: SourceKind::TrackLog,
            provider: origin.provider,
            category: origin.category,
            declared_length_km: None,
            context: origin.context(area, &file, index),
        }));
    }

    debug!(file = %file, tracks = records.len(), "Parsed GPX file");
    records
}

fn scan_metadata_name(pattern: &Regex, content: &str) -> Option<String> {
    pattern
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty())
}

/// Points of all segments of a track, in file order
struct TrackPoints {
    coordinates: Vec<Coordinate>,
    elevations: Vec<f64>,
    first_time: Option<DateTime<Utc>>,
    last_time: Option<DateTime<Utc>>,
}

impl TrackPoints {
    fn collect(track: &gpx::Track) -> Self {
        let mut points = Self {
            coordinates: Vec::new(),
            elevations: Vec::new(),
            first_time: None,
            last_time: None,
        };

        for waypoint in track.segments.iter().flat_map(|segment| segment.points.iter()) {
            let point = waypoint.point();
            points.coordinates.push(Coordinate {
                x: point.x(),
                y: point.y(),
            });
            if let Some(elevation) = waypoint.elevation.filter(|e| e.is_finite()) {
                points.elevations.push(elevation);
            }
            if let Some(time) = waypoint.time.as_ref().and_then(gpx_time_to_chrono) {
                points.first_time.get_or_insert(time);
                points.last_time = Some(time);
            }
        }

        points
    }

    /// Minutes between the first and last timestamped points, when positive
    fn elapsed_minutes(&self) -> Option<i32> {
        let elapsed = self.last_time? - self.first_time?;
        let minutes = (elapsed.num_seconds() as f64 / 60.0).round();
        (minutes >= 1.0 && minutes <= f64::from(i32::MAX)).then_some(minutes as i32)
    }
}

fn gpx_time_to_chrono(time: &gpx::Time) -> Option<DateTime<Utc>> {
    let formatted = time.format().ok()?;
    DateTime::parse_from_rfc3339(&formatted)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use trail_common::types::{Provider, RouteCategory};

    fn origin() -> SourceOrigin {
        SourceOrigin {
            source_name: "parques_nacionales".into(),
            provider: Provider::ParquesNacionales,
            category: RouteCategory::NationalParkTrail,
        }
    }

    fn write(dir: &Path, name: &str, content: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(name), content).unwrap();
    }

    const TWO_TRACKS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test">
  <metadata><name>Senderos del Teide</name></metadata>
  <trk>
    <name>Roques de García</name>
    <trkseg>
      <trkpt lat="28.22" lon="-16.63"><ele>2100</ele><time>2024-05-01T09:00:00Z</time></trkpt>
      <trkpt lat="28.23" lon="-16.62"><ele>2150</ele></trkpt>
    </trkseg>
    <trkseg>
      <trkpt lat="28.24" lon="-16.61"><ele>2120</ele><time>2024-05-01T10:30:00Z</time></trkpt>
    </trkseg>
  </trk>
  <trk>
    <name>Roques de García</name>
    <trkseg>
      <trkpt lat="28.25" lon="-16.60"/>
      <trkpt lat="28.26" lon="-16.59"/>
    </trkseg>
  </trk>
  <trk>
    <trkseg>
      <trkpt lat="28.27" lon="-16.58"/>
    </trkseg>
  </trk>
</gpx>"#;

    #[test]
    fn test_reads_tracks_with_segments_concatenated() {
        let root = TempDir::new().unwrap();
        write(&root.path().join("Teide"), "roques.gpx", TWO_TRACKS);

        let reader = TrackLogReader::new(origin(), root.path()).unwrap();
        let records: Vec<_> = reader.records().unwrap().collect::<Result<_>>().unwrap();

        assert_eq!(records.len(), 2);
        let first = &records[0];
        assert_eq!(first.external_id, "Teide_roques.gpx_0");
        assert_eq!(first.coordinates.len(), 3);
        assert_eq!(first.coordinates[0], Coordinate { x: -16.63, y: 28.22 });
        assert_eq!(first.elevations, Some(vec![2100.0, 2150.0, 2120.0]));
        assert_eq!(first.declared_duration_min, Some(90));
        assert_eq!(first.attribute(attr::NAME), Some("Roques de García"));
        assert_eq!(first.context.area, "Teide");

        let second = &records[1];
        assert_eq!(second.external_id, "Teide_roques.gpx_1");
        assert_ne!(first.external_id, second.external_id);
        assert_eq!(second.elevations, None);
        assert_eq!(second.declared_duration_min, None);
    }

    #[test]
    fn test_name_fallbacks() {
        let root = TempDir::new().unwrap();
        let area = root.path().join("Ordesa");
        write(
            &area,
            "circo.gpx",
            r#"<gpx version="1.1" creator="t"><metadata><name>Circo de Soaso</name></metadata>
<trk><trkseg><trkpt lat="42.6" lon="0.0"/><trkpt lat="42.7" lon="0.1"/></trkseg></trk></gpx>"#,
        );
        write(
            &area,
            "faja de pelay.gpx",
            r#"<gpx version="1.1" creator="t">
<trk><trkseg><trkpt lat="42.6" lon="0.0"/><trkpt lat="42.7" lon="0.1"/></trkseg></trk></gpx>"#,
        );

        let reader = TrackLogReader::new(origin(), root.path()).unwrap();
        let records: Vec<_> = reader.records().unwrap().collect::<Result<_>>().unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].attribute(attr::NAME), Some("Circo de Soaso"));
        assert_eq!(records[1].attribute(attr::NAME), Some("faja de pelay"));
        assert_eq!(records[1].external_id, "Ordesa_faja_de_pelay.gpx_0");
    }

    #[test]
    fn test_broken_file_yields_error_and_continues() {
        let root = TempDir::new().unwrap();
        let area = root.path().join("Doñana");
        write(&area, "a_broken.gpx", "<gpx><trk><trkseg><trkpt lat=");
        write(
            &area,
            "b_ok.gpx",
            r#"<gpx version="1.1" creator="t">
<trk><name>Charco</name><trkseg><trkpt lat="37.0" lon="-6.4"/><trkpt lat="37.1" lon="-6.5"/></trkseg></trk></gpx>"#,
        );
        write(&area, "notes.txt", "not a track");

        let reader = TrackLogReader::new(origin(), root.path()).unwrap();
        let items: Vec<_> = reader.records().unwrap().collect();

        assert_eq!(items.len(), 2);
        match &items[0] {
            Err(IngestError::Record { context, .. }) => assert_eq!(context.file, "a_broken.gpx"),
            other => panic!("expected record error, got {:?}", other),
        }
        assert_eq!(items[1].as_ref().unwrap().attribute(attr::NAME), Some("Charco"));
    }

    #[test]
    fn test_missing_directory_is_source_error() {
        let root = TempDir::new().unwrap();
        let reader = TrackLogReader::new(origin(), root.path().join("missing")).unwrap();
        assert!(matches!(reader.records(), Err(IngestError::Source { .. })));
    }

    #[test]
    fn test_scan_metadata_name_is_tolerant() {
        let pattern = TrackLogReader::new(origin(), "/unused").unwrap().metadata_name;
        let broken = "<gpx><metadata>\n  <name> Mirador </name></metadata><trk>";
        assert_eq!(scan_metadata_name(&pattern, broken), Some("Mirador".to_string()));
        assert_eq!(scan_metadata_name(&pattern, "<gpx><trk><name>x</name>"), None);
    }
}
