//! Track files
//!
//! One scenario per text file, one comma-separated record per line:
//!
//! ```text
//! 0,0,90      start x, start y, heading in degrees
//! 18,40       goal corner
//! 30,37       opposite goal corner
//! -6,-3       wall polyline points, in order
//! -6,22
//! ...
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TrackError;
use crate::geometry::Point;
use crate::sim::GoalArea;

/// Start pose, goal and three records before the walls; a wall needs two points.
const MIN_RECORDS: usize = 5;

/// A corridor scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub start: Point,
    /// Degrees
    pub heading: f64,
    pub goal: GoalArea,
    /// Wall polyline
    pub walls: Vec<Point>,
}

impl Track {
    pub fn parse(text: &str) -> Result<Self, TrackError> {
        let records = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| parse_record(idx + 1, line))
            .collect::<Result<Vec<_>, _>>()?;

        if records.len() < MIN_RECORDS {
            return Err(TrackError::MissingRecords {
                expected: MIN_RECORDS,
                found: records.len(),
            });
        }

        let (start_line, start) = &records[0];
        let heading = *start.get(2).ok_or_else(|| TrackError::Parse {
            line: *start_line,
            message: "start record needs x, y and heading".into(),
        })?;

        Ok(Self {
            start: point(&records[0])?,
            heading,
            goal: GoalArea::new(point(&records[1])?, point(&records[2])?),
            walls: records[3..].iter().map(point).collect::<Result<_, _>>()?,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, TrackError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| TrackError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let track = Self::parse(&text)?;
        log::debug!(
            "Loaded track {} ({} wall points)",
            path.display(),
            track.walls.len()
        );
        Ok(track)
    }
}

/// Every `*.txt` track in a directory, keyed by file stem
pub fn load_dir(dir: impl AsRef<Path>) -> Result<BTreeMap<String, Track>, TrackError> {
    let dir = dir.as_ref();
    let io_err = |source| TrackError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut tracks = BTreeMap::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if !path.is_file() || path.extension().is_none_or(|ext| ext != "txt") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        tracks.insert(stem.to_string(), Track::load(&path)?);
    }
    log::info!("Loaded {} tracks from {}", tracks.len(), dir.display());
    Ok(tracks)
}

fn parse_record(line: usize, text: &str) -> Result<(usize, Vec<f64>), TrackError> {
    text.split(',')
        .map(|field| {
            let field = field.trim();
            field.parse::<f64>().map_err(|_| TrackError::Parse {
                line,
                message: format!("'{field}' is not a number"),
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(|values| (line, values))
}

fn point((line, values): &(usize, Vec<f64>)) -> Result<Point, TrackError> {
    match values.as_slice() {
        [x, y, ..] => Ok(Point::new(*x, *y)),
        _ => Err(TrackError::Parse {
            line: *line,
            message: format!("expected at least 2 values, found {}", values.len()),
        }),
    }
}
