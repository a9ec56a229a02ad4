//! Trajectory export
//!
//! Plain-text training sets in fixed precision, one step per line, plus a JSON
//! dump of a whole run.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::sim::{RunResult, TrajectoryLog};

pub const FILE_4D: &str = "train4D.txt";
pub const FILE_6D: &str = "train6D.txt";

/// `front right left wheel` per line
pub fn write_4d<W: Write>(mut out: W, log: &TrajectoryLog) -> io::Result<()> {
    for record in log {
        write_row(&mut out, &record.as_4d())?;
    }
    out.flush()
}

/// `x y front right left wheel` per line
pub fn write_6d<W: Write>(mut out: W, log: &TrajectoryLog) -> io::Result<()> {
    for record in log {
        write_row(&mut out, &record.as_6d())?;
    }
    out.flush()
}

fn write_row<W: Write>(out: &mut W, values: &[f64]) -> io::Result<()> {
    let row = values
        .iter()
        .map(|v| format!("{v:.7}"))
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(out, "{row}")
}

/// Write both training sets into `dir`, returning the two file paths
pub fn save_results(dir: impl AsRef<Path>, log: &TrajectoryLog) -> io::Result<(PathBuf, PathBuf)> {
    let dir = dir.as_ref();
    let path_4d = dir.join(FILE_4D);
    let path_6d = dir.join(FILE_6D);

    write_4d(BufWriter::new(File::create(&path_4d)?), log)?;
    write_6d(BufWriter::new(File::create(&path_6d)?), log)?;

    log::info!(
        "Saved {} steps to {} and {}",
        log.len(),
        path_4d.display(),
        path_6d.display()
    );
    Ok((path_4d, path_6d))
}

/// Whole run as pretty JSON
pub fn write_json(path: impl AsRef<Path>, result: &RunResult) -> io::Result<()> {
    let file = BufWriter::new(File::create(path.as_ref())?);
    serde_json::to_writer_pretty(file, result).map_err(io::Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::sim::{Outcome, Pose, RunPhase, StepRecord};

    fn sample_log() -> TrajectoryLog {
        let mut log = TrajectoryLog::new();
        log.push(StepRecord {
            x: 0.0,
            y: 0.0,
            heading: 90.0,
            front: 22.0,
            right: 8.485281374238571,
            left: 8.48528137423857,
            wheel_angle: -1.25,
        });
        log.push(StepRecord {
            x: 0.1,
            y: 1.0,
            heading: 91.0,
            front: 21.0,
            right: 9.0,
            left: 8.0,
            wheel_angle: 3.0,
        });
        log
    }

    #[test]
    fn test_4d_format() {
        let mut buf = Vec::new();
        write_4d(&mut buf, &sample_log()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "22.0000000 8.4852814 8.4852814 -1.2500000");
        assert_eq!(lines[1], "21.0000000 9.0000000 8.0000000 3.0000000");
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_6d_format() {
        let mut buf = Vec::new();
        write_6d(&mut buf, &sample_log()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text.lines().nth(1),
            Some("0.1000000 1.0000000 21.0000000 9.0000000 8.0000000 3.0000000")
        );
    }

    #[test]
    fn test_empty_log_writes_empty_files() {
        let dir = tempfile::tempdir().unwrap();
        let (p4, p6) = save_results(dir.path(), &TrajectoryLog::new()).unwrap();
        assert_eq!(std::fs::read_to_string(p4).unwrap(), "");
        assert_eq!(std::fs::read_to_string(p6).unwrap(), "");
    }

    #[test]
    fn test_save_results_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let log = sample_log();
        let (p4, p6) = save_results(dir.path(), &log).unwrap();
        assert_eq!(p4.file_name().unwrap(), FILE_4D);
        assert_eq!(std::fs::read_to_string(p6).unwrap().lines().count(), 2);

        // short decimals only, so the JSON round trip is exact
        let mut short = TrajectoryLog::new();
        short.push(log.records()[1]);
        let result = RunResult {
            phase: RunPhase::Finished(Outcome::Goal),
            ticks: 3,
            final_pose: Pose {
                position: Point::new(0.2, 2.0),
                heading: 92.0,
                wheel_angle: 3.0,
            },
            log: short,
        };
        let json_path = dir.path().join("run.json");
        write_json(&json_path, &result).unwrap();
        let back: RunResult =
            serde_json::from_str(&std::fs::read_to_string(json_path).unwrap()).unwrap();
        assert_eq!(back, result);
    }
}
