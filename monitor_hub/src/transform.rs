//! File-exchange adapter for the external bird's eye converter.
//!
//! The converter is a separate binary sharing a working directory with the
//! hub: the hub writes the target rectangle, the calibration quad and the
//! points into the input file, runs the converter, and reads the projected
//! points back from the output file. A failed run or a truncated output
//! file surfaces as a short result, which the engine treats as a
//! misaligned cycle.
//!
//! SPDX-License-Identifier: GPL-3.0-or-later

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::Command;

use log::error;
use zonewatch_pipeline::geometry::{Point, Quad};
use zonewatch_pipeline::traits::PlaneTransform;

pub struct FileExchangeTransform {
    command: String,
    input_path: PathBuf,
    output_path: PathBuf,
}

impl FileExchangeTransform {
    pub fn new(command: &str, input_path: &str, output_path: &str) -> Self {
        Self {
            command: command.to_string(),
            input_path: PathBuf::from(input_path),
            output_path: PathBuf::from(output_path),
        }
    }

    fn write_input(&self, target: &Quad, calibration: &Quad, points: &[Point]) -> std::io::Result<()> {
        let mut file = File::create(&self.input_path)?;
        writeln!(file, "{}", join_values(target.values()))?;
        writeln!(file, "{}", join_values(calibration.values()))?;
        for point in points {
            writeln!(file, "{},{}", point.x, point.y)?;
        }
        file.flush()
    }

    fn read_output(&self) -> std::io::Result<Vec<Point>> {
        let file = File::open(&self.output_path)?;
        let mut points = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            let values: Vec<&str> = line.split(',').collect();
            if values.len() != 2 {
                continue;
            }
            let (Ok(x), Ok(y)) = (values[0].trim().parse(), values[1].trim().parse()) else {
                continue;
            };
            points.push(Point::new(x, y));
        }
        Ok(points)
    }
}

fn join_values(values: &[i64; 8]) -> String {
    values
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

impl PlaneTransform for FileExchangeTransform {
    fn transform(&self, target: &Quad, calibration: &Quad, points: &[Point]) -> Vec<Point> {
        if let Err(err) = self.write_input(target, calibration, points) {
            error!("cannot write converter input file: {err}");
            return Vec::new();
        }

        match Command::new(&self.command).status() {
            Ok(status) if status.success() => {}
            Ok(status) => {
                error!("bird's eye converter exited with {status}");
                return Vec::new();
            }
            Err(err) => {
                error!("cannot run bird's eye converter: {err}");
                return Vec::new();
            }
        }

        match self.read_output() {
            Ok(points) => points,
            Err(err) => {
                error!("cannot read converter output file: {err}");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> String {
        std::env::temp_dir()
            .join(format!("zonewatch_conv_{name}"))
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn input_file_carries_target_calibration_and_points() {
        let input = scratch("input");
        let adapter = FileExchangeTransform::new("true", &input, &scratch("unused"));
        let target = Quad([0, 0, 50, 0, 50, 50, 0, 50]);
        let calibration = Quad([1, 2, 3, 4, 5, 6, 7, 8]);
        adapter
            .write_input(&target, &calibration, &[Point::new(25, 25), Point::new(9, 9)])
            .unwrap();

        let content = std::fs::read_to_string(&input).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "0,0,50,0,50,50,0,50");
        assert_eq!(lines[1], "1,2,3,4,5,6,7,8");
        assert_eq!(lines[2], "25,25");
        assert_eq!(lines[3], "9,9");
    }

    #[test]
    fn output_parsing_skips_malformed_lines() {
        let output = scratch("output");
        std::fs::write(&output, "10,20\nnot a point\n30,40,50\n7,8\n").unwrap();
        let adapter = FileExchangeTransform::new("true", &scratch("unused2"), &output);
        let points = adapter.read_output().unwrap();
        assert_eq!(points, vec![Point::new(10, 20), Point::new(7, 8)]);
    }
}
