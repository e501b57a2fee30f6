//! Loading motion-capture exports into a [`Sequence`].
//!
//! The analysis core never touches files. A [`FrameSource`] hands it a
//! validated sequence; [`TsvFrameSource`] reads the tab-separated export of
//! the capture system.
//!
//! # Row filtering
//!
//! - the first two lines (title and parameters) are skipped
//! - rows with fewer than [`ColumnLayout::min_columns`] cells are dropped
//! - empty cells and cells past the end of a row read as 0.0
//! - rows with an unparsable cell are dropped
//! - rows with a non-positive time are dropped
//! - rows whose effector lies within 0.01 of the origin on every axis are
//!   dropped (marker dropout)

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::{AnalysisError, Result};
use crate::frame::{CenterOfMass, Frame, Joint, Sequence};

/// Effector positions closer than this to the origin on every axis are
/// treated as dropout.
const DROPOUT_TOLERANCE: f64 = 0.01;

/// Header lines preceding the data rows.
const HEADER_LINES: usize = 2;

/// Anything that can produce a validated [`Sequence`].
pub trait FrameSource {
    /// Load the sequence.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::MalformedInput`] when no usable frame is
    /// found, or the underlying I/O or validation error.
    fn load_sequence(&self) -> Result<Sequence>;
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn load_sequence(&self) -> Result<Sequence> {
        (**self).load_sequence()
    }
}

impl FrameSource for Sequence {
    fn load_sequence(&self) -> Result<Sequence> {
        Ok(self.clone())
    }
}

/// Column positions of the channels in an export row.
///
/// Every marker occupies a block whose first three cells are x, y, z; the
/// velocity and speed of the effector live in the same block further on.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayout {
    /// Time column.
    pub time: usize,
    /// First of the effector x, y, z columns.
    pub effector_position: usize,
    /// First of the effector vx, vy, vz columns.
    pub effector_velocity: usize,
    /// Effector speed column.
    pub effector_speed: usize,
    /// First (x) column of each joint.
    pub joints: Vec<(Joint, usize)>,
    /// Offset of a joint's speed cell from its first column.
    pub joint_speed_offset: Option<usize>,
    /// First of the centre-of-mass x, y, z columns.
    pub com_position: Option<usize>,
    /// Centre-of-mass speed column.
    pub com_speed: Option<usize>,
    /// Rows with fewer cells are dropped.
    pub min_columns: usize,
}

impl Default for ColumnLayout {
    /// Full-body export with the right index-finger base as effector.
    fn default() -> Self {
        Self {
            time: 0,
            effector_position: 409,
            effector_velocity: 413,
            effector_speed: 416,
            joints: vec![
                (Joint::Root, 13),
                (Joint::Pelvis, 97),
                (Joint::SpineLow, 217),
                (Joint::SpineHigh, 229),
                (Joint::Torso, 109),
                (Joint::Neck, 193),
                (Joint::Head, 205),
                (Joint::ClavicleRight, 241),
                (Joint::ShoulderRight, 121),
                (Joint::ElbowRight, 133),
                (Joint::WristRight, 145),
                (Joint::HandIndexRight, 409),
                (Joint::HandLittleRight, 421),
                (Joint::ClavicleLeft, 253),
                (Joint::ShoulderLeft, 157),
                (Joint::ElbowLeft, 169),
                (Joint::WristLeft, 181),
                (Joint::HandIndexLeft, 349),
                (Joint::HandLittleLeft, 361),
                (Joint::HipRight, 25),
                (Joint::KneeRight, 37),
                (Joint::AnkleRight, 49),
                (Joint::FootRight, 265),
                (Joint::HipLeft, 61),
                (Joint::KneeLeft, 73),
                (Joint::AnkleLeft, 85),
                (Joint::FootLeft, 277),
            ],
            joint_speed_offset: Some(7),
            com_position: Some(1),
            com_speed: Some(8),
            min_columns: 101,
        }
    }
}

impl ColumnLayout {
    fn triple(cells: &[f64], base: usize) -> [f64; 3] {
        [cell(cells, base), cell(cells, base + 1), cell(cells, base + 2)]
    }

    fn frame_from_cells(&self, cells: &[f64]) -> Option<Frame> {
        let time = cell(cells, self.time);
        if time <= 0.0 {
            return None;
        }

        let position = Self::triple(cells, self.effector_position);
        if position.iter().all(|c| c.abs() < DROPOUT_TOLERANCE) {
            return None;
        }

        let mut frame = Frame::new(time, position, Self::triple(cells, self.effector_velocity));
        frame.effector_speed = cell(cells, self.effector_speed);

        for &(joint, base) in &self.joints {
            if base + 2 < cells.len() {
                frame.joints.insert(joint, Self::triple(cells, base));
            }
            if let Some(&speed) = self.joint_speed_offset.and_then(|o| cells.get(base + o)) {
                frame.joint_speeds.insert(joint, speed);
            }
        }

        frame.center_of_mass = self.com_position.map(|base| CenterOfMass {
            position: Self::triple(cells, base),
            speed: self.com_speed.map_or(0.0, |c| cell(cells, c)),
        });

        Some(frame)
    }
}

fn cell(cells: &[f64], index: usize) -> f64 {
    cells.get(index).copied().unwrap_or(0.0)
}

fn parse_row(line: &str) -> Option<Vec<f64>> {
    line.trim()
        .split('\t')
        .map(|c| {
            if c.is_empty() {
                Some(0.0)
            } else {
                c.trim().parse::<f64>().ok()
            }
        })
        .collect()
}

/// Parse a tab-separated export into a sequence.
///
/// # Errors
///
/// Returns [`AnalysisError::MalformedInput`] if no row survives filtering,
/// an I/O error from `reader`, or a timestamp validation error.
pub fn parse_tsv<R: BufRead>(reader: R, layout: &ColumnLayout) -> Result<Sequence> {
    let mut frames = Vec::new();
    let mut dropped = 0usize;

    for line in reader.lines().skip(HEADER_LINES) {
        let line = line?;
        if line.trim().split('\t').count() < layout.min_columns {
            dropped += 1;
            continue;
        }

        match parse_row(&line).and_then(|cells| layout.frame_from_cells(&cells)) {
            Some(frame) => frames.push(frame),
            None => dropped += 1,
        }
    }

    if frames.is_empty() {
        return Err(AnalysisError::malformed_input(format!(
            "no usable frames ({dropped} rows dropped)"
        )));
    }

    log::debug!("loaded {} frames, dropped {dropped} rows", frames.len());
    Sequence::new(frames)
}

/// Tab-separated export on disk.
#[derive(Debug, Clone)]
pub struct TsvFrameSource {
    path: PathBuf,
    layout: ColumnLayout,
}

impl TsvFrameSource {
    /// Source reading `path` with the default layout.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            layout: ColumnLayout::default(),
        }
    }

    /// Use a custom column layout.
    #[must_use]
    pub fn with_layout(mut self, layout: ColumnLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Path of the export.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSource for TsvFrameSource {
    fn load_sequence(&self) -> Result<Sequence> {
        let file = File::open(&self.path)?;
        parse_tsv(BufReader::new(file), &self.layout)
    }
}
