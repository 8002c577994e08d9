// Copyright (C) 2023 by GiGa infosystems
//! This module uses `para_segy_in` and `para_segy_out` together to make
//! round trip tests and observe whether the crates work in a compatible
//! manner. The tests drive a small synthetic survey through the collective
//! write paths and read it back through every read shape.
use para_segy_core::communicator::LocalCommunicator;
use para_segy_core::io_driver::{FileMode, IoDriverFile, IoDriverOpt};
use para_segy_core::keys::TraceField;
use para_segy_core::metadata::TraceMetadata;
use para_segy_core::rules::Rule;
use para_segy_core::SegySettings;
use para_segy_in::InputFileSegy;

use crate::OutputFileSegy;

use std::path::Path;
use std::sync::Arc;

mod survey_roundtrip;

const TEXT: &str = "C 1 SYNTHETIC SURVEY FOR ROUND TRIP TESTS";
const SAMPLE_INTERVAL: f64 = 0.004;

fn output_file(path: &Path, settings: SegySettings) -> OutputFileSegy {
    let driver = IoDriverFile::open(
        Arc::new(LocalCommunicator::new()),
        path.to_str().unwrap(),
        FileMode::ReadWrite,
        IoDriverOpt::default(),
    )
    .unwrap();
    OutputFileSegy::new(Box::new(driver), settings).unwrap()
}

fn input_file(path: &Path) -> InputFileSegy {
    let driver = IoDriverFile::open(
        Arc::new(LocalCommunicator::new()),
        path.to_str().unwrap(),
        FileMode::Read,
        IoDriverOpt::default(),
    )
    .unwrap();
    InputFileSegy::open(Box::new(driver), SegySettings::default()).unwrap()
}

/// The rule used for writing and reading back the synthetic survey.
fn survey_rule() -> Rule {
    Rule::new(true, true, false)
}

/// The survey's metadata: trace i sits on inline 1600 + i/3000, crossline
/// 1600 + i%3000, with the source at (1500 + i, 1300 - i).
fn survey_metadata(number_of_traces: usize) -> TraceMetadata {
    let mut tm = TraceMetadata::new(survey_rule(), number_of_traces);
    for i in 0..number_of_traces {
        tm.set_integer(i, TraceField::Inline, 1600 + i as i64 / 3000)
            .unwrap();
        tm.set_integer(i, TraceField::Crossline, 1600 + i as i64 % 3000)
            .unwrap();
        tm.set_integer(i, TraceField::FileTraceIndex, i as i64 + 1)
            .unwrap();
        tm.set_floating_point(i, TraceField::SourceX, 1500.0 + i as f64)
            .unwrap();
        tm.set_floating_point(i, TraceField::SourceY, 1300.0 - i as f64)
            .unwrap();
    }
    tm
}

/// The survey's samples: s[j] = i + j for trace i.
fn survey_data(number_of_traces: usize, samples_per_trace: usize) -> Vec<f32> {
    (0..number_of_traces)
        .flat_map(|i| (0..samples_per_trace).map(move |j| (i + j) as f32))
        .collect()
}

/// Write the whole survey contiguously and sync.
fn write_survey(path: &Path, number_of_traces: usize, samples_per_trace: usize, settings: SegySettings) {
    let mut out = output_file(path, settings);
    out.write_text(TEXT);
    out.write_samples_per_trace(samples_per_trace).unwrap();
    out.write_number_of_traces(number_of_traces).unwrap();
    out.write_sample_interval(SAMPLE_INTERVAL);

    let tm = survey_metadata(number_of_traces);
    let data = survey_data(number_of_traces, samples_per_trace);
    out.write(0, number_of_traces, &data, &tm, 0).unwrap();
    out.sync().unwrap();
}

fn assert_survey_trace(tm: &TraceMetadata, row: usize, i: usize) {
    assert_eq!(
        tm.get_integer(row, TraceField::Inline).unwrap(),
        1600 + i as i64 / 3000
    );
    assert_eq!(
        tm.get_integer(row, TraceField::Crossline).unwrap(),
        1600 + i as i64 % 3000
    );
    assert_eq!(
        tm.get_integer(row, TraceField::FileTraceIndex).unwrap(),
        i as i64 + 1
    );
    assert_eq!(
        tm.get_floating_point(row, TraceField::SourceX).unwrap(),
        1500.0 + i as f64
    );
    assert_eq!(
        tm.get_floating_point(row, TraceField::SourceY).unwrap(),
        1300.0 - i as f64
    );
}
