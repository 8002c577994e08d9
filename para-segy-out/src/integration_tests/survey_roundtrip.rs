use super::*;

use para_segy_core::enums::{SegyNumberFormat, TextEncoding};

#[test]
fn ieee_ascii_survey_round_trip() {
    let dir = tempfile::tempdir().expect("Couldn't get tempfile.");
    let path = dir.path().join("survey-ieee.sgy");

    let (nt, ns) = (128, 128);
    write_survey(&path, nt, ns, SegySettings::default());

    let file = input_file(&path);
    assert_eq!(file.read_number_of_traces(), nt);
    assert_eq!(file.read_samples_per_trace(), ns);
    assert_eq!(file.number_format(), SegyNumberFormat::IeeeFloat32);
    assert!((file.read_sample_interval() - SAMPLE_INTERVAL).abs() < 1e-12);
    assert_eq!(&file.read_text()[..TEXT.len()], TEXT);

    let mut tm = TraceMetadata::new(survey_rule(), nt);
    let mut data = vec![0.0f32; nt * ns];
    file.read(0, nt, &mut data, &mut tm, 0).unwrap();

    for i in 0..nt {
        assert_survey_trace(&tm, i, i);
        for j in 0..ns {
            assert_eq!(data[i * ns + j], (i + j) as f32);
        }
    }
}

#[test]
fn ibm_ebcdic_survey_round_trip() {
    let dir = tempfile::tempdir().expect("Couldn't get tempfile.");
    let path = dir.path().join("survey-ibm.sgy");

    let mut settings = SegySettings::default();
    settings.set_number_format(SegyNumberFormat::IbmFloat32);
    settings.set_text_encoding(TextEncoding::Ebcdic);

    let (nt, ns) = (128, 128);
    write_survey(&path, nt, ns, settings);

    // The raw text block must not be plain ASCII.
    let raw = std::fs::read(&path).unwrap();
    assert_ne!(raw[0], b'C');

    let file = input_file(&path);
    assert_eq!(file.number_format(), SegyNumberFormat::IbmFloat32);
    assert_eq!(&file.read_text()[..TEXT.len()], TEXT);

    let mut tm = TraceMetadata::new(survey_rule(), nt);
    let mut data = vec![0.0f32; nt * ns];
    file.read(0, nt, &mut data, &mut tm, 0).unwrap();

    for i in 0..nt {
        assert_survey_trace(&tm, i, i);
        for j in 0..ns {
            // Small integers are exact through the IBM encode/decode pair.
            assert_eq!(data[i * ns + j], (i + j) as f32);
        }
    }
}

#[test]
fn zero_trace_file_round_trip() {
    let dir = tempfile::tempdir().expect("Couldn't get tempfile.");
    let path = dir.path().join("empty.sgy");

    write_survey(&path, 0, 0, SegySettings::default());
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 3600);

    let file = input_file(&path);
    assert_eq!(file.read_number_of_traces(), 0);
    assert_eq!(file.read_samples_per_trace(), 0);

    let mut tm = TraceMetadata::new(survey_rule(), 0);
    let mut data = vec![0.0f32; 0];
    file.read_metadata(0, 0, &mut tm, 0).unwrap();
    file.read_data(0, 0, &mut data).unwrap();
    file.read(0, 0, &mut data, &mut tm, 0).unwrap();
}

#[test]
fn non_contiguous_write_then_read() {
    let dir = tempfile::tempdir().expect("Couldn't get tempfile.");
    let path = dir.path().join("scattered.sgy");

    let (nt, ns) = (100, 4);
    // Size the file but only write four scattered traces.
    {
        let mut out = output_file(&path, SegySettings::default());
        out.write_text(TEXT);
        out.write_samples_per_trace(ns).unwrap();
        out.write_number_of_traces(nt).unwrap();
        out.write_sample_interval(SAMPLE_INTERVAL);

        let offsets = [0u64, 10, 50, 99];
        let mut tm = TraceMetadata::new(survey_rule(), offsets.len());
        let mut data = vec![0.0f32; offsets.len() * ns];
        for (row, &offset) in offsets.iter().enumerate() {
            tm.copy_entries(row, &survey_metadata(nt), offset as usize)
                .unwrap();
            for j in 0..ns {
                data[row * ns + j] = (offset as usize + j) as f32;
            }
        }
        out.write_non_contiguous(&offsets, &data, &tm, 0).unwrap();
        out.sync().unwrap();
    }

    let file = input_file(&path);
    let offsets = [0u64, 10, 50, 99];
    let mut tm = TraceMetadata::new(survey_rule(), offsets.len());
    file.read_metadata_non_contiguous(&offsets, &mut tm, 0).unwrap();
    for (row, &offset) in offsets.iter().enumerate() {
        assert_survey_trace(&tm, row, offset as usize);
    }

    // A trace nobody wrote reads back as zeros.
    let mut tm = TraceMetadata::new(survey_rule(), 1);
    file.read_metadata(1, 1, &mut tm, 0).unwrap();
    assert_eq!(tm.get_integer(0, TraceField::FileTraceIndex).unwrap(), 0);
}

#[test]
fn non_monotonic_write_lands_each_row_on_its_trace() {
    let dir = tempfile::tempdir().expect("Couldn't get tempfile.");
    let path = dir.path().join("shuffled.sgy");

    let (nt, ns) = (12, 2);
    {
        let mut out = output_file(&path, SegySettings::default());
        out.write_text(TEXT);
        out.write_samples_per_trace(ns).unwrap();
        out.write_number_of_traces(nt).unwrap();
        out.write_sample_interval(SAMPLE_INTERVAL);

        // Row r of the container describes trace offsets[r].
        let offsets = [7u64, 0, 11, 3];
        let mut tm = TraceMetadata::new(survey_rule(), offsets.len());
        let mut data = vec![0.0f32; offsets.len() * ns];
        for (row, &offset) in offsets.iter().enumerate() {
            tm.copy_entries(row, &survey_metadata(nt), offset as usize)
                .unwrap();
            for j in 0..ns {
                data[row * ns + j] = (offset as usize + j) as f32;
            }
        }
        out.write_non_monotonic(&offsets, &data, &tm, 0).unwrap();
        out.sync().unwrap();
    }

    let file = input_file(&path);
    for &offset in &[7u64, 0, 11, 3] {
        let mut tm = TraceMetadata::new(survey_rule(), 1);
        let mut data = vec![0.0f32; ns];
        file.read(offset, 1, &mut data, &mut tm, 0).unwrap();
        assert_survey_trace(&tm, 0, offset as usize);
        assert_eq!(data[0], offset as f32);
    }
}

#[test]
fn skip_composes_partial_writes() {
    let dir = tempfile::tempdir().expect("Couldn't get tempfile.");
    let whole_path = dir.path().join("whole.sgy");
    let pieced_path = dir.path().join("pieced.sgy");

    let (nt, ns) = (10, 3);
    write_survey(&whole_path, nt, ns, SegySettings::default());

    {
        let mut out = output_file(&pieced_path, SegySettings::default());
        out.write_text(TEXT);
        out.write_samples_per_trace(ns).unwrap();
        out.write_number_of_traces(nt).unwrap();
        out.write_sample_interval(SAMPLE_INTERVAL);

        // One container, emitted through three partial writes.
        let tm = survey_metadata(nt);
        let data = survey_data(nt, ns);
        out.write(0, 3, &data[..3 * ns], &tm, 0).unwrap();
        out.write(3, 4, &data[3 * ns..7 * ns], &tm, 3).unwrap();
        out.write(7, 3, &data[7 * ns..], &tm, 7).unwrap();
        out.sync().unwrap();
    }

    assert_eq!(
        std::fs::read(&whole_path).unwrap(),
        std::fs::read(&pieced_path).unwrap()
    );
}

#[test]
fn copy_rule_reproduces_a_file_byte_for_byte() {
    let dir = tempfile::tempdir().expect("Couldn't get tempfile.");
    let source_path = dir.path().join("source.sgy");
    let copied_path = dir.path().join("copied.sgy");

    let (nt, ns) = (16, 8);
    write_survey(&source_path, nt, ns, SegySettings::default());

    // Read everything, headers verbatim included.
    let mut rule = survey_rule();
    rule.add_copy();
    let mut tm = TraceMetadata::new(rule, nt);
    let mut data = vec![0.0f32; nt * ns];
    {
        let file = input_file(&source_path);
        file.read(0, nt, &mut data, &mut tm, 0).unwrap();
    }

    {
        let mut out = output_file(&copied_path, SegySettings::default());
        out.write_text(TEXT);
        out.write_samples_per_trace(ns).unwrap();
        out.write_number_of_traces(nt).unwrap();
        out.write_sample_interval(SAMPLE_INTERVAL);
        out.write_metadata(0, nt, &tm, 0).unwrap();
        out.write_data(0, nt, &data).unwrap();
        out.sync().unwrap();
    }

    assert_eq!(
        std::fs::read(&source_path).unwrap(),
        std::fs::read(&copied_path).unwrap()
    );
}

#[test]
fn empty_write_forms_participate_without_effect() {
    let dir = tempfile::tempdir().expect("Couldn't get tempfile.");
    let reference_path = dir.path().join("reference.sgy");
    let path = dir.path().join("empty-writes.sgy");

    let (nt, ns) = (4, 2);
    write_survey(&reference_path, nt, ns, SegySettings::default());

    {
        let mut out = output_file(&path, SegySettings::default());
        out.write_text(TEXT);
        out.write_samples_per_trace(ns).unwrap();
        out.write_number_of_traces(nt).unwrap();
        out.write_sample_interval(SAMPLE_INTERVAL);

        let tm = survey_metadata(nt);
        let data = survey_data(nt, ns);
        out.write(0, nt, &data, &tm, 0).unwrap();

        // The zero-trace participation forms leave the file untouched.
        out.write_metadata_empty().unwrap();
        out.write_data_empty().unwrap();
        out.write_empty().unwrap();
        out.write_metadata_non_contiguous_empty().unwrap();
        out.write_data_non_contiguous_empty().unwrap();
        out.write_non_contiguous_empty().unwrap();
        out.write_non_monotonic_empty().unwrap();
        out.sync().unwrap();
    }

    assert_eq!(
        std::fs::read(&path).unwrap(),
        std::fs::read(&reference_path).unwrap()
    );
}
