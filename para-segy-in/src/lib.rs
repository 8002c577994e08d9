//! This is a library for collective, trace-oriented reading of SEG-Y files
//! into rust. It is designed for distributed-memory use: every rank of a
//! process group opens the same file through a [`para_segy_core::IoDriver`]
//! and the read operations are collective over the group, so ranks can pull
//! disjoint slices of a survey in lock-step without holding the file in
//! memory.
//!
//! The library was designed to follow the SEG Technial Standards Committee's
//! SEG-Y_r2.0 standard (from January 2017), restricted to the IBM and IEEE
//! single precision sample formats.
//!
//! Ranks that have no traces to contribute to a collective read must still
//! participate; the `*_empty` methods are the zero-trace forms of each read
//! and must not be skipped, or the group deadlocks.
extern crate para_segy_core;

pub mod read_data;

pub use para_segy_core::enums;
pub use para_segy_core::errors::*;
pub use para_segy_core::header_structs::*;
pub use para_segy_core::{Rule, SegySettings, TraceField, TraceMetadata};

use log::debug;
use para_segy_core::enums::{EntryType, SegyNumberFormat};
use para_segy_core::io_driver::IoDriver;
use para_segy_core::keys::TraceField as Field;
use para_segy_core::parser::make_segy_parser;
use para_segy_core::segy;
use para_segy_core::{FILE_HEADER_LEN, TEXT_HEADER_LEN, TRACE_HEADER_LEN};

use std::collections::HashMap;

use crate::read_data::decode_samples_into;

/// A handle for reading one SEG-Y file collectively.
///
/// Construction parses the file headers once; afterwards the trace-oriented
/// reads move metadata into caller-owned [`TraceMetadata`] containers and
/// samples into caller-owned `f32` slices.
pub struct InputFileSegy {
    io: Box<dyn IoDriver>,
    text: String,
    samples_per_trace: usize,
    number_of_traces: usize,
    sample_interval: f64,
    number_format: SegyNumberFormat,
    settings: SegySettings,
}

impl std::fmt::Debug for InputFileSegy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputFileSegy")
            .field("io", &self.io.file_name())
            .field("text", &self.text)
            .field("samples_per_trace", &self.samples_per_trace)
            .field("number_of_traces", &self.number_of_traces)
            .field("sample_interval", &self.sample_interval)
            .field("number_format", &self.number_format)
            .field("settings", &self.settings)
            .finish()
    }
}

impl InputFileSegy {
    /// Open a SEG-Y file over an IO driver and parse its file headers.
    /// Collective: every rank of the driver's communicator must call.
    pub fn open(io: Box<dyn IoDriver>, settings: SegySettings) -> Result<Self, PsgError> {
        let file_size = io.file_size()?;
        if file_size < FILE_HEADER_LEN as u64 {
            return Err(PsgError::CorruptFile {
                msg: format!(
                    "'{}' is {} bytes, shorter than the {}-byte file header",
                    io.file_name(),
                    file_size,
                    FILE_HEADER_LEN
                ),
            });
        }

        let mut header = vec![0u8; FILE_HEADER_LEN];
        io.read(0, &mut header)?;

        let text = decode_text_header(&header[..TEXT_HEADER_LEN])?;
        let bin_header = BinHeader::from_bytes(&header[TEXT_HEADER_LEN..])?;

        let samples_per_trace = bin_header.samples_per_trace.max(0) as usize;
        let number_of_traces = segy::number_of_traces(file_size, samples_per_trace)? as usize;
        let sample_interval =
            bin_header.sample_interval as f64 * settings.get_sample_interval_factor();

        debug!(
            "opened '{}': {} traces of {} samples ({})",
            io.file_name(),
            number_of_traces,
            samples_per_trace,
            bin_header.number_format
        );

        Ok(InputFileSegy {
            io,
            text,
            samples_per_trace,
            number_of_traces,
            sample_interval,
            number_format: bin_header.number_format,
            settings,
        })
    }

    /// The name of the backing object.
    pub fn file_name(&self) -> &str {
        self.io.file_name()
    }

    /// The decoded (always ASCII) text header.
    pub fn read_text(&self) -> &str {
        &self.text
    }

    /// The text header as its 40 lines of 80 columns.
    pub fn text_header_lines(&self) -> Vec<String> {
        text_header_lines(&self.text)
    }

    /// The number of samples per trace.
    pub fn read_samples_per_trace(&self) -> usize {
        self.samples_per_trace
    }

    /// The number of traces in the file.
    pub fn read_number_of_traces(&self) -> usize {
        self.number_of_traces
    }

    /// The sample interval, scaled by the configured factor (seconds by
    /// default).
    pub fn read_sample_interval(&self) -> f64 {
        self.sample_interval
    }

    /// The sample number format of the file.
    pub fn number_format(&self) -> SegyNumberFormat {
        self.number_format
    }

    /// The settings this file was opened with.
    pub fn get_settings(&self) -> &SegySettings {
        &self.settings
    }

    /// Every metadata key this file can parse, with the native type and
    /// count its parser produces.
    pub fn trace_metadata_available(&self) -> HashMap<Field, (EntryType, usize)> {
        Field::all()
            .iter()
            .filter_map(|&field| make_segy_parser(field).map(|p| (field, p.parsed_type())))
            .collect()
    }

    fn fill_index_entries(
        &self,
        trace_metadata: &mut TraceMetadata,
        global_numbers: &[u64],
        skip: usize,
    ) -> Result<(), PsgError> {
        let has_gtn = trace_metadata.entry_types().contains_key(&Field::Gtn);
        let has_ltn = trace_metadata.entry_types().contains_key(&Field::Ltn);
        for (i, &gtn) in global_numbers.iter().enumerate() {
            if has_gtn {
                trace_metadata.set_index(skip + i, Field::Gtn, gtn)?;
            }
            if has_ltn {
                trace_metadata.set_index(skip + i, Field::Ltn, (skip + i) as u64)?;
            }
        }
        Ok(())
    }

    /// Read the metadata of `number_of_traces` traces starting at trace
    /// `trace_offset` into rows `[skip, skip + n)` of the container.
    /// Collective.
    pub fn read_metadata(
        &self,
        trace_offset: u64,
        number_of_traces: usize,
        trace_metadata: &mut TraceMetadata,
        skip: usize,
    ) -> Result<(), PsgError> {
        let ns = self.samples_per_trace;
        let rule = trace_metadata.rules();
        let extent = rule.extent();
        let start = rule.start();

        let mut buffer = vec![0u8; number_of_traces * extent];
        self.io.read_strided(
            segy::trace_location(trace_offset, ns) + start as u64,
            extent,
            segy::trace_size(ns),
            number_of_traces,
            &mut buffer,
        )?;

        segy::extract_trace_metadata(number_of_traces, &buffer, trace_metadata, 0, skip)?;

        let global_numbers = (0..number_of_traces as u64)
            .map(|i| trace_offset + i)
            .collect::<Vec<u64>>();
        self.fill_index_entries(trace_metadata, &global_numbers, skip)
    }

    /// The zero-trace form of [`InputFileSegy::read_metadata`] for ranks with
    /// nothing to read. Still collective; never optimise the call away.
    pub fn read_metadata_empty(&self) -> Result<(), PsgError> {
        self.io
            .read_strided(FILE_HEADER_LEN as u64, 0, TRACE_HEADER_LEN, 0, &mut [])
    }

    /// Read the samples of `number_of_traces` traces starting at trace
    /// `trace_offset` into `trace_data` (row-major, `ns` samples per trace).
    /// Collective.
    pub fn read_data(
        &self,
        trace_offset: u64,
        number_of_traces: usize,
        trace_data: &mut [f32],
    ) -> Result<(), PsgError> {
        let ns = self.samples_per_trace;
        let data_size = segy::trace_data_size(ns);

        let mut buffer = vec![0u8; number_of_traces * data_size];
        self.io.read_strided(
            segy::trace_data_location(trace_offset, ns),
            data_size,
            segy::trace_size(ns),
            number_of_traces,
            &mut buffer,
        )?;

        decode_samples_into(
            &buffer,
            self.number_format,
            &mut trace_data[..number_of_traces * ns],
        )
    }

    /// The zero-trace form of [`InputFileSegy::read_data`].
    pub fn read_data_empty(&self) -> Result<(), PsgError> {
        self.io
            .read_strided(FILE_HEADER_LEN as u64, 0, TRACE_HEADER_LEN, 0, &mut [])
    }

    /// Read the metadata and samples of a contiguous range of traces in one
    /// pass. Collective.
    pub fn read(
        &self,
        trace_offset: u64,
        number_of_traces: usize,
        trace_data: &mut [f32],
        trace_metadata: &mut TraceMetadata,
        skip: usize,
    ) -> Result<(), PsgError> {
        let ns = self.samples_per_trace;
        let trace_size = segy::trace_size(ns);

        let mut buffer = vec![0u8; number_of_traces * trace_size];
        self.io
            .read(segy::trace_location(trace_offset, ns), &mut buffer)?;

        self.split_whole_traces(
            &buffer,
            number_of_traces,
            trace_data,
            trace_metadata,
            skip,
        )?;

        let global_numbers = (0..number_of_traces as u64)
            .map(|i| trace_offset + i)
            .collect::<Vec<u64>>();
        self.fill_index_entries(trace_metadata, &global_numbers, skip)
    }

    /// The zero-trace form of [`InputFileSegy::read`].
    pub fn read_empty(&self) -> Result<(), PsgError> {
        self.io.read(FILE_HEADER_LEN as u64, &mut [])
    }

    /// Read the metadata of the traces at the given monotonic trace offsets.
    /// Collective.
    pub fn read_metadata_non_contiguous(
        &self,
        trace_offsets: &[u64],
        trace_metadata: &mut TraceMetadata,
        skip: usize,
    ) -> Result<(), PsgError> {
        let ns = self.samples_per_trace;
        let rule = trace_metadata.rules();
        let extent = rule.extent();
        let start = rule.start() as u64;

        let byte_offsets = trace_offsets
            .iter()
            .map(|&t| segy::trace_location(t, ns) + start)
            .collect::<Vec<u64>>();

        let mut buffer = vec![0u8; trace_offsets.len() * extent];
        self.io.read_offsets(extent, &byte_offsets, &mut buffer)?;

        segy::extract_trace_metadata(trace_offsets.len(), &buffer, trace_metadata, 0, skip)?;
        self.fill_index_entries(trace_metadata, trace_offsets, skip)
    }

    /// The zero-trace form of [`InputFileSegy::read_metadata_non_contiguous`].
    pub fn read_metadata_non_contiguous_empty(&self) -> Result<(), PsgError> {
        self.io.read_offsets(0, &[], &mut [])
    }

    /// Read the samples of the traces at the given monotonic trace offsets.
    /// Collective.
    pub fn read_data_non_contiguous(
        &self,
        trace_offsets: &[u64],
        trace_data: &mut [f32],
    ) -> Result<(), PsgError> {
        let ns = self.samples_per_trace;
        let data_size = segy::trace_data_size(ns);

        let byte_offsets = trace_offsets
            .iter()
            .map(|&t| segy::trace_data_location(t, ns))
            .collect::<Vec<u64>>();

        let mut buffer = vec![0u8; trace_offsets.len() * data_size];
        self.io.read_offsets(data_size, &byte_offsets, &mut buffer)?;

        decode_samples_into(
            &buffer,
            self.number_format,
            &mut trace_data[..trace_offsets.len() * ns],
        )
    }

    /// The zero-trace form of [`InputFileSegy::read_data_non_contiguous`].
    pub fn read_data_non_contiguous_empty(&self) -> Result<(), PsgError> {
        self.io.read_offsets(0, &[], &mut [])
    }

    /// Read metadata and samples of the traces at the given monotonic trace
    /// offsets in one pass. Collective.
    pub fn read_non_contiguous(
        &self,
        trace_offsets: &[u64],
        trace_data: &mut [f32],
        trace_metadata: &mut TraceMetadata,
        skip: usize,
    ) -> Result<(), PsgError> {
        let ns = self.samples_per_trace;
        let trace_size = segy::trace_size(ns);

        let byte_offsets = trace_offsets
            .iter()
            .map(|&t| segy::trace_location(t, ns))
            .collect::<Vec<u64>>();

        let mut buffer = vec![0u8; trace_offsets.len() * trace_size];
        self.io
            .read_offsets(trace_size, &byte_offsets, &mut buffer)?;

        self.split_whole_traces(
            &buffer,
            trace_offsets.len(),
            trace_data,
            trace_metadata,
            skip,
        )?;
        self.fill_index_entries(trace_metadata, trace_offsets, skip)
    }

    /// The zero-trace form of [`InputFileSegy::read_non_contiguous`].
    pub fn read_non_contiguous_empty(&self) -> Result<(), PsgError> {
        self.io.read_offsets(0, &[], &mut [])
    }

    /// Read metadata and samples of the traces at arbitrary (possibly
    /// unsorted, possibly repeating) trace offsets; results land in the
    /// order of the offset list. Collective.
    ///
    /// Internally the offsets are sorted for the transfer and the rows are
    /// permuted back afterwards.
    pub fn read_non_monotonic(
        &self,
        trace_offsets: &[u64],
        trace_data: &mut [f32],
        trace_metadata: &mut TraceMetadata,
        skip: usize,
    ) -> Result<(), PsgError> {
        let ns = self.samples_per_trace;
        let trace_size = segy::trace_size(ns);
        let n = trace_offsets.len();

        let mut order = (0..n).collect::<Vec<usize>>();
        order.sort_by_key(|&i| trace_offsets[i]);
        let sorted_byte_offsets = order
            .iter()
            .map(|&i| segy::trace_location(trace_offsets[i], ns))
            .collect::<Vec<u64>>();

        let mut sorted_buffer = vec![0u8; n * trace_size];
        self.io
            .read_offsets(trace_size, &sorted_byte_offsets, &mut sorted_buffer)?;

        // Apply the inverse permutation so row i of the buffer belongs to
        // trace_offsets[i] again.
        let mut buffer = vec![0u8; n * trace_size];
        for (sorted_i, &request_i) in order.iter().enumerate() {
            buffer[request_i * trace_size..][..trace_size]
                .copy_from_slice(&sorted_buffer[sorted_i * trace_size..][..trace_size]);
        }

        self.split_whole_traces(&buffer, n, trace_data, trace_metadata, skip)?;
        self.fill_index_entries(trace_metadata, trace_offsets, skip)
    }

    /// The zero-trace form of [`InputFileSegy::read_non_monotonic`].
    pub fn read_non_monotonic_empty(&self) -> Result<(), PsgError> {
        self.io.read_offsets(0, &[], &mut [])
    }

    /// Split a buffer of whole traces into the metadata container and the
    /// sample slice.
    fn split_whole_traces(
        &self,
        buffer: &[u8],
        number_of_traces: usize,
        trace_data: &mut [f32],
        trace_metadata: &mut TraceMetadata,
        skip: usize,
    ) -> Result<(), PsgError> {
        if number_of_traces == 0 {
            return Ok(());
        }

        let ns = self.samples_per_trace;
        let trace_size = segy::trace_size(ns);
        let data_size = segy::trace_data_size(ns);

        let rule = trace_metadata.rules();
        let extent = rule.extent();
        let start = rule.start();
        segy::extract_trace_metadata(
            number_of_traces,
            &buffer[start..],
            trace_metadata,
            trace_size - extent,
            skip,
        )?;

        for i in 0..number_of_traces {
            let samples = &buffer[i * trace_size + TRACE_HEADER_LEN..][..data_size];
            decode_samples_into(
                samples,
                self.number_format,
                &mut trace_data[i * ns..(i + 1) * ns],
            )?;
        }
        Ok(())
    }
}
