// Copyright (C) 2023 by GiGa infosystems
//! This is a library for collective, trace-oriented writing of SEG-Y files
//! from rust. It mirrors `para-segy-in`: every rank of a process group holds
//! a handle to the same file through a [`para_segy_core::IoDriver`] and the
//! write operations are collective, so ranks can emit disjoint slices of a
//! survey in lock-step.
//!
//! The library was designed to follow the SEG Technial Standards Committee's
//! SEG-Y_r2.0 standard (from January 2017), restricted to the IBM and IEEE
//! single precision sample formats.
//!
//! Writes from different ranks to overlapping byte ranges are undefined;
//! callers distribute traces disjointly. Ranks with no traces to contribute
//! to a collective write must still participate through the `*_empty`
//! methods.
extern crate num;
extern crate para_segy_core;
#[cfg(test)]
extern crate para_segy_in;
#[cfg(test)]
extern crate tempfile;

#[cfg(test)]
mod integration_tests;
pub mod write_data;
pub mod write_headers;

pub use para_segy_core::enums;
pub use para_segy_core::errors::*;
pub use para_segy_core::header_structs::*;
pub use para_segy_core::{Rule, SegySettings, TraceField, TraceMetadata};

use log::debug;
use num::ToPrimitive;
use para_segy_core::io_driver::IoDriver;
use para_segy_core::segy;
use para_segy_core::{FILE_HEADER_LEN, TRACE_HEADER_LEN};

use crate::write_data::encode_samples_into;
use crate::write_headers::file_header_bytes;

/// A handle for writing one SEG-Y file collectively.
///
/// The file geometry (`write_samples_per_trace`, `write_number_of_traces`)
/// must be set before trace payloads are written; setting it resizes the
/// backing object. The file header is flushed lazily: on the first trace
/// write after a header field changed, and on [`OutputFileSegy::sync`].
pub struct OutputFileSegy {
    io: Box<dyn IoDriver>,
    text: String,
    samples_per_trace: usize,
    number_of_traces: usize,
    sample_interval: f64,
    settings: SegySettings,
    file_header_dirty: bool,
}

impl OutputFileSegy {
    /// Wrap an IO driver for writing. Collective; grows the backing object
    /// to hold at least the 3600-byte file header.
    pub fn new(mut io: Box<dyn IoDriver>, settings: SegySettings) -> Result<Self, PsgError> {
        if io.file_size()? < FILE_HEADER_LEN as u64 {
            io.set_file_size(FILE_HEADER_LEN as u64)?;
        }
        Ok(OutputFileSegy {
            io,
            text: String::new(),
            samples_per_trace: 0,
            number_of_traces: 0,
            sample_interval: 0.0,
            settings,
            file_header_dirty: true,
        })
    }

    /// The name of the backing object.
    pub fn file_name(&self) -> &str {
        self.io.file_name()
    }

    pub fn get_settings(&self) -> &SegySettings {
        &self.settings
    }

    /// Set the text header content (ASCII; encoded per the settings when
    /// flushed).
    pub fn write_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.file_header_dirty = true;
    }

    /// Set the number of samples per trace and resize the backing object to
    /// match. Collective.
    pub fn write_samples_per_trace(&mut self, samples_per_trace: usize) -> Result<(), PsgError> {
        self.samples_per_trace = samples_per_trace;
        self.file_header_dirty = true;
        self.resize_backing()
    }

    /// Set the number of traces and resize the backing object to match.
    /// Collective.
    pub fn write_number_of_traces(&mut self, number_of_traces: usize) -> Result<(), PsgError> {
        self.number_of_traces = number_of_traces;
        self.resize_backing()
    }

    /// Set the sample interval, in the unit selected by the settings factor
    /// (seconds by default).
    pub fn write_sample_interval(&mut self, sample_interval: f64) {
        self.sample_interval = sample_interval;
        self.file_header_dirty = true;
    }

    pub fn read_samples_per_trace(&self) -> usize {
        self.samples_per_trace
    }

    pub fn read_number_of_traces(&self) -> usize {
        self.number_of_traces
    }

    fn resize_backing(&mut self) -> Result<(), PsgError> {
        let size = segy::trace_location(self.number_of_traces as u64, self.samples_per_trace);
        debug!("sizing '{}' for {} traces of {} samples", self.io.file_name(), self.number_of_traces, self.samples_per_trace);
        self.io.set_file_size(size)
    }

    /// Write the 3600-byte file header if any of its fields changed.
    /// Collective: rank 0 writes the bytes, the other ranks participate with
    /// a zero-length transfer.
    fn flush_file_header(&mut self) -> Result<(), PsgError> {
        if !self.file_header_dirty {
            return Ok(());
        }

        let raw_interval = (self.sample_interval / self.settings.get_sample_interval_factor())
            .round()
            .to_i16()
            .ok_or_else(|| PsgError::BitConversionError {
                msg: format!(
                    "sample interval {} does not fit the i16 header field",
                    self.sample_interval
                ),
            })?;

        if self.io.communicator().rank() == 0 {
            let header = file_header_bytes(
                &self.text,
                &self.settings,
                self.samples_per_trace,
                raw_interval,
            )?;
            self.io.write(0, &header)?;
        } else {
            self.io.write(0, &[])?;
        }
        self.file_header_dirty = false;
        Ok(())
    }

    /// Flush the file header if needed and make all writes visible to all
    /// ranks. Collective.
    pub fn sync(&mut self) -> Result<(), PsgError> {
        self.flush_file_header()?;
        self.io.sync()
    }

    /// Write the metadata of `number_of_traces` traces starting at trace
    /// `trace_offset`, taking rows `[skip, skip + n)` of the container.
    /// Collective.
    pub fn write_metadata(
        &mut self,
        trace_offset: u64,
        number_of_traces: usize,
        trace_metadata: &TraceMetadata,
        skip: usize,
    ) -> Result<(), PsgError> {
        self.flush_file_header()?;

        let ns = self.samples_per_trace;
        let rule = trace_metadata.rules();
        let extent = rule.extent();
        let start = rule.start();

        let mut buffer = vec![0u8; number_of_traces * extent];
        segy::insert_trace_metadata(number_of_traces, trace_metadata, &mut buffer, 0, skip)?;

        self.io.write_strided(
            segy::trace_location(trace_offset, ns) + start as u64,
            extent,
            segy::trace_size(ns),
            number_of_traces,
            &buffer,
        )
    }

    /// The zero-trace form of [`OutputFileSegy::write_metadata`] for ranks
    /// with nothing to write. Still collective; never optimise the call away.
    pub fn write_metadata_empty(&mut self) -> Result<(), PsgError> {
        self.flush_file_header()?;
        self.io
            .write_strided(FILE_HEADER_LEN as u64, 0, TRACE_HEADER_LEN, 0, &[])
    }

    /// Write the samples of `number_of_traces` traces starting at trace
    /// `trace_offset` (row-major, `ns` samples per trace). Collective.
    pub fn write_data(
        &mut self,
        trace_offset: u64,
        number_of_traces: usize,
        trace_data: &[f32],
    ) -> Result<(), PsgError> {
        self.flush_file_header()?;

        let ns = self.samples_per_trace;
        let data_size = segy::trace_data_size(ns);

        let mut buffer = vec![0u8; number_of_traces * data_size];
        encode_samples_into(
            &trace_data[..number_of_traces * ns],
            self.settings.get_number_format(),
            &mut buffer,
        )?;

        self.io.write_strided(
            segy::trace_data_location(trace_offset, ns),
            data_size,
            segy::trace_size(ns),
            number_of_traces,
            &buffer,
        )
    }

    /// The zero-trace form of [`OutputFileSegy::write_data`].
    pub fn write_data_empty(&mut self) -> Result<(), PsgError> {
        self.flush_file_header()?;
        self.io
            .write_strided(FILE_HEADER_LEN as u64, 0, TRACE_HEADER_LEN, 0, &[])
    }

    /// Write metadata and samples of a contiguous range of traces in one
    /// pass. Collective.
    pub fn write(
        &mut self,
        trace_offset: u64,
        number_of_traces: usize,
        trace_data: &[f32],
        trace_metadata: &TraceMetadata,
        skip: usize,
    ) -> Result<(), PsgError> {
        self.flush_file_header()?;

        let buffer =
            self.assemble_whole_traces(number_of_traces, trace_data, trace_metadata, skip)?;
        self.io.write(
            segy::trace_location(trace_offset, self.samples_per_trace),
            &buffer,
        )
    }

    /// The zero-trace form of [`OutputFileSegy::write`].
    pub fn write_empty(&mut self) -> Result<(), PsgError> {
        self.flush_file_header()?;
        self.io.write(FILE_HEADER_LEN as u64, &[])
    }

    /// Write the metadata of the traces at the given monotonic trace
    /// offsets. Collective.
    pub fn write_metadata_non_contiguous(
        &mut self,
        trace_offsets: &[u64],
        trace_metadata: &TraceMetadata,
        skip: usize,
    ) -> Result<(), PsgError> {
        self.flush_file_header()?;

        let ns = self.samples_per_trace;
        let rule = trace_metadata.rules();
        let extent = rule.extent();
        let start = rule.start() as u64;

        let mut buffer = vec![0u8; trace_offsets.len() * extent];
        segy::insert_trace_metadata(trace_offsets.len(), trace_metadata, &mut buffer, 0, skip)?;

        let byte_offsets = trace_offsets
            .iter()
            .map(|&t| segy::trace_location(t, ns) + start)
            .collect::<Vec<u64>>();
        self.io.write_offsets(extent, &byte_offsets, &buffer)
    }

    /// The zero-trace form of
    /// [`OutputFileSegy::write_metadata_non_contiguous`].
    pub fn write_metadata_non_contiguous_empty(&mut self) -> Result<(), PsgError> {
        self.flush_file_header()?;
        self.io.write_offsets(0, &[], &[])
    }

    /// Write the samples of the traces at the given monotonic trace offsets.
    /// Collective.
    pub fn write_data_non_contiguous(
        &mut self,
        trace_offsets: &[u64],
        trace_data: &[f32],
    ) -> Result<(), PsgError> {
        self.flush_file_header()?;

        let ns = self.samples_per_trace;
        let data_size = segy::trace_data_size(ns);

        let mut buffer = vec![0u8; trace_offsets.len() * data_size];
        encode_samples_into(
            &trace_data[..trace_offsets.len() * ns],
            self.settings.get_number_format(),
            &mut buffer,
        )?;

        let byte_offsets = trace_offsets
            .iter()
            .map(|&t| segy::trace_data_location(t, ns))
            .collect::<Vec<u64>>();
        self.io.write_offsets(data_size, &byte_offsets, &buffer)
    }

    /// The zero-trace form of [`OutputFileSegy::write_data_non_contiguous`].
    pub fn write_data_non_contiguous_empty(&mut self) -> Result<(), PsgError> {
        self.flush_file_header()?;
        self.io.write_offsets(0, &[], &[])
    }

    /// Write metadata and samples of the traces at the given monotonic trace
    /// offsets in one pass. Collective.
    pub fn write_non_contiguous(
        &mut self,
        trace_offsets: &[u64],
        trace_data: &[f32],
        trace_metadata: &TraceMetadata,
        skip: usize,
    ) -> Result<(), PsgError> {
        self.flush_file_header()?;

        let ns = self.samples_per_trace;
        let buffer =
            self.assemble_whole_traces(trace_offsets.len(), trace_data, trace_metadata, skip)?;

        let byte_offsets = trace_offsets
            .iter()
            .map(|&t| segy::trace_location(t, ns))
            .collect::<Vec<u64>>();
        self.io
            .write_offsets(segy::trace_size(ns), &byte_offsets, &buffer)
    }

    /// The zero-trace form of [`OutputFileSegy::write_non_contiguous`].
    pub fn write_non_contiguous_empty(&mut self) -> Result<(), PsgError> {
        self.flush_file_header()?;
        self.io.write_offsets(0, &[], &[])
    }

    /// Write metadata and samples of the traces at arbitrary (possibly
    /// unsorted) trace offsets; row i of the inputs goes to trace
    /// `trace_offsets[i]`. Collective.
    ///
    /// The transfer itself is issued in ascending file order.
    pub fn write_non_monotonic(
        &mut self,
        trace_offsets: &[u64],
        trace_data: &[f32],
        trace_metadata: &TraceMetadata,
        skip: usize,
    ) -> Result<(), PsgError> {
        self.flush_file_header()?;

        let ns = self.samples_per_trace;
        let trace_size = segy::trace_size(ns);
        let n = trace_offsets.len();

        let buffer = self.assemble_whole_traces(n, trace_data, trace_metadata, skip)?;

        let mut order = (0..n).collect::<Vec<usize>>();
        order.sort_by_key(|&i| trace_offsets[i]);

        let mut sorted_buffer = vec![0u8; n * trace_size];
        let mut sorted_byte_offsets = Vec::with_capacity(n);
        for (sorted_i, &request_i) in order.iter().enumerate() {
            sorted_buffer[sorted_i * trace_size..][..trace_size]
                .copy_from_slice(&buffer[request_i * trace_size..][..trace_size]);
            sorted_byte_offsets.push(segy::trace_location(trace_offsets[request_i], ns));
        }

        self.io
            .write_offsets(trace_size, &sorted_byte_offsets, &sorted_buffer)
    }

    /// The zero-trace form of [`OutputFileSegy::write_non_monotonic`].
    pub fn write_non_monotonic_empty(&mut self) -> Result<(), PsgError> {
        self.flush_file_header()?;
        self.io.write_offsets(0, &[], &[])
    }

    /// Assemble whole traces (header and samples) into a staging buffer.
    /// Header bytes not covered by the container's rules are zero.
    fn assemble_whole_traces(
        &self,
        number_of_traces: usize,
        trace_data: &[f32],
        trace_metadata: &TraceMetadata,
        skip: usize,
    ) -> Result<Vec<u8>, PsgError> {
        let ns = self.samples_per_trace;
        let trace_size = segy::trace_size(ns);
        let data_size = segy::trace_data_size(ns);

        let mut buffer = vec![0u8; number_of_traces * trace_size];
        if number_of_traces == 0 {
            return Ok(buffer);
        }

        let rule = trace_metadata.rules();
        let extent = rule.extent();
        let start = rule.start();
        segy::insert_trace_metadata(
            number_of_traces,
            trace_metadata,
            &mut buffer[start..],
            trace_size - extent,
            skip,
        )?;

        let format = self.settings.get_number_format();
        for i in 0..number_of_traces {
            let samples = &trace_data[i * ns..(i + 1) * ns];
            encode_samples_into(
                samples,
                format,
                &mut buffer[i * trace_size + TRACE_HEADER_LEN..][..data_size],
            )?;
        }
        Ok(buffer)
    }
}
