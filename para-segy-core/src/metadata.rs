//! The columnar, type-tagged container for trace metadata.
//!
//! The container decouples the in-memory representation from the on-disk
//! layout: for each active field key there is one typed column of length
//! `num_traces`, and the rule set the container was built from records how
//! those columns map to header bytes. Lookups with a key the container does
//! not hold, or with the wrong native type, fail with
//! [`PsgError::EntryNotFound`] rather than casting silently.
use crate::enums::{EntryType, FieldKind};
use crate::errors::PsgError;
use crate::keys::TraceField;
use crate::rules::Rule;
use crate::TRACE_HEADER_LEN;

use fnv::FnvHashMap;

/// Columnar storage for the metadata of `num_traces` traces.
///
/// The container is owned by the caller of the file read/write operations
/// and lives independently of any file.
#[derive(Debug, Clone)]
pub struct TraceMetadata {
    /// Floating point entries.
    floating_point_entries: FnvHashMap<TraceField, Vec<f64>>,
    /// Integer entries. On-disk i16/i32 widen into these i64 columns.
    integer_entries: FnvHashMap<TraceField, Vec<i64>>,
    /// Trace number bookkeeping entries.
    index_entries: FnvHashMap<TraceField, Vec<u64>>,
    /// Raw header copies, one 240-byte block per trace, allocated only when
    /// the rule set carries a copy entry.
    raw_metadata: Vec<u8>,
    /// The rules describing the indexing of the columns.
    rules: Rule,
    /// The number of sets of trace parameters.
    num_traces: usize,
    /// The kind of each active entry.
    entry_types: FnvHashMap<TraceField, FieldKind>,
}

impl TraceMetadata {
    /// Allocate the columns required by `rules` for `num_traces` traces.
    pub fn new(rules: Rule, num_traces: usize) -> Self {
        let mut metadata = TraceMetadata {
            floating_point_entries: FnvHashMap::default(),
            integer_entries: FnvHashMap::default(),
            index_entries: FnvHashMap::default(),
            raw_metadata: Vec::new(),
            num_traces,
            entry_types: FnvHashMap::default(),
            rules: rules.clone(),
        };

        for (&field, parser) in rules.iter() {
            let kind = parser.kind();
            metadata.entry_types.insert(field, kind);
            match kind {
                FieldKind::Float => {
                    metadata
                        .floating_point_entries
                        .insert(field, vec![0.0; num_traces]);
                }
                FieldKind::Long | FieldKind::Short => {
                    metadata.integer_entries.insert(field, vec![0; num_traces]);
                }
                FieldKind::Index => {
                    metadata.index_entries.insert(field, vec![0; num_traces]);
                }
                FieldKind::Copy => {
                    metadata.raw_metadata = vec![0; num_traces * TRACE_HEADER_LEN];
                }
            }
        }
        metadata
    }

    /// The rules this container was built from.
    pub fn rules(&self) -> &Rule {
        &self.rules
    }

    /// The number of sets of trace parameters.
    pub fn size(&self) -> usize {
        self.num_traces
    }

    /// The kind of each active entry.
    pub fn entry_types(&self) -> &FnvHashMap<TraceField, FieldKind> {
        &self.entry_types
    }

    /// The count-per-trace of an entry (240 for the raw copy, 1 otherwise).
    pub fn entry_size(&self, field: TraceField) -> Result<usize, PsgError> {
        match self.entry_types.get(&field) {
            Some(FieldKind::Copy) => Ok(TRACE_HEADER_LEN),
            Some(_) => Ok(1),
            None => Err(PsgError::EntryNotFound { field }),
        }
    }

    /// The native type tag of an entry's column.
    pub fn entry_type(&self, field: TraceField) -> Result<EntryType, PsgError> {
        self.entry_types
            .get(&field)
            .map(|kind| match kind {
                FieldKind::Float => EntryType::F64,
                FieldKind::Long | FieldKind::Short => EntryType::I64,
                FieldKind::Index => EntryType::Index,
                FieldKind::Copy => EntryType::U8,
            })
            .ok_or(PsgError::EntryNotFound { field })
    }

    /// Get a floating point metadata entry.
    ///
    /// Panics if `trace_index` is out of bounds.
    pub fn get_floating_point(
        &self,
        trace_index: usize,
        field: TraceField,
    ) -> Result<f64, PsgError> {
        self.floating_point_entries
            .get(&field)
            .map(|column| column[trace_index])
            .ok_or(PsgError::EntryNotFound { field })
    }

    /// Set a floating point metadata entry.
    pub fn set_floating_point(
        &mut self,
        trace_index: usize,
        field: TraceField,
        value: f64,
    ) -> Result<(), PsgError> {
        match self.floating_point_entries.get_mut(&field) {
            Some(column) => {
                column[trace_index] = value;
                Ok(())
            }
            None => Err(PsgError::EntryNotFound { field }),
        }
    }

    /// Get an integer metadata entry. The in-memory type is wider than any
    /// of the on-disk ones; range checking against the on-disk width happens
    /// when the value is written out.
    pub fn get_integer(&self, trace_index: usize, field: TraceField) -> Result<i64, PsgError> {
        self.integer_entries
            .get(&field)
            .map(|column| column[trace_index])
            .ok_or(PsgError::EntryNotFound { field })
    }

    /// Set an integer metadata entry.
    pub fn set_integer(
        &mut self,
        trace_index: usize,
        field: TraceField,
        value: i64,
    ) -> Result<(), PsgError> {
        match self.integer_entries.get_mut(&field) {
            Some(column) => {
                column[trace_index] = value;
                Ok(())
            }
            None => Err(PsgError::EntryNotFound { field }),
        }
    }

    /// Get a trace number bookkeeping entry.
    pub fn get_index(&self, trace_index: usize, field: TraceField) -> Result<u64, PsgError> {
        self.index_entries
            .get(&field)
            .map(|column| column[trace_index])
            .ok_or(PsgError::EntryNotFound { field })
    }

    /// Set a trace number bookkeeping entry.
    pub fn set_index(
        &mut self,
        trace_index: usize,
        field: TraceField,
        value: u64,
    ) -> Result<(), PsgError> {
        match self.index_entries.get_mut(&field) {
            Some(column) => {
                column[trace_index] = value;
                Ok(())
            }
            None => Err(PsgError::EntryNotFound { field }),
        }
    }

    /// Copy every entry present in this container from the matching entry of
    /// `source`. Keys missing from the source fail with
    /// [`PsgError::EntryNotFound`].
    pub fn copy_entries(
        &mut self,
        trace_index: usize,
        source: &TraceMetadata,
        source_trace_index: usize,
    ) -> Result<(), PsgError> {
        let fields = self.entry_types.iter().map(|(f, k)| (*f, *k)).collect::<Vec<_>>();
        for (field, kind) in fields {
            match kind {
                FieldKind::Float => {
                    let value = source.get_floating_point(source_trace_index, field)?;
                    self.set_floating_point(trace_index, field, value)?;
                }
                FieldKind::Long | FieldKind::Short => {
                    let value = source.get_integer(source_trace_index, field)?;
                    self.set_integer(trace_index, field, value)?;
                }
                FieldKind::Index => {
                    let value = source.get_index(source_trace_index, field)?;
                    self.set_index(trace_index, field, value)?;
                }
                FieldKind::Copy => {
                    let block = source.raw_metadata_row(source_trace_index)?.to_vec();
                    self.raw_metadata_row_mut(trace_index)?.copy_from_slice(&block);
                }
            }
        }
        Ok(())
    }

    /// The floating point column of a field.
    pub fn floating_point_entry_data(&self, field: TraceField) -> Result<&[f64], PsgError> {
        self.floating_point_entries
            .get(&field)
            .map(|column| column.as_slice())
            .ok_or(PsgError::EntryNotFound { field })
    }

    /// The integer column of a field.
    pub fn integer_entry_data(&self, field: TraceField) -> Result<&[i64], PsgError> {
        self.integer_entries
            .get(&field)
            .map(|column| column.as_slice())
            .ok_or(PsgError::EntryNotFound { field })
    }

    /// The index column of a field.
    pub fn index_entry_data(&self, field: TraceField) -> Result<&[u64], PsgError> {
        self.index_entries
            .get(&field)
            .map(|column| column.as_slice())
            .ok_or(PsgError::EntryNotFound { field })
    }

    /// The raw bytes of a field's column, whatever its native type. Useful
    /// for handing columns to a transport without knowing the type.
    pub fn entry_data_bytes(&self, field: TraceField) -> Result<&[u8], PsgError> {
        match self.entry_types.get(&field) {
            Some(FieldKind::Float) => Ok(bytemuck::cast_slice(
                self.floating_point_entries[&field].as_slice(),
            )),
            Some(FieldKind::Long) | Some(FieldKind::Short) => {
                Ok(bytemuck::cast_slice(self.integer_entries[&field].as_slice()))
            }
            Some(FieldKind::Index) => {
                Ok(bytemuck::cast_slice(self.index_entries[&field].as_slice()))
            }
            Some(FieldKind::Copy) => Ok(&self.raw_metadata),
            None => Err(PsgError::EntryNotFound { field }),
        }
    }

    /// The raw 240-byte header copy of one trace.
    pub fn raw_metadata_row(&self, trace_index: usize) -> Result<&[u8], PsgError> {
        if !self.rules.has_copy() {
            return Err(PsgError::EntryNotFound {
                field: TraceField::Raw,
            });
        }
        let start = trace_index * TRACE_HEADER_LEN;
        Ok(&self.raw_metadata[start..start + TRACE_HEADER_LEN])
    }

    /// The mutable counterpart of [`TraceMetadata::raw_metadata_row`].
    pub fn raw_metadata_row_mut(&mut self, trace_index: usize) -> Result<&mut [u8], PsgError> {
        if !self.rules.has_copy() {
            return Err(PsgError::EntryNotFound {
                field: TraceField::Raw,
            });
        }
        let start = trace_index * TRACE_HEADER_LEN;
        Ok(&mut self.raw_metadata[start..start + TRACE_HEADER_LEN])
    }

    /// Estimate of the total memory used, in bytes.
    pub fn memory_usage(&self) -> usize {
        self.num_traces * self.rules.memory_per_header()
    }
}
