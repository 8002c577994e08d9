//! The declarative description of which metadata fields are stored where in
//! a SEG-Y trace header.
//!
//! A rule set maps field keys to blob parsers. It either spans the full
//! 240-byte header ("full extent"), or only the `[start, end)` sub-range its
//! entries actually touch, which is what makes sparse header reads cheap.
use crate::enums::FieldKind;
use crate::keys::{TraceField, TraceHeaderOffset};
use crate::parser::{make_segy_parser, BlobParser};
use crate::TRACE_HEADER_LEN;

use fnv::FnvHashMap;

/// The commonly-read fields, added by the `defaults` flag of [`Rule::new`].
const DEFAULT_FIELDS: &[TraceField] = &[
    TraceField::SourceX,
    TraceField::SourceY,
    TraceField::ReceiverX,
    TraceField::ReceiverY,
    TraceField::CdpX,
    TraceField::CdpY,
    TraceField::SourceReceiverDistance,
    TraceField::Inline,
    TraceField::Crossline,
    TraceField::FileTraceIndex,
];

/// A larger set useful for copy-through workflows, added by the `extras`
/// flag of [`Rule::new`].
const EXTRA_FIELDS: &[TraceField] = &[
    TraceField::LineTraceIndex,
    TraceField::OfrTraceIndex,
    TraceField::EnsembleTraceIndex,
    TraceField::EnergySourceNumber,
    TraceField::TraceIdCode,
    TraceField::VStackCount,
    TraceField::HStackCount,
    TraceField::ReceiverElevation,
    TraceField::SurfaceElevationAtSource,
    TraceField::SourceDepth,
    TraceField::NumberOfSamples,
    TraceField::SampleInterval,
    TraceField::ShotpointNumber,
    TraceField::TraceValueUnit,
    TraceField::TransductionUnit,
];

/// An ordered set of field-to-parser bindings, immutable once a file session
/// starts using it.
///
/// ```
/// # use para_segy_core::rules::Rule;
/// # use para_segy_core::keys::TraceField;
/// let mut rule = Rule::new(false, false, false);
/// rule.add(TraceField::Inline);
/// rule.add(TraceField::Crossline);
/// // Inline occupies bytes 189-192, crossline 193-196 (1-indexed).
/// assert_eq!(rule.start(), 188);
/// assert_eq!(rule.extent(), 8);
/// ```
#[derive(Debug, Clone)]
pub struct Rule {
    entries: FnvHashMap<TraceField, BlobParser>,
    full_extent: bool,
}

impl Rule {
    /// Create a rule set. The in-memory trace number entries (`Gtn`, `Ltn`)
    /// are always present; `defaults` and `extras` add the standard field
    /// lists above.
    pub fn new(full_extent: bool, defaults: bool, extras: bool) -> Self {
        Rule::with_fields(&[], full_extent, defaults, extras)
    }

    /// [`Rule::new`] with an explicit list of additional fields.
    pub fn with_fields(
        fields: &[TraceField],
        full_extent: bool,
        defaults: bool,
        extras: bool,
    ) -> Self {
        let mut rule = Rule {
            entries: FnvHashMap::default(),
            full_extent,
        };
        rule.add_index(TraceField::Gtn);
        rule.add_index(TraceField::Ltn);

        for &field in fields {
            rule.add(field);
        }
        if defaults {
            for &field in DEFAULT_FIELDS {
                rule.add(field);
            }
        }
        if extras {
            for &field in EXTRA_FIELDS {
                rule.add(field);
            }
        }
        rule
    }

    /// Add the standard SEG-Y parser for a field. Returns `false` for keys
    /// with no standard parser.
    pub fn add(&mut self, field: TraceField) -> bool {
        match field {
            TraceField::Gtn | TraceField::Ltn => {
                self.add_index(field);
                true
            }
            TraceField::Raw => {
                self.add_copy();
                true
            }
            _ => match make_segy_parser(field) {
                Some(parser) => {
                    self.entries.insert(field, parser);
                    true
                }
                None => false,
            },
        }
    }

    /// Bind a field to a big-endian i32 at an explicit location.
    pub fn add_long(&mut self, field: TraceField, offset: TraceHeaderOffset) {
        self.entries
            .insert(field, BlobParser::Long { loc: offset.location() });
    }

    /// Bind a field to a big-endian i16 at an explicit location.
    pub fn add_short(&mut self, field: TraceField, offset: TraceHeaderOffset) {
        self.entries
            .insert(field, BlobParser::Short { loc: offset.location() });
    }

    /// Bind a field to a scaled i32 at explicit value and scalar locations.
    pub fn add_segy_float(
        &mut self,
        field: TraceField,
        offset: TraceHeaderOffset,
        scalar_offset: TraceHeaderOffset,
    ) {
        self.entries.insert(
            field,
            BlobParser::ScaledLong {
                loc: offset.location(),
                scalar_loc: scalar_offset.location(),
            },
        );
    }

    /// Bind an in-memory index entry.
    pub fn add_index(&mut self, field: TraceField) {
        self.entries.insert(field, BlobParser::Index);
    }

    /// Request a verbatim copy of the whole header. At most one copy entry
    /// exists per rule set; repeated calls are no-ops.
    pub fn add_copy(&mut self) {
        self.entries.entry(TraceField::Raw).or_insert(BlobParser::RawCopy);
    }

    /// Add every entry of `other` that this rule set does not have yet.
    pub fn add_from(&mut self, other: &Rule) {
        for (&field, &parser) in other.entries.iter() {
            self.entries.entry(field).or_insert(parser);
        }
    }

    /// Remove a field binding.
    pub fn remove(&mut self, field: TraceField) {
        self.entries.remove(&field);
    }

    /// The parser bound to a field, if any.
    pub fn entry(&self, field: TraceField) -> Option<&BlobParser> {
        self.entries.get(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TraceField, &BlobParser)> {
        self.entries.iter()
    }

    pub fn is_full_extent(&self) -> bool {
        self.full_extent
    }

    pub fn has_copy(&self) -> bool {
        self.entries.contains_key(&TraceField::Raw)
    }

    /// The first header byte the rule set touches. Zero for full-extent
    /// rule sets and rule sets with no on-disk entries.
    pub fn start(&self) -> usize {
        if self.full_extent {
            return 0;
        }
        self.on_disk_ranges()
            .map(|range| range.begin)
            .min()
            .unwrap_or(0)
    }

    /// One past the last header byte the rule set touches.
    pub fn end(&self) -> usize {
        if self.full_extent {
            return TRACE_HEADER_LEN;
        }
        self.on_disk_ranges()
            .map(|range| range.end)
            .max()
            .unwrap_or(0)
    }

    /// The byte span transferred per trace header.
    pub fn extent(&self) -> usize {
        self.end() - self.start()
    }

    /// The in-memory bytes one trace of metadata occupies, for sizing a
    /// metadata container.
    pub fn memory_per_header(&self) -> usize {
        self.entries
            .values()
            .map(|parser| match parser.kind() {
                FieldKind::Float => std::mem::size_of::<f64>(),
                FieldKind::Long => std::mem::size_of::<i64>(),
                FieldKind::Short => std::mem::size_of::<i16>(),
                FieldKind::Index => std::mem::size_of::<u64>(),
                FieldKind::Copy => TRACE_HEADER_LEN,
            })
            .sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn on_disk_ranges(&self) -> impl Iterator<Item = crate::parser::ByteRange> + '_ {
        self.entries
            .values()
            .filter(|parser| parser.kind() != FieldKind::Index)
            .flat_map(|parser| parser.data_locations().to_vec())
    }
}

impl Default for Rule {
    /// The default rule set reads the commonly-used fields over the full
    /// header extent.
    fn default() -> Self {
        Rule::new(true, true, false)
    }
}
