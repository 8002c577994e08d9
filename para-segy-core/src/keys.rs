//! The stable names for every trace metadata concept the library understands,
//! and the standard byte locations those concepts occupy in a SEG-Y trace
//! header.
//!
//! [`TraceField`] is the key type of the metadata container and the rule set.
//! Nothing in the library relies on the numeric values of the variants; the
//! on-disk placement comes exclusively from [`TraceHeaderOffset`].
#[cfg(any(feature = "to_json", feature = "serde"))]
use serde::{Deserialize, Serialize};

/// A key naming one metadata concept of a trace.
///
/// `Ltn`/`Gtn` (local/global trace number) are in-memory bookkeeping only and
/// have no on-disk location. `Raw` stands for the whole 240-byte header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
#[repr(C)]
#[cfg_attr(
    any(feature = "to_json", feature = "serde"),
    derive(Serialize, Deserialize)
)]
pub enum TraceField {
    /// Raw copy of the whole trace header.
    Raw,
    /// Local trace number (in-memory only).
    Ltn,
    /// Global trace number (in-memory only).
    Gtn,
    /// Trace sequence number within the line.
    LineTraceIndex,
    /// Trace sequence number within the file.
    FileTraceIndex,
    /// Trace number within the original field record.
    OfrTraceIndex,
    /// Trace number within the ensemble.
    EnsembleTraceIndex,
    /// Number of samples in this trace.
    NumberOfSamples,
    /// Sample interval of this trace.
    SampleInterval,
    /// Trace identification code.
    TraceIdCode,
    /// Energy source point number.
    EnergySourceNumber,
    /// Shotpoint number.
    ShotpointNumber,
    /// Number of vertically summed traces.
    VStackCount,
    /// Number of horizontally stacked traces.
    HStackCount,
    /// Distance from source to receiver group.
    SourceReceiverDistance,
    /// Receiver group elevation.
    ReceiverElevation,
    /// Surface elevation at source.
    SurfaceElevationAtSource,
    /// Source depth below surface.
    SourceDepth,
    /// Water depth at source.
    WaterDepthAtSource,
    /// Water depth at receiver group.
    WaterDepthAtReceiver,
    /// Source x coordinate.
    SourceX,
    /// Source y coordinate.
    SourceY,
    /// Receiver group x coordinate.
    ReceiverX,
    /// Receiver group y coordinate.
    ReceiverY,
    /// CDP (ensemble) x coordinate.
    CdpX,
    /// CDP (ensemble) y coordinate.
    CdpY,
    /// The coordinate scalar itself.
    CoordinateScalar,
    /// Inline number.
    Inline,
    /// Crossline number.
    Crossline,
    /// Unit system of the transduction constant.
    TransductionUnit,
    /// Unit system of the trace values.
    TraceValueUnit,
}

impl TraceField {
    /// Every key, in declaration order. Used to enumerate what a file can
    /// parse and by the rule constructors.
    pub fn all() -> &'static [TraceField] {
        use self::TraceField::*;
        &[
            Raw,
            Ltn,
            Gtn,
            LineTraceIndex,
            FileTraceIndex,
            OfrTraceIndex,
            EnsembleTraceIndex,
            NumberOfSamples,
            SampleInterval,
            TraceIdCode,
            EnergySourceNumber,
            ShotpointNumber,
            VStackCount,
            HStackCount,
            SourceReceiverDistance,
            ReceiverElevation,
            SurfaceElevationAtSource,
            SourceDepth,
            WaterDepthAtSource,
            WaterDepthAtReceiver,
            SourceX,
            SourceY,
            ReceiverX,
            ReceiverY,
            CdpX,
            CdpY,
            CoordinateScalar,
            Inline,
            Crossline,
            TransductionUnit,
            TraceValueUnit,
        ]
    }
}

/// The 1-indexed byte locations of the standard SEG-Y trace header fields
/// used by this library (SEG-Y_r2.0, table 3).
///
/// The numeric values are the positions printed in the standard; subtract one
/// for a byte index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
#[repr(C)]
pub enum TraceHeaderOffset {
    LineTraceIndex = 1,
    FileTraceIndex = 5,
    FieldRecordNumber = 9,
    OfrTraceIndex = 13,
    EnergySourceNumber = 17,
    EnsembleNumber = 21,
    EnsembleTraceIndex = 25,
    TraceIdCode = 29,
    VStackCount = 31,
    HStackCount = 33,
    SourceReceiverDistance = 37,
    ReceiverElevation = 41,
    SurfaceElevationAtSource = 45,
    SourceDepth = 49,
    WaterDepthAtSource = 61,
    WaterDepthAtReceiver = 65,
    ElevationScalar = 69,
    CoordinateScalar = 71,
    SourceX = 73,
    SourceY = 77,
    ReceiverX = 81,
    ReceiverY = 85,
    NumberOfSamples = 115,
    SampleInterval = 117,
    CdpX = 181,
    CdpY = 185,
    Inline = 189,
    Crossline = 193,
    ShotpointNumber = 197,
    ShotpointScalar = 201,
    TraceValueUnit = 203,
    TransductionUnit = 211,
}

impl TraceHeaderOffset {
    /// The 1-indexed location, as printed in the standard.
    pub fn location(self) -> usize {
        self as usize
    }
}
