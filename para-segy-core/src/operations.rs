//! Collective reductions over trace metadata.
//!
//! These helpers answer survey-wide questions ("where are the extremes of
//! the source coordinates?") without any rank holding more than its own
//! slice of the metadata.
use crate::communicator::Communicator;
use crate::errors::PsgError;
use crate::keys::TraceField;
use crate::metadata::TraceMetadata;

/// An extremal metadata value together with the global number of the trace
/// holding it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordElem {
    pub value: f64,
    pub trace_number: u64,
}

fn local_min_max(
    trace_offset: u64,
    metadata: &TraceMetadata,
    field: TraceField,
) -> Result<[CoordElem; 2], PsgError> {
    let mut min = CoordElem {
        value: f64::INFINITY,
        trace_number: u64::MAX,
    };
    let mut max = CoordElem {
        value: f64::NEG_INFINITY,
        trace_number: u64::MAX,
    };

    for i in 0..metadata.size() {
        let value = metadata.get_floating_point(i, field)?;
        if value < min.value {
            min = CoordElem {
                value,
                trace_number: trace_offset + i as u64,
            };
        }
        if value > max.value {
            max = CoordElem {
                value,
                trace_number: trace_offset + i as u64,
            };
        }
    }
    Ok([min, max])
}

fn pick<F>(values: &[f64], numbers: &[u64], better: F) -> CoordElem
where
    F: Fn(f64, f64) -> bool,
{
    let mut best = CoordElem {
        value: values[0],
        trace_number: numbers[0],
    };
    for (&value, &trace_number) in values.iter().zip(numbers.iter()).skip(1) {
        // Ranks without traces contribute placeholders with no trace number.
        if trace_number == u64::MAX {
            continue;
        }
        if best.trace_number == u64::MAX || better(value, best.value) {
            best = CoordElem {
                value,
                trace_number,
            };
        }
    }
    best
}

/// Find, collectively, the extremes of two metadata fields over all ranks'
/// containers. `trace_offset` is the global index of the calling rank's
/// first trace. Returns `[x_min, x_max, y_min, y_max]`, or `None` when no
/// rank holds any traces.
pub fn find_min_max(
    communicator: &dyn Communicator,
    trace_offset: u64,
    metadata: &TraceMetadata,
    field_x: TraceField,
    field_y: TraceField,
) -> Result<Option<[CoordElem; 4]>, PsgError> {
    let x = local_min_max(trace_offset, metadata, field_x)?;
    let y = local_min_max(trace_offset, metadata, field_y)?;

    let candidates = [x[0], x[1], y[0], y[1]];
    let values = communicator.gather_f64(&candidates.map(|c| c.value))?;
    let numbers = communicator.gather_u64(&candidates.map(|c| c.trace_number))?;

    // The gathers interleave four candidates per rank.
    let stride = 4;
    let select = |slot: usize, better: fn(f64, f64) -> bool| {
        let values = values
            .iter()
            .skip(slot)
            .step_by(stride)
            .copied()
            .collect::<Vec<f64>>();
        let numbers = numbers
            .iter()
            .skip(slot)
            .step_by(stride)
            .copied()
            .collect::<Vec<u64>>();
        pick(&values, &numbers, better)
    };

    let x_min = select(0, |a, b| a < b);
    let x_max = select(1, |a, b| a > b);
    let y_min = select(2, |a, b| a < b);
    let y_max = select(3, |a, b| a > b);

    if x_min.trace_number == u64::MAX {
        return Ok(None);
    }
    Ok(Some([x_min, x_max, y_min, y_max]))
}
