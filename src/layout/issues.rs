//! Per-cell and per-region problems the layout pass absorbs.

use serde::Serialize;

use crate::error::MetricsError;
use crate::types::MergeRange;

/// Something the layout pass worked around instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LayoutIssue {
    /// A merged region reached past the grid and was cut back to it.
    #[serde(rename_all = "camelCase")]
    RegionClamped {
        original: MergeRange,
        clamped: MergeRange,
    },
    /// A merged region was inverted or lay entirely outside the grid.
    #[serde(rename_all = "camelCase")]
    RegionSkipped { region: MergeRange },
    /// The metrics provider failed; a worst-case width was used instead.
    #[serde(rename_all = "camelCase")]
    UnmeasurableText {
        row: u32,
        col: u32,
        #[serde(serialize_with = "serialize_display")]
        error: MetricsError,
    },
    /// A cell or span had no drawable area and was not drawn.
    #[serde(rename_all = "camelCase")]
    DegenerateSpan {
        row: u32,
        col: u32,
        width: f32,
        height: f32,
    },
}

fn serialize_display<S>(error: &MetricsError, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_str(error)
}
