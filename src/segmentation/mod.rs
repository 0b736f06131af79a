/*!
 * Chapter segmentation.
 *
 * - `patterns`: the data-driven heading recognizer table
 * - `segmenter`: boundary detection, span extraction and size-based fallbacks
 */

pub use self::patterns::{BoundaryPattern, default_patterns};
pub use self::segmenter::{Boundary, RawSpan, Segmenter, split_fixed, split_into_parts};

pub mod patterns;
pub mod segmenter;
