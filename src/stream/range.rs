//! Range header parsing and window clamping.
//!
//! # Design Decisions
//! - Only the first range of a multi-range header is served
//! - Anything unparseable falls back to the whole resource, then clamps
//! - The window is capped so one response never exceeds `max_chunk` bytes;
//!   clients ask again for the rest

/// Inclusive byte window within a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes in the window.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Value of a `Content-Range` header for this window.
    pub fn content_range(&self, total: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, total)
    }
}

/// The requested window cannot be served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unsatisfiable;

/// A range as written by the client, before resolving against the size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestedRange {
    /// `bytes=<start>-<end?>`
    From { start: u64, end: Option<u64> },
    /// `bytes=-<n>`, the last `n` bytes.
    Suffix(u64),
}

fn parse_range_header(value: &str) -> Option<RequestedRange> {
    let value = value.trim();
    let ranges = value
        .get(..6)
        .filter(|unit| unit.eq_ignore_ascii_case("bytes="))
        .map(|_| &value[6..])?;
    let first = ranges.split(',').next()?.trim();
    let (start, end) = first.split_once('-')?;
    let (start, end) = (start.trim(), end.trim());

    if start.is_empty() {
        return end.parse().ok().map(RequestedRange::Suffix);
    }

    let start: u64 = start.parse().ok()?;
    let end = if end.is_empty() {
        None
    } else {
        let end: u64 = end.parse().ok()?;
        if end < start {
            return None;
        }
        Some(end)
    };
    Some(RequestedRange::From { start, end })
}

/// Resolve the window to serve for a `Range` header against a resource of
/// `total` bytes, capped at `max_chunk` bytes.
pub fn resolve_window(
    header: Option<&str>,
    total: u64,
    max_chunk: u64,
) -> Result<ByteRange, Unsatisfiable> {
    if total == 0 {
        return Err(Unsatisfiable);
    }
    let last = total - 1;

    let requested = header
        .and_then(parse_range_header)
        .unwrap_or(RequestedRange::From { start: 0, end: None });

    let (start, end) = match requested {
        RequestedRange::From { start, end } => (start, end.unwrap_or(last).min(last)),
        RequestedRange::Suffix(0) => return Err(Unsatisfiable),
        RequestedRange::Suffix(n) => (total.saturating_sub(n), last),
    };
    if start > last {
        return Err(Unsatisfiable);
    }

    let max_chunk = max_chunk.max(1);
    let end = if end - start + 1 > max_chunk {
        start + max_chunk - 1
    } else {
        end
    };
    Ok(ByteRange { start, end })
}
