/// Outcome of interpreting a `Range` header against a file of known size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// No usable range; serve the whole file.
    Full,
    /// Inclusive byte span.
    Partial { start: u64, end: u64 },
    /// Syntactically valid but outside the file.
    Unsatisfiable,
}

impl ByteRange {
    pub fn len(&self) -> u64 {
        match *self {
            ByteRange::Partial { start, end } => end - start + 1,
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parses a single `bytes=` range. Multi-range and malformed headers are
/// ignored, which means the caller answers with the full body.
pub fn parse_range(header: &str, size: u64) -> ByteRange {
    let Some(spec) = header.trim().strip_prefix("bytes=") else {
        return ByteRange::Full;
    };

    if spec.contains(',') {
        return ByteRange::Full;
    }

    let Some((first, last)) = spec.trim().split_once('-') else {
        return ByteRange::Full;
    };
    let (first, last) = (first.trim(), last.trim());

    if first.is_empty() {
        // Suffix form: the last N bytes.
        let Ok(suffix) = last.parse::<u64>() else {
            return ByteRange::Full;
        };
        if suffix == 0 || size == 0 {
            return ByteRange::Unsatisfiable;
        }
        return ByteRange::Partial {
            start: size.saturating_sub(suffix),
            end: size - 1,
        };
    }

    let Ok(start) = first.parse::<u64>() else {
        return ByteRange::Full;
    };

    let end = if last.is_empty() {
        None
    } else {
        match last.parse::<u64>() {
            Ok(end) if end >= start => Some(end),
            _ => return ByteRange::Full,
        }
    };

    if start >= size {
        return ByteRange::Unsatisfiable;
    }

    ByteRange::Partial {
        start,
        end: end.map_or(size - 1, |e| e.min(size - 1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_range() {
        assert_eq!(parse_range("bytes=2-5", 10), ByteRange::Partial { start: 2, end: 5 });
        assert_eq!(parse_range("bytes=0-0", 10), ByteRange::Partial { start: 0, end: 0 });
        assert_eq!(parse_range("bytes=2-5", 10).len(), 4);
    }

    #[test]
    fn test_open_and_clamped_ranges() {
        assert_eq!(parse_range("bytes=4-", 10), ByteRange::Partial { start: 4, end: 9 });
        assert_eq!(parse_range("bytes=4-100", 10), ByteRange::Partial { start: 4, end: 9 });
    }

    #[test]
    fn test_suffix_range() {
        assert_eq!(parse_range("bytes=-3", 10), ByteRange::Partial { start: 7, end: 9 });
        assert_eq!(parse_range("bytes=-30", 10), ByteRange::Partial { start: 0, end: 9 });
        assert_eq!(parse_range("bytes=-0", 10), ByteRange::Unsatisfiable);
    }

    #[test]
    fn test_unsatisfiable() {
        assert_eq!(parse_range("bytes=10-", 10), ByteRange::Unsatisfiable);
        assert_eq!(parse_range("bytes=0-", 0), ByteRange::Unsatisfiable);
        assert_eq!(parse_range("bytes=-5", 0), ByteRange::Unsatisfiable);
    }

    #[test]
    fn test_ignored_headers() {
        assert_eq!(parse_range("items=0-5", 10), ByteRange::Full);
        assert_eq!(parse_range("bytes=0-1,4-5", 10), ByteRange::Full);
        assert_eq!(parse_range("bytes=5-2", 10), ByteRange::Full);
        assert_eq!(parse_range("bytes=abc", 10), ByteRange::Full);
        assert_eq!(parse_range("bytes=x-3", 10), ByteRange::Full);
    }
}
