use crate::request::ParsedRequest;

/// Row window of one page: `OFFSET start LIMIT length`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: u64,
    /// `None` returns every remaining row
    pub limit: Option<u64>,
}

/// Window for `request`, with the page size clamped to `max_length` when set.
///
/// A grid asking for all rows (`length=-1`) is clamped too, so a configured
/// bound can never be bypassed.
#[must_use]
pub fn page_window(request: &ParsedRequest, max_length: Option<u64>) -> PageWindow {
    let limit = match (request.length, max_length) {
        (Some(length), Some(max)) => Some(length.min(max)),
        (None, Some(max)) => Some(max),
        (length, None) => length,
    };
    PageWindow {
        offset: request.start,
        limit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::parse;

    fn request(start: i64, length: i64) -> ParsedRequest {
        parse(&format!("draw=1&start={start}&length={length}&columns[0][data]=id")).unwrap()
    }

    #[test]
    fn test_window_from_request() {
        let window = page_window(&request(20, 10), None);
        assert_eq!(window, PageWindow { offset: 20, limit: Some(10) });
    }

    #[test]
    fn test_negative_length_is_unbounded() {
        let window = page_window(&request(0, -1), None);
        assert_eq!(window.limit, None);
    }

    #[test]
    fn test_max_length_clamps() {
        assert_eq!(page_window(&request(0, 500), Some(100)).limit, Some(100));
        assert_eq!(page_window(&request(0, 50), Some(100)).limit, Some(50));
        assert_eq!(page_window(&request(0, -1), Some(100)).limit, Some(100));
    }
}
