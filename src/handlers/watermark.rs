use std::fmt;

/// Identifies a served frame by the version of the source image it shows
/// (`data_id`) and the version of the viewport params that drove whatever
/// layout decision produced it (`viewport_id`). The synchronous and
/// pipelined handlers always compute both from the same request, so the two
/// fields are equal there; the asynchronous handler is the one place they
/// can diverge, when the layout loop reuses a stale image under a fresh
/// viewport.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Watermark {
    pub data_id: u64,
    pub viewport_id: u64,
}

impl Watermark {
    #[must_use]
    pub fn exact(request_id: u64) -> Self {
        Self {
            data_id: request_id,
            viewport_id: request_id,
        }
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.data_id, self.viewport_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_sets_both_fields_to_the_same_request_id() {
        let w = Watermark::exact(7);
        assert_eq!(w.data_id, 7);
        assert_eq!(w.viewport_id, 7);
    }

    #[test]
    fn test_ordering_is_lexicographic_by_data_id_then_viewport_id() {
        assert!(Watermark { data_id: 1, viewport_id: 9 } < Watermark { data_id: 2, viewport_id: 0 });
        assert!(Watermark { data_id: 5, viewport_id: 1 } < Watermark { data_id: 5, viewport_id: 2 });
    }
}
