/// Most events published per invocation. Overflow is discarded so a burst
/// upstream cannot trip the remote service's rate limits.
pub const MAX_BATCH_SIZE: usize = 20;

/// Keep the first [`MAX_BATCH_SIZE`] events in order.
///
/// Returns the admitted prefix and how many events were dropped.
pub fn admit<T>(mut events: Vec<T>) -> (Vec<T>, usize) {
    let dropped = events.len().saturating_sub(MAX_BATCH_SIZE);
    events.truncate(MAX_BATCH_SIZE);
    (events, dropped)
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case(0, 0, 0)]
    #[case(1, 1, 0)]
    #[case(20, 20, 0)]
    #[case(21, 20, 1)]
    #[case(25, 20, 5)]
    fn caps_batch(#[case] len: usize, #[case] kept: usize, #[case] dropped: usize) {
        let (admitted, n) = admit((0..len).collect::<Vec<_>>());
        assert_eq!(admitted.len(), kept);
        assert_eq!(n, dropped);
    }

    #[test]
    fn keeps_leading_prefix_in_order() {
        let (admitted, _) = admit((0..25).collect::<Vec<_>>());
        assert_eq!(admitted, (0..20).collect::<Vec<_>>());
    }
}
