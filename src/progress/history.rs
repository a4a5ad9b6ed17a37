//! Bounded logs: entries are appended and the oldest are dropped past a cap.

/// Append `item` and drop the oldest entries beyond `limit`.
pub fn push_capped<T>(log: &mut Vec<T>, item: T, limit: usize) {
    log.push(item);
    truncate_oldest(log, limit);
}

/// Drop entries from the front until at most `limit` remain.
pub fn truncate_oldest<T>(log: &mut Vec<T>, limit: usize) {
    if log.len() > limit {
        let excess = log.len() - limit;
        log.drain(..excess);
    }
}
