/// Which path last brought the store up to date
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum UpdateSource {
    #[default]
    None,
    Realtime,
    Polling,
}

/// Arbitrates between the change feed and the polling fallback, so that a poll tick
/// right after a realtime update does not redo the work.
#[derive(Clone, Debug, Default)]
pub struct Coordinator {
    last: UpdateSource,
}

impl Coordinator {
    pub fn new() -> Coordinator {
        Coordinator::default()
    }

    pub fn record(&mut self, source: UpdateSource) {
        self.last = source;
    }

    pub fn last_source(&self) -> UpdateSource {
        self.last
    }

    /// Returns `true` if the last update came from the change feed, in which case the
    /// caller skips this poll. Either way the flag is cleared.
    pub fn consume_realtime_flag(&mut self) -> bool {
        std::mem::take(&mut self.last) == UpdateSource::Realtime
    }

    pub fn reset(&mut self) {
        self.last = UpdateSource::None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn realtime_skips_exactly_one_poll() {
        let mut c = Coordinator::new();
        assert!(!c.consume_realtime_flag());
        c.record(UpdateSource::Realtime);
        assert!(c.consume_realtime_flag());
        assert!(!c.consume_realtime_flag());
        assert_eq!(c.last_source(), UpdateSource::None);
    }

    #[test]
    fn polling_does_not_skip() {
        let mut c = Coordinator::new();
        c.record(UpdateSource::Polling);
        assert!(!c.consume_realtime_flag());
        c.record(UpdateSource::Realtime);
        c.reset();
        assert!(!c.consume_realtime_flag());
    }
}
