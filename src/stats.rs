use std::time::Instant;

use log::info;

/// Per-connection exchange counters.
#[derive(Debug, Clone)]
pub struct Stats {
    pub queries: u64,
    pub warnings: u64,
    pub timeouts: u64,
    pub tx_bytes: u64,
    pub rx_bytes: u64,
    t0: Instant,
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Stats {
    pub fn new() -> Self {
        Self {
            queries: 0,
            warnings: 0,
            timeouts: 0,
            tx_bytes: 0,
            rx_bytes: 0,
            t0: Instant::now(),
        }
    }
    pub fn add_tx(&mut self, n: usize) {
        self.queries += 1;
        self.tx_bytes += n as u64;
    }
    pub fn add_rx(&mut self, n: usize) {
        self.rx_bytes += n as u64;
    }
    pub fn add_warnings(&mut self, n: usize) {
        self.warnings += n as u64;
    }
    pub fn inc_timeout(&mut self) {
        self.timeouts += 1;
    }

    pub fn log_summary(&self, alias: &str) {
        let dur = self.t0.elapsed().as_secs_f64().max(1e-3);
        info!(
            "[{}] queries={} warnings={} timeouts={} tx={}B rx={}B over {:.1}s",
            alias, self.queries, self.warnings, self.timeouts, self.tx_bytes, self.rx_bytes, dur
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let mut s = Stats::new();
        s.add_tx(12);
        s.add_tx(3013);
        s.add_rx(73);
        s.add_warnings(2);
        s.inc_timeout();
        assert_eq!(s.queries, 2);
        assert_eq!(s.tx_bytes, 3025);
        assert_eq!(s.rx_bytes, 73);
        assert_eq!(s.warnings, 2);
        assert_eq!(s.timeouts, 1);
    }
}
