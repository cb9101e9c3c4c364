use std::fmt;

/// Contadores da sessão e resumo dos RTTs.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    pub transmitted: u64,
    pub received: u64,
    rtt_min: f64,
    rtt_max: f64,
    rtt_sum: f64,
    rtt_sum_sq: f64,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_sent(&mut self) {
        self.transmitted += 1;
    }

    /// Desfaz um envio que não era uma ida e volta de verdade (loopback).
    pub fn undo_sent(&mut self) {
        self.transmitted = self.transmitted.saturating_sub(1);
    }

    pub fn record_reply(&mut self, rtt_ms: f64) {
        if self.received == 0 {
            self.rtt_min = rtt_ms;
            self.rtt_max = rtt_ms;
        } else {
            self.rtt_min = self.rtt_min.min(rtt_ms);
            self.rtt_max = self.rtt_max.max(rtt_ms);
        }
        self.rtt_sum += rtt_ms;
        self.rtt_sum_sq += rtt_ms * rtt_ms;
        self.received += 1;
    }

    /// Perda em porcentagem inteira; 0 quando nada foi transmitido.
    pub fn loss_percent(&self) -> u64 {
        if self.transmitted == 0 {
            return 0;
        }
        let lost = self.transmitted.saturating_sub(self.received);
        (lost as f64 / self.transmitted as f64 * 100.0).round() as u64
    }

    /// (min, avg, max, mdev) em ms, se houve alguma resposta.
    pub fn rtt_summary(&self) -> Option<(f64, f64, f64, f64)> {
        if self.received == 0 {
            return None;
        }
        let n = self.received as f64;
        let avg = self.rtt_sum / n;
        let mdev = (self.rtt_sum_sq / n - avg * avg).max(0.0).sqrt();
        Some((self.rtt_min, avg, self.rtt_max, mdev))
    }

    /// Bloco final impresso quando a sessão termina.
    pub fn report<'a>(&'a self, destination: &'a str) -> Report<'a> {
        Report {
            destination,
            stats: self,
        }
    }
}

pub struct Report<'a> {
    destination: &'a str,
    stats: &'a Statistics,
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.stats;
        writeln!(f, "--- {} ping statistics ---", self.destination)?;
        writeln!(
            f,
            "{} packets transmitted, {} received, {}% packet loss",
            s.transmitted,
            s.received,
            s.loss_percent()
        )?;
        if let Some((min, avg, max, mdev)) = s.rtt_summary() {
            writeln!(
                f,
                "rtt min/avg/max/mdev = {:.3}/{:.3}/{:.3}/{:.3} ms",
                min, avg, max, mdev
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_counts(transmitted: u64, received: u64) -> Statistics {
        Statistics {
            transmitted,
            received,
            ..Statistics::default()
        }
    }

    #[test]
    fn loss_is_rounded_percentage() {
        assert_eq!(with_counts(10, 7).loss_percent(), 30);
        assert_eq!(with_counts(3, 3).loss_percent(), 0);
        assert_eq!(with_counts(3, 0).loss_percent(), 100);
        // 1/3 = 33.3% → 33, 2/3 = 66.7% → 67
        assert_eq!(with_counts(3, 2).loss_percent(), 33);
        assert_eq!(with_counts(3, 1).loss_percent(), 67);
    }

    #[test]
    fn nothing_transmitted_is_zero_loss() {
        assert_eq!(Statistics::new().loss_percent(), 0);
    }

    #[test]
    fn undo_sent_never_underflows() {
        let mut s = Statistics::new();
        s.undo_sent();
        assert_eq!(s.transmitted, 0);
        s.record_sent();
        s.record_sent();
        s.undo_sent();
        assert_eq!(s.transmitted, 1);
    }

    #[test]
    fn rtt_summary_tracks_min_avg_max() {
        let mut s = Statistics::new();
        assert!(s.rtt_summary().is_none());
        for rtt in [10.0, 20.0, 30.0] {
            s.record_sent();
            s.record_reply(rtt);
        }
        let (min, avg, max, mdev) = s.rtt_summary().unwrap();
        assert_eq!(min, 10.0);
        assert_eq!(max, 30.0);
        assert!((avg - 20.0).abs() < 1e-9);
        assert!((mdev - 8.164_965_8).abs() < 1e-6);
    }

    #[test]
    fn report_block_without_replies() {
        let text = with_counts(10, 0).report("example.com").to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "--- example.com ping statistics ---");
        assert_eq!(lines[1], "10 packets transmitted, 0 received, 100% packet loss");
        // Sem respostas, não há linha de rtt
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn report_block_with_replies() {
        let mut s = Statistics::new();
        for rtt in [1.0, 3.0] {
            s.record_sent();
            s.record_reply(rtt);
        }
        s.record_sent();

        let text = s.report("example.com").to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "3 packets transmitted, 2 received, 33% packet loss");
        assert_eq!(lines[2], "rtt min/avg/max/mdev = 1.000/2.000/3.000/1.000 ms");
    }
}
