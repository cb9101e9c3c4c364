use std::collections::HashMap;
use std::io::{self, Write};
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tracing::{debug, warn};

use crate::config::PingConfig;
use crate::error::{PingError, Result};
use crate::icmp::{self, FrameKind, PAYLOAD_SIZE, ReceivedFrame};
use crate::resolve::{Resolver, Target};
use crate::stats::Statistics;
use crate::transport::{RECV_BUF, Transport};

/// Como a rodada terminou.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// Segue para a pausa e a próxima rodada.
    Next,
    /// Nosso próprio request voltou: reenvia já, sem pausa.
    Again,
    /// Ctrl+C enquanto esperava.
    Cancelled,
}

/// Uma execução de ping contra um único destino.
///
/// Dona exclusiva do transporte: o socket fecha quando a sessão cai, em
/// qualquer caminho de saída.
pub struct Session<T, R, W> {
    config: PingConfig,
    target: Target,
    transport: T,
    resolver: R,
    out: W,
    running: Arc<AtomicBool>,
    identifier: u16,
    sequence: u16,
    stats: Statistics,
    names: HashMap<Ipv4Addr, Option<String>>,
}

impl<T: Transport, R: Resolver, W: Write> Session<T, R, W> {
    pub fn new(
        config: PingConfig,
        target: Target,
        transport: T,
        resolver: R,
        out: W,
        running: Arc<AtomicBool>,
        identifier: u16,
    ) -> Self {
        Self {
            config,
            target,
            transport,
            resolver,
            out,
            running,
            identifier,
            sequence: 0,
            stats: Statistics::new(),
            names: HashMap::new(),
        }
    }

    /// Roda até o cancelamento, o limite de `count` ou um erro fatal.
    ///
    /// As estatísticas saem mesmo quando a sessão termina em erro.
    pub fn run(mut self) -> Result<Statistics> {
        let outcome = self.print_banner().and_then(|_| self.rounds());

        // Linha em branco antes do bloco final (depois do ^C)
        let report = format!("\n{}", self.stats.report(&self.target.host));
        if let Err(e) = self
            .out
            .write_all(report.as_bytes())
            .and_then(|_| self.out.flush())
        {
            // Erro fatal da sessão tem prioridade sobre falha de escrita
            warn!("falha ao escrever estatísticas: {e}");
            outcome?;
            return Err(PingError::Output(e));
        }

        outcome.map(|_| self.stats)
    }

    fn print_banner(&mut self) -> Result<()> {
        let mut line = format!(
            "PING {} ({}) {} data bytes",
            self.target.host, self.target.addr, PAYLOAD_SIZE
        );
        if self.config.verbose {
            line.push_str(&format!(
                ", id 0x{:04x} = {}",
                self.identifier, self.identifier
            ));
        }
        self.emit(&line)
    }

    fn rounds(&mut self) -> Result<()> {
        while self.is_running() {
            let seq = self.next_sequence();
            let sent_at = self.send(seq)?;

            match self.await_reply(seq, sent_at)? {
                Step::Again => continue,
                Step::Cancelled => break,
                Step::Next => {}
            }

            // Sem pausa depois do último pacote
            if let Some(limit) = self.config.count {
                if self.stats.transmitted >= limit {
                    break;
                }
            }
            self.pause();
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Pós-incremento com wrap em 16 bits.
    fn next_sequence(&mut self) -> u16 {
        let seq = self.sequence;
        self.sequence = self.sequence.wrapping_add(1);
        seq
    }

    fn send(&mut self, seq: u16) -> Result<Instant> {
        let pkt = icmp::build_request(self.identifier, seq).to_bytes();

        // Marca o instante do envio para calcular o RTT depois
        let sent_at = Instant::now();
        match self.transport.send_to(&pkt, self.target.addr) {
            Ok(0) => return Err(PingError::SocketClosed),
            Ok(_) => {}
            Err(e) => return Err(PingError::Send(e)),
        }
        self.stats.record_sent();
        Ok(sent_at)
    }

    /// Espera um quadro até o prazo `wait`, olhando o cancelamento a cada timeout.
    fn await_reply(&mut self, seq: u16, sent_at: Instant) -> Result<Step> {
        let deadline = sent_at + self.config.wait;
        let mut buf = [0u8; RECV_BUF];

        loop {
            if !self.is_running() {
                return Ok(Step::Cancelled);
            }
            if Instant::now() >= deadline {
                self.emit(&format!("Request timeout for icmp_seq {seq}"))?;
                return Ok(Step::Next);
            }

            let (n, src) = match self.transport.recv_from(&mut buf) {
                Ok(r) => r,
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::WouldBlock
                            | io::ErrorKind::TimedOut
                            | io::ErrorKind::Interrupted
                    ) =>
                {
                    continue;
                }
                Err(e) => return Err(PingError::Receive(e)),
            };
            let received_at = Instant::now();

            return self.classify(&buf[..n], src, sent_at, received_at);
        }
    }

    fn classify(
        &mut self,
        data: &[u8],
        src: Ipv4Addr,
        sent_at: Instant,
        received_at: Instant,
    ) -> Result<Step> {
        let decoded = if self.transport.includes_ip_header() {
            icmp::decode_reply(data)
        } else {
            icmp::decode_icmp(data)
        };
        let frame = match decoded {
            Ok(f) => f,
            Err(e) => {
                // Nem dá para saber o tipo: registra e segue
                warn!(%src, "{e}");
                return Ok(Step::Next);
            }
        };

        debug!(
            %src,
            icmp_type = frame.header.icmp_type,
            ip_header = frame.ip_header_len,
            len = frame.icmp_len,
            success = frame.is_success(),
            "quadro recebido"
        );

        // Sem filtro por identifier: só registra quando não é o nosso
        if frame.header.identifier != self.identifier {
            debug!(
                %src,
                id = frame.header.identifier,
                ours = self.identifier,
                "identifier diferente"
            );
        }

        match frame.kind {
            FrameKind::Reply => {
                let rtt = rtt_ms(sent_at, received_at);
                self.stats.record_reply(rtt);
                self.print_reply(&frame, src, rtt)?;
                Ok(Step::Next)
            }
            FrameKind::Loopback => {
                debug!(seq = frame.header.sequence, "echo request próprio recebido");
                self.stats.undo_sent();
                Ok(Step::Again)
            }
            FrameKind::ChecksumMismatch => {
                let from = self.label(src);
                self.emit(&format!(
                    "{} bytes from {}: icmp_seq={} (checksum mismatch)",
                    frame.icmp_len, from, frame.header.sequence
                ))?;
                Ok(Step::Next)
            }
            // TimeExceeded, Destination Unreachable e afins
            _ => {
                let from = self.label(src);
                self.emit(&format!(
                    "{} bytes from {}: {}",
                    frame.icmp_len,
                    from,
                    icmp::describe(&frame.header)
                ))?;
                Ok(Step::Next)
            }
        }
    }

    fn print_reply(&mut self, frame: &ReceivedFrame, src: Ipv4Addr, rtt: f64) -> Result<()> {
        let from = self.label(src);
        self.emit(&format!(
            "{} bytes from {}: icmp_seq={} ttl={} time={:.3} ms",
            frame.icmp_len, from, frame.header.sequence, self.config.ttl, rtt
        ))
    }

    /// `nome (ip)` quando há nome reverso, senão só o IP.
    fn label(&mut self, src: Ipv4Addr) -> String {
        let name = if self.config.numeric {
            None
        } else if src == self.target.addr {
            self.target.name.clone()
        } else {
            let resolver = &self.resolver;
            self.names
                .entry(src)
                .or_insert_with(|| resolver.reverse(src))
                .clone()
        };

        match name {
            Some(name) => format!("{name} ({src})"),
            None => src.to_string(),
        }
    }

    /// Pausa entre rodadas, em fatias de `poll` para não atrasar o Ctrl+C.
    fn pause(&self) {
        let until = Instant::now() + self.config.interval;
        while self.is_running() {
            let now = Instant::now();
            if now >= until {
                break;
            }
            std::thread::sleep((until - now).min(self.config.poll));
        }
    }

    fn emit(&mut self, line: &str) -> Result<()> {
        writeln!(self.out, "{line}").map_err(PingError::Output)
    }
}

fn rtt_ms(sent_at: Instant, received_at: Instant) -> f64 {
    received_at.duration_since(sent_at).as_secs_f64() * 1000.0
}
