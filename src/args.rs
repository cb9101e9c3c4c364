use clap::Parser;
use std::time::Duration;

use crate::config::{DEFAULT_TTL, PingConfig};

/// Envia ICMP ECHO_REQUEST para um host da rede.
#[derive(Debug, Parser)]
#[command(name = "pingrs", version)]
pub struct PingArgs {
    /// Saída detalhada
    #[arg(short, long)]
    pub verbose: bool,

    /// Sem DNS reverso: mostra só endereços numéricos
    #[arg(short = 'n', long)]
    pub numeric: bool,

    /// Time to live dos pacotes enviados
    #[arg(short = 't', long, default_value_t = DEFAULT_TTL, value_parser = clap::value_parser!(u8).range(1..))]
    pub ttl: u8,

    /// Para depois de enviar COUNT pacotes
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u64).range(1..))]
    pub count: Option<u64>,

    /// Segundos entre pacotes
    #[arg(short = 'i', long, default_value_t = 1.0, value_parser = positive_secs)]
    pub interval: f64,

    /// Segundos de espera por cada resposta
    #[arg(short = 'W', long, default_value_t = 2.0, value_parser = positive_secs)]
    pub wait: f64,

    /// Host ou endereço IPv4 de destino
    pub destination: String,
}

fn positive_secs(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("valor inválido: {s}"))?;
    if v.is_finite() && v > 0.0 {
        Ok(v)
    } else {
        Err(format!("precisa ser maior que zero: {s}"))
    }
}

impl PingArgs {
    pub fn into_config(self) -> PingConfig {
        let mut cfg = PingConfig::new(self.destination);
        cfg.ttl = self.ttl;
        cfg.numeric = self.numeric;
        cfg.verbose = self.verbose;
        cfg.count = self.count;
        cfg.interval = Duration::from_secs_f64(self.interval);
        cfg.wait = Duration::from_secs_f64(self.wait);
        // O poll nunca passa do prazo de espera
        cfg.poll = cfg.poll.min(cfg.wait);
        cfg
    }
}

/// Lê os argumentos do processo; `--help` e erros de uso saem pelo clap.
pub fn parse() -> PingConfig {
    PingArgs::parse().into_config()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_from(args: &[&str]) -> Result<PingConfig, clap::Error> {
        PingArgs::try_parse_from(args).map(PingArgs::into_config)
    }

    #[test]
    fn defaults_from_destination_only() {
        let cfg = parse_from(&["pingrs", "example.com"]).unwrap();
        assert_eq!(cfg.host, "example.com");
        assert_eq!(cfg.ttl, 115);
        assert!(!cfg.numeric && !cfg.verbose);
        assert_eq!(cfg.count, None);
        assert_eq!(cfg.interval, Duration::from_secs(1));
        assert_eq!(cfg.wait, Duration::from_secs(2));
    }

    #[test]
    fn all_flags() {
        let cfg = parse_from(&[
            "pingrs", "-v", "-n", "-t", "3", "-c", "5", "-i", "0.5", "-W", "0.125", "10.0.0.1",
        ])
        .unwrap();
        assert!(cfg.verbose && cfg.numeric);
        assert_eq!(cfg.ttl, 3);
        assert_eq!(cfg.count, Some(5));
        assert_eq!(cfg.interval, Duration::from_millis(500));
        assert_eq!(cfg.wait, Duration::from_millis(125));
        assert_eq!(cfg.poll, Duration::from_millis(125));
    }

    #[test]
    fn usage_errors() {
        assert!(parse_from(&["pingrs"]).is_err());
        assert!(parse_from(&["pingrs", "-t", "0", "h"]).is_err());
        assert!(parse_from(&["pingrs", "-t", "256", "h"]).is_err());
        assert!(parse_from(&["pingrs", "-c", "0", "h"]).is_err());
        assert!(parse_from(&["pingrs", "-i", "-1", "h"]).is_err());
        assert!(parse_from(&["pingrs", "-W", "abc", "h"]).is_err());
    }

    #[test]
    fn help_is_not_a_usage_error() {
        let err = PingArgs::try_parse_from(["pingrs", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
        assert_eq!(err.exit_code(), 0);
    }
}
