use std::time::Duration;

/// TTL padrão dos pacotes enviados.
pub const DEFAULT_TTL: u8 = 115;

/// Opções consumidas pela sessão, já validadas pela camada de argumentos.
#[derive(Debug, Clone)]
pub struct PingConfig {
    /// Destino como digitado (nome ou IPv4).
    pub host: String,
    pub ttl: u8,
    /// Desliga o DNS reverso (-n).
    pub numeric: bool,
    pub verbose: bool,
    /// Para depois de N pacotes transmitidos; `None` roda até Ctrl+C.
    pub count: Option<u64>,
    /// Pausa entre rodadas.
    pub interval: Duration,
    /// Quanto esperar por uma resposta antes de desistir da rodada.
    pub wait: Duration,
    /// Timeout de leitura do socket: limita a latência do cancelamento.
    pub poll: Duration,
}

impl PingConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ttl: DEFAULT_TTL,
            numeric: false,
            verbose: false,
            count: None,
            interval: Duration::from_secs(1),
            wait: Duration::from_secs(2),
            poll: Duration::from_millis(250),
        }
    }
}
