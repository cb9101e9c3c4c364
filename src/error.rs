use std::io;

/// Erros fatais da sessão. Classificações de resposta não passam por aqui.
#[derive(Debug, thiserror::Error)]
pub enum PingError {
    #[error("{host}: {reason}")]
    Resolve { host: String, reason: String },

    #[error("{host}: no IPv4 address")]
    NoIpv4 { host: String },

    #[error("lacking privilege for icmp socket")]
    Permission,

    #[error("socket: {0}")]
    Socket(#[source] io::Error),

    #[error("setsockopt: {0}")]
    SocketOption(#[source] io::Error),

    #[error("sendto: {0}")]
    Send(#[source] io::Error),

    #[error("sendto: socket closed")]
    SocketClosed,

    #[error("recvfrom: {0}")]
    Receive(#[source] io::Error),

    #[error("write: {0}")]
    Output(#[source] io::Error),

    #[error("signal handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

impl PingError {
    /// Código de saída do processo para este erro.
    pub fn exit_code(&self) -> i32 {
        // Destino que não resolve sai com 2, como o ping do iputils
        match self {
            PingError::Resolve { .. } | PingError::NoIpv4 { .. } => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, PingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failing_call() {
        let e = PingError::Send(io::Error::from(io::ErrorKind::ConnectionRefused));
        assert!(e.to_string().starts_with("sendto: "));
        assert_eq!(PingError::SocketClosed.to_string(), "sendto: socket closed");
        let e = PingError::Resolve {
            host: "nope.invalid".into(),
            reason: "Name or service not known".into(),
        };
        assert_eq!(e.to_string(), "nope.invalid: Name or service not known");
    }

    #[test]
    fn fatal_errors_exit_nonzero() {
        assert_ne!(PingError::Permission.exit_code(), 0);
        assert_ne!(PingError::SocketClosed.exit_code(), 0);
        let e = PingError::NoIpv4 {
            host: "v6only.example".into(),
        };
        assert_eq!(e.exit_code(), 2);
    }
}
