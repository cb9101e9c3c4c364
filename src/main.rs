// Tratamento de erros ergonômico
use anyhow::{Context, Result};

// Flag de execução compartilhada com o handler do Ctrl+C
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

// Módulos locais
mod args;
mod checksum;
mod config;
mod error;
mod icmp;
mod logging;
mod resolve;
mod session;
mod stats;
mod transport;

use error::PingError;
use resolve::{SystemResolver, Target};
use session::Session;
use transport::IcmpSocket;

/// Programa principal: resolve o destino e roda a sessão de ping até o Ctrl+C.
/// Como root usa socket RAW; senão o socket ICMP DGRAM do kernel.
fn main() {
    // Parsing de argumentos; --help e erros de uso já saem por aqui
    let config = args::parse();
    logging::init_logging(config.verbose);

    if let Err(e) = run(config) {
        eprintln!("pingrs: {e:#}");

        // Código de saída vem do tipo do erro fatal
        let code = e
            .downcast_ref::<PingError>()
            .map(PingError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

fn run(config: config::PingConfig) -> Result<()> {
    // Resolve antes de abrir o socket: destino inválido nem chega ao loop
    let target = Target::resolve(&config.host, config.numeric)?;

    let sock = IcmpSocket::open(config.ttl, config.poll)?;

    // Configura handler para Ctrl+C
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .map_err(PingError::from)
    .context("Erro ao configurar handler de Ctrl+C")?;

    // Identificador: usa o PID do processo (comum em pings)
    let ident = std::process::id() as u16;

    let session = Session::new(
        config,
        target,
        sock,
        SystemResolver,
        std::io::stdout(),
        running,
        ident,
    );
    session.run()?;

    Ok(())
}
