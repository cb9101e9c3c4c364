// Criação e configuração de sockets de baixo nível
use socket2::{Domain, Protocol, SockAddr, Socket, Type};

use std::io;
use std::mem::MaybeUninit;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;

use tracing::debug;

use crate::error::{PingError, Result};

/// Tamanho do buffer de recepção.
pub const RECV_BUF: usize = 256;

/// Fronteira com a rede: envia um pacote pronto e recebe quadros crus.
pub trait Transport {
    /// Envia `pkt` para `dst`. Devolve quantos bytes saíram.
    fn send_to(&mut self, pkt: &[u8], dst: Ipv4Addr) -> io::Result<usize>;

    /// Recebe um quadro em `buf`. Timeout aparece como `WouldBlock`/`TimedOut`.
    fn recv_from(&mut self, buf: &mut [u8]) -> io::Result<(usize, Ipv4Addr)>;

    /// Se os quadros recebidos começam com o cabeçalho IPv4.
    fn includes_ip_header(&self) -> bool;
}

/// Socket ICMPv4: RAW quando rodando como root, DGRAM caso contrário.
pub struct IcmpSocket {
    sock: Socket,
    raw: bool,
}

impl IcmpSocket {
    /// Abre o socket, aplica o TTL e o timeout de leitura.
    pub fn open(ttl: u8, read_timeout: Duration) -> Result<Self> {
        // Só root abre SOCK_RAW; os demais usam o ICMP "ping socket" do kernel
        let raw = unsafe { libc::geteuid() } == 0;
        let ty = if raw {
            Type::from(libc::SOCK_RAW)
        } else {
            Type::DGRAM
        };

        let sock = Socket::new(Domain::IPV4, ty, Some(Protocol::ICMPV4)).map_err(|e| {
            match e.raw_os_error() {
                Some(libc::EPERM) | Some(libc::EACCES) => PingError::Permission,
                _ => PingError::Socket(e),
            }
        })?;

        configure(&sock, ttl, read_timeout)?;

        debug!(raw, ttl, ?read_timeout, "socket ICMP aberto");
        Ok(Self { sock, raw })
    }
}

/// TTL dos pacotes enviados e timeout de leitura.
fn configure(sock: &Socket, ttl: u8, read_timeout: Duration) -> Result<()> {
    sock.set_ttl_v4(ttl as u32)
        .map_err(PingError::SocketOption)?;
    sock.set_read_timeout(Some(read_timeout))
        .map_err(PingError::SocketOption)
}

impl Transport for IcmpSocket {
    fn send_to(&mut self, pkt: &[u8], dst: Ipv4Addr) -> io::Result<usize> {
        // Porta 0 é ignorada para ICMP
        let addr = SockAddr::from(SocketAddrV4::new(dst, 0));
        self.sock.send_to(pkt, &addr)
    }

    fn recv_from(&mut self, buf: &mut [u8]) -> io::Result<(usize, Ipv4Addr)> {
        // SAFETY: `buf` já está todo inicializado e recvfrom nunca escreve
        // bytes não inicializados, então a visão como MaybeUninit não expõe lixo
        let uninit = unsafe { &mut *(buf as *mut [u8] as *mut [MaybeUninit<u8>]) };
        let (n, addr) = self.sock.recv_from(uninit)?;
        let src = addr
            .as_socket_ipv4()
            .map(|a| *a.ip())
            .unwrap_or(Ipv4Addr::UNSPECIFIED);
        Ok((n, src))
    }

    fn includes_ip_header(&self) -> bool {
        self.raw
    }
}
