use std::ffi::CStr;
use std::mem;
use std::net::{Ipv4Addr, SocketAddr, ToSocketAddrs};
use std::ptr;

use tracing::warn;

use crate::error::{PingError, Result};

// Tamanho máximo de um nome devolvido por getnameinfo
const NI_MAXHOST: usize = 1025;

/// Destino resolvido antes do loop começar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Como o usuário digitou.
    pub host: String,
    pub addr: Ipv4Addr,
    /// Nome reverso, só quando o destino não foi dado como IP.
    pub name: Option<String>,
}

impl Target {
    /// Resolve o destino; o DNS reverso é pulado para IPs literais ou com `numeric`.
    pub fn resolve(host: &str, numeric: bool) -> Result<Self> {
        if let Ok(addr) = host.parse::<Ipv4Addr>() {
            return Ok(Self {
                host: host.to_string(),
                addr,
                name: None,
            });
        }

        let addr = lookup_addr(host)?;
        let name = if numeric { None } else { reverse_lookup(addr)? };
        Ok(Self {
            host: host.to_string(),
            addr,
            name,
        })
    }
}

/// Primeiro endereço IPv4 do nome.
pub fn lookup_addr(host: &str) -> Result<Ipv4Addr> {
    let addrs = (host, 0).to_socket_addrs().map_err(|e| PingError::Resolve {
        host: host.to_string(),
        reason: e.to_string(),
    })?;

    addrs
        .filter_map(|a| match a {
            SocketAddr::V4(v4) => Some(*v4.ip()),
            SocketAddr::V6(_) => None,
        })
        .next()
        .ok_or_else(|| PingError::NoIpv4 {
            host: host.to_string(),
        })
}

/// DNS reverso com NI_NAMEREQD. Endereço sem nome devolve `Ok(None)`.
pub fn reverse_lookup(addr: Ipv4Addr) -> Result<Option<String>> {
    let mut sa: libc::sockaddr_in = unsafe { mem::zeroed() };
    sa.sin_family = libc::AF_INET as libc::sa_family_t;
    sa.sin_addr = libc::in_addr {
        s_addr: u32::from_ne_bytes(addr.octets()),
    };

    let mut host = [0 as libc::c_char; NI_MAXHOST];
    let res = unsafe {
        libc::getnameinfo(
            &sa as *const libc::sockaddr_in as *const libc::sockaddr,
            mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
            host.as_mut_ptr(),
            host.len() as libc::socklen_t,
            ptr::null_mut(),
            0,
            libc::NI_NAMEREQD,
        )
    };

    match res {
        0 => {
            let name = unsafe { CStr::from_ptr(host.as_ptr()) };
            Ok(Some(name.to_string_lossy().into_owned()))
        }
        libc::EAI_NONAME => Ok(None),
        code => {
            let reason = unsafe { CStr::from_ptr(libc::gai_strerror(code)) };
            Err(PingError::Resolve {
                host: addr.to_string(),
                reason: reason.to_string_lossy().into_owned(),
            })
        }
    }
}

/// Nomes para os endereços de origem das respostas.
pub trait Resolver {
    fn reverse(&self, addr: Ipv4Addr) -> Option<String>;
}

/// Resolver do sistema (getnameinfo).
pub struct SystemResolver;

impl Resolver for SystemResolver {
    fn reverse(&self, addr: Ipv4Addr) -> Option<String> {
        match reverse_lookup(addr) {
            Ok(name) => name,
            Err(e) => {
                // Falha no reverso de uma resposta não derruba a sessão
                warn!("{e}");
                None
            }
        }
    }
}
