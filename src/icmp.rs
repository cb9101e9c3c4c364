use crate::checksum::{checksum, verify};

/// Tamanho fixo do pacote ICMP enviado (cabeçalho + payload).
pub const PKT_SIZE: usize = 64;

/// Cabeçalho Echo: type, code, checksum, identifier, sequence.
pub const HEADER_SIZE: usize = 8;

/// Bytes de dados depois do cabeçalho.
pub const PAYLOAD_SIZE: usize = PKT_SIZE - HEADER_SIZE;

// Posição do campo checksum dentro do cabeçalho ICMP
const CHECKSUM_AT: usize = 2;

// Base ASCII do padrão de preenchimento do payload
const FILLER_BASE: u8 = b'0';

/// Tipos de mensagem ICMP (RFC 792) que o cliente sabe nomear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IcmpType {
    EchoReply = 0,
    DestinationUnreachable = 3,
    SourceQuench = 4,
    Redirect = 5,
    EchoRequest = 8,
    TimeExceeded = 11,
    ParameterProblem = 12,
}

impl IcmpType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(IcmpType::EchoReply),
            3 => Some(IcmpType::DestinationUnreachable),
            4 => Some(IcmpType::SourceQuench),
            5 => Some(IcmpType::Redirect),
            8 => Some(IcmpType::EchoRequest),
            11 => Some(IcmpType::TimeExceeded),
            12 => Some(IcmpType::ParameterProblem),
            _ => None,
        }
    }
}

/// Cabeçalho Echo decodificado.
///
/// `identifier` e `sequence` ficam em ordem do host; `checksum` guarda o valor
/// bruto como aparece no fio (lido em ordem nativa, ver [`checksum`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoHeader {
    pub icmp_type: u8,
    pub code: u8,
    pub checksum: u16,
    pub identifier: u16,
    pub sequence: u16,
}

impl EchoHeader {
    /// Lê os campos a partir de offsets fixos. `data` precisa ter 8 bytes.
    fn parse(data: &[u8]) -> Self {
        Self {
            icmp_type: data[0],
            code: data[1],
            checksum: u16::from_ne_bytes([data[2], data[3]]),
            identifier: u16::from_be_bytes([data[4], data[5]]),
            sequence: u16::from_be_bytes([data[6], data[7]]),
        }
    }

    fn write(&self, out: &mut [u8]) {
        out[0] = self.icmp_type;
        out[1] = self.code;
        out[2..4].copy_from_slice(&self.checksum.to_ne_bytes());
        out[4..6].copy_from_slice(&self.identifier.to_be_bytes());
        out[6..8].copy_from_slice(&self.sequence.to_be_bytes());
    }

    pub fn kind(&self) -> Option<IcmpType> {
        IcmpType::from_u8(self.icmp_type)
    }
}

/// Pacote Echo Request completo, sempre com [`PKT_SIZE`] bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub header: EchoHeader,
    pub payload: [u8; PAYLOAD_SIZE],
}

impl Packet {
    pub fn to_bytes(&self) -> [u8; PKT_SIZE] {
        let mut out = [0u8; PKT_SIZE];
        self.header.write(&mut out[..HEADER_SIZE]);
        out[HEADER_SIZE..].copy_from_slice(&self.payload);
        out
    }
}

/// Monta um Echo Request (type=8, code=0) com checksum calculado.
///
/// Determinístico: os mesmos `identifier`/`sequence` geram os mesmos bytes.
pub fn build_request(identifier: u16, sequence: u16) -> Packet {
    // Payload de enchimento: '0', '1', '2', ... (só para completar o tamanho)
    let mut payload = [0u8; PAYLOAD_SIZE];
    for (i, b) in payload.iter_mut().enumerate() {
        *b = FILLER_BASE.wrapping_add(i as u8);
    }

    let mut pkt = Packet {
        header: EchoHeader {
            icmp_type: IcmpType::EchoRequest as u8,
            code: 0,
            checksum: 0,
            identifier,
            sequence,
        },
        payload,
    };

    // Checksum sobre o pacote inteiro com o campo zerado
    pkt.header.checksum = checksum(&pkt.to_bytes());
    pkt
}

/// Resultado da classificação de um quadro recebido.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Echo Reply com checksum válido.
    Reply,
    /// Nosso próprio Echo Request voltando (broadcast, loopback).
    Loopback,
    TimeExceeded,
    /// Echo Reply cujo checksum não confere.
    ChecksumMismatch,
    /// Qualquer outro tipo ICMP; o cabeçalho diz qual.
    Other,
}

/// Quadro decodificado, descartado depois de classificado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceivedFrame {
    pub header: EchoHeader,
    pub kind: FrameKind,
    /// Bytes de cabeçalho IP removidos antes da parte ICMP.
    pub ip_header_len: usize,
    /// Bytes da parte ICMP (o que aparece em "N bytes from").
    pub icmp_len: usize,
}

impl ReceivedFrame {
    pub fn is_success(&self) -> bool {
        self.kind == FrameKind::Reply
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("packet too short ({len} bytes, need {needed})")]
    TooShort { len: usize, needed: usize },
}

/// Decodifica um quadro vindo de socket RAW (com cabeçalho IP na frente).
///
/// O tamanho do cabeçalho IP vem do nibble baixo do primeiro byte (IHL × 4).
/// Só buffer curto demais é erro; tipos inesperados viram classificação.
pub fn decode_reply(buf: &[u8]) -> Result<ReceivedFrame, DecodeError> {
    let Some(first) = buf.first() else {
        return Err(DecodeError::TooShort {
            len: 0,
            needed: PKT_SIZE,
        });
    };
    let offset = (first & 0x0F) as usize * 4;
    classify(buf, offset)
}

/// Decodifica um quadro ICMP sem cabeçalho IP (socket DGRAM não privilegiado).
pub fn decode_icmp(buf: &[u8]) -> Result<ReceivedFrame, DecodeError> {
    classify(buf, 0)
}

fn classify(buf: &[u8], offset: usize) -> Result<ReceivedFrame, DecodeError> {
    let needed = offset + PKT_SIZE;
    if buf.len() < needed {
        return Err(DecodeError::TooShort {
            len: buf.len(),
            needed,
        });
    }

    let icmp = &buf[offset..];
    let header = EchoHeader::parse(icmp);

    let kind = match header.kind() {
        Some(IcmpType::EchoReply) => {
            if verify(icmp, CHECKSUM_AT) {
                FrameKind::Reply
            } else {
                FrameKind::ChecksumMismatch
            }
        }
        Some(IcmpType::EchoRequest) => FrameKind::Loopback,
        Some(IcmpType::TimeExceeded) => FrameKind::TimeExceeded,
        _ => FrameKind::Other,
    };

    Ok(ReceivedFrame {
        header,
        kind,
        ip_header_len: offset,
        icmp_len: icmp.len(),
    })
}

/// Texto para quadros de erro ICMP, no estilo do ping tradicional.
pub fn describe(header: &EchoHeader) -> String {
    let code = header.code;
    match header.kind() {
        Some(IcmpType::TimeExceeded) => match code {
            0 => "Time to live exceeded".into(),
            1 => "Frag reassembly time exceeded".into(),
            _ => format!("Time exceeded, Bad Code: {code}"),
        },
        Some(IcmpType::DestinationUnreachable) => match code {
            0 => "Destination Net Unreachable".into(),
            1 => "Destination Host Unreachable".into(),
            2 => "Destination Protocol Unreachable".into(),
            3 => "Destination Port Unreachable".into(),
            4 => "Frag needed and DF set".into(),
            5 => "Source Route Failed".into(),
            6 => "Destination Net Unknown".into(),
            7 => "Destination Host Unknown".into(),
            9 | 10 | 13 => "Communication administratively prohibited".into(),
            _ => format!("Dest Unreachable, Bad Code: {code}"),
        },
        Some(IcmpType::SourceQuench) => "Source Quench".into(),
        Some(IcmpType::Redirect) => match code {
            0 => "Redirect Network".into(),
            1 => "Redirect Host".into(),
            _ => format!("Redirect, Bad Code: {code}"),
        },
        Some(IcmpType::ParameterProblem) => "Parameter problem".into(),
        Some(IcmpType::EchoRequest) => "Echo Request".into(),
        Some(IcmpType::EchoReply) => "Echo Reply".into(),
        None => format!("Unknown ICMP type {} code {code}", header.icmp_type),
    }
}
