//! DDC/CI "Get VCP Feature" packet codec
//!
//! # Wire format
//!
//! Request, written to I2C address 0x37:
//!
//! ```text
//! 0x51  0x82  0x01  <code>  <checksum>
//! ```
//!
//! The checksum XORs the destination address 0x6E with every byte before it.
//!
//! Reply, 11 bytes:
//!
//! ```text
//! 0x6E  0x88  0x02  <result>  <code>  <type>  <max hi> <max lo>  <cur hi> <cur lo>  <checksum>
//! ```
//!
//! `result` is 0 for a supported feature and 1 for an unsupported one. The
//! reply checksum XORs 0x50 with bytes 0..=9. A reply whose length field is
//! zero (a "null message") means the display has nothing to report.

use crate::constants::ddc;
use crate::display::{FeatureReply, QueryError};

/// Fault code for replies that fail protocol checks
pub const FAULT_PROTOCOL: u32 = 0xDDC0_0001;

/// XOR checksum with an initial seed
pub fn checksum(seed: u8, bytes: &[u8]) -> u8 {
    bytes.iter().fold(seed, |acc, b| acc ^ b)
}

/// Encode a Get VCP Feature request for `code`
pub fn encode_get_vcp(code: u8) -> [u8; 5] {
    let mut packet = [
        ddc::SOURCE_ADDRESS,
        ddc::LENGTH_FLAG | 2,
        ddc::GET_VCP_REQUEST,
        code,
        0,
    ];
    packet[4] = checksum(ddc::DEST_ADDRESS, &packet[..4]);
    packet
}

fn protocol_fault(message: impl Into<String>) -> QueryError {
    QueryError::fault(FAULT_PROTOCOL, message)
}

/// Decode a Get VCP Feature reply, checking it answers `code`
pub fn decode_get_vcp_reply(reply: &[u8], code: u8) -> Result<FeatureReply, QueryError> {
    if reply.len() < 2 {
        return Err(protocol_fault(format!("reply too short ({} bytes)", reply.len())));
    }

    let length = reply[1] & !ddc::LENGTH_FLAG;
    if length == 0 {
        return Err(QueryError::Unsupported);
    }

    if reply.len() < ddc::GET_VCP_REPLY_LEN {
        return Err(protocol_fault(format!("reply too short ({} bytes)", reply.len())));
    }

    let last = ddc::GET_VCP_REPLY_LEN - 1;
    let expected = checksum(ddc::REPLY_SEED, &reply[..last]);
    if reply[last] != expected {
        return Err(protocol_fault(format!(
            "bad checksum 0x{:02X}, expected 0x{:02X}",
            reply[last], expected
        )));
    }

    if reply[2] != ddc::GET_VCP_REPLY {
        return Err(protocol_fault(format!("unexpected opcode 0x{:02X}", reply[2])));
    }

    match reply[3] {
        0 => {}
        1 => return Err(QueryError::Unsupported),
        other => return Err(protocol_fault(format!("result code {}", other))),
    }

    if reply[4] != code {
        return Err(protocol_fault(format!(
            "reply for 0x{:02X}, asked for 0x{:02X}",
            reply[4], code
        )));
    }

    Ok(FeatureReply {
        max: u16::from_be_bytes([reply[6], reply[7]]),
        current: u16::from_be_bytes([reply[8], reply[9]]),
    })
}

/// Build a well-formed reply; the inverse of [`decode_get_vcp_reply`] for tests and simulators
pub fn encode_get_vcp_reply(code: u8, result: u8, reply: FeatureReply) -> [u8; 11] {
    let [max_hi, max_lo] = reply.max.to_be_bytes();
    let [cur_hi, cur_lo] = reply.current.to_be_bytes();
    let mut packet = [
        ddc::DEST_ADDRESS,
        ddc::LENGTH_FLAG | 8,
        ddc::GET_VCP_REPLY,
        result,
        code,
        0,
        max_hi,
        max_lo,
        cur_hi,
        cur_lo,
        0,
    ];
    packet[10] = checksum(ddc::REPLY_SEED, &packet[..10]);
    packet
}
