/*
 * funct7 Decoding
 *
 * The SAGE instructions share one custom opcode and are told apart by the
 * funct7 field. The bits are orthogonal:
 *
 *   bit 6      QUEUE (0) / MEMORY (1)
 *   bits 5..4  reserved
 *   bit 3      PUT
 *   bit 2      WAIT
 *   bit 1      GET
 *   bit 0      POLL
 *
 * Exactly one of PUT/WAIT/GET/POLL must be set. Whether a QUEUE
 * WAIT/GET/POLL addresses one source or "any" is not encoded in funct7: it
 * follows from whether the instruction reads rs1.
 */

use bitflags::bitflags;

use super::Operation;
use crate::error::DecodeError;
use crate::types::CoreId;

bitflags! {
    /// funct7 flags of the SAGE custom instruction
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Funct: u8 {
        const POLL = 1;
        const GET = 1 << 1;
        const WAIT = 1 << 2;
        const PUT = 1 << 3;
        // 4 and 5 are reserved
        const MEMORY = 1 << 6;
    }
}

impl Funct {
    const VERBS: Funct = Funct::PUT.union(Funct::WAIT).union(Funct::GET).union(Funct::POLL);
}

fn core_operand(value: u64) -> Result<CoreId, DecodeError> {
    u32::try_from(value)
        .map(CoreId)
        .map_err(|_| DecodeError::OperandOutOfRange(value))
}

impl Operation {
    /// Decode a raw funct7 and the register operands the instruction read
    ///
    /// `rs1` carries the destination (PUT) or source (specific WAIT/GET/POLL),
    /// `rs2` carries the PUT payload.
    pub fn decode(
        funct7: u8,
        rs1: Option<u64>,
        rs2: Option<u64>,
    ) -> Result<Operation, DecodeError> {
        let funct = Funct::from_bits(funct7).ok_or(DecodeError::UnknownFunct(funct7))?;
        let verb = funct.intersection(Funct::VERBS);
        if verb.bits().count_ones() != 1 {
            return Err(DecodeError::UnknownFunct(funct7));
        }
        let memory = funct.contains(Funct::MEMORY);

        let op = if verb == Funct::PUT {
            let dest = core_operand(rs1.ok_or(DecodeError::MissingOperand("rs1"))?)?;
            let data = rs2.ok_or(DecodeError::MissingOperand("rs2"))?;
            if memory {
                Operation::MPut { dest, data }
            } else {
                Operation::QPut { dest, data }
            }
        } else if memory {
            // MEMORY forms never address a source; rs1 is ignored.
            if verb == Funct::WAIT {
                Operation::MWait
            } else if verb == Funct::GET {
                Operation::MGet
            } else {
                Operation::MPoll
            }
        } else {
            let source = rs1.map(core_operand).transpose()?;
            if verb == Funct::WAIT {
                source.map_or(Operation::QWaitAny, |source| Operation::QWait { source })
            } else if verb == Funct::GET {
                source.map_or(Operation::QGetAny, |source| Operation::QGet { source })
            } else {
                source.map_or(Operation::QPollAny, |source| Operation::QPoll { source })
            }
        };
        Ok(op)
    }

    /// funct7 encoding of this operation
    pub fn funct(&self) -> Funct {
        match self {
            Operation::QPut { .. } => Funct::PUT,
            Operation::QWaitAny | Operation::QWait { .. } => Funct::WAIT,
            Operation::QGetAny | Operation::QGet { .. } => Funct::GET,
            Operation::QPollAny | Operation::QPoll { .. } => Funct::POLL,
            Operation::MPut { .. } => Funct::MEMORY | Funct::PUT,
            Operation::MWait => Funct::MEMORY | Funct::WAIT,
            Operation::MGet => Funct::MEMORY | Funct::GET,
            Operation::MPoll => Funct::MEMORY | Funct::POLL,
        }
    }
}
