// Opcode names and static base gas (Istanbul schedule) for the bytecode explorer
// and the gas profile. Nothing here executes anything.

pub const STOP: u8 = 0x00;
pub const PUSH0: u8 = 0x5F;
pub const PUSH1: u8 = 0x60;
pub const PUSH32: u8 = 0x7F;
pub const DUP1: u8 = 0x80;
pub const DUP16: u8 = 0x8F;
pub const SWAP1: u8 = 0x90;
pub const SWAP16: u8 = 0x9F;
pub const LOG0: u8 = 0xA0;
pub const LOG4: u8 = 0xA4;

const PUSH_NAMES: [&str; 32] = [
    "PUSH1", "PUSH2", "PUSH3", "PUSH4", "PUSH5", "PUSH6", "PUSH7", "PUSH8",
    "PUSH9", "PUSH10", "PUSH11", "PUSH12", "PUSH13", "PUSH14", "PUSH15", "PUSH16",
    "PUSH17", "PUSH18", "PUSH19", "PUSH20", "PUSH21", "PUSH22", "PUSH23", "PUSH24",
    "PUSH25", "PUSH26", "PUSH27", "PUSH28", "PUSH29", "PUSH30", "PUSH31", "PUSH32",
];
const DUP_NAMES: [&str; 16] = [
    "DUP1", "DUP2", "DUP3", "DUP4", "DUP5", "DUP6", "DUP7", "DUP8",
    "DUP9", "DUP10", "DUP11", "DUP12", "DUP13", "DUP14", "DUP15", "DUP16",
];
const SWAP_NAMES: [&str; 16] = [
    "SWAP1", "SWAP2", "SWAP3", "SWAP4", "SWAP5", "SWAP6", "SWAP7", "SWAP8",
    "SWAP9", "SWAP10", "SWAP11", "SWAP12", "SWAP13", "SWAP14", "SWAP15", "SWAP16",
];
const LOG_NAMES: [&str; 5] = ["LOG0", "LOG1", "LOG2", "LOG3", "LOG4"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpInfo {
    pub name: &'static str,
    pub gas: u64,
    pub immediate: usize,
}

impl OpInfo {
    const fn plain(name: &'static str, gas: u64) -> Self {
        Self { name, gas, immediate: 0 }
    }
}

pub fn info(op: u8) -> Option<OpInfo> {
    let plain = OpInfo::plain;
    let i = match op {
        STOP => plain("STOP", 0),
        0x01 => plain("ADD", 3),
        0x02 => plain("MUL", 5),
        0x03 => plain("SUB", 3),
        0x04 => plain("DIV", 5),
        0x05 => plain("SDIV", 5),
        0x06 => plain("MOD", 5),
        0x07 => plain("SMOD", 5),
        0x08 => plain("ADDMOD", 8),
        0x09 => plain("MULMOD", 8),
        0x0A => plain("EXP", 10),
        0x0B => plain("SIGNEXTEND", 5),
        0x10 => plain("LT", 3),
        0x11 => plain("GT", 3),
        0x12 => plain("SLT", 3),
        0x13 => plain("SGT", 3),
        0x14 => plain("EQ", 3),
        0x15 => plain("ISZERO", 3),
        0x16 => plain("AND", 3),
        0x17 => plain("OR", 3),
        0x18 => plain("XOR", 3),
        0x19 => plain("NOT", 3),
        0x1A => plain("BYTE", 3),
        0x1B => plain("SHL", 3),
        0x1C => plain("SHR", 3),
        0x1D => plain("SAR", 3),
        0x20 => plain("SHA3", 30),
        0x30 => plain("ADDRESS", 2),
        0x31 => plain("BALANCE", 700),
        0x32 => plain("ORIGIN", 2),
        0x33 => plain("CALLER", 2),
        0x34 => plain("CALLVALUE", 2),
        0x35 => plain("CALLDATALOAD", 3),
        0x36 => plain("CALLDATASIZE", 2),
        0x37 => plain("CALLDATACOPY", 3),
        0x38 => plain("CODESIZE", 2),
        0x39 => plain("CODECOPY", 3),
        0x3A => plain("GASPRICE", 2),
        0x3B => plain("EXTCODESIZE", 700),
        0x3C => plain("EXTCODECOPY", 700),
        0x3D => plain("RETURNDATASIZE", 2),
        0x3E => plain("RETURNDATACOPY", 3),
        0x3F => plain("EXTCODEHASH", 700),
        0x40 => plain("BLOCKHASH", 20),
        0x41 => plain("COINBASE", 2),
        0x42 => plain("TIMESTAMP", 2),
        0x43 => plain("NUMBER", 2),
        0x44 => plain("PREVRANDAO", 2),
        0x45 => plain("GASLIMIT", 2),
        0x46 => plain("CHAINID", 2),
        0x47 => plain("SELFBALANCE", 5),
        0x48 => plain("BASEFEE", 2),
        0x50 => plain("POP", 2),
        0x51 => plain("MLOAD", 3),
        0x52 => plain("MSTORE", 3),
        0x53 => plain("MSTORE8", 3),
        0x54 => plain("SLOAD", 800),
        0x55 => plain("SSTORE", 5000),
        0x56 => plain("JUMP", 8),
        0x57 => plain("JUMPI", 10),
        0x58 => plain("PC", 2),
        0x59 => plain("MSIZE", 2),
        0x5A => plain("GAS", 2),
        0x5B => plain("JUMPDEST", 1),
        PUSH0 => plain("PUSH0", 2),
        x if (PUSH1..=PUSH32).contains(&x) => {
            let n = usize::from(x - PUSH1);
            OpInfo { name: PUSH_NAMES[n], gas: 3, immediate: n + 1 }
        }
        x if (DUP1..=DUP16).contains(&x) => plain(DUP_NAMES[usize::from(x - DUP1)], 3),
        x if (SWAP1..=SWAP16).contains(&x) => plain(SWAP_NAMES[usize::from(x - SWAP1)], 3),
        x if (LOG0..=LOG4).contains(&x) => {
            let n = u64::from(x - LOG0);
            plain(LOG_NAMES[usize::from(x - LOG0)], 375 + 375 * n)
        }
        0xF0 => plain("CREATE", 32000),
        0xF1 => plain("CALL", 700),
        0xF2 => plain("CALLCODE", 700),
        0xF3 => plain("RETURN", 0),
        0xF4 => plain("DELEGATECALL", 700),
        0xF5 => plain("CREATE2", 32000),
        0xFA => plain("STATICCALL", 700),
        0xFD => plain("REVERT", 0),
        0xFE => plain("INVALID", 0),
        0xFF => plain("SELFDESTRUCT", 5000),
        _ => return None,
    };
    Some(i)
}

pub fn gas_of(mnemonic: &str) -> Option<u64> {
    (0..=u8::MAX).filter_map(info).find(|i| i.name.eq_ignore_ascii_case(mnemonic)).map(|i| i.gas)
}
