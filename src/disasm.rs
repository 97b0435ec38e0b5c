use crate::opcodes;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub offset: usize,
    pub opcode: u8,
    pub mnemonic: &'static str,
    // Truncated if the code ends early.
    pub immediate: Option<String>,
    pub gas: u64,
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04x}: {}", self.offset, self.mnemonic)?;
        if let Some(imm) = &self.immediate {
            write!(f, " {imm}")?;
        }
        Ok(())
    }
}

pub fn disassemble_hex(data: &str) -> Result<Vec<Instruction>, hex::FromHexError> {
    let data = data.trim();
    let code = hex::decode(data.strip_prefix("0x").unwrap_or(data))?;
    Ok(disassemble(&code))
}

pub fn disassemble(code: &[u8]) -> Vec<Instruction> {
    let mut out = Vec::new();
    let mut pc = 0usize;
    while pc < code.len() {
        let op = code[pc];
        let (mnemonic, gas, width) = match opcodes::info(op) {
            Some(i) => (i.name, i.gas, i.immediate),
            None => ("UNKNOWN", 0, 0),
        };
        let immediate = (width > 0).then(|| {
            let start = pc + 1;
            let end = (start + width).min(code.len());
            format!("0x{}", hex::encode(&code[start..end]))
        });
        out.push(Instruction { offset: pc, opcode: op, mnemonic, immediate, gas });
        pc += 1 + width;
    }
    out
}
