/*!
cpu::mod - Public facade for the 6502 instruction-set layer.

Structure:

```text
addressing.rs - Addressing mode enum, operand sizes and text formats,
                static target resolution.
table.rs      - Opcode metadata table (151 documented opcodes) and
                instruction categories.
```

This layer is purely descriptive: it knows what each opcode *is*, not how
to execute it. All decoding state lives in the disassembler and function
tracer, which consume these tables read-only.
*/

pub mod addressing;
pub mod table;

pub use addressing::AddressingMode;
pub use table::{opcode_info, InstructionCategory, InstructionInfo};
