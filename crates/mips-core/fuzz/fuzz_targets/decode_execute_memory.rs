#![no_main]

use libfuzzer_sys::fuzz_target;
use mips_core::{
    disassemble_word, validate_alignment, AccessWidth, CoreConfig, Decoder, Simulator, DATA_START,
    TEXT_START,
};

fuzz_target!(|data: &[u8]| {
    if data.len() < 8 {
        return;
    }

    let word = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    let operand = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);

    let decoded = Decoder::decode(word);
    assert_eq!(decoded.encode(), word);
    let _ = decoded.operation();
    let _ = disassemble_word(TEXT_START, word);

    let program: Vec<u32> = data
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();
    let mut sim = Simulator::new(CoreConfig::default());
    if sim.load(&program).is_err() {
        return;
    }
    for index in 1..32 {
        let _ = sim.write_register(index, operand.rotate_left(index as u32));
    }
    let _ = sim.write_register(29, DATA_START + 0x100);
    let _ = sim.run(64);
    assert_eq!(sim.read_register(0), Ok(0));

    for width in [AccessWidth::Byte, AccessWidth::Half, AccessWidth::Word] {
        let _ = validate_alignment(operand, width);
    }
});
