//! CRC validation for UHD frame table of contents.
//!
//! The FTOC of a synchronized UHD frame ends with a CRC-16 over everything
//! before it, so running the CRC over the complete FTOC leaves a zero residue.

const POLY: u16 = 0x1021;
const INIT: u16 = 0xFFFF;

/// Register value after shifting each byte value through eight steps.
const TABLE: [u16; 256] = build_table();

const fn build_table() -> [u16; 256] {
    let mut table = [0; 256];
    let mut byte = 0;
    while byte < table.len() {
        let mut reg = (byte as u16) << 8;
        let mut step = 0;
        while step < 8 {
            reg = if reg & 0x8000 != 0 {
                (reg << 1) ^ POLY
            } else {
                reg << 1
            };
            step += 1;
        }
        table[byte] = reg;
        byte += 1;
    }

    table
}

/// Running CRC-16/CCITT: polynomial 0x1021, register preset to 0xFFFF, no
/// reflection and no final XOR.
#[derive(Debug, Clone, Copy)]
pub struct Crc16Ccitt {
    reg: u16,
}

impl Default for Crc16Ccitt {
    fn default() -> Self {
        Self { reg: INIT }
    }
}

impl Crc16Ccitt {
    pub fn update(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            let index = (self.reg >> 8) as u8 ^ byte;
            self.reg = TABLE[index as usize] ^ (self.reg << 8);
        }
    }

    pub fn value(&self) -> u16 {
        self.reg
    }

    pub fn checksum(bytes: &[u8]) -> u16 {
        let mut crc = Self::default();
        crc.update(bytes);
        crc.value()
    }
}

#[test]
fn ccitt_check_value() {
    assert_eq!(Crc16Ccitt::checksum(b"123456789"), 0x29B1);

    let mut crc = Crc16Ccitt::default();
    crc.update(b"1234");
    crc.update(b"56789");
    assert_eq!(crc.value(), 0x29B1);
}

#[test]
fn appended_crc_leaves_zero_residue() {
    let mut data = vec![0x40, 0x41, 0x1B, 0xF2, 0x0F, 0x80, 0x12];
    let crc = Crc16Ccitt::checksum(&data);
    data.extend_from_slice(&crc.to_be_bytes());
    assert_eq!(Crc16Ccitt::checksum(&data), 0);
}
