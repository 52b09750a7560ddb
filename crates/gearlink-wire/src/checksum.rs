//! Frame checksum: XOR over the raw bytes from the start marker through the
//! last payload byte.

/// XOR of every byte in `bytes`.
pub fn xor_checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, b| acc ^ b)
}

/// Running XOR, fed in wire order.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct XorChecksum(u8);

impl XorChecksum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.0 ^= xor_checksum(bytes);
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_zero() {
        assert_eq!(xor_checksum(&[]), 0);
    }

    #[test]
    fn oil_temperature_frame_checksum() {
        // AA 10 04 00 00 70 42
        assert_eq!(xor_checksum(&[0xAA, 0x10, 0x04, 0x00, 0x00, 0x70, 0x42]), 0x8C);
    }

    #[test]
    fn running_checksum_matches_one_shot() {
        let mut running = XorChecksum::new();
        running.update(&[0xAA]);
        running.update(&[0x20, 0x02]);
        running.update(&[0x20, 0x03]);
        assert_eq!(running.value(), xor_checksum(&[0xAA, 0x20, 0x02, 0x20, 0x03]));
        assert_eq!(running.value(), 0xAB);
    }
}
