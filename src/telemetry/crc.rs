/// Incremental CRC-16/CCITT-FALSE: seed 0xFFFF, polynomial 0x1021, MSB first.
#[derive(Debug, Clone, Copy)]
pub struct Crc16 {
    crc: u16,
}

impl Default for Crc16 {
    fn default() -> Self {
        Self { crc: 0xFFFF }
    }
}

impl Crc16 {
    pub fn update(&mut self, data: &[u8]) {
        for &byte in data {
            self.crc ^= (byte as u16) << 8;
            for _ in 0..8 {
                if (self.crc & 0x8000) != 0 {
                    self.crc = (self.crc << 1) ^ 0x1021;
                } else {
                    self.crc <<= 1;
                }
            }
        }
    }

    pub fn value(&self) -> u16 {
        self.crc
    }
}

#[cfg(test)]
pub fn crc16_ccitt(data: &[u8]) -> u16 {
    let mut crc = Crc16::default();
    crc.update(data);
    crc.value()
}
