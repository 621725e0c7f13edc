#![allow(dead_code)]

// filename according to https://doc.rust-lang.org/book/ch11-03-test-organization.html
use embedded_storage::nor_flash::{
    ErrorType, MultiwriteNorFlash, NorFlash, NorFlashError, NorFlashErrorKind, ReadNorFlash,
};
use flash_eeprom::config::{Config, EraseMode};
use flash_eeprom::platform::NorFlashPlatform;

// Small pages keep page transfers frequent: 15 records per page.
pub const PAGE_SIZE: usize = 64;
pub const WORD_SIZE: usize = 4;
pub const CAPACITY: usize = PAGE_SIZE / WORD_SIZE - 1;

pub const PAGE0: u32 = 0;
pub const PAGE1: u32 = PAGE_SIZE as u32;

pub const STATUS_ERASED: u16 = 0xFFFF;
pub const STATUS_RECEIVING: u16 = 0xEEEE;
pub const STATUS_ACTIVE: u16 = 0x0000;

pub const IDS: [u16; 5] = [0, 1, 2, 3, 4];

pub type TestPlatform = NorFlashPlatform<Flash>;

pub fn config() -> Config {
    Config::new(PAGE0, 0, PAGE_SIZE as u32, EraseMode::ByAddress)
}

pub fn platform() -> TestPlatform {
    NorFlashPlatform::new(Flash::new(2), PAGE_SIZE as u32)
}

#[derive(Default, Clone)]
pub struct Flash {
    pub buf: Vec<u8>,
    pub fail_after_operation: usize,
    pub operations: Vec<Operation>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Operation {
    Read { offset: u32, len: usize },
    Write { offset: u32, len: usize },
    Erase { offset: u32, len: usize },
}

impl Flash {
    pub fn new(pages: usize) -> Self {
        Self {
            buf: vec![0xffu8; PAGE_SIZE * pages],
            fail_after_operation: usize::MAX,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Every operation from the `n`-th one on fails, as if the power was cut.
    pub fn fail_after(&mut self, n: usize) {
        self.fail_after_operation = self.operations.len() + n;
    }

    pub fn disable_faults(&mut self) {
        self.fail_after_operation = usize::MAX;
    }

    pub fn erases(&self) -> usize {
        self.operations
            .iter()
            .filter(|op| matches!(op, Operation::Erase { .. }))
            .count()
    }

    pub fn writes(&self) -> usize {
        self.operations
            .iter()
            .filter(|op| matches!(op, Operation::Write { .. }))
            .count()
    }

    pub fn halfword(&self, address: u32) -> u16 {
        let address = address as usize;
        u16::from_le_bytes([self.buf[address], self.buf[address + 1]])
    }

    pub fn status(&self, page: u32) -> u16 {
        self.halfword(page)
    }

    /// The `n`-th record of a page as `(value, id)`.
    pub fn record(&self, page: u32, n: usize) -> (u16, u16) {
        let address = page + ((n + 1) * WORD_SIZE) as u32;
        (self.halfword(address), self.halfword(address + 2))
    }

    pub fn is_erased(&self, page: u32) -> bool {
        let page = page as usize;
        self.buf[page..page + PAGE_SIZE].iter().all(|&b| b == 0xff)
    }

    /// Programs flash content directly, bypassing the operation log.
    pub fn program(&mut self, address: u32, value: u16) {
        let address = address as usize;
        for (i, byte) in value.to_le_bytes().into_iter().enumerate() {
            self.buf[address + i] &= byte;
        }
    }

    pub fn program_record(&mut self, page: u32, n: usize, id: u16, value: u16) {
        let address = page + ((n + 1) * WORD_SIZE) as u32;
        self.program(address, value);
        self.program(address + 2, id);
    }

    pub fn dump_operations(&self) {
        println!("Operations:");
        for op in &self.operations {
            println!("  {:?}", op);
        }
    }
}

#[derive(Debug)]
pub struct FlashError;

impl NorFlashError for FlashError {
    fn kind(&self) -> NorFlashErrorKind {
        NorFlashErrorKind::Other
    }
}

impl ErrorType for Flash {
    type Error = FlashError;
}

impl ReadNorFlash for Flash {
    const READ_SIZE: usize = WORD_SIZE;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        assert!(offset.is_multiple_of(Self::READ_SIZE as _));

        if self.operations.len() >= self.fail_after_operation {
            println!("    flash: FAULT");
            return Err(FlashError);
        }
        self.operations.push(Operation::Read {
            offset,
            len: bytes.len(),
        });

        let offset = offset as usize;
        bytes.copy_from_slice(&self.buf[offset..offset + bytes.len()]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.buf.len()
    }
}

impl NorFlash for Flash {
    const WRITE_SIZE: usize = WORD_SIZE;

    const ERASE_SIZE: usize = PAGE_SIZE;

    fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        assert!(from.is_multiple_of(Self::ERASE_SIZE as _));
        assert!(to.is_multiple_of(Self::ERASE_SIZE as _));
        assert!(to as usize <= self.buf.len());

        println!(
            "    flash: erase: {from:04X} - {to:04X} #{:>2}",
            self.operations.len()
        );

        if self.operations.len() >= self.fail_after_operation {
            println!("    flash: FAULT");
            return Err(FlashError);
        }

        self.operations.push(Operation::Erase {
            offset: from,
            len: (to - from) as usize,
        });

        for addr in from..to {
            self.buf[addr as usize] = 0xff;
        }
        Ok(())
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        assert!(offset.is_multiple_of(Self::WRITE_SIZE as _));
        assert!(bytes.len().is_multiple_of(Self::WRITE_SIZE as _));

        println!(
            "    flash: write: 0x{offset:04X}[0x{:04X}] #{:>2}",
            bytes.len(),
            self.operations.len()
        );

        if self.operations.len() >= self.fail_after_operation {
            println!("    flash: FAULT");
            return Err(FlashError);
        }
        assert!(!bytes.is_empty());

        self.operations.push(Operation::Write {
            offset,
            len: bytes.len(),
        });

        let offset = offset as usize;
        for (i, &val) in bytes.iter().enumerate() {
            // flash bits can only be flipped from 1 to 0
            self.buf[offset + i] &= val;
        }
        Ok(())
    }
}

impl MultiwriteNorFlash for Flash {}
