use crate::Eeprom;
use crate::error::Error;
use crate::platform::Platform;

pub trait Set<T> {
    fn set(&mut self, id: u16, value: T) -> Result<(), Error>;
}

impl<T, S: Set<T>> Set<T> for &mut S {
    fn set(&mut self, id: u16, value: T) -> Result<(), Error> {
        (*self).set(id, value)
    }
}

impl<T: Platform, const N: usize> Set<u16> for Eeprom<T, N> {
    fn set(&mut self, id: u16, value: u16) -> Result<(), Error> {
        self.write_variable(id, value)
    }
}

impl<T: Platform, const N: usize> Set<i16> for Eeprom<T, N> {
    fn set(&mut self, id: u16, value: i16) -> Result<(), Error> {
        self.write_variable(id, value.cast_unsigned())
    }
}

impl<T: Platform, const N: usize> Set<u8> for Eeprom<T, N> {
    fn set(&mut self, id: u16, value: u8) -> Result<(), Error> {
        self.write_variable(id, value.into())
    }
}

// sign extended, so `Get<i16>` reads back the same number
impl<T: Platform, const N: usize> Set<i8> for Eeprom<T, N> {
    fn set(&mut self, id: u16, value: i8) -> Result<(), Error> {
        self.write_variable(id, i16::from(value).cast_unsigned())
    }
}

impl<T: Platform, const N: usize> Set<bool> for Eeprom<T, N> {
    fn set(&mut self, id: u16, value: bool) -> Result<(), Error> {
        self.write_variable(id, value.into())
    }
}
