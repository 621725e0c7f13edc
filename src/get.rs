//! The `Get<T>` trait and its implementation in this module allows providing a single generic,
//! overloaded function `get<T>()` for all supported types of the store.

use crate::Eeprom;
use crate::error::Error;
use crate::platform::Platform;

pub trait Get<T> {
    fn get(&mut self, id: u16) -> Result<T, Error>;
}

impl<T, G: Get<T>> Get<T> for &mut G {
    fn get(&mut self, id: u16) -> Result<T, Error> {
        (*self).get(id)
    }
}

impl<T: Platform, const N: usize> Get<u16> for Eeprom<T, N> {
    fn get(&mut self, id: u16) -> Result<u16, Error> {
        self.read_variable(id)
    }
}

impl<T: Platform, const N: usize> Get<i16> for Eeprom<T, N> {
    fn get(&mut self, id: u16) -> Result<i16, Error> {
        let value = self.read_variable(id)?;
        Ok(value.cast_signed())
    }
}

impl<T: Platform, const N: usize> Get<u8> for Eeprom<T, N> {
    fn get(&mut self, id: u16) -> Result<u8, Error> {
        let value = self.read_variable(id)?;
        u8::try_from(value).map_err(|_| Error::ValueOutOfRange)
    }
}

impl<T: Platform, const N: usize> Get<i8> for Eeprom<T, N> {
    fn get(&mut self, id: u16) -> Result<i8, Error> {
        let value = self.read_variable(id)?;
        i8::try_from(value.cast_signed()).map_err(|_| Error::ValueOutOfRange)
    }
}

impl<T: Platform, const N: usize> Get<bool> for Eeprom<T, N> {
    fn get(&mut self, id: u16) -> Result<bool, Error> {
        let value = self.read_variable(id)?;
        Ok(value != 0)
    }
}
