use core::fmt::Debug;
use embedded_hal::i2c::I2c;

use crate::cfg::I2cAddress;
use crate::reg::Register;

/// Register-level access to a device that is already bound on its bus
pub trait RegisterBus {
    type Error: Debug;

    /// Write a single byte to the requested register
    fn write_register(&mut self, reg: Register, value: u8) -> Result<(), Self::Error>;

    /// Read a single byte from the requested register
    fn read_register(&mut self, reg: Register) -> Result<u8, Self::Error>;
}

impl<B: RegisterBus + ?Sized> RegisterBus for &mut B {
    type Error = B::Error;

    fn write_register(&mut self, reg: Register, value: u8) -> Result<(), Self::Error> {
        B::write_register(self, reg, value)
    }

    fn read_register(&mut self, reg: Register) -> Result<u8, Self::Error> {
        B::read_register(self, reg)
    }
}

// Type to hold bus information for any blocking embedded-hal I2c
pub struct I2cBus<I2C> {
    bus_inner: I2C,
    address: I2cAddress,
}

impl<I2C: I2c> I2cBus<I2C> {
    pub fn new(bus: I2C, address: impl Into<I2cAddress>) -> Self {
        Self {
            bus_inner: bus,
            address: address.into(),
        }
    }

    pub fn address(&self) -> u8 {
        self.address.get()
    }

    /// Releases the underlying bus back to the user
    #[must_use]
    pub fn destroy(self) -> I2C {
        self.bus_inner
    }
}

impl<I2C: I2c> RegisterBus for I2cBus<I2C> {
    type Error = I2C::Error;

    fn write_register(&mut self, reg: Register, value: u8) -> Result<(), Self::Error> {
        self.bus_inner.write(self.address.get(), &[reg.addr(), value])
    }

    fn read_register(&mut self, reg: Register) -> Result<u8, Self::Error> {
        let mut buf = [0u8; 1];
        self.bus_inner
            .write_read(self.address.get(), &[reg.addr()], &mut buf)?;
        Ok(buf[0])
    }
}

/// Reads a signed 16-bit quantity split over a high and a low byte register.
///
/// Both halves are always requested; if either fails the whole value fails.
pub fn read_i16<B>(bus: &mut B, msb: Register, lsb: Register) -> Result<i16, B::Error>
where
    B: RegisterBus + ?Sized,
{
    let high = bus.read_register(msb);
    let low = bus.read_register(lsb);
    Ok(combine(high?, low?))
}

/// Two's-complement combination of a register pair
pub const fn combine(msb: u8, lsb: u8) -> i16 {
    i16::from_be_bytes([msb, lsb])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combines_big_endian() {
        assert_eq!(combine(0x01, 0x90), 400);
        assert_eq!(combine(0x00, 0x00), 0);
        assert_eq!(combine(0x7F, 0xFF), i16::MAX);
    }

    #[test]
    fn combines_signed() {
        assert_eq!(combine(0xFF, 0xFF), -1);
        assert_eq!(combine(0x80, 0x00), i16::MIN);
        assert_eq!(combine(0xE6, 0x66), -6554);
    }

    struct Pair {
        high: Result<u8, ()>,
        low: Result<u8, ()>,
        reads: usize,
    }

    impl RegisterBus for Pair {
        type Error = ();

        fn write_register(&mut self, _: Register, _: u8) -> Result<(), ()> {
            Ok(())
        }

        fn read_register(&mut self, reg: Register) -> Result<u8, ()> {
            self.reads += 1;
            match reg {
                Register::GyroXoutH => self.high,
                _ => self.low,
            }
        }
    }

    #[test]
    fn read_i16_reads_both_halves() {
        let mut bus = Pair {
            high: Ok(0x01),
            low: Ok(0x90),
            reads: 0,
        };
        assert_eq!(
            read_i16(&mut bus, Register::GyroXoutH, Register::GyroXoutL),
            Ok(400)
        );
        assert_eq!(bus.reads, 2);
    }

    #[test]
    fn read_i16_fails_if_either_half_fails() {
        let mut bus = Pair {
            high: Err(()),
            low: Ok(0x90),
            reads: 0,
        };
        assert!(read_i16(&mut bus, Register::GyroXoutH, Register::GyroXoutL).is_err());
        assert_eq!(bus.reads, 2);

        let mut bus = Pair {
            high: Ok(0x01),
            low: Err(()),
            reads: 0,
        };
        assert!(read_i16(&mut bus, Register::GyroXoutH, Register::GyroXoutL).is_err());
    }
}
