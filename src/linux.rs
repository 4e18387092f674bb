//! Linux `i2c-dev` session: one open `/dev/i2c-N` node bound to one slave address.

use std::path::PathBuf;

use i2cdev::core::I2CDevice;
use i2cdev::linux::{LinuxI2CDevice, LinuxI2CError};
use log::debug;
use thiserror::Error;

use crate::cfg::{I2cAddress, InitError};
use crate::reg::Register;
use crate::RegisterBus;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("could not open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: LinuxI2CError,
    },
    #[error("could not bind slave address {address:#04x}: {source}")]
    Bind {
        address: u8,
        #[source]
        source: LinuxI2CError,
    },
    #[error("the I2C session is closed")]
    Closed,
    #[error("bus transfer failed: {0}")]
    Transfer(#[from] LinuxI2CError),
}

impl From<SessionError> for InitError<SessionError> {
    fn from(error: SessionError) -> Self {
        if matches!(error, SessionError::Bind { .. }) {
            InitError::AddressBindFailed(error)
        } else {
            InitError::BusOpenFailed(error)
        }
    }
}

/// Path of the character device for bus `bus`
pub fn device_path(bus: u8) -> PathBuf {
    PathBuf::from(format!("/dev/i2c-{bus}"))
}

/// Exclusively owned channel to a single device.
///
/// The node is released when the session is closed or dropped, whichever comes first;
/// the session cannot be cloned.
pub struct I2cSession {
    bus: u8,
    address: u8,
    device: Option<LinuxI2CDevice>,
}

impl I2cSession {
    /// Open `/dev/i2c-<bus>` and bind it to `address`
    pub fn open(bus: u8, address: impl Into<I2cAddress>) -> Result<Self, SessionError> {
        let address = address.into().get();
        let path = device_path(bus);

        // Opening the node yields an I/O error, the I2C_SLAVE ioctl an errno
        let device = LinuxI2CDevice::new(&path, u16::from(address)).map_err(|source| {
            match source {
                LinuxI2CError::Io(_) => SessionError::Open { path, source },
                source => SessionError::Bind { address, source },
            }
        })?;
        debug!("opened /dev/i2c-{bus} at {address:#04x}");

        Ok(Self {
            bus,
            address,
            device: Some(device),
        })
    }

    pub fn bus(&self) -> u8 {
        self.bus
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn is_open(&self) -> bool {
        self.device.is_some()
    }

    /// Release the node. Closing a closed session does nothing.
    pub fn close(&mut self) {
        if self.device.take().is_some() {
            debug!("closed /dev/i2c-{} at {:#04x}", self.bus, self.address);
        }
    }

    fn device(&mut self) -> Result<&mut LinuxI2CDevice, SessionError> {
        self.device.as_mut().ok_or(SessionError::Closed)
    }
}

impl RegisterBus for I2cSession {
    type Error = SessionError;

    fn write_register(&mut self, reg: Register, value: u8) -> Result<(), SessionError> {
        self.device()?.smbus_write_byte_data(reg.addr(), value)?;
        Ok(())
    }

    fn read_register(&mut self, reg: Register) -> Result<u8, SessionError> {
        Ok(self.device()?.smbus_read_byte_data(reg.addr())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn never_opened() -> I2cSession {
        I2cSession {
            bus: 1,
            address: 0x68,
            device: None,
        }
    }

    #[test]
    fn close_twice_is_noop() {
        let mut session = never_opened();
        session.close();
        session.close();
        assert!(!session.is_open());
    }

    #[test]
    fn closed_session_refuses_io() {
        let mut session = never_opened();
        assert!(matches!(
            session.read_register(Register::WhoAmI),
            Err(SessionError::Closed)
        ));
        assert!(matches!(
            session.write_register(Register::PwrMgmt1, 0),
            Err(SessionError::Closed)
        ));
    }

    #[test]
    fn path_follows_bus_index() {
        assert_eq!(device_path(0), PathBuf::from("/dev/i2c-0"));
        assert_eq!(device_path(1), PathBuf::from("/dev/i2c-1"));
    }

    #[test]
    fn missing_node_is_bus_open_failure() {
        let err = I2cSession::open(250, 0x68).err().expect("bus 250 should not exist");
        assert!(matches!(err, SessionError::Open { .. }));

        let err: InitError<SessionError> = err.into();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn bind_failure_maps_to_exit_code_two() {
        let source = LinuxI2CError::Io(std::io::Error::from(std::io::ErrorKind::Other));
        let err: InitError<SessionError> = SessionError::Bind {
            address: 0x69,
            source,
        }
        .into();
        assert!(matches!(err, InitError::AddressBindFailed(_)));
        assert_eq!(err.exit_code(), 2);
    }
}
