use thiserror::Error;

/// Process exit code for a run that finished without a driver error
pub const CLEAN_EXIT: i32 = 0;

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Index `N` of the `/dev/i2c-N` node the device lives on
    pub bus: u8,
    pub address: I2cAddress,
    pub clock: ClockSource,
    pub gyr_range: GyrRange,
    pub acc_range: AccRange,
    /// Enable DATA_RDY_EN so `data_ready()` can be polled
    pub data_ready: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bus: 1,
            address: I2cAddress::X68,
            clock: ClockSource::Internal8MHz,
            gyr_range: GyrRange::Dps500,
            acc_range: AccRange::Gs2,
            data_ready: false,
        }
    }
}

impl Config {
    /// Select the `/dev/i2c-N` bus; older Raspberry Pi boards (rev 0) expose the header on bus 0
    #[must_use]
    pub fn bus(self, bus: u8) -> Self {
        Self { bus, ..self }
    }

    /// Set I2C address of the module. See `I2cAddress` for defaults, otherwise `u8` implements `Into<I2cAddress>`
    #[must_use]
    pub fn address(self, address: impl Into<I2cAddress>) -> Self {
        Self {
            address: address.into(),
            ..self
        }
    }

    #[must_use]
    pub fn clock(self, clock: ClockSource) -> Self {
        Self { clock, ..self }
    }

    /// Set gyroscope measuring range, choises are 250Dps, 500Dps, 1000Dps and 2000Dps
    #[must_use]
    pub fn gyr_range(self, gyr_range: GyrRange) -> Self {
        Self { gyr_range, ..self }
    }

    /// Set accelerometer measuring range, choises are 2G, 4G, 8G or 16G
    #[must_use]
    pub fn acc_range(self, acc_range: AccRange) -> Self {
        Self { acc_range, ..self }
    }

    #[must_use]
    pub fn data_ready(self, data_ready: bool) -> Self {
        Self { data_ready, ..self }
    }

    /// Reject parameters the device cannot be driven with
    pub fn validate<E>(&self) -> Result<(), InitError<E>> {
        if self.address.get() > 0x7F {
            return Err(InitError::InvalidParameter);
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum I2cAddress {
    /// `0x68` is the address when pin `AD0` is low
    #[default]
    X68,
    /// `0x69` is the address when pin `AD0` is high
    X69,
    /// In case the module sits behind a translator or a different address
    Any(u8),
}

impl From<u8> for I2cAddress {
    fn from(address: u8) -> Self {
        match address {
            0x68 => I2cAddress::X68,
            0x69 => I2cAddress::X69,
            a => I2cAddress::Any(a),
        }
    }
}

impl I2cAddress {
    pub const fn get(&self) -> u8 {
        match self {
            I2cAddress::X68 => 0x68,
            I2cAddress::X69 => 0x69,
            I2cAddress::Any(a) => *a,
        }
    }
}

/// Clock source selected through `CLKSEL` in PWR_MGMT_1
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ClockSource {
    #[default]
    Internal8MHz = 0,
    PllGyroX = 1,
    PllGyroY = 2,
    PllGyroZ = 3,
    External32kHz = 4,
    External19MHz = 5,
    /// Stops the clock and keeps the timing generator in reset
    Stop = 7,
}

impl TryFrom<u8> for ClockSource {
    type Error = InvalidTier;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Internal8MHz,
            1 => Self::PllGyroX,
            2 => Self::PllGyroY,
            3 => Self::PllGyroZ,
            4 => Self::External32kHz,
            5 => Self::External19MHz,
            7 => Self::Stop,
            other => return Err(InvalidTier(other)),
        })
    }
}

/// Range / sentivity of gyroscope in degrees/second
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GyrRange {
    Dps250 = 0b00,
    #[default]
    Dps500 = 0b01,
    Dps1000 = 0b10,
    Dps2000 = 0b11,
}

impl GyrRange {
    /// LSB per degree/second
    pub const fn divisor(self) -> f32 {
        match self {
            Self::Dps250 => 131.0,
            Self::Dps500 => 65.5,
            Self::Dps1000 => 32.8,
            Self::Dps2000 => 16.4,
        }
    }
}

impl TryFrom<u8> for GyrRange {
    type Error = InvalidTier;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Dps250,
            1 => Self::Dps500,
            2 => Self::Dps1000,
            3 => Self::Dps2000,
            other => return Err(InvalidTier(other)),
        })
    }
}

/// Range / sensitivity of accelerometer in Gs
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AccRange {
    #[default]
    Gs2 = 0b00,
    Gs4 = 0b01,
    Gs8 = 0b10,
    Gs16 = 0b11,
}

impl AccRange {
    /// LSB per g
    pub const fn divisor(self) -> f32 {
        match self {
            Self::Gs2 => 16384.0,
            Self::Gs4 => 8192.0,
            Self::Gs8 => 4096.0,
            Self::Gs16 => 2048.0,
        }
    }
}

impl TryFrom<u8> for AccRange {
    type Error = InvalidTier;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Gs2,
            1 => Self::Gs4,
            2 => Self::Gs8,
            3 => Self::Gs16,
            other => return Err(InvalidTier(other)),
        })
    }
}

/// Digital low-pass filter shared by accelerometer and gyroscope (`DLPF_CFG`)
///
/// Named after the accelerometer bandwidth; the gyroscope bandwidth is within a few Hz.
/// Every setting but `Hz260` drops the gyroscope output rate from 8 kHz to 1 kHz.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Dlpf {
    Hz260 = 0,
    Hz184 = 1,
    Hz94 = 2,
    Hz44 = 3,
    Hz21 = 4,
    Hz10 = 5,
    Hz5 = 6,
}

/// A raw selector outside the values documented for the register field
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
#[error("{0} is not a valid selector for this register field")]
pub struct InvalidTier(pub u8);

impl<E> From<InvalidTier> for InitError<E> {
    fn from(_: InvalidTier) -> Self {
        InitError::InvalidParameter
    }
}

/// Failures while bringing the device into a known configuration
///
/// Each kind maps to a distinct process exit code through [`InitError::exit_code`],
/// so applications that terminate on a failed setup keep a stable contract.
#[derive(Debug, Error)]
pub enum InitError<E> {
    /// The bus device node could not be opened
    #[error("could not open the I2C bus: {0:?}")]
    BusOpenFailed(E),
    /// The bus was opened but the device address could not be bound
    #[error("could not bind the device address: {0:?}")]
    AddressBindFailed(E),
    /// Writing PWR_MGMT_1 failed, the device is likely dead or miswired
    #[error("could not write the power management register: {0:?}")]
    PowerConfigFailed(E),
    #[error("could not configure the gyroscope: {0:?}")]
    GyroConfigFailed(E),
    #[error("could not configure the accelerometer: {0:?}")]
    AccelConfigFailed(E),
    #[error("could not enable the data ready flag: {0:?}")]
    InterruptSetupFailed(E),
    #[error("invalid initialization parameter")]
    InvalidParameter,
}

impl<E> InitError<E> {
    pub const fn exit_code(&self) -> i32 {
        match self {
            InitError::BusOpenFailed(_) => 1,
            InitError::AddressBindFailed(_) => 2,
            InitError::PowerConfigFailed(_) => 3,
            InitError::GyroConfigFailed(_) => 4,
            InitError::AccelConfigFailed(_) => 5,
            InitError::InterruptSetupFailed(_) => 6,
            InitError::InvalidParameter => 7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gyr_divisors_match_datasheet() {
        let table = [
            (GyrRange::Dps250, 131.0),
            (GyrRange::Dps500, 65.5),
            (GyrRange::Dps1000, 32.8),
            (GyrRange::Dps2000, 16.4),
        ];
        for (range, divisor) in table {
            assert_eq!(range.divisor(), divisor);
        }
        assert_eq!(6550.0 / GyrRange::Dps500.divisor(), 100.0);
    }

    #[test]
    fn acc_divisors_match_datasheet() {
        let table = [
            (AccRange::Gs2, 16384.0),
            (AccRange::Gs4, 8192.0),
            (AccRange::Gs8, 4096.0),
            (AccRange::Gs16, 2048.0),
        ];
        for (range, divisor) in table {
            assert_eq!(range.divisor(), divisor);
        }
        assert_eq!(16384.0 / AccRange::Gs2.divisor(), 1.0);
    }

    #[test]
    fn raw_selectors_convert() {
        assert_eq!(GyrRange::try_from(2), Ok(GyrRange::Dps1000));
        assert_eq!(AccRange::try_from(3), Ok(AccRange::Gs16));
        assert_eq!(ClockSource::try_from(5), Ok(ClockSource::External19MHz));
        assert_eq!(GyrRange::try_from(4), Err(InvalidTier(4)));
        assert_eq!(AccRange::try_from(9), Err(InvalidTier(9)));
        assert_eq!(ClockSource::try_from(6), Err(InvalidTier(6)));
    }

    #[test]
    fn invalid_tier_is_a_parameter_error() {
        let err: InitError<()> = InvalidTier(4).into();
        assert!(matches!(err, InitError::InvalidParameter));
        assert_eq!(err.exit_code(), 7);
    }

    #[test]
    fn defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.bus, 1);
        assert_eq!(cfg.address.get(), 0x68);
        assert_eq!(cfg.clock, ClockSource::Internal8MHz);
        assert_eq!(cfg.gyr_range, GyrRange::Dps500);
        assert_eq!(cfg.acc_range, AccRange::Gs2);
        assert!(!cfg.data_ready);
    }

    #[test]
    fn address_from_u8() {
        assert_eq!(I2cAddress::from(0x68), I2cAddress::X68);
        assert_eq!(I2cAddress::from(0x69), I2cAddress::X69);
        assert_eq!(I2cAddress::from(0x2A), I2cAddress::Any(0x2A));
    }

    #[test]
    fn validate_rejects_wide_address() {
        assert!(Config::default().address(0x69).validate::<()>().is_ok());
        let err = Config::default().address(0x80).validate::<()>().unwrap_err();
        assert!(matches!(err, InitError::InvalidParameter));
    }

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [
            InitError::BusOpenFailed(()).exit_code(),
            InitError::AddressBindFailed(()).exit_code(),
            InitError::PowerConfigFailed(()).exit_code(),
            InitError::GyroConfigFailed(()).exit_code(),
            InitError::AccelConfigFailed(()).exit_code(),
            InitError::InterruptSetupFailed(()).exit_code(),
            InitError::<()>::InvalidParameter.exit_code(),
        ];
        assert_eq!(codes, [1, 2, 3, 4, 5, 6, 7]);
        assert!(!codes.contains(&CLEAN_EXIT));
    }
}
