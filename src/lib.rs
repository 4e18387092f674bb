#![cfg_attr(not(feature = "std"), no_std)]

use core::fmt;
use embedded_hal::i2c::I2c;
use log::{debug, info, warn};
use nalgebra::Vector3;

mod bus;
mod cfg;
#[cfg(feature = "linux")]
mod linux;
mod reg;

pub use crate::bus::{combine, read_i16, I2cBus, RegisterBus};
pub use crate::cfg::*;
#[cfg(feature = "linux")]
pub use crate::linux::{device_path, I2cSession, SessionError};
pub use crate::reg::Register;
use crate::reg::*;

/// Container for the last decoded gyroscope, accelerometer and temperature reading
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sample {
    /// Angular rate in degrees/second
    pub gyr: Vector3<f32>,
    /// Acceleration in multiples of g
    pub acc: Vector3<f32>,
    /// Die temperature in degrees Celsius
    pub tmp: f32,
}

impl Default for Sample {
    fn default() -> Self {
        Self {
            gyr: Vector3::zeros(),
            acc: Vector3::zeros(),
            tmp: 0.0,
        }
    }
}

impl Sample {
    pub fn get(&self, field: Field) -> f32 {
        match field {
            Field::GyroX => self.gyr.x,
            Field::GyroY => self.gyr.y,
            Field::GyroZ => self.gyr.z,
            Field::AccelX => self.acc.x,
            Field::AccelY => self.acc.y,
            Field::AccelZ => self.acc.z,
            Field::Temperature => self.tmp,
        }
    }

    fn set(&mut self, field: Field, value: f32) {
        match field {
            Field::GyroX => self.gyr.x = value,
            Field::GyroY => self.gyr.y = value,
            Field::GyroZ => self.gyr.z = value,
            Field::AccelX => self.acc.x = value,
            Field::AccelY => self.acc.y = value,
            Field::AccelZ => self.acc.z = value,
            Field::Temperature => self.tmp = value,
        }
    }
}

/// One of the seven quantities refreshed by [`Mpu6050::refresh`]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Field {
    GyroX,
    GyroY,
    GyroZ,
    AccelX,
    AccelY,
    AccelZ,
    Temperature,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::GyroX,
        Field::GyroY,
        Field::GyroZ,
        Field::AccelX,
        Field::AccelY,
        Field::AccelZ,
        Field::Temperature,
    ];

    /// High and low byte registers holding the raw value
    pub const fn registers(self) -> (Register, Register) {
        match self {
            Field::GyroX => (Register::GyroXoutH, Register::GyroXoutL),
            Field::GyroY => (Register::GyroYoutH, Register::GyroYoutL),
            Field::GyroZ => (Register::GyroZoutH, Register::GyroZoutL),
            Field::AccelX => (Register::AccelXoutH, Register::AccelXoutL),
            Field::AccelY => (Register::AccelYoutH, Register::AccelYoutL),
            Field::AccelZ => (Register::AccelZoutH, Register::AccelZoutL),
            Field::Temperature => (Register::TempOutH, Register::TempOutL),
        }
    }

    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::GyroX => "Gyro X",
            Field::GyroY => "Gyro Y",
            Field::GyroZ => "Gyro Z",
            Field::AccelX => "Accel X",
            Field::AccelY => "Accel Y",
            Field::AccelZ => "Accel Z",
            Field::Temperature => "Temperature",
        };
        f.write_str(name)
    }
}

/// Which fields failed to read during a refresh. Failed fields hold zero in the sample.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ReadStatus {
    failed: u8,
}

impl ReadStatus {
    /// True if every field was read
    pub const fn is_ok(self) -> bool {
        self.failed == 0
    }

    pub const fn failed(self, field: Field) -> bool {
        self.failed & field.bit() != 0
    }

    pub const fn failure_count(self) -> u32 {
        self.failed.count_ones()
    }

    pub fn failures(self) -> impl Iterator<Item = Field> {
        Field::ALL.into_iter().filter(move |&field| self.failed(field))
    }

    fn mark(&mut self, field: Field) {
        self.failed |= field.bit();
    }
}

/// Scale divisors (LSB per unit) currently applied to raw readings
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Scales {
    /// LSB per degree/second
    pub gyr: f32,
    /// LSB per g
    pub acc: f32,
}

/// Converts a raw TEMP_OUT value into degrees Celsius
pub fn celsius(raw: i16) -> f32 {
    f32::from(raw) / 340.0 + 36.53
}

pub struct Mpu6050<BUS> {
    bus: BUS,
    config: Config,
    sample: Sample,
}

impl<I2C: I2c> Mpu6050<I2cBus<I2C>> {
    /// Binds `i2c` to the configured address and initializes the device
    pub fn new_i2c(i2c: I2C, config: Config) -> Result<Self, InitError<I2C::Error>> {
        Self::new(I2cBus::new(i2c, config.address), config)
    }
}

#[cfg(feature = "linux")]
impl Mpu6050<I2cSession> {
    /// Opens `/dev/i2c-<config.bus>`, binds `config.address` and initializes the device
    pub fn open(config: Config) -> Result<Self, InitError<SessionError>> {
        config.validate::<SessionError>()?;
        let session = I2cSession::open(config.bus, config.address)?;
        Self::new(session, config)
    }

    /// Releases the bus node. Every later register access fails with `SessionError::Closed`.
    pub fn close(&mut self) {
        self.bus.close();
    }
}

impl<BUS: RegisterBus> Mpu6050<BUS> {
    /// Drives the device into the configured state on an already bound bus.
    ///
    /// The cached sample starts zeroed; call [`Mpu6050::refresh`] to take a reading.
    pub fn new(bus: BUS, config: Config) -> Result<Self, InitError<BUS::Error>> {
        config.validate::<BUS::Error>()?;

        let mut imu = Self {
            bus,
            config,
            sample: Sample::default(),
        };
        imu.initialize()?;

        info!(
            "MPU6050 at {:#04x} on /dev/i2c-{} initialized",
            config.address.get(),
            config.bus
        );
        Ok(imu)
    }

    /// Consumes the driver and releases the bus back to the user
    #[must_use]
    pub fn destroy(self) -> BUS {
        self.bus
    }

    fn initialize(&mut self) -> Result<(), InitError<BUS::Error>> {
        // Writing the whole byte also clears SLEEP, which is set at power-on
        self.bus
            .write_register(Register::PwrMgmt1, self.config.clock as u8)
            .map_err(InitError::PowerConfigFailed)?;
        debug!("clock source set to {:?}", self.config.clock);

        self.set_gyr_range(self.config.gyr_range)
            .map_err(InitError::GyroConfigFailed)?;
        self.set_acc_range(self.config.acc_range)
            .map_err(InitError::AccelConfigFailed)?;

        if self.config.data_ready {
            self.bus
                .write_register(Register::IntEnable, INT_DATA_RDY)
                .map_err(InitError::InterruptSetupFailed)?;
            debug!("data ready flag enabled");
        }

        Ok(())
    }

    /// Write to a register, but only overwrite the parts corresponding to the flag byte
    fn write_to_flag(&mut self, reg: Register, data: u8, flag: u8) -> Result<(), BUS::Error> {
        let mut register = self.bus.read_register(reg)?;
        register = (register & !flag) | (data & flag);
        self.bus.write_register(reg, register)
    }

    /*
        Configuration methods
    */

    /// Configure gyroscope to measure with given range
    pub fn set_gyr_range(&mut self, range: GyrRange) -> Result<(), BUS::Error> {
        self.bus
            .write_register(Register::GyroConfig, (range as u8) << FS_SEL_SHIFT)?;
        self.config.gyr_range = range;
        debug!("gyroscope range set to {range:?}");
        Ok(())
    }

    /// Configure acceleromter to measure with given range
    pub fn set_acc_range(&mut self, range: AccRange) -> Result<(), BUS::Error> {
        self.bus
            .write_register(Register::AccelConfig, (range as u8) << FS_SEL_SHIFT)?;
        self.config.acc_range = range;
        debug!("accelerometer range set to {range:?}");
        Ok(())
    }

    /// Select the clock source, leaving the other PWR_MGMT_1 bits alone
    pub fn set_clock(&mut self, clock: ClockSource) -> Result<(), BUS::Error> {
        self.write_to_flag(Register::PwrMgmt1, clock as u8, PWR1_CLKSEL)?;
        self.config.clock = clock;
        Ok(())
    }

    /// Set the digital low-pass filter, external frame sync disabled
    pub fn set_dlpf(&mut self, dlpf: Dlpf) -> Result<(), BUS::Error> {
        self.bus.write_register(Register::Config, dlpf as u8)
    }

    /// Rewrites clock source and both ranges without reopening the bus.
    ///
    /// Steps run in order and stop at the first failure; steps that succeeded stay applied.
    pub fn reconfigure(
        &mut self,
        clock: ClockSource,
        gyr_range: GyrRange,
        acc_range: AccRange,
    ) -> Result<(), InitError<BUS::Error>> {
        self.set_clock(clock).map_err(InitError::PowerConfigFailed)?;
        self.set_gyr_range(gyr_range)
            .map_err(InitError::GyroConfigFailed)?;
        self.set_acc_range(acc_range)
            .map_err(InitError::AccelConfigFailed)
    }

    /*
        Power methods
    */

    pub fn sleep(&mut self) -> Result<(), BUS::Error> {
        self.write_to_flag(Register::PwrMgmt1, PWR1_SLEEP, PWR1_SLEEP)
    }

    pub fn wake(&mut self) -> Result<(), BUS::Error> {
        self.write_to_flag(Register::PwrMgmt1, 0, PWR1_SLEEP)
    }

    pub fn disable_temp(&mut self) -> Result<(), BUS::Error> {
        self.write_to_flag(Register::PwrMgmt1, PWR1_TEMP_DIS, PWR1_TEMP_DIS)
    }

    pub fn enable_temp(&mut self) -> Result<(), BUS::Error> {
        self.write_to_flag(Register::PwrMgmt1, 0, PWR1_TEMP_DIS)
    }

    /// Put all three gyroscope axes in standby
    pub fn disable_gyro(&mut self) -> Result<(), BUS::Error> {
        self.write_to_flag(Register::PwrMgmt2, PWR2_STBY_GYR, PWR2_STBY_GYR)
    }

    pub fn enable_gyro(&mut self) -> Result<(), BUS::Error> {
        self.write_to_flag(Register::PwrMgmt2, 0, PWR2_STBY_GYR)
    }

    /// Put all three accelerometer axes in standby
    pub fn disable_accel(&mut self) -> Result<(), BUS::Error> {
        self.write_to_flag(Register::PwrMgmt2, PWR2_STBY_ACC, PWR2_STBY_ACC)
    }

    pub fn enable_accel(&mut self) -> Result<(), BUS::Error> {
        self.write_to_flag(Register::PwrMgmt2, 0, PWR2_STBY_ACC)
    }

    /*
        Reading methods
    */

    /// Re-reads all seven fields and replaces the cached sample.
    ///
    /// A field that cannot be read is logged, zeroed and reported in the returned status;
    /// the remaining fields are still updated.
    pub fn refresh(&mut self) -> ReadStatus {
        let mut status = ReadStatus::default();
        let mut sample = Sample::default();

        for field in Field::ALL {
            let (msb, lsb) = field.registers();
            match read_i16(&mut self.bus, msb, lsb) {
                Ok(raw) => sample.set(field, self.convert(field, raw)),
                Err(e) => {
                    warn!("error accessing {field} data: {e:?}");
                    status.mark(field);
                }
            }
        }

        self.sample = sample;
        status
    }

    fn convert(&self, field: Field, raw: i16) -> f32 {
        match field {
            Field::GyroX | Field::GyroY | Field::GyroZ => {
                f32::from(raw) / self.config.gyr_range.divisor()
            }
            Field::AccelX | Field::AccelY | Field::AccelZ => {
                f32::from(raw) / self.config.acc_range.divisor()
            }
            Field::Temperature => celsius(raw),
        }
    }

    /// Raw WHO_AM_I register
    pub fn who_am_i(&mut self) -> Result<u8, BUS::Error> {
        self.bus.read_register(Register::WhoAmI)
    }

    /// True if WHO_AM_I identifies an MPU6050, regardless of the AD0 strap
    pub fn identify(&mut self) -> Result<bool, BUS::Error> {
        Ok((self.who_am_i()? & WHO_AM_I_MASK) == WHO_AM_I_VALUE)
    }

    /// Polls DATA_RDY_INT; only set when `Config::data_ready` was enabled
    pub fn data_ready(&mut self) -> Result<bool, BUS::Error> {
        Ok(self.bus.read_register(Register::IntStatus)? & INT_DATA_RDY != 0)
    }
}

impl<BUS> Mpu6050<BUS> {
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn scales(&self) -> Scales {
        Scales {
            gyr: self.config.gyr_range.divisor(),
            acc: self.config.acc_range.divisor(),
        }
    }

    pub fn sample(&self) -> Sample {
        self.sample
    }

    pub fn gyro_x(&self) -> f32 {
        self.sample.gyr.x
    }

    pub fn gyro_y(&self) -> f32 {
        self.sample.gyr.y
    }

    pub fn gyro_z(&self) -> f32 {
        self.sample.gyr.z
    }

    pub fn accel_x(&self) -> f32 {
        self.sample.acc.x
    }

    pub fn accel_y(&self) -> f32 {
        self.sample.acc.y
    }

    pub fn accel_z(&self) -> f32 {
        self.sample.acc.z
    }

    pub fn temperature(&self) -> f32 {
        self.sample.tmp
    }
}

impl<BUS> fmt::Display for Mpu6050<BUS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Sample { gyr, acc, tmp } = &self.sample;
        writeln!(f)?;
        writeln!(f, "-------------------------------------")?;
        writeln!(f, "----- Basic Info -----")?;
        writeln!(f, "I2C Address: {:#x}", self.config.address.get())?;
        writeln!(f, "I2C Interface: /dev/i2c-{}", self.config.bus)?;
        writeln!(f)?;
        writeln!(f, "---- Gyro Values -----")?;
        writeln!(f, "GyroX: {}", gyr.x)?;
        writeln!(f, "GyroY: {}", gyr.y)?;
        writeln!(f, "GyroZ: {}", gyr.z)?;
        writeln!(f)?;
        writeln!(f, "---- Accel Values ----")?;
        writeln!(f, "AccelX: {}", acc.x)?;
        writeln!(f, "AccelY: {}", acc.y)?;
        writeln!(f, "AccelZ: {}", acc.z)?;
        writeln!(f)?;
        writeln!(f, "Temp: {tmp}")?;
        writeln!(f, "-------------------------------------")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temperature_transfer_function() {
        assert_eq!(celsius(0), 36.53);
        assert!((celsius(340) - 37.53).abs() < 1e-5);
        assert!((celsius(-340) - 35.53).abs() < 1e-5);
    }

    #[test]
    fn status_tracks_individual_fields() {
        let mut status = ReadStatus::default();
        assert!(status.is_ok());

        status.mark(Field::GyroY);
        status.mark(Field::Temperature);
        assert!(!status.is_ok());
        assert!(status.failed(Field::GyroY));
        assert!(status.failed(Field::Temperature));
        assert!(!status.failed(Field::GyroX));
        assert_eq!(status.failure_count(), 2);

        let failed: Vec<Field> = status.failures().collect();
        assert_eq!(failed, vec![Field::GyroY, Field::Temperature]);
    }

    #[test]
    fn field_registers_are_consecutive_pairs() {
        for field in Field::ALL {
            let (msb, lsb) = field.registers();
            assert_eq!(msb.addr() + 1, lsb.addr(), "{field}");
        }
        assert_eq!(Field::AccelX.registers().0.addr(), 0x3B);
        assert_eq!(Field::Temperature.registers().0.addr(), 0x41);
        assert_eq!(Field::GyroX.registers().0.addr(), 0x43);
    }

    #[test]
    fn sample_accessors_cover_every_field() {
        let mut sample = Sample::default();
        for (i, field) in Field::ALL.into_iter().enumerate() {
            sample.set(field, i as f32 + 1.0);
        }
        assert_eq!(sample.gyr, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(sample.acc, Vector3::new(4.0, 5.0, 6.0));
        assert_eq!(sample.get(Field::Temperature), 7.0);
    }
}
