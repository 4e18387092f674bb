/// MPU6050 register map (single bank, 8-bit addresses)
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum Register {
    Config = 0x1A,
    GyroConfig = 0x1B,
    AccelConfig = 0x1C,
    IntEnable = 0x38,
    IntStatus = 0x3A,
    AccelXoutH = 0x3B,
    AccelXoutL = 0x3C,
    AccelYoutH = 0x3D,
    AccelYoutL = 0x3E,
    AccelZoutH = 0x3F,
    AccelZoutL = 0x40,
    TempOutH = 0x41,
    TempOutL = 0x42,
    GyroXoutH = 0x43,
    GyroXoutL = 0x44,
    GyroYoutH = 0x45,
    GyroYoutL = 0x46,
    GyroZoutH = 0x47,
    GyroZoutL = 0x48,
    PwrMgmt1 = 0x6B,
    PwrMgmt2 = 0x6C,
    WhoAmI = 0x75,
}

impl Register {
    pub const fn addr(self) -> u8 {
        self as u8
    }
}

/// Bit position of `FS_SEL` / `AFS_SEL` inside GYRO_CONFIG / ACCEL_CONFIG
pub const FS_SEL_SHIFT: u8 = 3;

// PWR_MGMT_1: {DEVICE_RESET, SLEEP, CYCLE, -, TEMP_DIS, CLKSEL[3]}
pub const PWR1_SLEEP: u8 = 1 << 6;
pub const PWR1_TEMP_DIS: u8 = 1 << 3;
pub const PWR1_CLKSEL: u8 = 0b0000_0111;

// PWR_MGMT_2: {LP_WAKE_CTRL[2], STBY_XA, STBY_YA, STBY_ZA, STBY_XG, STBY_YG, STBY_ZG}
pub const PWR2_STBY_ACC: u8 = 0b0011_1000;
pub const PWR2_STBY_GYR: u8 = 0b0000_0111;

/// DATA_RDY_EN in INT_ENABLE, DATA_RDY_INT in INT_STATUS
pub const INT_DATA_RDY: u8 = 1;

/// Upper six bits of WHO_AM_I, independent of the AD0 strap
pub const WHO_AM_I_VALUE: u8 = 0x68;
pub const WHO_AM_I_MASK: u8 = 0b0111_1110;
