//! 运行数据通道解码
//!
//! 每个通道从记录的固定偏移读取一个无符号值（16 位小端或单字节），
//! 再按固定线性变换 `raw * scale + offset` 换算为工程单位。
//!
//! | 通道 | 字节 (低, 高) | 变换 |
//! |------|---------------|------|
//! | 发动机温度 (°C) | (30, 31) | raw × 0.1 − 40 |
//! | 氧传感器电压 (V) | (34, 35) | raw × 0.004888 |
//! | 前缸喷油脉宽 (ms) | (21, 22) | raw × 0.00133 |
//! | 后缸喷油脉宽 (ms) | (23, 24) | raw × 0.00133 |
//! | 前缸燃油表 | (17, 18) | raw × 0.026666 |
//! | 后缸燃油表 | (19, 20) | raw × 0.026666 |
//! | 电池电压 (V) | (28, 29) | raw × 0.01 |
//! | 前缸点火提前角 (°) | (13, 14) | raw × 0.0025 |
//! | 后缸点火提前角 (°) | (15, 16) | raw × 0.0025 |
//! | 发动机负荷 | (27) | raw（0-255 ≈ 0-100%） |
//! | 转速 | (11, 12) | raw |
//! | 排气氧比例 | (54, 55) | raw × 0.1 |
//! | 运行时间 | (9, 10) | raw |
//!
//! 通道表是外部日志查看器的兼容约束，属于协议常量，不可配置。
//!
//! 解码不做任何校验：对未通过校验的记录解码会得到无意义的数值。
//! 管线中只通过 [`ValidatedRecord::decode`](crate::ValidatedRecord::decode) 调用。

use crate::constants::RECORD_LENGTH;
use crate::read_u16_le;

/// 字段宽度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldWidth {
    /// 单字节
    Byte,
    /// 16 位小端（低字节在 `offset`，高字节在 `offset + 1`）
    Word,
}

/// 通道定义
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelSpec {
    /// 低字节偏移
    pub offset: usize,
    /// 字段宽度
    pub width: FieldWidth,
    /// 比例系数
    pub scale: f64,
    /// 偏置
    pub bias: f64,
}

impl ChannelSpec {
    const fn word(offset: usize, scale: f64, bias: f64) -> Self {
        Self {
            offset,
            width: FieldWidth::Word,
            scale,
            bias,
        }
    }

    const fn byte(offset: usize) -> Self {
        Self {
            offset,
            width: FieldWidth::Byte,
            scale: 1.0,
            bias: 0.0,
        }
    }

    /// 读取原始值
    pub fn raw(&self, record: &[u8; RECORD_LENGTH]) -> u16 {
        match self.width {
            FieldWidth::Byte => record[self.offset] as u16,
            FieldWidth::Word => read_u16_le(record, self.offset),
        }
    }

    /// 读取并换算为工程单位
    pub fn decode(&self, record: &[u8; RECORD_LENGTH]) -> f64 {
        self.raw(record) as f64 * self.scale + self.bias
    }
}

/// 运行数据通道
///
/// 枚举顺序即离线读取器的固定列顺序。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Channel {
    /// 发动机温度（°C）
    EngineTemp,
    /// 氧传感器电压（V）
    O2Voltage,
    /// 前缸喷油脉宽（ms）
    FuelPulseFront,
    /// 前缸燃油表
    FuelTableFront,
    /// 后缸喷油脉宽（ms）
    FuelPulseRear,
    /// 后缸燃油表
    FuelTableRear,
    /// 电池电压（V）
    BatteryVoltage,
    /// 前缸点火提前角（°）
    SparkAdvanceFront,
    /// 后缸点火提前角（°）
    SparkAdvanceRear,
    /// 发动机负荷（0-255）
    EngineLoad,
    /// 转速（原始单位）
    EngineSpeed,
    /// 排气氧比例
    EgoRatio,
    /// 运行时间（原始单位）
    Runtime,
}

impl Channel {
    /// 全部通道，按固定列顺序
    pub const ALL: [Channel; 13] = [
        Channel::EngineTemp,
        Channel::O2Voltage,
        Channel::FuelPulseFront,
        Channel::FuelTableFront,
        Channel::FuelPulseRear,
        Channel::FuelTableRear,
        Channel::BatteryVoltage,
        Channel::SparkAdvanceFront,
        Channel::SparkAdvanceRear,
        Channel::EngineLoad,
        Channel::EngineSpeed,
        Channel::EgoRatio,
        Channel::Runtime,
    ];

    /// 通道的偏移和线性变换
    pub const fn spec(self) -> ChannelSpec {
        match self {
            Channel::EngineTemp => ChannelSpec::word(30, 0.1, -40.0),
            Channel::O2Voltage => ChannelSpec::word(34, 0.004888, 0.0),
            Channel::FuelPulseFront => ChannelSpec::word(21, 0.00133, 0.0),
            Channel::FuelPulseRear => ChannelSpec::word(23, 0.00133, 0.0),
            Channel::FuelTableFront => ChannelSpec::word(17, 0.026666, 0.0),
            Channel::FuelTableRear => ChannelSpec::word(19, 0.026666, 0.0),
            Channel::BatteryVoltage => ChannelSpec::word(28, 0.01, 0.0),
            Channel::SparkAdvanceFront => ChannelSpec::word(13, 0.0025, 0.0),
            Channel::SparkAdvanceRear => ChannelSpec::word(15, 0.0025, 0.0),
            Channel::EngineLoad => ChannelSpec::byte(27),
            Channel::EngineSpeed => ChannelSpec::word(11, 1.0, 0.0),
            Channel::EgoRatio => ChannelSpec::word(54, 0.1, 0.0),
            Channel::Runtime => ChannelSpec::word(9, 1.0, 0.0),
        }
    }

    /// 列标签（离线读取器输出）
    pub const fn label(self) -> &'static str {
        match self {
            Channel::EngineTemp => "T",
            Channel::O2Voltage => "O",
            Channel::FuelPulseFront | Channel::FuelTableFront => "F",
            Channel::FuelPulseRear | Channel::FuelTableRear => "R",
            Channel::BatteryVoltage => "V",
            Channel::SparkAdvanceFront => "F",
            Channel::SparkAdvanceRear => "R",
            Channel::EngineLoad => "L",
            Channel::EngineSpeed => "RPM",
            Channel::EgoRatio => "EGO",
            Channel::Runtime => "RT",
        }
    }

    /// 输出小数位数
    pub const fn precision(self) -> usize {
        match self {
            Channel::FuelTableFront | Channel::FuelTableRear => 0,
            Channel::EngineLoad | Channel::EngineSpeed | Channel::Runtime => 0,
            Channel::EgoRatio => 1,
            _ => 2,
        }
    }
}

/// 一条记录解码得到的运行数据
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Telemetry {
    /// 发动机温度（°C）
    pub engine_temp_c: f64,
    /// 氧传感器电压（V）
    pub o2_voltage: f64,
    /// 前缸喷油脉宽（ms）
    pub fuel_pulse_front_ms: f64,
    /// 前缸燃油表
    pub fuel_table_front: f64,
    /// 后缸喷油脉宽（ms）
    pub fuel_pulse_rear_ms: f64,
    /// 后缸燃油表
    pub fuel_table_rear: f64,
    /// 电池电压（V）
    pub battery_voltage: f64,
    /// 前缸点火提前角（°）
    pub spark_advance_front_deg: f64,
    /// 后缸点火提前角（°）
    pub spark_advance_rear_deg: f64,
    /// 发动机负荷（0-255）
    pub engine_load: f64,
    /// 转速（原始单位）
    pub engine_speed: f64,
    /// 排气氧比例
    pub ego_ratio: f64,
    /// 运行时间（原始单位）
    pub runtime: f64,
}

impl Telemetry {
    /// 按通道取值
    pub fn get(&self, channel: Channel) -> f64 {
        match channel {
            Channel::EngineTemp => self.engine_temp_c,
            Channel::O2Voltage => self.o2_voltage,
            Channel::FuelPulseFront => self.fuel_pulse_front_ms,
            Channel::FuelTableFront => self.fuel_table_front,
            Channel::FuelPulseRear => self.fuel_pulse_rear_ms,
            Channel::FuelTableRear => self.fuel_table_rear,
            Channel::BatteryVoltage => self.battery_voltage,
            Channel::SparkAdvanceFront => self.spark_advance_front_deg,
            Channel::SparkAdvanceRear => self.spark_advance_rear_deg,
            Channel::EngineLoad => self.engine_load,
            Channel::EngineSpeed => self.engine_speed,
            Channel::EgoRatio => self.ego_ratio,
            Channel::Runtime => self.runtime,
        }
    }

    /// 按固定列顺序迭代 `(通道, 数值)`
    pub fn iter(&self) -> impl Iterator<Item = (Channel, f64)> + '_ {
        Channel::ALL.into_iter().map(move |channel| (channel, self.get(channel)))
    }

    /// 格式化为单行文本（固定列顺序）
    ///
    /// ```text
    /// T: -24.00 | O: 0.49 | F: 1.33 | F: 27 | R: 1.33 | R: 27 | V: 12.80 | ...
    /// ```
    pub fn to_line(&self) -> String {
        self.iter()
            .map(|(channel, value)| {
                format!(
                    "{}: {:.prec$}",
                    channel.label(),
                    value,
                    prec = channel.precision()
                )
            })
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// 解码一条 99 字节记录
///
/// 纯函数：相同输入总是得到相同输出，不做校验。
pub fn decode_raw(record: &[u8; RECORD_LENGTH]) -> Telemetry {
    let value = |channel: Channel| channel.spec().decode(record);

    Telemetry {
        engine_temp_c: value(Channel::EngineTemp),
        o2_voltage: value(Channel::O2Voltage),
        fuel_pulse_front_ms: value(Channel::FuelPulseFront),
        fuel_table_front: value(Channel::FuelTableFront),
        fuel_pulse_rear_ms: value(Channel::FuelPulseRear),
        fuel_table_rear: value(Channel::FuelTableRear),
        battery_voltage: value(Channel::BatteryVoltage),
        spark_advance_front_deg: value(Channel::SparkAdvanceFront),
        spark_advance_rear_deg: value(Channel::SparkAdvanceRear),
        engine_load: value(Channel::EngineLoad),
        engine_speed: value(Channel::EngineSpeed),
        ego_ratio: value(Channel::EgoRatio),
        runtime: value(Channel::Runtime),
    }
}
