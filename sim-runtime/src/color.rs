//! # Color 模块
//!
//! RGB 颜色。分量是普通浮点数，不做截断；只有投影为十六进制字符串时才取整。

use crate::error::ColorError;

/// RGB 颜色
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::new(255.0, 255.0, 255.0);

    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// 解析 `#rgb` 或 `#rrggbb`
    pub fn from_hex(input: &str) -> Result<Self, ColorError> {
        let invalid = || ColorError::InvalidHex {
            input: input.to_string(),
        };

        let digits = input.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |s: &str| u8::from_str_radix(s, 16).map(f64::from).map_err(|_| invalid());
        match digits.len() {
            3 => {
                let expand = |i: usize| {
                    let c = &digits[i..i + 1];
                    channel(&format!("{c}{c}"))
                };
                Ok(Self::new(expand(0)?, expand(1)?, expand(2)?))
            }
            6 => Ok(Self::new(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            _ => Err(invalid()),
        }
    }

    /// 投影为 `#rrggbb`
    ///
    /// 每个分量取整并补零到两位；超出 [0, 255] 的中间值在这里截断。
    pub fn to_hex(&self) -> String {
        fn component(c: f64) -> u8 {
            c.round().clamp(0.0, 255.0) as u8
        }
        format!(
            "#{:02x}{:02x}{:02x}",
            component(self.r),
            component(self.g),
            component(self.b)
        )
    }

    /// 在 `ticks` 个 tick 内从 `self` 变到 `target` 时，每个 tick 的分量增量
    pub fn step_towards(&self, target: &Color, ticks: u32) -> Self {
        let n = f64::from(ticks.max(1));
        Self {
            r: (target.r - self.r) / n,
            g: (target.g - self.g) / n,
            b: (target.b - self.b) / n,
        }
    }

    /// 分量相加
    pub fn offset(&mut self, delta: &Color) {
        self.r += delta.r;
        self.g += delta.g;
        self.b += delta.b;
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// 颜色输入：结构化颜色或十六进制字符串
#[derive(Debug, Clone, PartialEq)]
pub enum ColorInput {
    Rgb(Color),
    Hex(String),
}

impl ColorInput {
    /// 解析为 [`Color`]
    pub fn resolve(&self) -> Result<Color, ColorError> {
        match self {
            Self::Rgb(color) => Ok(*color),
            Self::Hex(hex) => Color::from_hex(hex),
        }
    }
}

impl From<Color> for ColorInput {
    fn from(color: Color) -> Self {
        Self::Rgb(color)
    }
}

impl From<&str> for ColorInput {
    fn from(hex: &str) -> Self {
        Self::Hex(hex.to_string())
    }
}

impl From<String> for ColorInput {
    fn from(hex: String) -> Self {
        Self::Hex(hex)
    }
}
