//! # Vector 模块
//!
//! 带"静止坐标"的二维向量。
//!
//! ## 旋转模型
//!
//! 向量保存一组未旋转的静止坐标 `(rest_x, rest_y)` 和累计旋转角 `rotation`（角度制）。
//! 当前坐标总是由静止坐标和累计角度重新计算：
//!
//! ```text
//! x = rest_x·cos(θ) − rest_y·sin(θ)
//! y = rest_x·sin(θ) + rest_y·cos(θ)
//! ```
//!
//! 因此旋转两次 10° 与一次旋转 20° 结果一致，不会累积浮点误差。
//!
//! 改变模长的操作（`multiply`、`append_*`、`set_*` 等）会把静止坐标重置为当前坐标，
//! 之后的旋转以新的静止坐标为基准，但累计角度保持不变。

use crate::surface::Surface;

/// 点（与向量同一类型）
pub type Point = Vector2D;

/// 二维向量
#[derive(Debug, Clone, PartialEq)]
pub struct Vector2D {
    x: f64,
    y: f64,
    rest_x: f64,
    rest_y: f64,
    mag: f64,
    /// 静止坐标的方向角（角度制）
    rest_angle: f64,
    /// 累计旋转角（角度制）
    rotation: f64,
}

impl Default for Vector2D {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl Vector2D {
    /// 创建未旋转的向量
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            rest_x: x,
            rest_y: y,
            mag: x.hypot(y),
            rest_angle: y.atan2(x).to_degrees(),
            rotation: 0.0,
        }
    }

    /// 以 `(x, y)` 为静止坐标创建向量，并立即应用旋转角
    pub fn with_rotation(x: f64, y: f64, rotation: f64) -> Self {
        let mut v = Self::new(x, y);
        v.rotate_to(rotation);
        v
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn rest_x(&self) -> f64 {
        self.rest_x
    }

    pub fn rest_y(&self) -> f64 {
        self.rest_y
    }

    /// 模长
    pub fn mag(&self) -> f64 {
        self.mag
    }

    /// 静止坐标的方向角（角度制）
    pub fn rest_angle(&self) -> f64 {
        self.rest_angle
    }

    /// 累计旋转角（角度制）
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    // ========== 旋转 ==========

    /// 在当前累计角度上增加 `deg` 度
    pub fn rotate(&mut self, deg: f64) {
        self.rotation += deg;
        self.apply_rotation();
    }

    /// 把累计角度设为 `deg` 度
    pub fn rotate_to(&mut self, deg: f64) {
        self.rotation = deg;
        self.apply_rotation();
    }

    fn apply_rotation(&mut self) {
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        self.x = self.rest_x * cos - self.rest_y * sin;
        self.y = self.rest_x * sin + self.rest_y * cos;
    }

    // ========== 模长 ==========

    /// 归一化；模长为 0 时不做任何事
    pub fn normalize(&mut self) {
        if self.mag != 0.0 {
            self.x /= self.mag;
            self.y /= self.mag;
            self.rebase();
        }
    }

    pub fn multiply(&mut self, n: f64) {
        self.x *= n;
        self.y *= n;
        self.rebase();
    }

    pub fn multiply_x(&mut self, n: f64) {
        self.x *= n;
        self.rebase();
    }

    pub fn multiply_y(&mut self, n: f64) {
        self.y *= n;
        self.rebase();
    }

    /// 除以 `n`；`n == 0` 时保持不变
    pub fn divide(&mut self, n: f64) {
        if n == 0.0 {
            tracing::debug!("Vector2D::divide 除数为 0，忽略");
            return;
        }
        self.x /= n;
        self.y /= n;
        self.rebase();
    }

    /// 模长增加 `value`，方向不变；零向量没有方向，保持不变
    pub fn append_mag(&mut self, value: f64) {
        if self.mag != 0.0 {
            let new_mag = self.mag + value;
            self.normalize();
            self.multiply(new_mag);
        }
    }

    pub fn append_x(&mut self, value: f64) {
        self.x += value;
        self.rebase();
    }

    pub fn append_y(&mut self, value: f64) {
        self.y += value;
        self.rebase();
    }

    pub fn set_x(&mut self, value: f64) {
        self.x = value;
        self.rebase();
    }

    pub fn set_y(&mut self, value: f64) {
        self.y = value;
        self.rebase();
    }

    /// 设置模长（先归一化再乘），方向不变
    pub fn set_mag(&mut self, value: f64) {
        self.normalize();
        self.multiply(value);
    }

    /// 平移（用于位置点）
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
        self.rebase();
    }

    /// 直接设置当前坐标
    pub fn set(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
        self.rebase();
    }

    /// 把静止坐标重置为当前坐标并更新模长
    fn rebase(&mut self) {
        self.rest_x = self.x;
        self.rest_y = self.y;
        self.mag = self.x.hypot(self.y);
        self.rest_angle = self.y.atan2(self.x).to_degrees();
    }

    // ========== 查询 ==========

    /// 到另一点的欧氏距离
    pub fn distance(&self, other: &Vector2D) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// 以 `(origin_x, origin_y)` 为起点绘制该向量（调试用）
    ///
    /// - `color`: 十六进制颜色字符串
    /// - `scale`: 向量缩放
    /// - `thickness`: 线宽
    pub fn draw(
        &self,
        surface: &mut dyn Surface,
        origin_x: f64,
        origin_y: f64,
        color: &str,
        scale: f64,
        thickness: f64,
    ) {
        surface.begin_path();
        surface.set_stroke_style(color);
        surface.set_line_width(thickness);
        surface.move_to(origin_x, origin_y);
        surface.line_to(origin_x + self.x * scale, origin_y + self.y * scale);
        surface.stroke();
        surface.close_path();
    }
}

impl std::fmt::Display for Vector2D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(f64, f64)> for Vector2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}
