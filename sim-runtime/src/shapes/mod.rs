//! # Shapes 模块
//!
//! 具体形状。所有形状都是可克隆的句柄，克隆共享同一份状态：
//! 一份交给场景绘制，一份留在调用方继续驱动动画。
//!
//! | 形状 | 命中测试 | 特有动画 |
//! |------|----------|----------|
//! | [`Circle`] | 到圆心距离 < 半径 | `set_radius`、`scale` |
//! | [`Rectangle`] | 逆旋转到局部坐标后比较角点边界 | `rotate*`、`scale*`、`set_width/height`、`expand_*` |
//! | [`Polygon`] | 无 | `rotate*` |
//! | [`Line`] | 无 | `rotate*`（只旋转方向向量） |

mod circle;
mod line;
mod polygon;
mod rectangle;

pub use circle::Circle;
pub use line::Line;
pub use polygon::Polygon;
pub use rectangle::{Corner, Rectangle};
