use crate::position::Position;
use thiserror::Error;

/// 偏移逆解失败
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// 偏移与目标径向共线，或目标位于原点，三角形退化
    #[error("Offset {offset} is degenerate for target {target}")]
    Singular { target: Position, offset: Position },

    /// 偏移相对目标距离过长，正弦定理无解
    #[error("Target {target} cannot be reached with offset {offset} (asin argument {ratio:.4})")]
    OutOfReach {
        target: Position,
        offset: Position,
        ratio: f64,
    },
}
