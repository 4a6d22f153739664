//! 速度/加速度设置栈

/// 一组运动设置
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSettings {
    /// mm/s
    pub speed: f64,
    pub acceleration: f64,
}

/// 当前设置 + LIFO 栈
///
/// 复合操作（回零、探测、回放）先 push 再修改速度，结束时 pop 恢复调用方的设置。
#[derive(Debug, Clone)]
pub struct SettingsStack {
    current: MotionSettings,
    stack: Vec<MotionSettings>,
}

impl SettingsStack {
    pub fn new(initial: MotionSettings) -> Self {
        Self {
            current: initial,
            stack: Vec::new(),
        }
    }

    pub fn current(&self) -> MotionSettings {
        self.current
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.current.speed = speed;
    }

    pub fn set_acceleration(&mut self, acceleration: f64) {
        self.current.acceleration = acceleration;
    }

    /// 保存当前设置
    pub fn push(&mut self) {
        self.stack.push(self.current);
    }

    /// 取出最近保存的设置（不修改当前值）
    pub fn pop(&mut self) -> Option<MotionSettings> {
        self.stack.pop()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}
