//! # 弹窗视图边界
//!
//! 控制器只通过 `ModalView` 读写页面：文本、内联样式、显隐、滑块、文件输入框、预览图与阻塞提示。
//! 宿主页面实现该 trait；`RecordingView` 把所有操作按顺序记录下来，供命令行输出与测试断言。

use std::collections::HashMap;

use super::ElementHandle;

/// 弹窗的展示层操作。
pub trait ModalView: Send {
    fn set_text(&mut self, handle: &ElementHandle, text: &str);

    /// 设置内联样式属性，例如 `padding`、`border-radius`。
    fn set_style(&mut self, handle: &ElementHandle, property: &str, value: &str);

    fn set_visible(&mut self, handle: &ElementHandle, visible: bool);

    fn set_slider(&mut self, handle: &ElementHandle, value: u32);

    /// 滑块当前取值；读不到或不是数字时返回 `None`。
    fn slider_value(&self, handle: &ElementHandle) -> Option<u32>;

    fn clear_file_input(&mut self, handle: &ElementHandle);

    /// 显示预览图；`None` 表示清空并隐藏。
    fn set_preview(&mut self, handle: &ElementHandle, data_url: Option<&str>);

    /// 阻塞式提示。
    fn alert(&mut self, message: &str);
}

/// 一次视图操作的记录。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewOp {
    Text { id: String, text: String },
    Style { id: String, property: String, value: String },
    Visible { id: String, visible: bool },
    Slider { id: String, value: u32 },
    ClearFileInput { id: String },
    Preview { id: String, data_url: Option<String> },
    Alert(String),
}

#[derive(Debug, Default)]
pub struct RecordingView {
    ops: Vec<ViewOp>,
    sliders: HashMap<String, u32>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[ViewOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<ViewOp> {
        std::mem::take(&mut self.ops)
    }

    /// 模拟用户拖动滑块，不计入视图操作。
    pub fn drag_slider(&mut self, id: &str, value: u32) {
        self.sliders.insert(id.to_string(), value);
    }

    pub fn alerts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                ViewOp::Alert(message) => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    /// 元素最近一次的可见状态。
    pub fn last_visibility(&self, id: &str) -> Option<bool> {
        self.ops.iter().rev().find_map(|op| match op {
            ViewOp::Visible { id: op_id, visible } if op_id == id => Some(*visible),
            _ => None,
        })
    }

    pub fn last_text(&self, id: &str) -> Option<&str> {
        self.ops.iter().rev().find_map(|op| match op {
            ViewOp::Text { id: op_id, text } if op_id == id => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn last_style(&self, id: &str, property: &str) -> Option<&str> {
        self.ops.iter().rev().find_map(|op| match op {
            ViewOp::Style {
                id: op_id,
                property: op_prop,
                value,
            } if op_id == id && op_prop == property => Some(value.as_str()),
            _ => None,
        })
    }

    fn record(&mut self, op: ViewOp) {
        log::trace!("🪟 视图操作：{:?}", op);
        self.ops.push(op);
    }
}

impl ModalView for RecordingView {
    fn set_text(&mut self, handle: &ElementHandle, text: &str) {
        self.record(ViewOp::Text {
            id: handle.id().to_string(),
            text: text.to_string(),
        });
    }

    fn set_style(&mut self, handle: &ElementHandle, property: &str, value: &str) {
        self.record(ViewOp::Style {
            id: handle.id().to_string(),
            property: property.to_string(),
            value: value.to_string(),
        });
    }

    fn set_visible(&mut self, handle: &ElementHandle, visible: bool) {
        self.record(ViewOp::Visible {
            id: handle.id().to_string(),
            visible,
        });
    }

    fn set_slider(&mut self, handle: &ElementHandle, value: u32) {
        self.sliders.insert(handle.id().to_string(), value);
        self.record(ViewOp::Slider {
            id: handle.id().to_string(),
            value,
        });
    }

    fn slider_value(&self, handle: &ElementHandle) -> Option<u32> {
        self.sliders.get(handle.id()).copied()
    }

    fn clear_file_input(&mut self, handle: &ElementHandle) {
        self.record(ViewOp::ClearFileInput {
            id: handle.id().to_string(),
        });
    }

    fn set_preview(&mut self, handle: &ElementHandle, data_url: Option<&str>) {
        self.record(ViewOp::Preview {
            id: handle.id().to_string(),
            data_url: data_url.map(str::to_string),
        });
    }

    fn alert(&mut self, message: &str) {
        log::warn!("⚠️ 提示用户：{}", message);
        self.record(ViewOp::Alert(message.to_string()));
    }
}
