//! # 元素句柄表
//!
//! 弹窗相关元素在组件生命周期内只查找一次，之后各操作通过句柄表引用，
//! 不再在每次调用时重复查找。

use std::collections::HashSet;

use super::QrError;

/// 页面元素的不透明句柄。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle(String);

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

/// 二维码弹窗用到的元素。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModalElement {
    Modal,
    UrlDisplay,
    Container,
    PaddingSlider,
    RadiusSlider,
    PaddingValue,
    RadiusValue,
    Preview,
    RemoveButton,
    FileInput,
}

impl ModalElement {
    pub const ALL: [ModalElement; 10] = [
        Self::Modal,
        Self::UrlDisplay,
        Self::Container,
        Self::PaddingSlider,
        Self::RadiusSlider,
        Self::PaddingValue,
        Self::RadiusValue,
        Self::Preview,
        Self::RemoveButton,
        Self::FileInput,
    ];

    /// 元素在页面中的标识。
    pub fn selector(&self) -> &'static str {
        match self {
            Self::Modal => "qr-modal",
            Self::UrlDisplay => "qr-url-display",
            Self::Container => "qr-code-container",
            Self::PaddingSlider => "qr-padding",
            Self::RadiusSlider => "qr-radius",
            Self::PaddingValue => "qr-padding-value",
            Self::RadiusValue => "qr-radius-value",
            Self::Preview => "logo-preview",
            Self::RemoveButton => "remove-logo-btn",
            Self::FileInput => "qr-logo",
        }
    }
}

/// 按标识查找元素的能力（由宿主页面提供）。
pub trait ElementLookup {
    fn lookup(&self, selector: &str) -> Option<ElementHandle>;
}

/// 固定元素集合的页面，命令行与测试使用。
#[derive(Debug, Clone, Default)]
pub struct StaticPage {
    selectors: HashSet<String>,
}

impl StaticPage {
    /// 包含完整二维码弹窗结构的页面。
    pub fn qr_modal() -> Self {
        Self {
            selectors: ModalElement::ALL
                .iter()
                .map(|e| e.selector().to_string())
                .collect(),
        }
    }

    pub fn without(mut self, selector: &str) -> Self {
        self.selectors.remove(selector);
        self
    }
}

impl ElementLookup for StaticPage {
    fn lookup(&self, selector: &str) -> Option<ElementHandle> {
        self.selectors
            .contains(selector)
            .then(|| ElementHandle::new(selector))
    }
}

/// 一次性填充的句柄表，每个弹窗元素对应一个字段。
#[derive(Debug, Clone)]
pub struct HandleTable {
    modal: ElementHandle,
    url_display: ElementHandle,
    container: ElementHandle,
    padding_slider: ElementHandle,
    radius_slider: ElementHandle,
    padding_value: ElementHandle,
    radius_value: ElementHandle,
    preview: ElementHandle,
    remove_button: ElementHandle,
    file_input: ElementHandle,
}

impl HandleTable {
    /// 查找全部弹窗元素；任何一个缺失都视为页面结构错误。
    pub fn populate(lookup: &dyn ElementLookup) -> Result<Self, QrError> {
        let find = |element: ModalElement| {
            lookup
                .lookup(element.selector())
                .ok_or_else(|| QrError::MissingElement(element.selector().to_string()))
        };

        let table = Self {
            modal: find(ModalElement::Modal)?,
            url_display: find(ModalElement::UrlDisplay)?,
            container: find(ModalElement::Container)?,
            padding_slider: find(ModalElement::PaddingSlider)?,
            radius_slider: find(ModalElement::RadiusSlider)?,
            padding_value: find(ModalElement::PaddingValue)?,
            radius_value: find(ModalElement::RadiusValue)?,
            preview: find(ModalElement::Preview)?,
            remove_button: find(ModalElement::RemoveButton)?,
            file_input: find(ModalElement::FileInput)?,
        };
        log::debug!("🔗 弹窗元素句柄已缓存：{} 个", ModalElement::ALL.len());
        Ok(table)
    }

    pub fn get(&self, element: ModalElement) -> &ElementHandle {
        match element {
            ModalElement::Modal => &self.modal,
            ModalElement::UrlDisplay => &self.url_display,
            ModalElement::Container => &self.container,
            ModalElement::PaddingSlider => &self.padding_slider,
            ModalElement::RadiusSlider => &self.radius_slider,
            ModalElement::PaddingValue => &self.padding_value,
            ModalElement::RadiusValue => &self.radius_value,
            ModalElement::Preview => &self.preview,
            ModalElement::RemoveButton => &self.remove_button,
            ModalElement::FileInput => &self.file_input,
        }
    }
}
