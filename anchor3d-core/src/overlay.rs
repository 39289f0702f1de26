/// Overlay document abstraction and an in-memory implementation
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use crate::error::LabelError;
use crate::observable::Observable;
use crate::projection::ScreenPosition;

/// Content offset applied when a label is centered on its anchor point
pub const CENTER_TRANSFORM: &str = "translate(-50%, -50%)";

/// CSS transform placing a label root at a projected position
pub fn placement_transform(position: &ScreenPosition) -> String {
    format!(
        "translate3d({}px,{}px,0) scale({})",
        position.x, position.y, position.scale
    )
}

/// Full inline style of a label root
pub fn root_css_text(position: &ScreenPosition) -> String {
    format!(
        "position:absolute;top:0;left:0;transform:{};transform-origin:0 0;",
        placement_transform(position)
    )
}

/// A DOM-like element handle. Clones refer to the same element.
pub trait OverlayElement: Clone {
    /// Replace the whole inline style
    fn set_css_text(&self, css: &str);

    fn set_style(&self, property: &str, value: &str);

    /// Move `child` under this element, detaching it from any previous parent
    fn append_child(&self, child: &Self);

    /// Detach from the document. No-op if already detached.
    fn remove(&self);
}

/// The document side of the overlay: element factory, body and resize events
pub trait OverlayDocument {
    type Element: OverlayElement + 'static;

    fn create_element(&self, tag: &str) -> Result<Self::Element, LabelError>;

    fn append_to_body(&self, element: &Self::Element);

    /// Fired when the window or render surface changes size
    fn on_resize(&self) -> &Observable;
}

#[derive(Debug, Default)]
struct ElementState {
    tag: String,
    text: String,
    style: BTreeMap<String, String>,
    style_writes: usize,
    children: Vec<HeadlessElement>,
    parent: Option<Weak<RefCell<ElementState>>>,
}

/// Element of a [`HeadlessDocument`]; records every style write
#[derive(Debug, Clone)]
pub struct HeadlessElement {
    state: Rc<RefCell<ElementState>>,
}

impl HeadlessElement {
    pub fn new(tag: &str) -> Self {
        Self {
            state: Rc::new(RefCell::new(ElementState {
                tag: tag.to_string(),
                ..Default::default()
            })),
        }
    }

    pub fn tag(&self) -> String {
        self.state.borrow().tag.clone()
    }

    pub fn text(&self) -> String {
        self.state.borrow().text.clone()
    }

    pub fn set_text(&self, text: impl Into<String>) {
        self.state.borrow_mut().text = text.into();
    }

    pub fn style(&self, property: &str) -> Option<String> {
        self.state.borrow().style.get(property).cloned()
    }

    /// Number of inline style writes since creation
    pub fn style_writes(&self) -> usize {
        self.state.borrow().style_writes
    }

    pub fn children(&self) -> Vec<HeadlessElement> {
        self.state.borrow().children.clone()
    }

    pub fn parent(&self) -> Option<HeadlessElement> {
        let parent = self.state.borrow().parent.as_ref()?.upgrade()?;
        Some(HeadlessElement { state: parent })
    }

    pub fn ptr_eq(&self, other: &HeadlessElement) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl OverlayElement for HeadlessElement {
    fn set_css_text(&self, css: &str) {
        let mut state = self.state.borrow_mut();
        state.style = css
            .split(';')
            .filter_map(|declaration| declaration.split_once(':'))
            .map(|(property, value)| (property.trim().to_string(), value.trim().to_string()))
            .collect();
        state.style_writes += 1;
    }

    fn set_style(&self, property: &str, value: &str) {
        let mut state = self.state.borrow_mut();
        state.style.insert(property.to_string(), value.to_string());
        state.style_writes += 1;
    }

    fn append_child(&self, child: &Self) {
        child.remove();
        child.state.borrow_mut().parent = Some(Rc::downgrade(&self.state));
        self.state.borrow_mut().children.push(child.clone());
    }

    fn remove(&self) {
        let Some(parent) = self.parent() else {
            return;
        };
        parent
            .state
            .borrow_mut()
            .children
            .retain(|child| !child.ptr_eq(self));
        self.state.borrow_mut().parent = None;
    }
}

/// In-memory overlay document for tests and non-browser front ends
#[derive(Debug)]
pub struct HeadlessDocument {
    body: HeadlessElement,
    resize: Observable,
}

impl HeadlessDocument {
    pub fn new() -> Self {
        Self {
            body: HeadlessElement::new("body"),
            resize: Observable::new(),
        }
    }

    pub fn body(&self) -> &HeadlessElement {
        &self.body
    }

    /// Whether `element` is attached somewhere below the body
    pub fn contains(&self, element: &HeadlessElement) -> bool {
        let mut current = element.parent();
        while let Some(node) = current {
            if node.ptr_eq(&self.body) {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// Notify resize listeners
    pub fn resize(&self) {
        self.resize.notify();
    }
}

impl Default for HeadlessDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayDocument for HeadlessDocument {
    type Element = HeadlessElement;

    fn create_element(&self, tag: &str) -> Result<Self::Element, LabelError> {
        Ok(HeadlessElement::new(tag))
    }

    fn append_to_body(&self, element: &Self::Element) {
        self.body.append_child(element);
    }

    fn on_resize(&self) -> &Observable {
        &self.resize
    }
}
