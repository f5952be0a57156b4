//! Page enhancement behaviors for server-rendered forms.
//!
//! The behaviors (smooth fragment scrolling, submit loading state, the
//! password strength meter with confirmation matching, and alert
//! auto-dismissal) are installed onto a [`Page`]: a deterministic headless
//! document with its own event dispatcher, constraint validation and
//! virtual clock.
//!
//! ```
//! use form_enhancer::{EnhanceConfig, Page, install};
//!
//! let html = r#"
//!   <form id="signup">
//!     <div><input id="password" type="password"></div>
//!     <div><input id="confirm_password" type="password"></div>
//!     <button type="submit">Register</button>
//!   </form>
//! "#;
//! let mut page = Page::from_html(html)?;
//! install(&mut page, &EnhanceConfig::default())?;
//! page.type_text("#password", "Password1!")?;
//! page.assert_style(".progress-bar", "width", "100%")?;
//! page.assert_class(".progress-bar", "bg-success")?;
//! # Ok::<(), form_enhancer::Error>(())
//! ```

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::error::Error as StdError;
use std::fmt;
use std::rc::Rc;

mod dom;
mod enhance;
mod events;
mod html;
mod js_regex;
mod page;
mod selector;
pub mod strength;
mod timers;
mod validity;

use dom::*;
use events::ListenerStore;
use html::*;
use js_regex::Regex;
use selector::*;

pub use dom::NodeId;
pub use enhance::{
    AlertDismissal, AlertPhase, EnhanceConfig, Installation, TierClasses, confirm_passwords,
    install, render_meter,
};
pub use events::{Event, EventHandler, ListenerId};
pub use page::{FormSubmission, Page, ScrollBehavior, ScrollRecord};
pub use strength::{Strength, StrengthTier};
pub use timers::{PendingTimer, TimerId};
pub use validity::{ValidationSink, ValidityState};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    HtmlParse(String),
    UnsupportedSelector(String),
    SelectorNotFound(String),
    InvalidNode(String),
    Runtime(String),
    TypeMismatch {
        selector: String,
        expected: String,
        actual: String,
    },
    AssertionFailed {
        selector: String,
        expected: String,
        actual: String,
        dom_snippet: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HtmlParse(msg) => write!(f, "html parse error: {msg}"),
            Self::UnsupportedSelector(selector) => write!(f, "unsupported selector: {selector}"),
            Self::SelectorNotFound(selector) => write!(f, "selector not found: {selector}"),
            Self::InvalidNode(msg) => write!(f, "invalid node: {msg}"),
            Self::Runtime(msg) => write!(f, "runtime error: {msg}"),
            Self::TypeMismatch {
                selector,
                expected,
                actual,
            } => write!(
                f,
                "type mismatch for {selector}: expected {expected}, actual {actual}"
            ),
            Self::AssertionFailed {
                selector,
                expected,
                actual,
                dom_snippet,
            } => write!(
                f,
                "assertion failed for {selector}: expected {expected}, actual {actual}, snippet {dom_snippet}"
            ),
        }
    }
}

impl StdError for Error {}

#[cfg(test)]
mod tests;
