use super::*;

/// Write side of native constraint validation: attach or clear a custom
/// error on a field. `None` clears it.
pub trait ValidationSink {
    fn set_validation_error(&mut self, field: NodeId, message: Option<&str>) -> Result<()>;
}

impl ValidationSink for Page {
    fn set_validation_error(&mut self, field: NodeId, message: Option<&str>) -> Result<()> {
        self.set_custom_validity(field, message.unwrap_or(""))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityState {
    pub value_missing: bool,
    pub type_mismatch: bool,
    pub pattern_mismatch: bool,
    pub too_long: bool,
    pub too_short: bool,
    pub custom_error: bool,
    pub valid: bool,
}

impl Default for ValidityState {
    fn default() -> Self {
        Self {
            value_missing: false,
            type_mismatch: false,
            pattern_mismatch: false,
            too_long: false,
            too_short: false,
            custom_error: false,
            valid: true,
        }
    }
}

impl ValidityState {
    fn settle(mut self) -> Self {
        self.valid = !(self.value_missing
            || self.type_mismatch
            || self.pattern_mismatch
            || self.too_long
            || self.too_short
            || self.custom_error);
        self
    }
}

impl Page {
    pub fn set_custom_validity(&mut self, node: NodeId, message: &str) -> Result<()> {
        self.ensure_node(node)?;
        self.dom.set_custom_validity_message(node, message)?;
        if self.trace {
            let label = self.trace_node_label(node);
            self.trace_line(format!(
                "[validity] custom node={label} message={message:?}"
            ));
        }
        Ok(())
    }

    /// Whether the control takes part in constraint validation at all.
    pub fn will_validate(&self, node: NodeId) -> bool {
        let dom = &self.dom;
        if dom.element(node).is_none() || self.is_effectively_disabled(node) {
            return false;
        }
        if dom.is_tag(node, "select") {
            return true;
        }
        if dom.is_tag(node, "textarea") {
            return !dom.readonly(node);
        }
        if dom.is_tag(node, "input") {
            let kind = input_type(dom, node);
            return !matches!(
                kind.as_str(),
                "hidden" | "submit" | "reset" | "button" | "image"
            ) && !dom.readonly(node);
        }
        false
    }

    pub fn validity(&self, node: NodeId) -> Result<ValidityState> {
        self.ensure_node(node)?;
        let mut validity = ValidityState::default();
        if !self.will_validate(node) {
            return Ok(validity);
        }

        let value = self.dom.value(node)?;
        if self.dom.required(node) && value.is_empty() {
            validity.value_missing = true;
        }

        let text_like = self.dom.is_tag(node, "textarea")
            || (self.dom.is_tag(node, "input")
                && matches!(
                    input_type(&self.dom, node).as_str(),
                    "text" | "search" | "url" | "tel" | "email" | "password"
                ));

        if text_like && !value.is_empty() {
            let value_len = value.encode_utf16().count() as i64;
            if let Some(min_len) = self.parse_attr_i64(node, "minlength") {
                if min_len >= 0 && value_len < min_len {
                    validity.too_short = true;
                }
            }
            if let Some(max_len) = self.parse_attr_i64(node, "maxlength") {
                if max_len >= 0 && value_len > max_len {
                    validity.too_long = true;
                }
            }

            if input_type(&self.dom, node) == "email" && self.dom.is_tag(node, "input") {
                validity.type_mismatch = !is_simple_email(&value);
            }

            if let Some(pattern) = self.dom.attr(node, "pattern").filter(|p| !p.is_empty()) {
                // An uncompilable pattern is ignored, as browsers do.
                if let Ok(regex) = Regex::new_anchored(&pattern) {
                    validity.pattern_mismatch = !regex.is_match(&value)?;
                }
            }
        }

        validity.custom_error = !self.dom.custom_validity_message(node)?.is_empty();
        Ok(validity.settle())
    }

    /// Validates a single control, or every control owned by a form.
    pub fn check_validity(&self, node: NodeId) -> Result<bool> {
        Ok(self.invalid_controls(node)?.is_empty())
    }

    /// Like [`Page::check_validity`], but also fires `invalid` at each
    /// failing control so listeners can surface messages.
    pub fn report_validity(&mut self, node: NodeId) -> Result<bool> {
        let invalid = self.invalid_controls(node)?;
        for control in &invalid {
            self.dispatch_event(*control, "invalid")?;
        }
        Ok(invalid.is_empty())
    }

    pub fn validation_message(&self, node: NodeId) -> Result<String> {
        let validity = self.validity(node)?;
        if validity.valid {
            return Ok(String::new());
        }
        if validity.custom_error {
            return self.dom.custom_validity_message(node);
        }
        let message = if validity.value_missing {
            "Please fill out this field.".to_string()
        } else if validity.type_mismatch {
            "Please enter an email address.".to_string()
        } else if validity.too_short {
            let min = self.parse_attr_i64(node, "minlength").unwrap_or_default();
            format!("Please lengthen this text to {min} characters or more.")
        } else if validity.too_long {
            let max = self.parse_attr_i64(node, "maxlength").unwrap_or_default();
            format!("Please shorten this text to {max} characters or less.")
        } else {
            "Please match the requested format.".to_string()
        };
        Ok(message)
    }

    fn invalid_controls(&self, node: NodeId) -> Result<Vec<NodeId>> {
        self.ensure_node(node)?;
        let candidates = if self.dom.is_tag(node, "form") {
            self.dom.form_controls(node)
        } else {
            vec![node]
        };
        let mut invalid = Vec::new();
        for control in candidates {
            if !self.validity(control)?.valid {
                invalid.push(control);
            }
        }
        Ok(invalid)
    }

    fn is_effectively_disabled(&self, node: NodeId) -> bool {
        if self.dom.disabled(node) {
            return true;
        }
        let mut cursor = self.dom.parent(node);
        while let Some(current) = cursor {
            if self.dom.is_tag(current, "fieldset") && self.dom.disabled(current) {
                return true;
            }
            cursor = self.dom.parent(current);
        }
        false
    }

    fn parse_attr_i64(&self, node: NodeId, name: &str) -> Option<i64> {
        self.dom
            .attr(node, name)
            .and_then(|raw| raw.trim().parse::<i64>().ok())
    }
}

fn is_simple_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    if !local.chars().all(is_email_local_char) {
        return false;
    }
    domain.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

fn is_email_local_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || ".!#$%&'*+/=?^_`{|}~-".contains(c)
}
