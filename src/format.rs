//! Wazuh CDB list formatting
//!
//! Each exported attribute becomes one `key:value` line, where the key is the
//! indicator and the value points back at the MISP event it came from:
//!
//! ```text
//! 44d88612fea8a8f36de82e1278abb02f:Event_1337
//! ```

use serde_json::Value;

use crate::types::Attribute;

/// Rendered in place of an absent event id
const MISSING_EVENT_ID: &str = "None";

/// Format one attribute as a CDB entry
///
/// Returns `None` when the attribute has no value (or an empty one); such records
/// are skipped silently. The event id is not validated.
pub fn format_entry(attr: &Attribute) -> Option<String> {
    let value = attr.value.as_deref().filter(|v| !v.is_empty())?;
    Some(format!("{}:Event_{}", value, EventIdDisplay(attr.event_id.as_ref())))
}

struct EventIdDisplay<'a>(Option<&'a Value>);

impl std::fmt::Display for EventIdDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            None | Some(Value::Null) => f.write_str(MISSING_EVENT_ID),
            Some(Value::String(s)) => f.write_str(s),
            Some(other) => write!(f, "{other}"),
        }
    }
}
