//! Descriptions of the input forms a client has to render for the
//! create, edit and comment pages.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One selectable option of a choice field.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Choice {
    pub value: i32,
    pub label: String,
}

/// Input widget kind of a form field.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Choice { choices: Vec<Choice> },
    Image,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub help_text: Option<String>,
    pub required: bool,
    pub kind: FieldKind,
    /// Current value when editing an existing record
    pub initial: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Default)]
pub struct FormDescriptor {
    pub fields: Vec<FormField>,
}

impl FormDescriptor {
    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|field| field.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_kind_is_tagged() {
        let kind = FieldKind::Choice {
            choices: vec![Choice {
                value: 1,
                label: "Test group".to_string(),
            }],
        };
        let value = serde_json::to_value(&kind).unwrap();

        assert_eq!(value["type"], "choice");
        assert_eq!(value["choices"][0]["label"], "Test group");
    }

    #[test]
    fn test_field_lookup_by_name() {
        let form = FormDescriptor {
            fields: vec![FormField {
                name: "text".to_string(),
                label: "Post text".to_string(),
                help_text: None,
                required: true,
                kind: FieldKind::Text,
                initial: None,
            }],
        };

        assert_eq!(form.field("text").map(|f| &f.kind), Some(&FieldKind::Text));
        assert!(form.field("image").is_none());
    }
}
