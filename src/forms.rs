//! Form descriptors for the pages that accept input.

use common::{Choice, FieldKind, FormDescriptor, FormField};
use model::entities::{group, post};

fn text_field(name: &str, label: &str, help_text: Option<&str>) -> FormField {
    FormField {
        name: name.to_string(),
        label: label.to_string(),
        help_text: help_text.map(str::to_string),
        required: true,
        kind: FieldKind::Text,
        initial: None,
    }
}

/// The post form, filled with the values of `post` when editing.
pub fn post_form(groups: &[group::Model], post: Option<&post::Model>) -> FormDescriptor {
    let choices = groups
        .iter()
        .map(|group| Choice {
            value: group.id,
            label: group.to_string(),
        })
        .collect();

    let group_field = FormField {
        name: "group".to_string(),
        label: "Группа".to_string(),
        help_text: Some("Группа, к которой будет относиться пост".to_string()),
        required: false,
        kind: FieldKind::Choice { choices },
        initial: post.and_then(|p| p.group_id).map(|id| id.to_string()),
    };

    let text = FormField {
        initial: post.map(|p| p.text.clone()),
        ..text_field("text", "Текст поста", Some("Текст нового поста"))
    };

    let image_field = FormField {
        name: "image".to_string(),
        label: "Картинка".to_string(),
        help_text: None,
        required: false,
        kind: FieldKind::Image,
        initial: post.and_then(|p| p.image.clone()),
    };

    FormDescriptor {
        fields: vec![group_field, text, image_field],
    }
}

pub fn comment_form() -> FormDescriptor {
    FormDescriptor {
        fields: vec![text_field("text", "Текст комментария", None)],
    }
}

pub fn login_form() -> FormDescriptor {
    FormDescriptor {
        fields: vec![
            text_field("username", "Имя пользователя", None),
            text_field("password", "Пароль", None),
        ],
    }
}
