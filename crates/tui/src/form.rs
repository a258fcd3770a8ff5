//! Modal input forms for create, update, delete and search.

use chrono::Local;
use records_core::{FieldMap, RecordKind};

const MAX_INPUT_LEN: usize = 128;

pub const TYPE_LABEL: &str = "Type";
pub const ID_LABEL: &str = "ID";
pub const CLIENT_ID_LABEL: &str = "Client ID";
pub const AIRLINE_ID_LABEL: &str = "Airline ID";
pub const FLIGHT_LABEL: &str = "Flight";
pub const ANY_KIND: &str = "Any";

const DATE_LABEL: &str = "Date";
const KIND_OPTIONS: [&str; 3] = ["Client", "Airline", "Flight"];
const SEARCH_OPTIONS: [&str; 4] = [ANY_KIND, "Client", "Airline", "Flight"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPurpose {
    Create,
    Update,
    Delete,
    Search,
}

impl FormPurpose {
    pub fn title(self) -> &'static str {
        match self {
            FormPurpose::Create => "Create Record",
            FormPurpose::Update => "Update Record (blank fields are left unchanged)",
            FormPurpose::Delete => "Delete Record",
            FormPurpose::Search => "Search Records",
        }
    }

    pub fn submit_label(self) -> &'static str {
        match self {
            FormPurpose::Create => "create",
            FormPurpose::Update => "update",
            FormPurpose::Delete => "delete",
            FormPurpose::Search => "search",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldInput {
    Text { value: String, cursor: usize },
    Toggle(bool),
    Choice {
        options: &'static [&'static str],
        selected: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub label: &'static str,
    pub input: FieldInput,
}

impl FormField {
    fn text(label: &'static str) -> Self {
        Self::text_with(label, String::new())
    }

    fn text_with(label: &'static str, value: String) -> Self {
        let cursor = value.chars().count();
        Self {
            label,
            input: FieldInput::Text { value, cursor },
        }
    }

    fn toggle(label: &'static str) -> Self {
        Self {
            label,
            input: FieldInput::Toggle(false),
        }
    }

    fn choice(label: &'static str, options: &'static [&'static str], selected: usize) -> Self {
        Self {
            label,
            input: FieldInput::Choice { options, selected },
        }
    }

    /// Text shown after the label.
    pub fn display_value(&self) -> String {
        match &self.input {
            FieldInput::Text { value, .. } => value.clone(),
            FieldInput::Toggle(on) => (if *on { "[x]" } else { "[ ]" }).to_string(),
            FieldInput::Choice { options, selected } => {
                format!("◀ {} ▶", options.get(*selected).copied().unwrap_or_default())
            }
        }
    }

    /// Cursor column within [`Self::display_value`] for text inputs.
    pub fn cursor(&self) -> Option<usize> {
        match &self.input {
            FieldInput::Text { cursor, .. } => Some(*cursor),
            _ => None,
        }
    }
}

/// A modal form with one focused field.
#[derive(Debug, Clone)]
pub struct FormModal {
    pub purpose: FormPurpose,
    pub fields: Vec<FormField>,
    pub focus: usize,
}

impl FormModal {
    /// Create form for `kind`; the Type selector rebuilds the fields when changed.
    pub fn create(kind: RecordKind) -> Self {
        let selected = RecordKind::ALL
            .iter()
            .position(|candidate| *candidate == kind)
            .unwrap_or(0);
        let mut form = Self {
            purpose: FormPurpose::Create,
            fields: vec![FormField::choice(TYPE_LABEL, &KIND_OPTIONS, selected)],
            focus: 0,
        };
        form.rebuild_create_fields();
        form
    }

    /// Update form: target ids, a flight toggle and every editable field.
    pub fn update() -> Self {
        let mut fields = vec![
            FormField::text(CLIENT_ID_LABEL),
            FormField::text(AIRLINE_ID_LABEL),
            FormField::toggle(FLIGHT_LABEL),
        ];
        for kind in RecordKind::ALL {
            fields.extend(kind.editable_fields().iter().copied().map(FormField::text));
        }
        Self {
            purpose: FormPurpose::Update,
            fields,
            focus: 0,
        }
    }

    pub fn delete() -> Self {
        Self {
            purpose: FormPurpose::Delete,
            fields: vec![
                FormField::text(AIRLINE_ID_LABEL),
                FormField::text(CLIENT_ID_LABEL),
                FormField::toggle(FLIGHT_LABEL),
            ],
            focus: 0,
        }
    }

    /// Search form scoped to `kind`, or across all kinds.
    pub fn search(kind: Option<RecordKind>) -> Self {
        let selected = kind
            .and_then(|kind| SEARCH_OPTIONS.iter().position(|o| *o == kind.as_str()))
            .unwrap_or(0);
        Self {
            purpose: FormPurpose::Search,
            fields: vec![
                FormField::choice(TYPE_LABEL, &SEARCH_OPTIONS, selected),
                FormField::text(ID_LABEL),
            ],
            focus: 1,
        }
    }

    /// Kind selected in a create form.
    pub fn create_kind(&self) -> RecordKind {
        self.choice(TYPE_LABEL)
            .parse()
            .unwrap_or(RecordKind::Client)
    }

    /// Trimmed text of a field, empty when absent.
    pub fn text(&self, label: &str) -> &str {
        self.field(label)
            .and_then(|field| match &field.input {
                FieldInput::Text { value, .. } => Some(value.trim()),
                _ => None,
            })
            .unwrap_or_default()
    }

    pub fn toggled(&self, label: &str) -> bool {
        matches!(
            self.field(label).map(|field| &field.input),
            Some(FieldInput::Toggle(true))
        )
    }

    pub fn choice(&self, label: &str) -> &'static str {
        match self.field(label).map(|field| &field.input) {
            Some(FieldInput::Choice { options, selected }) => {
                options.get(*selected).copied().unwrap_or_default()
            }
            _ => "",
        }
    }

    /// Non-blank text fields, trimmed, excluding `skip`.
    pub fn filled_fields(&self, skip: &[&str]) -> FieldMap {
        self.fields
            .iter()
            .filter(|field| !skip.contains(&field.label))
            .filter_map(|field| match &field.input {
                FieldInput::Text { value, .. } if !value.trim().is_empty() => {
                    Some((field.label.to_string(), value.trim().to_string()))
                }
                _ => None,
            })
            .collect()
    }

    pub fn focused(&self) -> Option<&FormField> {
        self.fields.get(self.focus)
    }

    pub fn focus_next(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + 1) % self.fields.len();
        }
    }

    pub fn focus_prev(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
        }
    }

    /// Left/Right: move the text cursor or cycle a choice.
    pub fn shift(&mut self, delta: isize) {
        let mut rebuild = false;
        if let Some(field) = self.fields.get_mut(self.focus) {
            match &mut field.input {
                FieldInput::Text { value, cursor } => {
                    let len = value.chars().count() as isize;
                    *cursor = (*cursor as isize + delta).clamp(0, len) as usize;
                }
                FieldInput::Choice { options, selected } => {
                    let len = options.len() as isize;
                    *selected = (*selected as isize + delta).rem_euclid(len.max(1)) as usize;
                    rebuild = self.purpose == FormPurpose::Create;
                }
                FieldInput::Toggle(_) => {}
            }
        }
        if rebuild {
            self.rebuild_create_fields();
        }
    }

    pub fn home(&mut self) {
        if let Some(FieldInput::Text { cursor, .. }) = self.focused_input() {
            *cursor = 0;
        }
    }

    pub fn end(&mut self) {
        if let Some(FieldInput::Text { value, cursor }) = self.focused_input() {
            *cursor = value.chars().count();
        }
    }

    /// Type a character; space flips a focused toggle.
    pub fn insert(&mut self, ch: char) {
        match self.focused_input() {
            Some(FieldInput::Text { value, cursor }) => {
                if ch.is_control() || value.chars().count() >= MAX_INPUT_LEN {
                    return;
                }
                let at = byte_index(value, *cursor);
                value.insert(at, ch);
                *cursor += 1;
            }
            Some(FieldInput::Toggle(on)) if ch == ' ' => *on = !*on,
            _ => {}
        }
    }

    pub fn backspace(&mut self) {
        if let Some(FieldInput::Text { value, cursor }) = self.focused_input() {
            if *cursor > 0 {
                *cursor -= 1;
                let at = byte_index(value, *cursor);
                value.remove(at);
            }
        }
    }

    pub fn delete_char(&mut self) {
        if let Some(FieldInput::Text { value, cursor }) = self.focused_input() {
            if *cursor < value.chars().count() {
                let at = byte_index(value, *cursor);
                value.remove(at);
            }
        }
    }

    fn field(&self, label: &str) -> Option<&FormField> {
        self.fields.iter().find(|field| field.label == label)
    }

    fn focused_input(&mut self) -> Option<&mut FieldInput> {
        self.fields.get_mut(self.focus).map(|field| &mut field.input)
    }

    fn rebuild_create_fields(&mut self) {
        let kind = self.create_kind();
        self.fields.truncate(1);
        for label in kind.fields().iter().copied() {
            let field = if label == DATE_LABEL {
                FormField::text_with(label, Local::now().format("%Y-%m-%dT%H:%M:%S").to_string())
            } else {
                FormField::text(label)
            };
            self.fields.push(field);
        }
    }
}

fn byte_index(value: &str, cursor: usize) -> usize {
    value
        .char_indices()
        .nth(cursor)
        .map(|(index, _)| index)
        .unwrap_or(value.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_text(form: &mut FormModal, text: &str) {
        for ch in text.chars() {
            form.insert(ch);
        }
    }

    #[test]
    fn create_form_follows_the_selected_kind() {
        let mut form = FormModal::create(RecordKind::Airline);
        assert_eq!(form.create_kind(), RecordKind::Airline);
        assert_eq!(form.fields.len(), 2);
        assert_eq!(form.fields[1].label, "Company Name");

        form.shift(1);
        assert_eq!(form.create_kind(), RecordKind::Flight);
        let labels: Vec<_> = form.fields.iter().map(|field| field.label).collect();
        assert_eq!(
            labels,
            vec!["Type", "Client_ID", "Airline_ID", "Date", "Start City", "End City"]
        );
        assert!(!form.text("Date").is_empty());

        form.shift(1);
        assert_eq!(form.create_kind(), RecordKind::Client);
    }

    #[test]
    fn text_editing_handles_multibyte_input() {
        let mut form = FormModal::search(None);
        type_text(&mut form, "Zürich");
        form.shift(-2);
        form.backspace();
        assert_eq!(form.text(ID_LABEL), "Zürch");
        form.home();
        form.delete_char();
        assert_eq!(form.text(ID_LABEL), "ürch");
        form.end();
        type_text(&mut form, "!");
        assert_eq!(form.text(ID_LABEL), "ürch!");
    }

    #[test]
    fn space_flips_toggles() {
        let mut form = FormModal::delete();
        form.focus = 2;
        form.insert(' ');
        assert!(form.toggled(FLIGHT_LABEL));
        form.insert('x');
        assert!(form.toggled(FLIGHT_LABEL));
        form.insert(' ');
        assert!(!form.toggled(FLIGHT_LABEL));
    }

    #[test]
    fn filled_fields_skip_blanks_and_ids() {
        let mut form = FormModal::update();
        type_text(&mut form, "1");
        let name = form
            .fields
            .iter()
            .position(|field| field.label == "Name")
            .expect("update form has a Name field");
        form.focus = name;
        type_text(&mut form, "  Johnathan Doe ");
        let city = name + 4;
        form.focus = city;
        type_text(&mut form, "   ");

        let fields = form.filled_fields(&[CLIENT_ID_LABEL, AIRLINE_ID_LABEL]);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get("Name").map(String::as_str), Some("Johnathan Doe"));
    }

    #[test]
    fn focus_wraps_in_both_directions() {
        let mut form = FormModal::delete();
        form.focus_prev();
        assert_eq!(form.focus, 2);
        form.focus_next();
        assert_eq!(form.focus, 0);
    }

    #[test]
    fn search_form_preselects_kind() {
        let form = FormModal::search(Some(RecordKind::Flight));
        assert_eq!(form.choice(TYPE_LABEL), "Flight");
        assert_eq!(FormModal::search(None).choice(TYPE_LABEL), ANY_KIND);
    }
}
