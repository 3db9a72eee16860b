use crate::page::{Listen, Page};

pub const PHONE_FIELD_ID: &str = "telefone";

/// Formats whatever digits `raw` contains as a Brazilian phone number.
pub fn format_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.len() {
        0..=1 => digits,
        2..=5 => format!("({}) {}", &digits[..2], &digits[2..]),
        6..=10 => {
            let (area, rest) = digits.split_at(2);
            let (head, tail) = rest.split_at(4);
            if tail.is_empty() {
                format!("({}) {}", area, head)
            } else {
                format!("({}) {}-{}", area, head, tail)
            }
        }
        _ => format!(
            "({}) {}-{}{}",
            &digits[..2],
            &digits[2..7],
            &digits[7..11],
            &digits[11..]
        ),
    }
}

pub fn install<P: Page>(page: &P) {
    let Some(field) = page.by_id(PHONE_FIELD_ID) else {
        return;
    };
    let handler_page = page.clone();
    let target = field.clone();
    page.listen(
        &field,
        "input",
        Listen::Passive,
        Box::new(move || {
            let formatted = format_phone(&handler_page.value(&target));
            handler_page.set_value(&target, &formatted);
        }),
    );
}
