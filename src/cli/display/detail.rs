//! Key-value views for single records (profile, certificate setup, results).

use colored::Colorize;

use super::colors::label;

/// Builder for a titled block of `key: value` lines and bullet items.
pub struct DetailView {
    title: String,
    sections: Vec<DetailSection>,
}

#[derive(Default)]
struct DetailSection {
    header: Option<String>,
    fields: Vec<(String, String)>,
    items: Vec<String>,
}

impl DetailView {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            sections: vec![DetailSection::default()],
        }
    }

    pub fn field(mut self, key: &str, value: impl ToString) -> Self {
        if let Some(section) = self.sections.last_mut() {
            section.fields.push((key.to_string(), value.to_string()));
        }
        self
    }

    /// Skipped when `value` is `None` or empty.
    pub fn field_opt(self, key: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.is_empty() => self.field(key, v),
            _ => self,
        }
    }

    pub fn section(mut self, header: &str) -> Self {
        self.sections.push(DetailSection {
            header: Some(header.to_string()),
            ..DetailSection::default()
        });
        self
    }

    pub fn item(mut self, text: impl ToString) -> Self {
        if let Some(section) = self.sections.last_mut() {
            section.items.push(text.to_string());
        }
        self
    }

    pub fn render(&self) -> String {
        let mut lines = vec![self.title.bold().to_string()];
        let key_width = self
            .sections
            .iter()
            .flat_map(|s| s.fields.iter())
            .map(|(k, _)| k.len())
            .max()
            .unwrap_or(12);

        for section in &self.sections {
            if let Some(header) = &section.header {
                lines.push(String::new());
                lines.push(header.bold().underline().to_string());
            }
            for (key, value) in &section.fields {
                let pad = " ".repeat(key_width.saturating_sub(key.len()));
                lines.push(format!("  {}{pad}  {value}", label(key)));
            }
            for item in &section.items {
                lines.push(format!("  {} {item}", "\u{2022}".dimmed()));
            }
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_fields_are_skipped() {
        colored::control::set_override(false);
        let view = DetailView::new("Profile")
            .field("User", "amira")
            .field_opt("Company", None)
            .field_opt("Role", Some(""))
            .section("Certificates")
            .item("/opt/certs/seal.p12")
            .render();
        assert!(view.contains("User:"));
        assert!(!view.contains("Company"));
        assert!(!view.contains("Role"));
        assert!(view.contains("/opt/certs/seal.p12"));
    }
}
