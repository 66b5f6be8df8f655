//! Legacy filename → DGW template selection

/// Legacy keywords that pick a template family, and the template keywords
/// identifying that family
struct TemplateRule {
    legacy: &'static [&'static str],
    templates: &'static [&'static str],
}

/// Priority order: hire, absence, contact, worker, compensation
const TEMPLATE_RULES: &[TemplateRule] = &[
    TemplateRule {
        legacy: &["hirestack", "hire"],
        templates: &["hirestack", "hire"],
    },
    TemplateRule {
        legacy: &["absence", "leave", "time_off", "timeoff"],
        templates: &["absence", "leave", "time_off", "timeoff"],
    },
    TemplateRule {
        legacy: &["contact"],
        templates: &["contact"],
    },
    TemplateRule {
        legacy: &["worker"],
        templates: &["worker"],
    },
    TemplateRule {
        legacy: &["compensation", "salary"],
        templates: &["compensation", "comp"],
    },
];

/// Choose a template for a legacy file, or `None` when nothing applies.
///
/// Only the first keyword rule matching the filename is consulted. When it
/// finds no template of its family, selection continues with the prefix
/// fallback, then the single-template fallback.
pub fn select_template<'a, S: AsRef<str>>(filename: &str, available: &'a [S]) -> Option<&'a str> {
    let name = filename.to_lowercase();

    let rule = TEMPLATE_RULES
        .iter()
        .find(|rule| rule.legacy.iter().any(|kw| name.contains(kw)));
    if let Some(rule) = rule {
        let found = available.iter().map(|c| c.as_ref()).find(|template| {
            let template = template.to_lowercase();
            rule.templates.iter().any(|kw| template.contains(kw))
        });
        if found.is_some() {
            return found;
        }
    }

    let prefix = name_prefix(&name);
    if !prefix.is_empty() {
        if let Some(found) = available
            .iter()
            .map(|c| c.as_ref())
            .find(|template| name_prefix(&template.to_lowercase()) == prefix)
        {
            return Some(found);
        }
    }

    match available {
        [only] => Some(only.as_ref()),
        _ => None,
    }
}

/// Substring before the first separator
fn name_prefix(name: &str) -> &str {
    name.split(['_', '-', ' ', '.']).next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hire_file_picks_hirestack_template() {
        let templates = vec!["DGW_HireStack.xlsx", "DGW_Absence.xlsx"];
        assert_eq!(
            select_template("Hire_Batch1.xlsx", &templates),
            Some("DGW_HireStack.xlsx")
        );
    }

    #[test]
    fn test_absence_family() {
        let templates = vec!["DGW_HireStack.xlsx", "DGW_Leave_Of_Absence.xlsx"];
        assert_eq!(
            select_template("time_off_2024.xlsx", &templates),
            Some("DGW_Leave_Of_Absence.xlsx")
        );
    }

    #[test]
    fn test_prefix_fallback() {
        let templates = vec!["DGW_HireStack.xlsx", "Payroll_Template.xlsx"];
        assert_eq!(
            select_template("payroll_jan.xlsx", &templates),
            Some("Payroll_Template.xlsx")
        );
    }

    #[test]
    fn test_rule_without_template_falls_through() {
        let templates = vec!["DGW_Contact.xlsx"];
        // hire keywords match but no hire template: single-template fallback
        assert_eq!(
            select_template("hire_batch.xlsx", &templates),
            Some("DGW_Contact.xlsx")
        );
    }

    #[test]
    fn test_only_first_matching_rule_is_consulted() {
        let templates = vec!["DGW_Contact.xlsx", "DGW_Worker.xlsx"];
        // hire wins over contact; no hire template and no prefix match
        assert_eq!(select_template("hire_contact.xlsx", &templates), None);
        assert_eq!(
            select_template("contact_hire.xlsx", &templates),
            None,
            "hire is checked before contact regardless of word order"
        );
        assert_eq!(
            select_template("worker_contact.xlsx", &templates),
            Some("DGW_Contact.xlsx")
        );
    }

    #[test]
    fn test_single_template_fallback() {
        let templates = vec!["Anything.xlsx"];
        assert_eq!(select_template("mystery.xlsx", &templates), Some("Anything.xlsx"));
    }

    #[test]
    fn test_not_found() {
        let templates = vec!["DGW_HireStack.xlsx", "DGW_Absence.xlsx"];
        assert_eq!(select_template("mystery.xlsx", &templates), None);

        let empty: Vec<&str> = Vec::new();
        assert_eq!(select_template("hire.xlsx", &empty), None);
    }

    #[test]
    fn test_name_prefix() {
        assert_eq!(name_prefix("payroll_jan.xlsx"), "payroll");
        assert_eq!(name_prefix("dgw-hire"), "dgw");
        assert_eq!(name_prefix("plain"), "plain");
    }
}
