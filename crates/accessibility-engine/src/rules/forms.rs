// Form field labeling
use shared_pdf::Field;

/// Fields with neither a tooltip (`/TU`) nor a partial name (`/T`).
/// Fields are numbered from 0 in form order.
pub fn check_form_fields(fields: Option<&[Field]>) -> Vec<String> {
    fields
        .unwrap_or_default()
        .iter()
        .enumerate()
        .filter(|(_, field)| !field.has_label())
        .map(|(index, _)| format!("Form field {} missing label/tooltip.", index))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlabeled_fields() {
        let fields = vec![
            Field::new(Some("First name"), None),
            Field::new(None, None),
            Field::new(None, Some("zip")),
            Field::new(Some(""), None),
        ];
        assert_eq!(
            check_form_fields(Some(&fields)),
            vec![
                "Form field 1 missing label/tooltip.".to_string(),
                "Form field 3 missing label/tooltip.".to_string(),
            ]
        );
    }

    #[test]
    fn test_first_field_is_numbered_zero() {
        let fields = vec![Field::new(None, None)];
        assert_eq!(
            check_form_fields(Some(&fields)),
            vec!["Form field 0 missing label/tooltip.".to_string()]
        );
    }

    #[test]
    fn test_no_form() {
        assert!(check_form_fields(None).is_empty());
    }
}
