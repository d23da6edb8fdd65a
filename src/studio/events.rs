use crate::tree::NodeDraft;

/// User intents raised by the studio panels, applied in order after the frame's UI pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudioAction {
    Select {
        node_id: Option<String>,
    },
    AddChild {
        parent_id: String,
        draft: NodeDraft,
    },
    SaveNotes {
        node_id: String,
        notes: String,
    },
}

/// Splits a comma-separated tag field, dropping blanks.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::parse_tags;

    #[test]
    fn parse_tags_trims_and_skips_empty_entries() {
        assert_eq!(
            parse_tags(" rust, ,layout ,, graphs"),
            vec!["rust".to_owned(), "layout".to_owned(), "graphs".to_owned()]
        );
        assert!(parse_tags("  ").is_empty());
    }
}
